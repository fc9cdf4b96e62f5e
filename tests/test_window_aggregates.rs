mod common;

use meeg::{
    kind_of, window_aggregates, AnatomicalGroup, Baseline, EventSelection, EventType,
    ExplorerError, Recording, WindowMargins, WindowRequest,
};

fn request(pre: f64, post: f64, types: &[EventType]) -> WindowRequest {
    WindowRequest {
        selection: EventSelection::from_types(types.iter().copied()),
        margins: WindowMargins::new(pre, post).unwrap(),
        baseline: Baseline::None,
        with_std: false,
    }
}

/// 100 Hz, 2000 samples, Famous at samples 500 and 1500.
/// Every channel sits at 1 unit before sample 1000 and 3 units after.
fn two_event_run() -> Recording {
    common::recording(100.0, 2000, &[(5.0, "Famous"), (15.0, "Famous")], |c, t| {
        let level = if t < 1000 { 1.0 } else { 3.0 };
        if c < 7 { level * 1e-6 } else { level * 1e-15 }
    })
}

#[test]
fn two_events_give_two_windows_of_21_samples() {
    let rec = two_event_run();
    let agg = window_aggregates(
        &[rec],
        &request(0.1, 0.1, &[EventType::Famous]),
        &common::eeg_groups(),
        &common::meg_groups(),
    )
    .unwrap();

    assert_eq!(agg.n_windows, 2);
    assert_eq!(agg.per_run, vec![2]);
    assert_eq!(agg.window_len, 21);
    assert_eq!(agg.times.len(), 21);
    let frontal = agg.eeg.get(AnatomicalGroup::Frontal).unwrap();
    assert_eq!(frontal.mean.len(), 21);
    for &v in frontal.mean.iter() {
        approx::assert_abs_diff_eq!(v, 2.0, epsilon = 1e-9);
    }
    // Averaged window is flat: no power outside DC after detrending.
    assert_eq!(frontal.psd.n_rows(), 3);
    assert_eq!(frontal.psd.n_freqs(), 11);
    assert!(frontal.psd.power.iter().all(|p| p.abs() < 1e-12));
}

#[test]
fn std_is_across_trials_then_channels() {
    let mut req = request(0.1, 0.1, &[EventType::Famous]);
    req.with_std = true;
    let agg = window_aggregates(&[two_event_run()], &req, &common::eeg_groups(), &common::meg_groups())
        .unwrap();
    for modality in meeg::Modality::ALL {
        for (group, ga) in agg.modality(modality).iter() {
            let std = ga.std.as_ref().unwrap_or_else(|| panic!("{modality} {group} has no std"));
            for &v in std.iter() {
                approx::assert_abs_diff_eq!(v, 1.0, epsilon = 1e-9);
            }
        }
    }
}

#[test]
fn prestimulus_baseline_is_applied() {
    let mut req = request(0.1, 0.1, &[EventType::Famous]);
    req.baseline = Baseline::PreStimulus;
    let agg = window_aggregates(&[two_event_run()], &req, &common::eeg_groups(), &common::meg_groups())
        .unwrap();
    for &v in agg.eeg.get(AnatomicalGroup::Occipital).unwrap().mean.iter() {
        approx::assert_abs_diff_eq!(v, 0.0, epsilon = 1e-9);
    }
}

#[test]
fn pooled_mean_is_trial_weighted() {
    let wave = |phase: f64| {
        move |c: usize, t: usize| {
            let x = (t as f64 * 0.13 + phase + c as f64).sin();
            if c < 7 { x * 1e-6 } else { x * 1e-15 }
        }
    };
    let r1 = common::recording(100.0, 3000, &[(4.0, "Famous"), (12.0, "Scrambled")], wave(0.0));
    let r2 = common::recording(
        100.0,
        3000,
        &[(5.0, "Famous"), (10.0, "Unfamiliar"), (20.0, "Famous")],
        wave(1.7),
    );
    let req = WindowRequest {
        selection: EventSelection::all(),
        margins: WindowMargins::new(0.3, 0.5).unwrap(),
        ..WindowRequest::default()
    };
    let (eeg, meg) = (common::eeg_groups(), common::meg_groups());

    let a1 = window_aggregates(std::slice::from_ref(&r1), &req, &eeg, &meg).unwrap();
    let a2 = window_aggregates(std::slice::from_ref(&r2), &req, &eeg, &meg).unwrap();
    let both = window_aggregates(&[r1, r2], &req, &eeg, &meg).unwrap();
    assert_eq!((a1.n_windows, a2.n_windows, both.n_windows), (2, 3, 5));
    assert_eq!(both.per_run, vec![2, 3]);

    for modality in meeg::Modality::ALL {
        for group in AnatomicalGroup::ALL {
            let m1 = &a1.modality(modality).get(group).unwrap().mean;
            let m2 = &a2.modality(modality).get(group).unwrap().mean;
            let expected = (m1 * 2.0 + m2 * 3.0) / 5.0;
            let got = &both.modality(modality).get(group).unwrap().mean;
            for (g, e) in got.iter().zip(expected.iter()) {
                approx::assert_abs_diff_eq!(*g, *e, epsilon = 1e-9);
            }
        }
    }
}

#[test]
fn window_length_follows_margins() {
    let rec = common::recording(145.0, 145 * 30, &[(10.0, "Scrambled"), (20.0, "Scrambled")], |_, _| 0.0);
    for (pre, post) in [(0.1, 0.1), (0.2, 0.55), (0.5, 0.5), (1.5, 1.5), (0.013, 0.77)] {
        let agg = window_aggregates(
            std::slice::from_ref(&rec),
            &request(pre, post, &[EventType::Scrambled]),
            &common::eeg_groups(),
            &common::meg_groups(),
        )
        .unwrap();
        let n = ((pre + post) * 145.0_f64).round() as usize + 1;
        assert_eq!(agg.window_len, n, "pre={pre} post={post}");
        for (_, ga) in agg.eeg.iter().chain(agg.meg.iter()) {
            assert_eq!(ga.mean.len(), n);
        }
    }
}

#[test]
fn no_matching_event_is_an_empty_selection() {
    let err = window_aggregates(
        &[two_event_run()],
        &request(0.1, 0.1, &[EventType::Scrambled, EventType::Unfamiliar]),
        &common::eeg_groups(),
        &common::meg_groups(),
    )
    .unwrap_err();
    assert_eq!(kind_of(&err), Some(&ExplorerError::EmptySelection));

    let err = window_aggregates(&[two_event_run()], &request(0.1, 0.1, &[]), &common::eeg_groups(), &common::meg_groups())
        .unwrap_err();
    assert_eq!(kind_of(&err), Some(&ExplorerError::EmptySelection));
}

#[test]
fn windows_past_the_edges_are_dropped() {
    // Events 0.05 s from either end cannot hold a 0.1 s margin.
    let rec = common::recording(
        100.0,
        1000,
        &[(0.05, "Famous"), (5.0, "Famous"), (9.95, "Famous")],
        |_, _| 1e-6,
    );
    let agg = window_aggregates(&[rec], &request(0.1, 0.1, &[EventType::Famous]), &common::eeg_groups(), &common::meg_groups())
        .unwrap();
    assert_eq!(agg.n_windows, 1);
}

#[test]
fn windows_overlapping_bad_annotations_are_dropped() {
    let mut rec = two_event_run();
    rec.annotations.push(14.5, 1.0, "BAD_ACQ_SKIP");
    let req = request(0.1, 0.1, &[EventType::Famous]);
    let agg = window_aggregates(&[rec.clone()], &req, &common::eeg_groups(), &common::meg_groups())
        .unwrap();
    assert_eq!(agg.n_windows, 1);
    assert_eq!(agg.per_run, vec![1]);
    // Only the event at 5 s survives, on the 1-unit level.
    for &v in agg.eeg.get(AnatomicalGroup::Frontal).unwrap().mean.iter() {
        approx::assert_abs_diff_eq!(v, 1.0, epsilon = 1e-9);
    }

    // A span ending exactly where a window starts does not touch it.
    let mut clear = two_event_run();
    clear.annotations.push(14.4, 0.5, "bad_blink");
    let agg = window_aggregates(&[clear], &req, &common::eeg_groups(), &common::meg_groups()).unwrap();
    assert_eq!(agg.n_windows, 2);

    rec.annotations.push(4.95, 0.0, "BAD_marker");
    let err = window_aggregates(&[rec], &req, &common::eeg_groups(), &common::meg_groups()).unwrap_err();
    assert_eq!(kind_of(&err), Some(&ExplorerError::EmptySelection));
}

#[test]
fn mixed_sampling_rates_are_rejected() {
    let a = common::recording(100.0, 1000, &[(5.0, "Famous")], |_, _| 0.0);
    let b = common::recording(200.0, 2000, &[(5.0, "Famous")], |_, _| 0.0);
    let err = window_aggregates(&[a, b], &request(0.1, 0.1, &[EventType::Famous]), &common::eeg_groups(), &common::meg_groups())
        .unwrap_err();
    assert!(matches!(kind_of(&err), Some(ExplorerError::SamplingRateMismatch { .. })));
}

#[test]
fn margins_outside_safety_bound_are_parameter_errors() {
    for (pre, post) in [(1.6, 0.5), (0.5, 1.51), (-0.1, 0.5), (0.0, 0.2)] {
        let err = WindowMargins::new(pre, post).unwrap_err();
        assert!(matches!(kind_of(&err), Some(ExplorerError::Parameter(_))), "pre={pre} post={post}");
    }
    let m = WindowMargins::from_tmin_tmax(-1.5, 1.5).unwrap();
    assert_eq!(m.window_len(100.0), 301);
}
