//! Welch power spectral density.
//!
//! Reproduces `scipy.signal.welch(x, fs)` with its defaults, row by row:
//!
//! * periodic Hann window, `nperseg = min(256, n)`, `noverlap = nperseg / 2`
//! * constant detrend of every segment
//! * one-sided density scaling `1 / (fs · Σw²)`, every bin except DC (and
//!   Nyquist, for even `nperseg`) doubled
//! * periodograms averaged over the `(n − noverlap) / (nperseg − noverlap)`
//!   segments
use std::f64::consts::PI;
use anyhow::Result;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rustfft::{num_complex::Complex, FftPlanner};

use crate::error::ExplorerError;

/// Default segment length.
pub const NPERSEG: usize = 256;

/// One-sided PSD, one row per input row.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    /// Hz, `k · fs / nperseg`.
    pub freqs: Array1<f64>,
    /// `[n_rows, n_freqs]`, unit²/Hz.
    pub power: Array2<f64>,
}

impl Spectrum {
    pub fn n_freqs(&self) -> usize {
        self.freqs.len()
    }

    pub fn n_rows(&self) -> usize {
        self.power.nrows()
    }
}

/// Periodic Hann window (`scipy.signal.get_window("hann", n)`).
fn hann_periodic(n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![1.0];
    }
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / n as f64).cos())
        .collect()
}

/// Welch PSD of each row of `data` (`[rows, n]`) sampled at `sfreq`.
pub fn welch(data: ArrayView2<f64>, sfreq: f64) -> Result<Spectrum> {
    let n = data.ncols();
    if n == 0 {
        return Err(ExplorerError::Parameter("Welch estimate of an empty signal".into()).into());
    }
    if !(sfreq.is_finite() && sfreq > 0.0) {
        return Err(ExplorerError::Parameter(format!("sampling rate {sfreq} Hz")).into());
    }

    let nperseg = NPERSEG.min(n);
    let noverlap = nperseg / 2;
    let step = nperseg - noverlap;
    let n_seg = (n - noverlap) / step;
    let n_freqs = nperseg / 2 + 1;

    let window = hann_periodic(nperseg);
    let scale = 1.0 / (sfreq * window.iter().map(|w| w * w).sum::<f64>());

    let mut planner: FftPlanner<f64> = FftPlanner::new();
    let fft = planner.plan_fft_forward(nperseg);
    let mut buf = vec![Complex::<f64>::default(); nperseg];

    let mut power = Array2::<f64>::zeros((data.nrows(), n_freqs));
    for (row, mut out) in data.axis_iter(Axis(0)).zip(power.axis_iter_mut(Axis(0))) {
        for seg in 0..n_seg {
            let start = seg * step;
            fill_segment(&mut buf, row.slice(ndarray::s![start..start + nperseg]), &window);
            fft.process(&mut buf);
            for (acc, c) in out.iter_mut().zip(&buf) {
                *acc += c.norm_sqr();
            }
        }

        let last_doubled = if nperseg % 2 == 0 { n_freqs - 1 } else { n_freqs };
        for (k, p) in out.iter_mut().enumerate() {
            let fold = if k > 0 && k < last_doubled { 2.0 } else { 1.0 };
            *p *= fold * scale / n_seg as f64;
        }
    }

    let freqs = Array1::from_shape_fn(n_freqs, |k| k as f64 * sfreq / nperseg as f64);
    Ok(Spectrum { freqs, power })
}

/// Detrended, windowed copy of `segment` into `buf`.
fn fill_segment(buf: &mut [Complex<f64>], segment: ArrayView1<f64>, window: &[f64]) {
    let mean = segment.mean().unwrap_or(0.0);
    for ((b, &x), &w) in buf.iter_mut().zip(segment.iter()).zip(window) {
        *b = Complex { re: (x - mean) * w, im: 0.0 };
    }
}
