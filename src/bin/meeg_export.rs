use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use meeg::{
    write_run_aggregates, write_window_aggregates, Dataset, EventSelection, ExplorerConfig,
    Modality, Session, SubjectData,
};

#[derive(Parser)]
#[command(name = "meeg_export", about = "Export EEG/MEG group aggregates of one subject to safetensors")]
struct Args {
    /// Processed dataset root (holds subject_data.json)
    #[arg(long, default_value = "data/processed")]
    data_root: PathBuf,

    /// Subject number
    #[arg(long)]
    subject: u32,

    /// Runs to load (comma-separated)
    #[arg(long, value_delimiter = ',', default_value = "1,2,3,4,5,6")]
    runs: Vec<u32>,

    /// Seconds before each event (default: 0.5)
    #[arg(long, default_value_t = 0.5)]
    pre: f64,

    /// Seconds after each event (default: 0.5)
    #[arg(long, default_value_t = 0.5)]
    post: f64,

    /// Event ids to pool: 1 Famous, 2 Scrambled, 3 Unfamiliar (default: all)
    #[arg(long, value_delimiter = ',')]
    events: Vec<u8>,

    /// Also export the across-trial standard deviation
    #[arg(long)]
    with_std: bool,

    /// Run aggregates output path
    #[arg(long)]
    runs_out: Option<PathBuf>,

    /// Window aggregates output path
    #[arg(long)]
    windows_out: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let selection = if args.events.is_empty() {
        EventSelection::all()
    } else {
        EventSelection::from_ids(&args.events)?
    };
    let cfg = ExplorerConfig {
        data_root: args.data_root,
        pre: args.pre,
        post: args.post,
        selection,
        with_std: args.with_std,
        ..ExplorerConfig::default()
    };

    let dataset = Dataset::new(&cfg.data_root);
    let meta = SubjectData::load(dataset.subject_data_path())?;
    let eeg = meta.channel_group_membership(Modality::Eeg)?;
    let meg = meta.channel_group_membership(Modality::Meg)?;

    let mut session = Session::open(&dataset, args.subject, &args.runs, eeg, meg, cfg.window_request()?)
        .with_context(|| format!("subject {}", args.subject))?;
    println!("Loaded subject {} runs {:?}", args.subject, session.runs());

    if let Some(path) = &args.runs_out {
        write_run_aggregates(session.run_aggregates(), session.runs(), path)?;
        println!("Run aggregates → {}", path.display());
    }
    if let Some(path) = &args.windows_out {
        let agg = session.window_aggregates()?;
        println!("Pooled {} windows of {} samples", agg.n_windows, agg.window_len);
        write_window_aggregates(agg, path)?;
        println!("Window aggregates → {}", path.display());
    }

    Ok(())
}
