use cardtrace::{
    clock::{Clock, ManualClock, SystemClock},
    collector::{JsonLinesSink, MemorySink, ReportCollector},
    config::{Config, ConfigStore, FileConfigStore},
    demo::{InstrumentedGame, MemoryGame},
    error_filter::ErrorFilter,
    hooks::{AnalyticsObserver, Interceptor},
    runtime::{Runner, ScriptSource},
    session::Session,
    tracker::LevelTracker,
};
use clap::Parser;
use itertools::Itertools;
use std::{error::Error, path::PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// replay card-matching gameplay through the analytics hooks
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Replays a scripted card-matching session through the analytics hooks and writes the submitted reports as JSON lines."
)]
pub struct Cli {
    /// gameplay script to replay (JSON array of steps)
    #[clap(short = 's', long)]
    script: PathBuf,

    /// config file to use instead of the platform default
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,

    /// application id reported to analytics
    #[clap(long)]
    app_id: Option<String>,

    /// directory that receives <session_id>.jsonl report files
    #[clap(long)]
    report_dir: Option<PathBuf>,

    /// also print every submitted report to stdout as pretty JSON
    #[clap(long)]
    print: bool,
}

impl Cli {
    fn apply_overrides(&self, mut config: Config) -> Config {
        if let Some(app_id) = &self.app_id {
            config.app_id = app_id.clone();
        }
        if let Some(dir) = &self.report_dir {
            config.report_dir = Some(dir.clone());
        }
        config
    }
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli, config: &Config) -> Result<(), Box<dyn Error>> {
    let source = ScriptSource::from_path(&cli.script)?;
    let session = Session::new(config.app_id.clone());
    let report_dir = config.report_dir();
    let file_sink = JsonLinesSink::new(&report_dir);
    let report_path = file_sink.path_for(session.id().as_str());
    let memory = MemorySink::new();

    let clock = ManualClock::new(SystemClock.now());
    let tracker = LevelTracker::new().shared();
    let mut observer = AnalyticsObserver::new(
        ReportCollector::new((file_sink, memory.clone())),
        tracker.clone(),
        clock.clone(),
    )
    .with_level_ids(config.level_ids())
    .with_unknown_label(config.unknown_label.clone());
    if let Err(error) = observer.initialize(&session) {
        warn!(%error, "analytics initialization failed, replaying without it");
    }

    let mut interceptor = Interceptor::new();
    interceptor.register(observer);
    let mut game = InstrumentedGame::new(MemoryGame::new(), interceptor);

    info!(script = %cli.script.display(), steps = source.len(), "replay starting");
    let stats = Runner::new(source, clock).run(&mut game);

    let reports = memory.reports();
    info!(
        steps = stats.steps,
        levels = stats.levels_started,
        matches = stats.matches,
        reports = reports.len(),
        "replay finished"
    );
    if tracker.borrow().is_active() && stats.levels_started > stats.levels_ended {
        warn!(
            level_id = tracker.borrow().level_id().unwrap_or_default(),
            "last level never ended; its data was not submitted"
        );
    }
    if !reports.is_empty() {
        let levels = reports
            .iter()
            .flat_map(|r| r.levels.iter().map(|l| l.level_id.as_str()))
            .join(", ");
        info!(path = %report_path.display(), %levels, "reports written");
    }

    if cli.print {
        for report in &reports {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let store = match &cli.config {
        Some(path) => FileConfigStore::with_path(path),
        None => FileConfigStore::new(),
    };
    let config = match store.load() {
        Ok(config) => cli.apply_overrides(config),
        Err(e) => {
            init_tracing("info");
            return Err(e.into());
        }
    };
    init_tracing(&config.log_level);

    let filter = ErrorFilter::new(&config.suppress_keywords);
    run(&cli, &config).or_else(|e| filter.filter(e))
}
