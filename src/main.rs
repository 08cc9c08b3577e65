//! CLI entry point: aggregates per-wing glide-angle statistics for a work directory.

use anyhow::Result;
use clap::Parser;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use wing_stats::aggregate::DegeneratePolicy;
use wing_stats::pipeline::{RunConfig, RunOutcome, StdinConfirm, run};
use wing_stats::progress::LogProgress;

#[derive(Parser)]
#[command(name = "wing_stats")]
#[command(
    about = "Computes per-wing glide angle statistics from analysed flights",
    long_about = None
)]
struct Cli {
    /// Directory holding flights_analysed.json; flights_stats.dat is written next to it
    #[arg(value_name = "WORKDIR")]
    workdir: PathBuf,

    /// Overwrite an existing flights_stats.dat without asking
    #[arg(short = 'y', long, default_value_t = false)]
    yes: bool,

    /// What to do with wings whose statistics are undefined: fail, nan or skip
    #[arg(long, value_name = "POLICY", default_value = "fail")]
    on_degenerate: DegeneratePolicy,

    /// Gzip compress the stats file
    #[arg(long, default_value_t = false)]
    gzip: bool,

    /// Optional: also write a CSV summary to this path
    #[arg(long, value_name = "PATH")]
    summary_csv: Option<PathBuf>,
}

impl Cli {
    fn into_config(self) -> RunConfig {
        RunConfig {
            assume_yes: self.yes,
            policy: self.on_degenerate,
            gzip: self.gzip,
            summary_csv: self.summary_csv,
            ..RunConfig::from_workdir(&self.workdir)
        }
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/wing_stats.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("wing_stats.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let config = Cli::parse().into_config();

    let outcome = run(&config, &mut StdinConfirm, &mut LogProgress::default())
        .inspect_err(|e| error!(error = %e, "Wing statistics failed"))?;

    match outcome {
        RunOutcome::Declined => info!("Output left untouched"),
        RunOutcome::Written { wings, flights } => {
            info!(wings, flights, outfile = %config.outfile.display(), "Done")
        }
    }

    Ok(())
}
