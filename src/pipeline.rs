//! End-to-end run: pre-flight checks, aggregation and persistence.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{info, warn};

use crate::aggregate::{DegeneratePolicy, aggregate_wings};
use crate::error::PipelineError;
use crate::flight::load_flights;
use crate::output::{print_json, write_stats_file, write_summary_csv};
use crate::progress::Progress;

pub const INPUT_FILE_NAME: &str = "flights_analysed.json";
pub const OUTPUT_FILE_NAME: &str = "flights_stats.dat";

/// Everything a run needs. Paths are always explicit.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub infile: PathBuf,
    pub outfile: PathBuf,
    /// Overwrite an existing output without asking.
    pub assume_yes: bool,
    pub policy: DegeneratePolicy,
    pub gzip: bool,
    pub summary_csv: Option<PathBuf>,
}

impl RunConfig {
    /// `workdir/flights_analysed.json` in, `workdir/flights_stats.dat` out.
    pub fn from_workdir(workdir: impl AsRef<Path>) -> Self {
        let workdir = workdir.as_ref();
        RunConfig {
            infile: workdir.join(INPUT_FILE_NAME),
            outfile: workdir.join(OUTPUT_FILE_NAME),
            assume_yes: false,
            policy: DegeneratePolicy::default(),
            gzip: false,
            summary_csv: None,
        }
    }
}

/// Yes/no question asked before overwriting the output.
pub trait Confirm {
    /// Returns `true` only on an explicit yes.
    fn confirm(&mut self, question: &str) -> bool;
}

/// Asks on stderr, reads the answer from stdin. Defaults to no.
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&mut self, question: &str) -> bool {
        let mut stderr = std::io::stderr();
        let _ = write!(stderr, "{question} [y/N] ");
        let _ = stderr.flush();

        let mut answer = String::new();
        match std::io::stdin().lock().read_line(&mut answer) {
            Ok(_) => is_yes(&answer),
            Err(_) => false,
        }
    }
}

pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// How a run ended when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The output existed and the user chose to keep it.
    Declined,
    Written { wings: usize, flights: usize },
}

/// Runs the whole stage. Nothing is written unless aggregation succeeds.
///
/// # Errors
///
/// [`PipelineError`] for a missing input or output directory, otherwise any
/// load, statistics or write failure.
#[tracing::instrument(skip_all, fields(infile = %config.infile.display(), outfile = %config.outfile.display()))]
pub fn run(
    config: &RunConfig,
    confirm: &mut dyn Confirm,
    progress: &mut dyn Progress,
) -> Result<RunOutcome> {
    if !config.infile.exists() {
        return Err(PipelineError::MissingInputFile(config.infile.clone()).into());
    }

    if config.outfile.exists() && !config.assume_yes {
        let question = format!("{} already exists, overwrite?", config.outfile.display());
        if !confirm.confirm(&question) {
            info!("Keeping existing output");
            return Ok(RunOutcome::Declined);
        }
    }

    let out_dir = output_dir(&config.outfile);
    if !out_dir.is_dir() {
        return Err(PipelineError::InvalidOutputDirectory(out_dir.to_path_buf()).into());
    }

    info!("Loading flight file");
    let flights = load_flights(&config.infile)?;
    if flights.is_empty() {
        warn!("Flight file has no entries");
    }

    let table = aggregate_wings(&flights, config.policy, progress)?;
    print_json(&table)?;

    info!("Saving results");
    write_stats_file(&config.outfile, &table, config.gzip)?;
    if let Some(csv_path) = &config.summary_csv {
        write_summary_csv(csv_path, &table)?;
    }

    Ok(RunOutcome::Written {
        wings: table.len(),
        flights: flights.len() - flights.skipped(),
    })
}

/// Parent directory of `path`; a bare file name lives in the current directory.
fn output_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StatsError;
    use crate::output::read_stats_file;
    use crate::progress::NoProgress;
    use std::fs;

    /// Answers every question with a fixed value and counts the questions.
    struct Scripted {
        answer: bool,
        asked: usize,
    }

    impl Scripted {
        fn new(answer: bool) -> Self {
            Self { answer, asked: 0 }
        }
    }

    impl Confirm for Scripted {
        fn confirm(&mut self, _question: &str) -> bool {
            self.asked += 1;
            self.answer
        }
    }

    const FLIGHTS: &str = r#"{
        "1001": {"wing": 7, "glide_angles": [10, 12], "sampling": 2},
        "1002": {"wing": 7, "glide_angles": [11], "sampling": 1},
        "1003": null,
        "1004": {"wing": "3", "glide_angles": [8.0, 8.5, 9.0], "sampling": 0.5}
    }"#;

    fn workdir_with_input() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(INPUT_FILE_NAME), FLIGHTS).unwrap();
        dir
    }

    #[test]
    fn test_from_workdir_paths() {
        let c = RunConfig::from_workdir("/data/full");
        assert_eq!(c.infile, Path::new("/data/full/flights_analysed.json"));
        assert_eq!(c.outfile, Path::new("/data/full/flights_stats.dat"));
        assert_eq!(c.policy, DegeneratePolicy::Fail);
        assert!(!c.assume_yes);
    }

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes("\n"));
        assert!(!is_yes("n"));
        assert!(!is_yes(""));
    }

    #[test]
    fn test_missing_input_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = RunConfig::from_workdir(dir.path());

        let err = run(&config, &mut Scripted::new(true), &mut NoProgress).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::MissingInputFile(_))
        ));
        assert!(!config.outfile.exists());
    }

    #[test]
    fn test_writes_output() {
        let dir = workdir_with_input();
        let config = RunConfig::from_workdir(dir.path());

        let outcome = run(&config, &mut Scripted::new(false), &mut NoProgress).unwrap();

        assert_eq!(
            outcome,
            RunOutcome::Written {
                wings: 2,
                flights: 3
            }
        );
        let table = read_stats_file(&config.outfile).unwrap();
        assert_eq!(table.keys().copied().collect::<Vec<_>>(), vec![3, 7]);
        assert_eq!(table[&7].mean, 11.0);
    }

    #[test]
    fn test_declined_overwrite_keeps_file() {
        let dir = workdir_with_input();
        let config = RunConfig::from_workdir(dir.path());
        fs::write(&config.outfile, b"previous").unwrap();

        let mut confirm = Scripted::new(false);
        let outcome = run(&config, &mut confirm, &mut NoProgress).unwrap();

        assert_eq!(outcome, RunOutcome::Declined);
        assert_eq!(confirm.asked, 1);
        assert_eq!(fs::read(&config.outfile).unwrap(), b"previous");
    }

    #[test]
    fn test_accepted_overwrite_replaces_file() {
        let dir = workdir_with_input();
        let config = RunConfig::from_workdir(dir.path());
        fs::write(&config.outfile, b"previous").unwrap();

        let outcome = run(&config, &mut Scripted::new(true), &mut NoProgress).unwrap();

        assert!(matches!(outcome, RunOutcome::Written { .. }));
        assert_eq!(read_stats_file(&config.outfile).unwrap().len(), 2);
    }

    #[test]
    fn test_assume_yes_skips_prompt() {
        let dir = workdir_with_input();
        let mut config = RunConfig::from_workdir(dir.path());
        config.assume_yes = true;
        fs::write(&config.outfile, b"previous").unwrap();

        let mut confirm = Scripted::new(false);
        run(&config, &mut confirm, &mut NoProgress).unwrap();

        assert_eq!(confirm.asked, 0);
        assert_ne!(fs::read(&config.outfile).unwrap(), b"previous");
    }

    #[test]
    fn test_missing_output_directory() {
        let dir = workdir_with_input();
        let mut config = RunConfig::from_workdir(dir.path());
        config.outfile = dir.path().join("nowhere").join(OUTPUT_FILE_NAME);

        let err = run(&config, &mut Scripted::new(true), &mut NoProgress).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::InvalidOutputDirectory(_))
        ));
    }

    #[test]
    fn test_degenerate_wing_aborts_before_write() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(INPUT_FILE_NAME),
            r#"{"a": {"wing": 1, "glide_angles": [9.0], "sampling": 0}}"#,
        )
        .unwrap();
        let config = RunConfig::from_workdir(dir.path());

        let err = run(&config, &mut Scripted::new(true), &mut NoProgress).unwrap_err();

        assert_eq!(
            err.downcast_ref::<StatsError>(),
            Some(&StatsError::ZeroWeight { wing: 1 })
        );
        assert!(!config.outfile.exists());
    }

    #[test]
    fn test_summary_csv_is_written_on_request() {
        let dir = workdir_with_input();
        let mut config = RunConfig::from_workdir(dir.path());
        let csv_path = dir.path().join("summary.csv");
        config.summary_csv = Some(csv_path.clone());

        run(&config, &mut Scripted::new(true), &mut NoProgress).unwrap();

        let content = fs::read_to_string(csv_path).unwrap();
        assert_eq!(content.lines().count(), 3);
    }

    #[test]
    fn test_output_dir_of_bare_name() {
        assert_eq!(output_dir(Path::new("stats.dat")), Path::new("."));
        assert_eq!(output_dir(Path::new("a/stats.dat")), Path::new("a"));
    }
}
