//! Domain Sweep CLI Application
//!
//! Two independent phases, one per invocation:
//!
//! - `prepare` recreates the candidate store and fills it with every label
//! - `detect` / `redetect` page through the store and query the check API
//!
//! `dump` writes the prepare phase out as SQL scripts instead.

mod logging;
mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, ValueEnum};
use domain_sweep_lib::{
    export_scripts, load_env_config, prepare_candidates, Alphabet, CandidateStore,
    CheckApiClient, ConfigManager, DetectMode, Detector, DomainSweepError, SweepConfig,
    DEFAULT_SUFFIX,
};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;
use tracing::{error, info, warn};

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

const AFTER_HELP: &str = "\
Modes:
  prepare   recreate the database and prepare domains to detect
  detect    check every domain that has not been detected yet
  redetect  check every domain again, overwriting earlier results
  dump      write c-<n>.sql insert scripts instead of touching the database

Settings are read from ./domain-sweep.toml, ~/.domain-sweep.toml and DS_* variables.";

/// CLI arguments for domain-sweep
#[derive(Parser, Debug)]
#[command(name = "domain-sweep")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Enumerate short .com names and record their availability")]
#[command(after_help = AFTER_HELP)]
#[command(styles = STYLES)]
pub struct Args {
    /// What to run
    #[arg(value_enum, value_name = "MODE")]
    pub mode: Mode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Recreate the database and prepare domains to detect
    Prepare,
    /// Detect domains that have no status yet
    Detect,
    /// Detect every domain again
    Redetect,
    /// Write SQL insert scripts for the candidate set
    Dump,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    let _ = e.print();
                }
                _ => print_usage(),
            }
            // Bad or missing mode is not an error exit.
            return;
        }
    };

    let loaded = match load_config() {
        Ok(loaded) => loaded,
        Err(e) => {
            ui::print_error(&e.to_string());
            process::exit(1);
        }
    };
    let config = loaded.config;

    if let Err(e) = logging::init(&config.log_file) {
        ui::print_error(&e);
    }
    info!(mode = ?args.mode, version = env!("CARGO_PKG_VERSION"), "domain-sweep starting");
    for path in &loaded.files {
        info!(path = %path.display(), "loaded config file");
    }
    for warning in &loaded.warnings {
        warn!("{}", warning);
    }

    if let Err(e) = run(args.mode, &config).await {
        error!(error = %e, "run aborted");
        ui::print_error(&e.to_string());
        if e.is_fatal() {
            process::exit(1);
        }
    }
}

fn print_usage() {
    let mut cmd = Args::command();
    let _ = cmd.print_help();
}

/// Resolved settings plus what happened while resolving them.
struct LoadedConfig {
    config: SweepConfig,
    files: Vec<PathBuf>,
    warnings: Vec<String>,
}

/// Resolve settings from config files and `DS_*` variables.
fn load_config() -> Result<LoadedConfig, DomainSweepError> {
    let mut manager = ConfigManager::new();
    let file_config = manager.discover_and_load()?;
    let env_config = load_env_config();

    let config = SweepConfig::resolve(&file_config, &env_config)?;

    Ok(LoadedConfig {
        config,
        files: manager.loaded_files,
        warnings: env_config.warnings,
    })
}

async fn run(mode: Mode, config: &SweepConfig) -> Result<(), DomainSweepError> {
    match mode {
        Mode::Prepare => run_prepare(config),
        Mode::Detect => run_detect(config, DetectMode::Initial).await,
        Mode::Redetect => run_detect(config, DetectMode::Redetect).await,
        Mode::Dump => run_dump(config),
    }
}

fn run_prepare(config: &SweepConfig) -> Result<(), DomainSweepError> {
    let alphabet = Alphabet::alphanumeric();
    let estimate = domain_sweep_lib::generate::estimate_range_count(&alphabet, config.lengths());
    ui::print_header(
        "Preparing",
        &format!(
            "lengths {}-{} ({} candidates) into {}",
            config.min_length,
            config.max_length,
            estimate,
            config.db_path.display()
        ),
    );

    let start = Instant::now();
    let mut store = CandidateStore::open(&config.db_path)?;
    let prepared = prepare_candidates(&mut store, &alphabet, config.lengths(), DEFAULT_SUFFIX)?;

    ui::print_prepare_summary(&prepared, start.elapsed());
    Ok(())
}

async fn run_detect(config: &SweepConfig, mode: DetectMode) -> Result<(), DomainSweepError> {
    ui::print_header(
        "Detecting",
        &format!("{} via {}", config.db_path.display(), config.endpoint),
    );

    let start = Instant::now();
    let store = CandidateStore::open(&config.db_path)?;
    let client = CheckApiClient::with_config(&config.endpoint, &config.token, config.timeout)?;

    let summary = Detector::new(&store, client).run(mode).await?;

    let counts = match store.count_by_status() {
        Ok(counts) => Some(counts),
        Err(e) => {
            warn!(error = %e, "could not count rows by status");
            None
        }
    };
    ui::print_detect_summary(mode, &summary, counts, start.elapsed());
    Ok(())
}

fn run_dump(config: &SweepConfig) -> Result<(), DomainSweepError> {
    ui::print_header(
        "Writing",
        &format!(
            "insert scripts for lengths {}-{}",
            config.min_length, config.max_length
        ),
    );

    let start = Instant::now();
    let scripts = export_scripts(
        Path::new("."),
        &Alphabet::alphanumeric(),
        config.lengths(),
        DEFAULT_SUFFIX,
    )?;

    ui::print_dump_summary(&scripts, start.elapsed());
    Ok(())
}
