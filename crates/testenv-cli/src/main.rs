use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use testenv_env::{default_env_prefix, EnvLayout};
use testenv_runner::run_env_tests;
use tracing_subscriber::EnvFilter;

mod config;
mod render;

use config::TestenvConfig;
use render::TerminalRenderer;

const LOG_ENV: &str = "CONDA_TESTENV_LOG";
const CONFIG_ENV: &str = "CONDA_TESTENV_CONFIG";

#[derive(Parser, Debug)]
#[command(name = "conda-testenv")]
#[command(
    about = "Re-run the bundled recipe tests of every package in a conda environment",
    long_about = None
)]
struct Cli {
    /// Environment to test; defaults to the active environment.
    #[arg(short = 'p', long = "prefix")]
    prefix: Option<PathBuf>,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing();

    let mut config = match std::env::var_os(CONFIG_ENV).filter(|path| !path.is_empty()) {
        Some(path) => TestenvConfig::load(&PathBuf::from(path))?,
        None => TestenvConfig::default(),
    };
    config.apply_env_overrides(
        std::env::var("CONDA_PY").ok(),
        std::env::var("CONDA_NPY").ok(),
    );

    let prefix = match cli.prefix {
        Some(prefix) => prefix,
        None => default_env_prefix()?,
    };
    let layout = EnvLayout::new(prefix);

    let renderer = TerminalRenderer::current();
    let report = run_env_tests(&layout, &config.options, &mut |event| {
        renderer.print_event(event)
    })
    .context("cannot test environment")?;

    Ok(ExitCode::from(config.exit_policy.exit_code(&report)))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
