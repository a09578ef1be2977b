//! Command-line interface for pyweb
//!
//! A single positional argument selects the phase:
//! - `dev`: transpile the entry file and serve it
//! - `build`: production build into the output directory
//! - `start`: serve the build output over HTTPS

pub mod build;
pub mod dev;
pub mod start;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use tracing::{error, info, warn};

use crate::config::{self, ConfigDiagnostic};
use crate::phase::{Phase, PhaseResult};
use crate::process::SystemRunner;

/// pyweb - build and serve Python web projects
#[derive(Parser, Debug)]
#[command(name = "pyweb")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Phase to run: dev, build or start
    pub phase: String,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Project directory containing python.config.json
    #[arg(short = 'C', long, default_value = ".", env = "PYWEB_PROJECT_DIR")]
    pub project_dir: PathBuf,
}

impl Cli {
    /// Execute the selected phase
    pub async fn execute(&self) -> Result<ExitCode> {
        print_banner();

        let phase: Phase = match self.phase.parse() {
            Ok(phase) => phase,
            Err(other) => {
                error!("Invalid script: {}", other);
                return Ok(ExitCode::SUCCESS);
            }
        };

        let root = std::path::absolute(&self.project_dir)
            .with_context(|| format!("Invalid project directory: {}", self.project_dir.display()))?;
        let resolved = config::resolve(&root);
        if let ConfigDiagnostic::Loaded { path, .. } = &resolved.diagnostic {
            info!("Loaded configuration from {}", path.display());
        }
        if resolved.diagnostic.is_degraded() {
            warn!("Configuration ignored, continuing with defaults");
        }

        let config = &resolved.config;
        let runner = SystemRunner;
        let result = match phase {
            Phase::Dev => dev::run(config, &runner).await,
            Phase::Build => build::run(config, &runner).await,
            Phase::Start => start::run(config, &runner).await,
        };

        Ok(report(&result))
    }
}

/// Log the final outcome of a phase and map it to an exit status
fn report(result: &PhaseResult) -> ExitCode {
    match result.cause() {
        None => {
            info!("{} finished", result.phase);
            ExitCode::SUCCESS
        }
        Some(cause) => {
            error!("{} failed during {:?}: {}", result.phase, result.reached, cause);
            eprintln!(
                "\n{} {} failed: {}\n",
                "✗".red().bold(),
                result.phase.to_string().bold(),
                cause
            );
            ExitCode::FAILURE
        }
    }
}

/// Print the pyweb banner
fn print_banner() {
    eprintln!(
        "\n{} {} {}\n",
        "⚡".cyan(),
        "pyweb".bold().cyan(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
}
