//! Production build phase
//!
//! dependencies -> transpile (fail-fast) -> bundle -> minify (best-effort)

use std::time::Instant;

use colored::Colorize;
use tracing::{info, warn};

use crate::bundler::{bundle, minify_all};
use crate::config::ProjectConfig;
use crate::error::PhaseError;
use crate::install::{install_dependencies, tool_program};
use crate::phase::{Phase, PhaseResult, PhaseState, PhaseTracker};
use crate::process::ProcessRunner;
use crate::transpile::transpile_all;
use crate::utils::{display_path, format_duration};

/// What a successful build produced
#[derive(Debug, Default)]
pub struct BuildSummary {
    pub transpiled: usize,
    pub copied: usize,
    pub minified: usize,
    pub minify_failures: usize,
}

/// Run the build phase to completion
pub async fn run(config: &ProjectConfig, runner: &dyn ProcessRunner) -> PhaseResult {
    let start = Instant::now();
    let mut tracker = PhaseTracker::new(Phase::Build);

    eprintln!("{} Building production files...", "→".blue());

    match execute(config, runner, &mut tracker).await {
        Ok(summary) => {
            print_summary(config, &summary, start);
            tracker.finish(PhaseState::Done)
        }
        Err(e) => tracker.fail(e),
    }
}

async fn execute(
    config: &ProjectConfig,
    runner: &dyn ProcessRunner,
    tracker: &mut PhaseTracker,
) -> Result<BuildSummary, PhaseError> {
    tracker.enter(PhaseState::InstallingDependencies);
    install_dependencies(config, runner).await?;

    tracker.enter(PhaseState::Transpiling);
    let transpiler = tool_program(config, &config.toolchain.transpiler);
    let outcome = transpile_all(config, &transpiler, runner).await;
    if !outcome.succeeded {
        return Err(PhaseError::TranspileFailure {
            file: outcome.failed_file.unwrap_or_else(|| config.source_path()),
            cause: outcome.cause.unwrap_or_default(),
        });
    }

    tracker.enter(PhaseState::Bundling);
    let copied = bundle(config)?;
    info!("Bundled {} asset(s) into {}", copied, config.output_directory.display());

    tracker.enter(PhaseState::Minifying);
    let report = minify_all(
        &config.output_path(),
        &config.build_exclusions(),
        &config.toolchain.minifier,
        runner,
    );
    if !report.failed.is_empty() {
        warn!("{} file(s) could not be minified", report.failed.len());
    }

    Ok(BuildSummary {
        transpiled: outcome.outputs.len(),
        copied,
        minified: report.minified.len(),
        minify_failures: report.failed.len(),
    })
}

fn print_summary(config: &ProjectConfig, summary: &BuildSummary, start: Instant) {
    eprintln!(
        "\n{} Production files built in {} ({})\n",
        "✓".green().bold(),
        display_path(&config.root, &config.output_path()).cyan(),
        format_duration(start.elapsed()).dimmed()
    );
    eprintln!("  {} {} transpiled", "•".dimmed(), summary.transpiled);
    eprintln!("  {} {} copied", "•".dimmed(), summary.copied);
    eprintln!("  {} {} minified", "•".dimmed(), summary.minified);
    if summary.minify_failures > 0 {
        eprintln!(
            "  {} {}",
            "•".dimmed(),
            format!("{} not minified", summary.minify_failures).yellow()
        );
    }
    eprintln!();
}
