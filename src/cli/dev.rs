//! Development phase
//!
//! transpiler check -> batch transpile of the entry file -> HTTP server

use std::net::{Ipv4Addr, SocketAddr};

use colored::Colorize;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::config::ProjectConfig;
use crate::error::PhaseError;
use crate::install::{ensure_installed, tool_program};
use crate::phase::{Phase, PhaseResult, PhaseState, PhaseTracker};
use crate::process::ProcessRunner;
use crate::server::{serve_http, StaticSite};
use crate::transpile::{convert_to_typescript, dev_output_path, transpile_one};

/// Everything the dev server needs once transpilation succeeded
#[derive(Debug, Clone)]
pub struct DevPlan {
    pub addr: SocketAddr,
    pub site: StaticSite,
}

/// Run the dev phase; returns only if setup fails or the server stops
pub async fn run(config: &ProjectConfig, runner: &dyn ProcessRunner) -> PhaseResult {
    let mut tracker = PhaseTracker::new(Phase::Dev);

    let plan = match prepare(config, runner, &mut tracker).await {
        Ok(plan) => plan,
        Err(e) => return tracker.fail(e),
    };

    tracker.enter(PhaseState::Listening);
    eprintln!(
        "{} Development server running at {}\n",
        "→".blue(),
        format!("http://localhost:{}", plan.addr.port()).cyan().underline()
    );
    eprintln!("  {} Press {} to stop\n", "•".dimmed(), "Ctrl+C".yellow());

    let app = plan.site.router().layer(CorsLayer::permissive());
    match serve_http(plan.addr, app).await {
        Ok(()) => tracker.finish(PhaseState::Done),
        Err(e) => tracker.fail(PhaseError::Serve(e)),
    }
}

/// Install the transpiler if needed and transpile the entry file
pub async fn prepare(
    config: &ProjectConfig,
    runner: &dyn ProcessRunner,
    tracker: &mut PhaseTracker,
) -> Result<DevPlan, PhaseError> {
    let transpiler = &config.toolchain.transpiler;

    tracker.enter(PhaseState::ToolCheck);
    ensure_installed(config, transpiler, runner).await?;

    tracker.enter(PhaseState::Transpiling);
    let program = tool_program(config, transpiler);
    let result = transpile_one(config, &program, runner).await;
    if !result.is_success() {
        return Err(PhaseError::TranspileFailure {
            file: config.entry_path(),
            cause: result,
        });
    }

    if config.wants_typescript() {
        let converted = convert_to_typescript(config, runner).await;
        if converted.is_success() {
            info!("Conversion to TypeScript successful");
        } else {
            warn!("Conversion to TypeScript failed: {}", converted);
        }
    }

    Ok(DevPlan {
        addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, config.dev_port)),
        site: StaticSite::new(config.dev_target_path(), dev_output_path(config)),
    })
}
