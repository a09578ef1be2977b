//! Production serving phase
//!
//! port allocation -> certificate provisioning -> HTTPS server over the
//! build output. Assumes `build` already ran.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use colored::Colorize;

use crate::config::ProjectConfig;
use crate::error::PhaseError;
use crate::phase::{Phase, PhaseResult, PhaseState, PhaseTracker};
use crate::process::ProcessRunner;
use crate::server::{allocate_port_on, host_address, serve_https, StaticSite};
use crate::tls::{ensure_certificates, CertificateBundle};
use crate::utils::to_target_path;

/// Resolved address, certificates and content for the production server
#[derive(Debug, Clone)]
pub struct StartPlan {
    pub addr: SocketAddr,
    pub certs: CertificateBundle,
    pub site: StaticSite,
}

/// Run the start phase; returns only if setup fails or the server stops
pub async fn run(config: &ProjectConfig, runner: &dyn ProcessRunner) -> PhaseResult {
    let mut tracker = PhaseTracker::new(Phase::Start);

    let plan = match prepare(config, runner, host_address(), &mut tracker) {
        Ok(plan) => plan,
        Err(e) => return tracker.fail(e),
    };

    tracker.enter(PhaseState::Listening);
    eprintln!(
        "{} Production server running at {}\n",
        "→".blue(),
        format!("https://{}", plan.addr).cyan().underline()
    );

    match serve_https(plan.addr, plan.site.router(), &plan.certs).await {
        Ok(()) => tracker.finish(PhaseState::Done),
        Err(e) => tracker.fail(PhaseError::Serve(e)),
    }
}

/// Pick a port on `host` and provision certificates into the output directory
pub fn prepare(
    config: &ProjectConfig,
    runner: &dyn ProcessRunner,
    host: IpAddr,
    tracker: &mut PhaseTracker,
) -> Result<StartPlan, PhaseError> {
    tracker.enter(PhaseState::AllocatingPort);
    let port = allocate_port_on(host, config.toolchain.base_port)?;

    tracker.enter(PhaseState::ProvisioningCertificates);
    let dist = config.output_path();
    let certs = ensure_certificates(&dist, &config.toolchain, runner)?;

    Ok(StartPlan {
        addr: SocketAddr::new(host, port),
        certs,
        site: StaticSite::new(&dist, built_entry_path(config)).hiding("ssl"),
    })
}

/// Where `build` put the transpiled entry point
pub fn built_entry_path(config: &ProjectConfig) -> PathBuf {
    let entry = config.entry_path();
    let source = config.source_path();
    let relative = entry
        .strip_prefix(&source)
        .map(PathBuf::from)
        .unwrap_or_else(|_| entry.file_name().map(PathBuf::from).unwrap_or_default());
    config.output_path().join(to_target_path(&relative))
}
