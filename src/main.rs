//! pyweb - lifecycle orchestrator for Python-to-web projects
//!
//! Drives three phases over a Transcrypt-based toolchain:
//! - `dev`: transpile the entry file and serve it locally
//! - `build`: transpile the whole source tree, copy assets, minify
//! - `start`: serve the build output over HTTPS on the first free port

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use pyweb_lib::Cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the logging/tracing system
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("pyweb=debug,pyweb_lib=debug,tower_http=debug"))
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("pyweb=info,pyweb_lib=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    cli.execute().await
}
