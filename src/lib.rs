//! pyweb library
//!
//! Lifecycle orchestration for Python-to-web projects: configuration,
//! external tool invocation, transpilation, bundling, certificates and
//! serving, composed into the `dev`, `build` and `start` phases.

pub mod bundler;
pub mod cli;
pub mod config;
pub mod error;
pub mod install;
pub mod phase;
pub mod process;
pub mod server;
pub mod tls;
pub mod transpile;
pub mod utils;

pub use cli::Cli;
pub use config::ProjectConfig;
pub use error::PhaseError;
pub use phase::{Phase, PhaseResult};
