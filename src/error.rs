//! Fatal phase errors

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::process::ProcessResult;

/// A failure that aborts the phase it occurs in.
///
/// Minification failures and configuration problems are deliberately absent:
/// the former are reported per file, the latter degrade to defaults.
#[derive(Debug, Error)]
pub enum PhaseError {
    #[error("{tool} is not installed and installing it failed ({cause})")]
    ToolMissingOrInstallFailed { tool: String, cause: ProcessResult },

    #[error("installing Python dependencies failed ({cause})")]
    DependencyInstallFailed { cause: ProcessResult },

    #[error("transpiling {} failed ({cause})", .file.display())]
    TranspileFailure { file: PathBuf, cause: ProcessResult },

    #[error("bundling failed at {}: {source}", .path.display())]
    BundleCopyFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("generating TLS certificates failed: {0}")]
    CertificateGenerationFailure(String),

    #[error("no free port at or above {base}")]
    PortExhausted { base: u16 },

    #[error("server error: {0:#}")]
    Serve(anyhow::Error),
}

impl PhaseError {
    pub(crate) fn bundle(path: impl Into<PathBuf>, source: io::Error) -> Self {
        PhaseError::BundleCopyFailure {
            path: path.into(),
            source,
        }
    }
}
