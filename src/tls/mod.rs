//! Self-signed certificate provisioning for the production server

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::Toolchain;
use crate::error::PhaseError;
use crate::process::{Invocation, ProcessRunner};

/// Key and certificate written by [`ensure_certificates`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateBundle {
    pub key_path: PathBuf,
    pub cert_path: PathBuf,
}

impl CertificateBundle {
    /// Locations inside `<dist_dir>/ssl`
    pub fn in_dir(dist_dir: &Path) -> Self {
        let ssl_dir = dist_dir.join("ssl");
        Self {
            key_path: ssl_dir.join("server.key"),
            cert_path: ssl_dir.join("server.cert"),
        }
    }

    fn is_present(&self) -> bool {
        self.key_path.is_file() && self.cert_path.is_file()
    }
}

/// Generate a fresh self-signed key/certificate pair under `<dist_dir>/ssl`.
///
/// The pair is regenerated on every call. Fails if `ssl` exists but is not a
/// directory, if the tool fails, or if either file is missing afterwards.
pub fn ensure_certificates(
    dist_dir: &Path,
    toolchain: &Toolchain,
    runner: &dyn ProcessRunner,
) -> Result<CertificateBundle, PhaseError> {
    let ssl_dir = dist_dir.join("ssl");
    if ssl_dir.exists() && !ssl_dir.is_dir() {
        return Err(PhaseError::CertificateGenerationFailure(format!(
            "{} exists but is not a directory",
            ssl_dir.display()
        )));
    }
    fs::create_dir_all(&ssl_dir).map_err(|e| {
        PhaseError::CertificateGenerationFailure(format!("creating {}: {}", ssl_dir.display(), e))
    })?;

    let bundle = CertificateBundle::in_dir(dist_dir);
    let invocation = Invocation::new(&toolchain.cert_tool)
        .args(["req", "-nodes", "-new", "-x509", "-keyout"])
        .arg(bundle.key_path.to_string_lossy())
        .arg("-out")
        .arg(bundle.cert_path.to_string_lossy())
        .arg("-days")
        .arg(toolchain.cert_days.to_string())
        .arg("-subj")
        .arg(&toolchain.cert_subject);

    let result = runner.run_blocking(&invocation);
    if !result.is_success() {
        return Err(PhaseError::CertificateGenerationFailure(result.to_string()));
    }
    if !bundle.is_present() {
        return Err(PhaseError::CertificateGenerationFailure(format!(
            "{} did not produce both {} and {}",
            toolchain.cert_tool,
            bundle.key_path.display(),
            bundle.cert_path.display()
        )));
    }

    info!("SSL certificates generated in {}", ssl_dir.display());
    Ok(bundle)
}
