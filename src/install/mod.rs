//! Tool and dependency installation gates
//!
//! Each gate makes exactly one install attempt. A failed install is returned
//! to the phase driver, which treats it as fatal.

use tracing::{debug, info};

use crate::config::ProjectConfig;
use crate::error::PhaseError;
use crate::process::{Invocation, ProcessRunner};

/// Ensure `tool` is present in the project's local bin directory, installing
/// it with the configured package manager if it is not.
pub async fn ensure_installed(
    config: &ProjectConfig,
    tool: &str,
    runner: &dyn ProcessRunner,
) -> Result<(), PhaseError> {
    let marker = config.local_tool_path(tool);
    if marker.exists() {
        debug!("{} found at {}", tool, marker.display());
        return Ok(());
    }

    info!("{} is not installed, installing with {}", tool, config.package_manager);
    let install = Invocation::new(&config.package_manager)
        .args(["install", tool])
        .current_dir(&config.root);

    let result = runner.run(&install).await;
    if result.is_success() {
        info!("{} installed", tool);
        Ok(())
    } else {
        Err(PhaseError::ToolMissingOrInstallFailed {
            tool: tool.to_string(),
            cause: result,
        })
    }
}

/// The program to invoke for `tool`: the locally installed copy when there
/// is one, otherwise the bare name looked up on `PATH`.
pub fn tool_program(config: &ProjectConfig, tool: &str) -> String {
    let local = config.local_tool_path(tool);
    if local.exists() {
        local.display().to_string()
    } else {
        tool.to_string()
    }
}

/// Install the project's Python dependencies with pip in a single invocation.
pub async fn install_dependencies(
    config: &ProjectConfig,
    runner: &dyn ProcessRunner,
) -> Result<(), PhaseError> {
    if config.dependencies.is_empty() {
        info!("No Python dependencies specified");
        return Ok(());
    }

    let python = select_python(config, runner).await;
    let install = Invocation::new(python)
        .args(["-m", "pip", "install"])
        .args(config.dependencies.iter().cloned())
        .current_dir(&config.root);

    let result = runner.run(&install).await;
    if result.is_success() {
        info!("Installed {} Python dependencies", config.dependencies.len());
        Ok(())
    } else {
        Err(PhaseError::DependencyInstallFailed { cause: result })
    }
}

/// Windows installs commonly expose only `python3`; prefer it when it answers.
async fn select_python(config: &ProjectConfig, runner: &dyn ProcessRunner) -> String {
    if cfg!(windows) {
        let probe = Invocation::new("python3").arg("--version");
        if runner.run(&probe).await.is_success() {
            return "python3".to_string();
        }
    }
    config.toolchain.python.clone()
}
