//! Python-to-JavaScript transpilation
//!
//! Two forms: a batch run on the entry file for the dev server, and a full
//! fail-fast pass over the source tree for production builds. In both, a
//! zero exit code is not enough; the expected output file must exist.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::ProjectConfig;
use crate::process::{Invocation, ProcessResult, ProcessRunner};
use crate::utils::{display_path, is_source_file, to_target_path, walk_sorted};

/// Aggregate result of transpiling a source tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranspileOutcome {
    pub succeeded: bool,

    /// The first file that failed; nothing after it was attempted
    pub failed_file: Option<PathBuf>,

    pub cause: Option<ProcessResult>,

    /// Outputs written before success or failure
    pub outputs: Vec<PathBuf>,
}

impl TranspileOutcome {
    fn failure(file: PathBuf, cause: ProcessResult, outputs: Vec<PathBuf>) -> Self {
        Self {
            succeeded: false,
            failed_file: Some(file),
            cause: Some(cause),
            outputs,
        }
    }
}

/// Compiled script the dev server serves as its default document
pub fn dev_output_path(config: &ProjectConfig) -> PathBuf {
    let name = config
        .entry_point
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_default();
    config.dev_target_path().join(to_target_path(&name))
}

/// Transpile the entry file in batch mode, from the entry's own directory.
pub async fn transpile_one(
    config: &ProjectConfig,
    program: &str,
    runner: &dyn ProcessRunner,
) -> ProcessResult {
    let entry = config.entry_path();
    let Some(file_name) = entry.file_name() else {
        return ProcessResult::failed(format!("invalid entry point: {}", entry.display()));
    };
    let workdir = entry.parent().unwrap_or(config.root.as_path());

    let invocation = Invocation::new(program)
        .args(["-b", "-m"])
        .arg(file_name.to_string_lossy())
        .current_dir(workdir);

    let result = runner.run(&invocation).await;
    if !result.is_success() {
        return result;
    }

    let expected = dev_output_path(config);
    if expected.exists() {
        debug!("Transpiled {} -> {}", entry.display(), expected.display());
        result
    } else {
        missing_output(&expected)
    }
}

/// Transpile every source file under the source directory into the output
/// directory, mirroring its layout. Stops at the first failure.
pub async fn transpile_all(
    config: &ProjectConfig,
    program: &str,
    runner: &dyn ProcessRunner,
) -> TranspileOutcome {
    let source_dir = config.source_path();
    let output_dir = config.output_path();
    let excluded = config.build_exclusions();

    let mut outputs = Vec::new();

    for entry in walk_sorted(&source_dir, &excluded) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| source_dir.clone());
                return TranspileOutcome::failure(path, ProcessResult::failed(e.to_string()), outputs);
            }
        };
        if !entry.file_type().is_file() || !is_source_file(entry.path()) {
            continue;
        }

        let file = entry.path().to_path_buf();
        let relative = file.strip_prefix(&source_dir).unwrap_or(&file).to_path_buf();
        let output = output_dir.join(to_target_path(&relative));

        if let Some(parent) = output.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                return TranspileOutcome::failure(file, ProcessResult::failed(e.to_string()), outputs);
            }
        }

        let invocation = Invocation::new(program)
            .args(["-b", "-m"])
            .arg(relative.to_string_lossy())
            .arg("-o")
            .arg(output.to_string_lossy())
            .current_dir(&source_dir);

        let result = runner.run(&invocation).await;
        if !result.is_success() {
            return TranspileOutcome::failure(file, result, outputs);
        }
        if !output.exists() {
            return TranspileOutcome::failure(file, missing_output(&output), outputs);
        }

        info!("Transpiled {}", display_path(&config.root, &file));
        outputs.push(output);
    }

    TranspileOutcome {
        succeeded: true,
        failed_file: None,
        cause: None,
        outputs,
    }
}

/// Convert the dev output to TypeScript next to it.
pub async fn convert_to_typescript(
    config: &ProjectConfig,
    runner: &dyn ProcessRunner,
) -> ProcessResult {
    let js = dev_output_path(config);
    let ts = js.with_extension("ts");

    let invocation = Invocation::new(&config.toolchain.ts_converter)
        .arg(js.to_string_lossy())
        .arg(ts.to_string_lossy())
        .current_dir(&config.root);

    runner.run(&invocation).await
}

fn missing_output(expected: &Path) -> ProcessResult {
    ProcessResult::failed(format!("expected output {} was not produced", expected.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::fake::{mentions, program_name, FakeRunner};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn project(files: &[&str]) -> (TempDir, ProjectConfig) {
        let dir = TempDir::new().unwrap();
        for file in files {
            let path = dir.path().join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "print('hi')\n").unwrap();
        }
        let config = ProjectConfig::defaults_in(dir.path());
        (dir, config)
    }

    #[tokio::test]
    async fn test_all_files_transpiled_in_lexical_order() {
        let (_dir, config) = project(&["b.py", "a.py", "pkg/c.pyc", "static/logo.png"]);
        let runner = FakeRunner::new();

        let outcome = transpile_all(&config, "transcrypt", &runner).await;

        assert!(outcome.succeeded);
        let out = config.output_path();
        assert_eq!(
            outcome.outputs,
            vec![out.join("a.js"), out.join("b.js"), out.join("pkg/c.js")]
        );
        let inputs: Vec<String> = runner.calls().iter().map(|c| c.args[2].clone()).collect();
        assert_eq!(inputs, vec!["a.py", "b.py", "pkg/c.pyc"]);
    }

    #[tokio::test]
    async fn test_invocation_shape() {
        let (_dir, config) = project(&["app.py"]);
        let runner = FakeRunner::new();

        transpile_all(&config, "transcrypt", &runner).await;

        let call = &runner.calls()[0];
        let expected_out = config.output_path().join("app.js");
        assert_eq!(call.program, "transcrypt");
        assert_eq!(
            call.args,
            vec!["-b", "-m", "app.py", "-o", expected_out.to_str().unwrap()]
        );
        assert_eq!(call.cwd, Some(config.source_path()));
    }

    #[tokio::test]
    async fn test_stops_at_first_failing_file() {
        let (_dir, config) = project(&["a.py", "b.py", "c.py", "d.py"]);
        let runner = FakeRunner::new().failing(|inv| mentions(inv, "b.py"));

        let outcome = transpile_all(&config, "transcrypt", &runner).await;

        assert!(!outcome.succeeded);
        assert_eq!(outcome.failed_file, Some(config.source_path().join("b.py")));
        assert_eq!(outcome.cause, Some(ProcessResult::exited(1)));
        assert_eq!(runner.calls().len(), 2);
        assert!(!config.output_path().join("c.js").exists());
    }

    #[tokio::test]
    async fn test_zero_exit_without_output_is_failure() {
        let (_dir, config) = project(&["a.py", "b.py"]);
        let runner = FakeRunner::new().silent(|inv| mentions(inv, "a.py"));

        let outcome = transpile_all(&config, "transcrypt", &runner).await;

        assert!(!outcome.succeeded);
        assert_eq!(outcome.failed_file, Some(config.source_path().join("a.py")));
        let cause = outcome.cause.unwrap();
        assert!(cause.error_detail.unwrap().contains("was not produced"));
        assert_eq!(runner.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_output_directory_inside_source_is_not_rescanned() {
        let (_dir, config) = project(&["app.py", "build/stale.py", "__target__/app.py"]);
        let runner = FakeRunner::new();

        let outcome = transpile_all(&config, "transcrypt", &runner).await;

        assert!(outcome.succeeded);
        assert_eq!(runner.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_tree_succeeds() {
        let (_dir, config) = project(&[]);
        let outcome = transpile_all(&config, "transcrypt", &FakeRunner::new()).await;
        assert!(outcome.succeeded);
        assert!(outcome.outputs.is_empty());
    }

    #[tokio::test]
    async fn test_batch_mode_runs_from_entry_directory() {
        let (_dir, config) = project(&["app.py"]);
        let runner = FakeRunner::new();

        let result = transpile_one(&config, "transcrypt", &runner).await;

        assert!(result.is_success());
        let call = &runner.calls()[0];
        assert_eq!(call.args, vec!["-b", "-m", "app.py"]);
        assert_eq!(call.cwd, Some(config.root.clone()));
        assert!(dev_output_path(&config).exists());
    }

    #[tokio::test]
    async fn test_batch_mode_requires_output() {
        let (_dir, config) = project(&["app.py"]);
        let runner = FakeRunner::new().silent(|inv| program_name(inv) == "transcrypt");

        let result = transpile_one(&config, "transcrypt", &runner).await;
        assert!(!result.is_success());
    }

    #[tokio::test]
    async fn test_typescript_conversion_targets_dev_output() {
        let (_dir, config) = project(&["app.py"]);
        let runner = FakeRunner::new();

        assert!(convert_to_typescript(&config, &runner).await.is_success());

        let call = &runner.calls()[0];
        assert_eq!(call.program, "js-to-ts");
        assert!(call.args[0].ends_with("__target__/app.js"));
        assert!(call.args[1].ends_with("__target__/app.ts"));
    }
}
