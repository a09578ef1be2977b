//! Best-effort minification of emitted scripts

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::process::{Invocation, ProcessResult, ProcessRunner};
use crate::utils::{display_path, is_script_file, walk_sorted};

/// Per-file minification results
#[derive(Debug, Default)]
pub struct MinifyReport {
    pub minified: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, ProcessResult)>,
}

/// `app.js` -> `app.min.js`
pub fn minified_path(script: &Path) -> PathBuf {
    script.with_extension("min.js")
}

fn is_minified(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(".min.js"))
}

/// Minify every script under `output_dir` into a `.min.js` sibling.
///
/// Scripts in subdirectories are included unless they sit in an `excluded`
/// directory; existing `.min.js` files are not minified again. A failing
/// file is logged and skipped.
pub fn minify_all(
    output_dir: &Path,
    excluded: &[PathBuf],
    program: &str,
    runner: &dyn ProcessRunner,
) -> MinifyReport {
    let scripts: Vec<PathBuf> = walk_sorted(output_dir, excluded)
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| is_script_file(p) && !is_minified(p))
        .collect();

    let mut report = MinifyReport::default();

    for script in scripts {
        let target = minified_path(&script);
        let invocation = Invocation::new(program)
            .arg(script.to_string_lossy())
            .arg("-o")
            .arg(target.to_string_lossy());

        let mut result = runner.run_blocking(&invocation);
        if result.is_success() && !target.exists() {
            result = ProcessResult::failed(format!("{} was not produced", target.display()));
        }

        let shown = display_path(output_dir, &script);
        if result.is_success() {
            info!("Minified {}", shown);
            report.minified.push(target);
        } else {
            warn!("Error minifying {}: {}", shown, result);
            report.failed.push((script, result));
        }
    }

    report
}
