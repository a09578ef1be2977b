//! Production bundling
//!
//! Mirrors the source tree into the output directory, skipping source-language
//! files (their transpiled counterparts are already there), then minifies
//! the emitted scripts.

mod minify;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::ProjectConfig;
use crate::error::PhaseError;
use crate::utils::{is_source_file, walk_sorted};

pub use minify::{minified_path, minify_all, MinifyReport};

/// Copy every non-source file under `source_dir` into `target_dir`,
/// preserving layout and overwriting existing files.
///
/// A file whose target is the file itself (output directory equal to the
/// source directory) is left untouched and not counted.
///
/// Directories listed in `excluded` are skipped entirely. The first I/O
/// error aborts the copy; files already copied stay in place. Returns the
/// number of files copied.
pub fn mirror(source_dir: &Path, target_dir: &Path, excluded: &[PathBuf]) -> Result<usize, PhaseError> {
    fs::create_dir_all(target_dir).map_err(|e| PhaseError::bundle(target_dir, e))?;

    let mut copied = 0;
    for entry in walk_sorted(source_dir, excluded) {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| source_dir.to_path_buf());
            PhaseError::bundle(path, io::Error::from(e))
        })?;

        let source = entry.path();
        let relative = source.strip_prefix(source_dir).unwrap_or(source);
        let target = target_dir.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| PhaseError::bundle(&target, e))?;
        } else if is_same_file(source, &target) {
            // Copying onto itself would truncate the file
            debug!("Already in place: {}", relative.display());
        } else if !is_source_file(source) {
            fs::copy(source, &target).map_err(|e| PhaseError::bundle(source, e))?;
            debug!("Copied {}", relative.display());
            copied += 1;
        }
    }

    Ok(copied)
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Mirror the configured source directory into the output directory
pub fn bundle(config: &ProjectConfig) -> Result<usize, PhaseError> {
    mirror(&config.source_path(), &config.output_path(), &config.build_exclusions())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;
    use walkdir::WalkDir;

    fn tree(root: &Path) -> Vec<String> {
        let mut entries: Vec<String> = WalkDir::new(root)
            .min_depth(1)
            .into_iter()
            .filter_map(Result::ok)
            .map(|e| e.path().strip_prefix(root).unwrap().display().to_string())
            .collect();
        entries.sort();
        entries
    }

    #[test]
    fn test_source_files_are_excluded() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        fs::create_dir_all(src.path().join("static/img")).unwrap();
        fs::create_dir_all(src.path().join("pkg")).unwrap();
        fs::write(src.path().join("app.py"), "").unwrap();
        fs::write(src.path().join("index.html"), "<html>").unwrap();
        fs::write(src.path().join("static/img/logo.png"), [0x89, 0x50]).unwrap();
        fs::write(src.path().join("pkg/util.py"), "").unwrap();
        fs::write(src.path().join("pkg/util.pyc"), "").unwrap();

        let copied = mirror(src.path(), out.path(), &[]).unwrap();

        assert_eq!(copied, 2);
        assert_eq!(
            tree(out.path()),
            vec!["index.html", "pkg", "static", "static/img", "static/img/logo.png"]
        );
        assert_eq!(fs::read(out.path().join("static/img/logo.png")).unwrap(), vec![0x89, 0x50]);
    }

    #[test]
    fn test_existing_targets_are_overwritten() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        fs::write(src.path().join("data.json"), "new").unwrap();
        fs::write(out.path().join("data.json"), "old").unwrap();

        mirror(src.path(), out.path(), &[]).unwrap();

        assert_eq!(fs::read_to_string(out.path().join("data.json")).unwrap(), "new");
    }

    #[test]
    fn test_nested_output_directory_is_not_copied_into_itself() {
        let dir = TempDir::new().unwrap();
        let config = ProjectConfig::defaults_in(dir.path());
        fs::write(dir.path().join("style.css"), "").unwrap();
        fs::create_dir_all(config.output_path()).unwrap();
        fs::write(config.output_path().join("app.js"), "").unwrap();

        bundle(&config).unwrap();

        assert_eq!(tree(&config.output_path()), vec!["app.js", "style.css"]);
    }

    #[test]
    fn test_output_equal_to_source_keeps_files_intact() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("python.config.json"),
            r#"{"build": {"outputDirectory": "."}}"#,
        )
        .unwrap();
        fs::write(dir.path().join("index.html"), "<html>").unwrap();
        fs::create_dir_all(dir.path().join("static")).unwrap();
        fs::write(dir.path().join("static/logo.png"), "png").unwrap();
        let config = crate::config::resolve(dir.path()).config;
        assert_eq!(config.output_directory, PathBuf::from("."));

        let copied = bundle(&config).unwrap();

        assert_eq!(copied, 0);
        assert_eq!(fs::read_to_string(dir.path().join("index.html")).unwrap(), "<html>");
        assert_eq!(fs::read_to_string(dir.path().join("static/logo.png")).unwrap(), "png");
        assert!(fs::read_to_string(dir.path().join("python.config.json"))
            .unwrap()
            .contains("outputDirectory"));
    }

    #[test]
    fn test_missing_source_reports_failure() {
        let out = TempDir::new().unwrap();
        let missing = out.path().join("nope");

        let err = mirror(&missing, &out.path().join("dist"), &[]).unwrap_err();
        assert!(matches!(err, PhaseError::BundleCopyFailure { .. }));
    }
}
