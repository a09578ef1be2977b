//! Utility functions and helpers

use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

/// Extensions of the source language, including compiled/optimized variants
pub const SOURCE_EXTENSIONS: [&str; 4] = ["py", "pyc", "pyo", "pyd"];

/// Extension of transpiled output
pub const TARGET_EXTENSION: &str = "js";

/// Whether `path` is a source-language file
pub fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
}

/// Whether `path` is a transpiled script
pub fn is_script_file(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(TARGET_EXTENSION)
}

/// `path` with its source extension rewritten to the target extension
pub fn to_target_path(path: &Path) -> PathBuf {
    path.with_extension(TARGET_EXTENSION)
}

/// Walk `root` depth-first in lexical order, pruning any directory in `excluded`.
///
/// The root itself is not yielded.
pub fn walk_sorted<'a>(
    root: &Path,
    excluded: &'a [PathBuf],
) -> impl Iterator<Item = walkdir::Result<DirEntry>> + 'a {
    WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(move |entry| !excluded.iter().any(|ex| entry.path() == ex))
}

/// Get relative path from base to target
pub fn relative_path(from: &Path, to: &Path) -> Option<String> {
    pathdiff::diff_paths(to, from)
        .map(|p| p.display().to_string())
}

/// Path for log output: relative to `base` when possible
pub fn display_path(base: &Path, path: &Path) -> String {
    relative_path(base, path).unwrap_or_else(|| path.display().to_string())
}

/// Format duration as human-readable string
pub fn format_duration(duration: std::time::Duration) -> String {
    let secs = duration.as_secs_f64();

    if secs >= 60.0 {
        let mins = (secs / 60.0).floor() as u64;
        let remaining_secs = secs - (mins as f64 * 60.0);
        format!("{}m {:.2}s", mins, remaining_secs)
    } else if secs >= 1.0 {
        format!("{:.2}s", secs)
    } else {
        format!("{:.0}ms", secs * 1000.0)
    }
}
