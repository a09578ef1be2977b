//! Configuration handling for pyweb
//!
//! Locates `python.config.json` (or its `.tson` fallback) in the project root
//! and normalizes it into a [`ProjectConfig`] with every field populated.
//! Resolution never fails: a missing or broken file yields the defaults plus
//! a [`ConfigDiagnostic`] describing what happened.

mod schema;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, error, warn};

pub use schema::*;

/// Candidate configuration files, highest priority first
pub const CONFIG_CANDIDATES: [&str; 2] = ["python.config.json", "python.config.tson"];

const DEFAULT_ENTRY_POINT: &str = "app.py";
const DEFAULT_DEV_PORT: u16 = 3000;
const DEFAULT_SOURCE_DIR: &str = ".";
const DEFAULT_OUTPUT_DIR: &str = "build";
const DEFAULT_PACKAGE_MANAGER: &str = "npm";

/// Normalized project settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectConfig {
    /// Target-language hint; `typescript` enables post-conversion in dev
    pub language: Option<String>,

    /// Entry source file, relative to the project root
    pub entry_point: PathBuf,

    /// Dev server port
    pub dev_port: u16,

    /// Source tree for production builds, relative to the project root
    pub source_dir: PathBuf,

    /// Production output directory, relative to the project root
    pub output_directory: PathBuf,

    /// Python packages installed before building
    pub dependencies: Vec<String>,

    /// Package manager used for tool installation
    pub package_manager: String,

    /// External tools and fixed parameters
    pub toolchain: Toolchain,

    /// Project root every relative path resolves against
    pub root: PathBuf,
}

impl ProjectConfig {
    /// All-defaults configuration rooted at `root`
    pub fn defaults_in<P: AsRef<Path>>(root: P) -> Self {
        Self::from_file(ConfigFile::default(), root.as_ref())
    }

    fn from_file(file: ConfigFile, root: &Path) -> Self {
        let text = |value: Option<String>, default: &str| {
            value
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Self {
            language: file.language.filter(|l| !l.trim().is_empty()),
            entry_point: PathBuf::from(text(file.entry_point, DEFAULT_ENTRY_POINT)),
            dev_port: file
                .dev
                .and_then(|dev| dev.port)
                .filter(|port| *port != 0)
                .unwrap_or(DEFAULT_DEV_PORT),
            source_dir: PathBuf::from(text(file.source_dir, DEFAULT_SOURCE_DIR)),
            output_directory: PathBuf::from(text(
                file.build.and_then(|build| build.output_directory),
                DEFAULT_OUTPUT_DIR,
            )),
            dependencies: file
                .python_dependencies
                .unwrap_or_default()
                .into_iter()
                .filter(|dep| !dep.trim().is_empty())
                .collect(),
            package_manager: text(file.package_manager, DEFAULT_PACKAGE_MANAGER),
            toolchain: file.toolchain.unwrap_or_default(),
            root: root.to_path_buf(),
        }
    }

    /// Absolute path of the entry file
    pub fn entry_path(&self) -> PathBuf {
        self.root.join(&self.entry_point)
    }

    /// Absolute source directory
    pub fn source_path(&self) -> PathBuf {
        self.root.join(&self.source_dir)
    }

    /// Absolute output directory
    pub fn output_path(&self) -> PathBuf {
        self.root.join(&self.output_directory)
    }

    /// Directory the transpiler writes to when run in batch mode on the entry file
    pub fn dev_target_path(&self) -> PathBuf {
        self.entry_path()
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone())
            .join(&self.toolchain.dev_target_dir)
    }

    /// Marker whose presence means the transpiler is installed locally
    pub fn local_tool_path(&self, tool: &str) -> PathBuf {
        self.root.join(&self.toolchain.local_bin_dir).join(tool)
    }

    /// Directories never scanned for sources nor mirrored into the output,
    /// relevant when they sit inside the source tree
    pub fn build_exclusions(&self) -> Vec<PathBuf> {
        let mut excluded = vec![
            self.output_path(),
            self.source_path().join(&self.toolchain.dev_target_dir),
        ];
        let dev_target = self.dev_target_path();
        if !excluded.contains(&dev_target) {
            excluded.push(dev_target);
        }
        let bin_dir = self.root.join(&self.toolchain.local_bin_dir);
        if let Some(packages) = bin_dir.parent().filter(|p| *p != self.root) {
            excluded.push(packages.to_path_buf());
        }
        excluded
    }

    /// Whether dev output should additionally be converted to TypeScript
    pub fn wants_typescript(&self) -> bool {
        self.language
            .as_deref()
            .is_some_and(|l| l.eq_ignore_ascii_case("typescript"))
    }
}

/// Why a present candidate file could not be used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    Unreadable,
    Empty,
    Malformed,
}

/// A candidate file that exists but was skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub path: PathBuf,
    pub kind: IssueKind,
    pub detail: String,
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self.kind {
            IssueKind::Unreadable => "could not be read",
            IssueKind::Empty => "is empty",
            IssueKind::Malformed => "is malformed",
        };
        write!(f, "{} {}", self.path.display(), what)?;
        if !self.detail.is_empty() {
            write!(f, ": {}", self.detail)?;
        }
        Ok(())
    }
}

/// How the configuration was obtained
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigDiagnostic {
    /// Parsed from `path`; earlier candidates in `skipped` were present but unusable
    Loaded {
        path: PathBuf,
        skipped: Vec<ConfigIssue>,
    },

    /// No candidate file exists
    Absent,

    /// Every present candidate was unusable; defaults are in effect
    Unusable(Vec<ConfigIssue>),
}

impl ConfigDiagnostic {
    /// True when defaults were substituted for a file that exists
    pub fn is_degraded(&self) -> bool {
        matches!(self, ConfigDiagnostic::Unusable(_))
    }
}

/// Outcome of [`resolve`]
#[derive(Debug, Clone)]
pub struct Resolved {
    pub config: ProjectConfig,
    pub diagnostic: ConfigDiagnostic,
}

/// Resolve the project configuration in `root`.
///
/// Candidates are tried in [`CONFIG_CANDIDATES`] order; the first one that
/// reads and parses wins.
pub fn resolve<P: AsRef<Path>>(root: P) -> Resolved {
    let root = root.as_ref();
    let mut issues = Vec::new();

    for name in CONFIG_CANDIDATES {
        let path = root.join(name);
        if !path.exists() {
            continue;
        }

        match read_candidate(&path) {
            Ok(file) => {
                debug!("Loaded configuration from {}", path.display());
                for issue in &issues {
                    warn!("Skipped configuration file: {}", issue);
                }
                return Resolved {
                    config: ProjectConfig::from_file(file, root),
                    diagnostic: ConfigDiagnostic::Loaded {
                        path,
                        skipped: issues,
                    },
                };
            }
            Err(issue) => issues.push(issue),
        }
    }

    let diagnostic = if issues.is_empty() {
        warn!("No configuration file found, using defaults");
        ConfigDiagnostic::Absent
    } else {
        for issue in &issues {
            error!("Error reading configuration file: {}", issue);
        }
        ConfigDiagnostic::Unusable(issues)
    };

    Resolved {
        config: ProjectConfig::defaults_in(root),
        diagnostic,
    }
}

fn read_candidate(path: &Path) -> Result<ConfigFile, ConfigIssue> {
    let issue = |kind, detail: String| ConfigIssue {
        path: path.to_path_buf(),
        kind,
        detail,
    };

    let content =
        fs::read_to_string(path).map_err(|e| issue(IssueKind::Unreadable, e.to_string()))?;

    if content.trim().is_empty() {
        return Err(issue(IssueKind::Empty, String::new()));
    }

    serde_json::from_str(&content).map_err(|e| issue(IssueKind::Malformed, e.to_string()))
}
