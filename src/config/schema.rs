//! Configuration file schema definitions
//!
//! Every field is read independently: a `null` or a value of the wrong shape
//! counts as absent instead of invalidating the whole file.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// On-disk shape of `python.config.json` / `python.config.tson`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFile {
    /// Optional target-language hint (e.g. "typescript")
    #[serde(default, deserialize_with = "lenient")]
    pub language: Option<String>,

    /// Entry source file
    #[serde(default, deserialize_with = "lenient")]
    pub entry_point: Option<String>,

    /// Root of the source tree transpiled by `build`
    #[serde(default, deserialize_with = "lenient")]
    pub source_dir: Option<String>,

    /// Package manager used to install the transpiler
    #[serde(default, deserialize_with = "lenient")]
    pub package_manager: Option<String>,

    /// Development server settings
    #[serde(default, deserialize_with = "lenient")]
    pub dev: Option<DevSection>,

    /// Production build settings
    #[serde(default, deserialize_with = "lenient")]
    pub build: Option<BuildSection>,

    /// Python packages installed before a production build
    #[serde(default, alias = "dependencies", deserialize_with = "lenient")]
    pub python_dependencies: Option<Vec<String>>,

    /// External tool overrides
    #[serde(default, deserialize_with = "lenient")]
    pub toolchain: Option<Toolchain>,
}

/// `dev` section
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevSection {
    #[serde(default, deserialize_with = "port")]
    pub port: Option<u16>,
}

/// `build` section
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildSection {
    #[serde(default, deserialize_with = "lenient")]
    pub output_directory: Option<String>,
}

/// Any JSON value, kept only when it has the expected shape
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// A port given as a number or a numeric string
fn port<'de, D>(deserializer: D) -> Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// External tools and fixed parameters every stage reads from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Toolchain {
    /// Python-to-JavaScript transpiler
    pub transpiler: String,

    /// JavaScript minifier
    pub minifier: String,

    /// Certificate generation tool
    pub cert_tool: String,

    /// JavaScript-to-TypeScript converter
    pub ts_converter: String,

    /// Python interpreter used for `pip`
    pub python: String,

    /// Where the package manager drops executables, relative to the project root
    pub local_bin_dir: String,

    /// Directory the transpiler writes to in batch mode
    pub dev_target_dir: String,

    /// First port probed by `start`
    pub base_port: u16,

    /// Subject of the self-signed certificate
    pub cert_subject: String,

    /// Certificate validity in days
    pub cert_days: u32,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            transpiler: "transcrypt".to_string(),
            minifier: "terser".to_string(),
            cert_tool: "openssl".to_string(),
            ts_converter: "js-to-ts".to_string(),
            python: "python".to_string(),
            local_bin_dir: "node_modules/.bin".to_string(),
            dev_target_dir: "__target__".to_string(),
            base_port: 3000,
            cert_subject: "/C=US/ST=New York/L=New York/O=Organization/OU=IT Department/CN=*"
                .to_string(),
            cert_days: 365,
        }
    }
}
