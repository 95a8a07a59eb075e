//! Engine configuration.
//!
//! Every field has a default, so an empty YAML document is a valid config:
//!
//! ```yaml
//! debug: true
//! namespaces: [app::helpers]
//! references: [libapp_views.so]
//! encoding: html          # html | raw
//! cache_capacity: 512     # omit for an unbounded cache
//! failure_policy: retry   # retry | remember
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{io_err, ConfigError};

/// How the encoded value path treats text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// HTML-encode non-raw values.
    #[default]
    Html,
    /// Write every value verbatim.
    Raw,
}

/// What the artifact cache does with a failed compile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Cache nothing; the next identical request compiles again.
    #[default]
    Retry,
    /// Remember the failure and return it for identical inputs.
    Remember,
}

/// Engine-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Attach generated source and logical name to instances; request debug
    /// info from the compiler.
    pub debug: bool,
    /// Namespace imports handed to the code generator.
    pub namespaces: Vec<String>,
    /// Library references handed to the compiler.
    pub references: Vec<String>,
    pub encoding: Encoding,
    /// Maximum number of cached artifacts (least recently used evicted first).
    /// `None` keeps every artifact for the lifetime of the engine.
    pub cache_capacity: Option<usize>,
    pub failure_policy: FailurePolicy,
}

impl EngineConfig {
    /// Parse a config from a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a config file.
    ///
    /// Returns `ConfigError::Io` if the file cannot be read and
    /// `ConfigError::Parse` (with the path) if it is malformed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
