//! Error types for the stencil workspace.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Diagnostic
// ---------------------------------------------------------------------------

/// One message reported by the code generator or the compiler.
///
/// Renders in build-log form: `file(line,column): error CODE: message`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            file: None,
            line: None,
            column: None,
            code: None,
            message: message.into(),
        }
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file.as_deref().unwrap_or("<template>"))?;
        match (self.line, self.column) {
            (Some(line), Some(column)) => write!(f, "({line},{column})")?,
            (Some(line), None) => write!(f, "({line})")?,
            _ => {}
        }
        f.write_str(": error")?;
        if let Some(code) = &self.code {
            write!(f, " {code}")?;
        }
        write!(f, ": {}", self.message)
    }
}

/// One diagnostic per line, each preceded by a newline.
fn render_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics.iter().map(|d| format!("\n  {d}")).collect()
}

// ---------------------------------------------------------------------------
// UsageError
// ---------------------------------------------------------------------------

/// Caller misuse detected while compiling or rendering.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    /// A required section was rendered but never defined.
    #[error("section `{name}` has not been defined")]
    MissingSection { name: String },

    /// A section name was defined twice in one render chain.
    #[error("section `{name}` is already defined")]
    DuplicateSection { name: String },

    /// `render_body` was called with nothing on the body stack.
    #[error("render_body called with no pending body to render")]
    EmptyBodyStack,

    /// A template declared a layout that neither the cache nor the resolver knows.
    #[error("layout `{name}` could not be resolved")]
    LayoutNotFound { name: String },

    /// A template was requested by name and could not be resolved.
    #[error("template `{name}` could not be resolved")]
    TemplateNotFound { name: String },

    /// No compiler pipeline handles the given file name.
    #[error("no compiler pipeline registered for `{file_name}`")]
    ProviderNotFound { file_name: String },

    /// The bound model does not match the type the template was compiled for.
    #[error("model type mismatch: template expects `{expected}`, got `{found}`")]
    ModelTypeMismatch { expected: String, found: String },
}

// ---------------------------------------------------------------------------
// TemplateError
// ---------------------------------------------------------------------------

/// All errors that can arise from compiling or rendering a template.
#[derive(Debug, Clone, Error)]
pub enum TemplateError {
    /// The parser/code generator rejected the template.
    #[error("template generation failed:{}", render_diagnostics(.diagnostics))]
    Generation { diagnostics: Vec<Diagnostic> },

    /// The generated source did not compile.
    #[error("template compilation failed:{}", render_diagnostics(.diagnostics))]
    Compilation {
        diagnostics: Vec<Diagnostic>,
        /// Full generated source, for inspecting the reported locations.
        generated_source: String,
    },

    /// Caller misuse; the render chain was aborted.
    #[error(transparent)]
    Usage(#[from] UsageError),
}

impl TemplateError {
    /// Diagnostics carried by a generation or compilation failure.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            TemplateError::Generation { diagnostics }
            | TemplateError::Compilation { diagnostics, .. } => diagnostics,
            TemplateError::Usage(_) => &[],
        }
    }

    pub fn as_usage(&self) -> Option<&UsageError> {
        match self {
            TemplateError::Usage(usage) => Some(usage),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Errors from loading an [`EngineConfig`](crate::EngineConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure reading the config file.
    #[error("config I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed YAML in an in-memory document.
    #[error("config YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Malformed YAML in a config file.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Convenience constructor for [`ConfigError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.into(),
        source,
    }
}
