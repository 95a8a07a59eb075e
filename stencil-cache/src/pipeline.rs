//! Boundary to the external parser/codegen/compile collaborator.
//!
//! The cache only knows two operations: turn template text into generated
//! source ([`CompilerPipeline::generate`]) and turn generated source into a
//! loadable artifact ([`CompilerPipeline::compile`]). [`compile_template`]
//! runs both and maps failures onto [`TemplateError`].

use std::fmt;
use std::sync::Arc;

use stencil_core::{Diagnostic, EngineConfig, ModelType, TemplateError};

use crate::fingerprint::Fingerprint;

// ---------------------------------------------------------------------------
// Requests / outputs
// ---------------------------------------------------------------------------

/// Input to [`CompilerPipeline::generate`].
#[derive(Debug, Clone, Copy)]
pub struct GenerateRequest<'a> {
    pub content: &'a str,
    pub file_name: Option<&'a str>,
    pub model_type_name: &'a str,
    pub namespaces: &'a [String],
}

/// Result of [`CompilerPipeline::generate`].
#[derive(Debug, Clone, Default)]
pub struct GenerateOutput {
    pub success: bool,
    pub generated_source: String,
    /// Errors on failure; warnings may accompany a success.
    pub diagnostics: Vec<Diagnostic>,
}

impl GenerateOutput {
    pub fn succeeded(generated_source: impl Into<String>) -> Self {
        Self {
            success: true,
            generated_source: generated_source.into(),
            diagnostics: Vec::new(),
        }
    }

    pub fn failed(diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            success: false,
            generated_source: String::new(),
            diagnostics,
        }
    }
}

/// Input to [`CompilerPipeline::compile`].
#[derive(Debug, Clone, Copy)]
pub struct CompileRequest<'a> {
    pub generated_source: &'a str,
    pub references: &'a [String],
    pub debug_info: bool,
}

/// Result of [`CompilerPipeline::compile`].
#[derive(Debug, Clone)]
pub struct CompileOutput<L> {
    pub success: bool,
    pub artifact: Option<L>,
    pub diagnostics: Vec<Diagnostic>,
}

impl<L> CompileOutput<L> {
    pub fn succeeded(artifact: L) -> Self {
        Self {
            success: true,
            artifact: Some(artifact),
            diagnostics: Vec::new(),
        }
    }

    pub fn failed(diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            success: false,
            artifact: None,
            diagnostics,
        }
    }
}

// ---------------------------------------------------------------------------
// CompilerPipeline
// ---------------------------------------------------------------------------

/// The external generate + compile collaborator.
///
/// `Loadable` is whatever the compiler hands back; the cache stores it
/// without looking inside.
pub trait CompilerPipeline: Send + Sync {
    type Loadable: Clone + Send + Sync + 'static;

    fn generate(&self, request: &GenerateRequest<'_>) -> GenerateOutput;

    fn compile(&self, request: &CompileRequest<'_>) -> CompileOutput<Self::Loadable>;
}

impl<P: CompilerPipeline + ?Sized> CompilerPipeline for Arc<P> {
    type Loadable = P::Loadable;

    fn generate(&self, request: &GenerateRequest<'_>) -> GenerateOutput {
        (**self).generate(request)
    }

    fn compile(&self, request: &CompileRequest<'_>) -> CompileOutput<Self::Loadable> {
        (**self).compile(request)
    }
}

/// Settings forwarded to the pipeline on every compile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineOptions {
    pub namespaces: Vec<String>,
    pub references: Vec<String>,
    pub debug: bool,
}

impl From<&EngineConfig> for PipelineOptions {
    fn from(config: &EngineConfig) -> Self {
        Self {
            namespaces: config.namespaces.clone(),
            references: config.references.clone(),
            debug: config.debug,
        }
    }
}

// ---------------------------------------------------------------------------
// CompileInput / CompiledArtifact
// ---------------------------------------------------------------------------

/// What the caller asks to compile.
#[derive(Debug, Clone, Copy)]
pub struct CompileInput<'a> {
    /// Logical name; defaults to the fingerprint.
    pub name: Option<&'a str>,
    pub content: &'a str,
    pub file_name: Option<&'a str>,
    pub model_type: &'a ModelType,
}

impl<'a> CompileInput<'a> {
    pub fn new(content: &'a str, model_type: &'a ModelType) -> Self {
        Self {
            name: None,
            content,
            file_name: None,
            model_type,
        }
    }

    pub fn with_name(mut self, name: Option<&'a str>) -> Self {
        self.name = name;
        self
    }

    pub fn with_file_name(mut self, file_name: Option<&'a str>) -> Self {
        self.file_name = file_name;
        self
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::compute(self.content, self.file_name, self.model_type)
    }
}

/// A successfully compiled template.
pub struct CompiledArtifact<L> {
    key: String,
    fingerprint: Fingerprint,
    model_type: ModelType,
    file_name: Option<String>,
    generated_source: String,
    loadable: L,
}

impl<L> CompiledArtifact<L> {
    pub fn new(
        key: impl Into<String>,
        fingerprint: Fingerprint,
        model_type: ModelType,
        file_name: Option<String>,
        generated_source: String,
        loadable: L,
    ) -> Self {
        Self {
            key: key.into(),
            fingerprint,
            model_type,
            file_name,
            generated_source,
            loadable,
        }
    }

    /// Cache key: the logical name, or the fingerprint when none was given.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    pub fn model_type(&self) -> &ModelType {
        &self.model_type
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn generated_source(&self) -> &str {
        &self.generated_source
    }

    pub fn loadable(&self) -> &L {
        &self.loadable
    }
}

impl<L> fmt::Debug for CompiledArtifact<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledArtifact")
            .field("key", &self.key)
            .field("fingerprint", &self.fingerprint)
            .field("model_type", &self.model_type)
            .field("file_name", &self.file_name)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// compile_template
// ---------------------------------------------------------------------------

/// Run one generate + compile cycle.
///
/// Returns `TemplateError::Generation` if generation fails and
/// `TemplateError::Compilation` (with the generated source) if compilation
/// fails or yields no artifact.
pub fn compile_template<P: CompilerPipeline + ?Sized>(
    pipeline: &P,
    input: &CompileInput<'_>,
    options: &PipelineOptions,
) -> Result<CompiledArtifact<P::Loadable>, TemplateError> {
    let fingerprint = input.fingerprint();
    let key = input.name.unwrap_or(fingerprint.as_str()).to_owned();

    let generated = pipeline.generate(&GenerateRequest {
        content: input.content,
        file_name: input.file_name,
        model_type_name: input.model_type.name(),
        namespaces: &options.namespaces,
    });
    if !generated.success {
        return Err(TemplateError::Generation {
            diagnostics: generated.diagnostics,
        });
    }
    for warning in &generated.diagnostics {
        tracing::debug!("generate {key}: {warning}");
    }

    let compiled = pipeline.compile(&CompileRequest {
        generated_source: &generated.generated_source,
        references: &options.references,
        debug_info: options.debug,
    });
    let loadable = match compiled.artifact {
        Some(loadable) if compiled.success => loadable,
        _ => {
            return Err(TemplateError::Compilation {
                diagnostics: compiled.diagnostics,
                generated_source: generated.generated_source,
            })
        }
    };

    Ok(CompiledArtifact::new(
        key,
        fingerprint,
        input.model_type.clone(),
        input.file_name.map(str::to_owned),
        generated.generated_source,
        loadable,
    ))
}
