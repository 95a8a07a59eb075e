//! Template instances: a compiled artifact bound to a model and an engine.

use std::fmt;
use std::sync::Arc;

use stencil_cache::CompiledArtifact;
use stencil_core::{Model, ModelType, TemplateError, UsageError};

use crate::context::ExecutionContext;
use crate::engine::Engine;
use crate::page::TemplatePage;

/// A compiled template body.
///
/// The body drives the page's callbacks (`write`, `write_literal`,
/// `write_attribute`, sections, `render_body`, `set_layout`).
pub trait CompiledTemplate: Send + Sync {
    fn execute(&self, page: &mut TemplatePage<'_>) -> Result<(), TemplateError>;
}

/// What the compiler pipeline hands back for one template.
pub type Loadable = Arc<dyn CompiledTemplate>;

/// A cached, compiled template.
pub type Artifact = CompiledArtifact<Loadable>;

/// Adapter implementing [`CompiledTemplate`] for a closure.
pub struct FnTemplate<F>(F);

impl<F> CompiledTemplate for FnTemplate<F>
where
    F: Fn(&mut TemplatePage<'_>) -> Result<(), TemplateError> + Send + Sync,
{
    fn execute(&self, page: &mut TemplatePage<'_>) -> Result<(), TemplateError> {
        (self.0)(page)
    }
}

/// Wrap a closure as a loadable template body.
pub fn template_fn<F>(body: F) -> Loadable
where
    F: Fn(&mut TemplatePage<'_>) -> Result<(), TemplateError> + Send + Sync + 'static,
{
    Arc::new(FnTemplate(body))
}

/// Introspection data attached in debug mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugInfo {
    pub name: String,
    pub file_name: Option<String>,
    pub generated_source: String,
}

/// One render request's view of a compiled template.
pub struct TemplateInstance {
    engine: Engine,
    artifact: Arc<Artifact>,
    model: Model,
    layout: Option<String>,
    debug: Option<DebugInfo>,
}

impl TemplateInstance {
    pub(crate) fn new(engine: Engine, artifact: Arc<Artifact>, model: Model) -> Result<Self, UsageError> {
        check_model(artifact.model_type(), &model)?;
        let debug = engine.config().debug.then(|| DebugInfo {
            name: artifact.key().to_owned(),
            file_name: artifact.file_name().map(str::to_owned),
            generated_source: artifact.generated_source().to_owned(),
        });
        Ok(Self {
            engine,
            artifact,
            model,
            layout: None,
            debug,
        })
    }

    /// Logical name (cache key) of the underlying artifact.
    pub fn name(&self) -> &str {
        self.artifact.key()
    }

    pub fn artifact(&self) -> &Arc<Artifact> {
        &self.artifact
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Replace the bound model, checking it against the compiled model type.
    pub fn bind_model(&mut self, model: Model) -> Result<(), UsageError> {
        check_model(self.artifact.model_type(), &model)?;
        self.model = model;
        Ok(())
    }

    /// Layout the instance starts with; the body may still change it.
    pub fn layout(&self) -> Option<&str> {
        self.layout.as_deref()
    }

    pub fn with_layout(mut self, layout: impl Into<String>) -> Self {
        self.layout = Some(layout.into());
        self
    }

    /// Generated source and logical name; `None` unless debug mode is on.
    pub fn debug_info(&self) -> Option<&DebugInfo> {
        self.debug.as_ref()
    }

    /// Bind `model` and render this template, and any layouts it declares,
    /// inside `context`.
    pub fn run(mut self, model: Model, context: &mut ExecutionContext) -> Result<String, TemplateError> {
        self.bind_model(model)?;
        let engine = self.engine.clone();
        engine.execute(self, context)
    }

    /// [`run`](Self::run) with a fresh context.
    pub fn render(self, model: Model) -> Result<String, TemplateError> {
        self.run(model, &mut ExecutionContext::new())
    }

    pub(crate) fn template(&self) -> &dyn CompiledTemplate {
        &**self.artifact.loadable()
    }
}

impl fmt::Debug for TemplateInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateInstance")
            .field("name", &self.name())
            .field("model", &self.model)
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

/// Templates compiled for the dynamic model accept any model; typed
/// templates accept no model or a model of exactly their type.
fn check_model(expected: &ModelType, model: &Model) -> Result<(), UsageError> {
    if expected.is_dynamic() {
        return Ok(());
    }
    match model {
        Model::None => Ok(()),
        Model::Typed(typed) if typed.model_type() == expected => Ok(()),
        other => Err(UsageError::ModelTypeMismatch {
            expected: expected.name().to_owned(),
            found: other.model_type().name().to_owned(),
        }),
    }
}
