//! Stencil engine: compile, instantiate, render.
//!
//! # Render chain
//!
//! ```text
//! child body ──► captured output ──► body stack ──► layout body ──► … ──► result
//!      │                                               ▲
//!      └── define_section ──► section map ─────────────┘ render_section
//! ```
//!
//! Each template body runs to completion before its layout starts, so every
//! section a child defines is registered before the layout can ask for it.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use stencil_cache::{CompileInput, CompilerPipeline, PipelineOptions, TemplateCache};
use stencil_core::{EngineConfig, Model, ModelType, TemplateError, UsageError, ViewBag};

use crate::context::{ExecutionContext, Producer, RenderState};
use crate::instance::{Artifact, Loadable, TemplateInstance};
use crate::page::TemplatePage;

/// A compiler pipeline producing loadable template bodies.
pub type DynPipeline = dyn CompilerPipeline<Loadable = Loadable>;

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Template text handed back by a [`TemplateResolver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSource {
    pub content: String,
    pub file_name: Option<String>,
    pub model_type: ModelType,
}

impl TemplateSource {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            file_name: None,
            model_type: ModelType::dynamic(),
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn with_model_type(mut self, model_type: ModelType) -> Self {
        self.model_type = model_type;
        self
    }
}

/// Supplies templates the cache has not seen yet, by logical name.
pub trait TemplateResolver: Send + Sync {
    fn resolve(&self, name: &str) -> Option<TemplateSource>;

    /// Whether `name` would resolve.
    ///
    /// Defaults to a full [`resolve`](Self::resolve) whose result is thrown
    /// away; resolvers backed by files or the network should override it
    /// with a cheaper check.
    fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }
}

impl<F> TemplateResolver for F
where
    F: Fn(&str) -> Option<TemplateSource> + Send + Sync,
{
    fn resolve(&self, name: &str) -> Option<TemplateSource> {
        self(name)
    }
}

/// Resolver backed by a fixed name → source table.
#[derive(Debug, Clone, Default)]
pub struct MapResolver(HashMap<String, TemplateSource>);

impl MapResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, source: TemplateSource) -> Self {
        self.0.insert(name.into(), source);
        self
    }
}

impl TemplateResolver for MapResolver {
    fn resolve(&self, name: &str) -> Option<TemplateSource> {
        self.0.get(name).cloned()
    }

    fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }
}

// ---------------------------------------------------------------------------
// EngineBuilder
// ---------------------------------------------------------------------------

/// Builder for [`Engine`].
#[derive(Default)]
pub struct EngineBuilder {
    config: EngineConfig,
    default_pipeline: Option<Arc<DynPipeline>>,
    pipelines: HashMap<String, Arc<DynPipeline>>,
    resolver: Option<Arc<dyn TemplateResolver>>,
}

impl EngineBuilder {
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Pipeline used when no extension-specific pipeline matches.
    pub fn pipeline<P>(mut self, pipeline: P) -> Self
    where
        P: CompilerPipeline<Loadable = Loadable> + 'static,
    {
        self.default_pipeline = Some(Arc::new(pipeline));
        self
    }

    /// Pipeline for file names ending in `.{extension}` (case-insensitive).
    pub fn pipeline_for<P>(mut self, extension: &str, pipeline: P) -> Self
    where
        P: CompilerPipeline<Loadable = Loadable> + 'static,
    {
        self.pipelines
            .insert(normalize_extension(extension), Arc::new(pipeline));
        self
    }

    pub fn resolver<R: TemplateResolver + 'static>(mut self, resolver: R) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    pub fn build(self) -> Engine {
        let options = PipelineOptions::from(&self.config);
        let cache = TemplateCache::from_config(&self.config);
        Engine {
            inner: Arc::new(EngineInner {
                config: self.config,
                options,
                cache,
                default_pipeline: self.default_pipeline,
                pipelines: self.pipelines,
                resolver: self.resolver,
            }),
        }
    }
}

fn normalize_extension(extension: &str) -> String {
    extension.trim_start_matches('.').to_lowercase()
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

struct EngineInner {
    config: EngineConfig,
    options: PipelineOptions,
    cache: TemplateCache<Loadable>,
    default_pipeline: Option<Arc<DynPipeline>>,
    pipelines: HashMap<String, Arc<DynPipeline>>,
    resolver: Option<Arc<dyn TemplateResolver>>,
}

/// Compiles, caches and renders templates.
///
/// Cheap to clone; clones share the artifact cache. Safe to use from many
/// threads at once.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    pub fn cache(&self) -> &TemplateCache<Loadable> {
        &self.inner.cache
    }

    /// Compile `content` (or fetch it from the cache) and return an instance
    /// with no model bound.
    ///
    /// `name` defaults to the content fingerprint; `model_type` defaults to
    /// the dynamic model.
    pub fn compile(
        &self,
        name: Option<&str>,
        content: &str,
        file_name: Option<&str>,
        model_type: Option<&ModelType>,
    ) -> Result<TemplateInstance, TemplateError> {
        let artifact = self.compile_artifact(name, content, file_name, model_type)?;
        self.new_instance(artifact, Model::None)
    }

    /// The cached artifact for these inputs, compiling it at most once.
    pub fn compile_artifact(
        &self,
        name: Option<&str>,
        content: &str,
        file_name: Option<&str>,
        model_type: Option<&ModelType>,
    ) -> Result<Arc<Artifact>, TemplateError> {
        let model_type = model_type.cloned().unwrap_or_default();
        let pipeline = self.pipeline_for(file_name)?;
        let input = CompileInput::new(content, &model_type)
            .with_name(name)
            .with_file_name(file_name);
        self.inner
            .cache
            .get_or_compile(&**pipeline, &input, &self.inner.options)
    }

    /// Instantiate `artifact` with `model` bound.
    pub fn new_instance(&self, artifact: Arc<Artifact>, model: Model) -> Result<TemplateInstance, TemplateError> {
        Ok(TemplateInstance::new(self.clone(), artifact, model)?)
    }

    /// Instance of the template cached under `name`, falling back to the
    /// resolver. `Ok(None)` when neither knows the name.
    pub fn find_template(&self, name: &str) -> Result<Option<TemplateInstance>, TemplateError> {
        if let Some(artifact) = self.inner.cache.get(name) {
            return self.new_instance(artifact, Model::None).map(Some);
        }
        let Some(source) = self.inner.resolver.as_ref().and_then(|r| r.resolve(name)) else {
            return Ok(None);
        };
        tracing::debug!("resolved template: {name}");
        self.compile(
            Some(name),
            &source.content,
            source.file_name.as_deref(),
            Some(&source.model_type),
        )
        .map(Some)
    }

    /// Whether `name` is cached or resolvable.
    ///
    /// Asks the resolver through [`TemplateResolver::contains`]; nothing is
    /// compiled or cached.
    pub fn has_template(&self, name: &str) -> bool {
        self.inner.cache.contains(name)
            || self
                .inner
                .resolver
                .as_ref()
                .is_some_and(|r| r.contains(name))
    }

    /// Compile `content` for the model's type and render it.
    pub fn parse(&self, content: &str, model: Model, view_bag: Option<ViewBag>) -> Result<String, TemplateError> {
        let model_type = model.model_type();
        let instance = self.compile(None, content, None, Some(&model_type))?;
        let mut context = ExecutionContext::with_view_bag(view_bag.unwrap_or_default());
        instance.run(model, &mut context)
    }

    /// Render the template called `name`.
    pub fn run(&self, name: &str, model: Model, view_bag: Option<ViewBag>) -> Result<String, TemplateError> {
        let instance = self
            .find_template(name)?
            .ok_or_else(|| UsageError::TemplateNotFound { name: name.to_owned() })?;
        let mut context = ExecutionContext::with_view_bag(view_bag.unwrap_or_default());
        instance.run(model, &mut context)
    }

    fn pipeline_for(&self, file_name: Option<&str>) -> Result<&Arc<DynPipeline>, UsageError> {
        let by_extension = file_name
            .and_then(|f| Path::new(f).extension())
            .and_then(|ext| {
                self.inner
                    .pipelines
                    .get(&normalize_extension(&ext.to_string_lossy()))
            });
        by_extension
            .or(self.inner.default_pipeline.as_ref())
            .ok_or_else(|| UsageError::ProviderNotFound {
                file_name: file_name.unwrap_or("<inline>").to_owned(),
            })
    }

    /// Run `instance` and every layout it chains to inside `context`.
    ///
    /// The context is left `Idle` whether the chain succeeds or fails. A
    /// failed chain's captured bodies and sections are discarded with it.
    pub(crate) fn execute(
        &self,
        instance: TemplateInstance,
        context: &mut ExecutionContext,
    ) -> Result<String, TemplateError> {
        let result = self.execute_chain(instance, context);
        if result.is_err() {
            context.reset_chain();
        }
        context.set_state(RenderState::Idle);
        result
    }

    fn execute_chain(
        &self,
        mut instance: TemplateInstance,
        context: &mut ExecutionContext,
    ) -> Result<String, TemplateError> {
        loop {
            context.set_state(RenderState::Executing);
            let (output, layout) = {
                let mut page = TemplatePage::new(&instance, context);
                instance.template().execute(&mut page)?;
                page.finish()
            };

            let Some(layout) = layout else {
                return Ok(output);
            };

            context.set_state(RenderState::LayoutChaining);
            tracing::debug!("{} -> layout {layout}", instance.name());
            context.push_body(Producer::Rendered(output));

            let mut next = self
                .find_template(&layout)?
                .ok_or_else(|| UsageError::LayoutNotFound { name: layout.clone() })?;
            next.bind_model(instance.model().clone())?;
            instance = next;
        }
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.inner.config)
            .field("cached", &self.inner.cache.len())
            .field("extensions", &self.inner.pipelines.keys().collect::<Vec<_>>())
            .field("resolver", &self.inner.resolver.is_some())
            .finish()
    }
}
