//! # stencil-renderer
//!
//! Executes compiled templates: value and attribute writing, layouts,
//! sections, and the [`Engine`] that ties compilation, caching and
//! rendering together.
//!
//! ## Usage
//!
//! ```rust
//! use stencil_renderer::{template_fn, Engine, Model, StaticPipeline, TemplateError};
//!
//! const PAGE: &str = "<h1>@Model.title</h1>";
//!
//! let pipeline = StaticPipeline::new().with_template(
//!     PAGE,
//!     template_fn(|page| {
//!         let title = page.field("title").cloned().unwrap_or_default();
//!         page.write_literal("<h1>");
//!         page.write(title);
//!         page.write_literal("</h1>");
//!         Ok(())
//!     }),
//! );
//! let engine = Engine::builder().pipeline(pipeline).build();
//!
//! let html = engine.parse(PAGE, Model::dynamic([("title", "Tom & Jerry")]), None)?;
//! assert_eq!(html, "<h1>Tom &amp; Jerry</h1>");
//! # Ok::<(), TemplateError>(())
//! ```

pub mod attribute;
pub mod context;
pub mod encode;
pub mod engine;
pub mod instance;
pub mod page;
pub mod pipeline;

pub use attribute::{AttributeSegment, PositionTagged};
pub use context::{ExecutionContext, Producer, RenderState};
pub use engine::{DynPipeline, Engine, EngineBuilder, MapResolver, TemplateResolver, TemplateSource};
pub use instance::{template_fn, Artifact, CompiledTemplate, DebugInfo, FnTemplate, Loadable, TemplateInstance};
pub use page::TemplatePage;
pub use pipeline::StaticPipeline;

pub use stencil_core::{
    Encoding, EngineConfig, FailurePolicy, Model, ModelType, TemplateError, UsageError, Value, ViewBag,
};
