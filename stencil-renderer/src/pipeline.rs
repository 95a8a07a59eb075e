//! Precompiled template bodies registered by their template text.
//!
//! [`StaticPipeline`] stands in for the external code generator when the
//! bodies were produced ahead of time (e.g. by a build step). Generation
//! succeeds only for registered text, and compiling hands back the
//! registered body.

use std::collections::HashMap;

use stencil_cache::{CompileOutput, CompileRequest, CompilerPipeline, GenerateOutput, GenerateRequest};
use stencil_core::Diagnostic;

use crate::instance::Loadable;

/// Diagnostic code for template text with no registered body.
pub const UNKNOWN_TEMPLATE: &str = "STC0001";
/// Diagnostic code for generated source with no registered body.
pub const UNKNOWN_SOURCE: &str = "STC0002";

/// In-memory pipeline mapping template text to precompiled bodies.
#[derive(Default)]
pub struct StaticPipeline {
    bodies: HashMap<String, Loadable>,
}

impl StaticPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `body` as the compiled form of `content`.
    pub fn with_template(mut self, content: impl Into<String>, body: Loadable) -> Self {
        self.bodies.insert(content.into(), body);
        self
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}

impl CompilerPipeline for StaticPipeline {
    type Loadable = Loadable;

    fn generate(&self, request: &GenerateRequest<'_>) -> GenerateOutput {
        if !self.bodies.contains_key(request.content) {
            let diagnostic = Diagnostic::new(format!(
                "no precompiled body for template (model `{}`)",
                request.model_type_name
            ))
            .with_file(request.file_name.unwrap_or("<inline>"))
            .at(1, 1)
            .with_code(UNKNOWN_TEMPLATE);
            return GenerateOutput::failed(vec![diagnostic]);
        }
        GenerateOutput::succeeded(request.content)
    }

    fn compile(&self, request: &CompileRequest<'_>) -> CompileOutput<Loadable> {
        match self.bodies.get(request.generated_source) {
            Some(body) => CompileOutput::succeeded(body.clone()),
            None => CompileOutput::failed(vec![
                Diagnostic::new("generated source does not match a precompiled body").with_code(UNKNOWN_SOURCE),
            ]),
        }
    }
}
