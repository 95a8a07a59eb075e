//! # stencil-cache
//!
//! Content-addressed memoization of compiled templates.
//!
//! [`TemplateCache::get_or_compile`] fingerprints the inputs, runs the
//! external [`CompilerPipeline`] at most once per key and hands every caller
//! the same [`CompiledArtifact`].

pub mod cache;
pub mod fingerprint;
pub mod pipeline;

pub use cache::TemplateCache;
pub use fingerprint::Fingerprint;
pub use pipeline::{
    compile_template, CompileInput, CompileOutput, CompileRequest, CompiledArtifact,
    CompilerPipeline, GenerateOutput, GenerateRequest, PipelineOptions,
};
