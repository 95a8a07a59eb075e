//! Shared fixtures for the renderer integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use stencil_cache::{CompileOutput, CompileRequest, CompilerPipeline, GenerateOutput, GenerateRequest};

/// Wraps a pipeline and counts how often each stage runs.
pub struct Counting<P> {
    inner: P,
    generated: AtomicUsize,
    compiled: AtomicUsize,
}

impl<P> Counting<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            generated: AtomicUsize::new(0),
            compiled: AtomicUsize::new(0),
        }
    }

    pub fn generated(&self) -> usize {
        self.generated.load(Ordering::SeqCst)
    }

    pub fn compiled(&self) -> usize {
        self.compiled.load(Ordering::SeqCst)
    }
}

impl<P: CompilerPipeline> CompilerPipeline for Counting<P> {
    type Loadable = P::Loadable;

    fn generate(&self, request: &GenerateRequest<'_>) -> GenerateOutput {
        self.generated.fetch_add(1, Ordering::SeqCst);
        self.inner.generate(request)
    }

    fn compile(&self, request: &CompileRequest<'_>) -> CompileOutput<P::Loadable> {
        self.compiled.fetch_add(1, Ordering::SeqCst);
        self.inner.compile(request)
    }
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
