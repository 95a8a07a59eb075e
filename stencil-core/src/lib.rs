//! Stencil core library: values, models, diagnostics, errors, configuration.
//!
//! Public API surface:
//! - [`types`]: [`Value`], [`Model`], [`ModelType`], [`ViewBag`]
//! - [`error`]: [`TemplateError`], [`UsageError`], [`Diagnostic`], [`ConfigError`]
//! - [`config`]: [`EngineConfig`] and its YAML loader

pub mod config;
pub mod error;
pub mod types;

pub use config::{Encoding, EngineConfig, FailurePolicy};
pub use error::{ConfigError, Diagnostic, TemplateError, UsageError};
pub use types::{FromValue, Model, ModelType, TypedModel, Value, ViewBag};
