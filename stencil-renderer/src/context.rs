//! Per-chain render state: view bag, body stack, sections.

use std::collections::HashMap;

use stencil_core::{UsageError, Value, ViewBag};

/// Output produced ahead of time and placed later by a layout.
///
/// Bodies are captured once the child template finishes; sections are
/// rendered when they are defined. Neither holds a reference to a live sink.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Producer {
    #[default]
    Empty,
    Rendered(String),
}

impl Producer {
    pub fn as_str(&self) -> &str {
        match self {
            Producer::Empty => "",
            Producer::Rendered(text) => text,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.as_str().is_empty()
    }

    pub fn into_string(self) -> String {
        match self {
            Producer::Empty => String::new(),
            Producer::Rendered(text) => text,
        }
    }
}

impl From<String> for Producer {
    fn from(text: String) -> Self {
        Producer::Rendered(text)
    }
}

impl From<&str> for Producer {
    fn from(text: &str) -> Self {
        Producer::Rendered(text.to_owned())
    }
}

/// Producers are already-rendered markup: writing one never re-encodes it.
impl From<Producer> for Value {
    fn from(producer: Producer) -> Self {
        match producer {
            Producer::Empty => Value::Null,
            Producer::Rendered(text) => Value::Raw(text),
        }
    }
}

/// Where a render chain currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderState {
    #[default]
    Idle,
    /// A template body is running.
    Executing,
    /// A body finished and its layout is being resolved.
    LayoutChaining,
}

/// State threaded through every template of one render chain.
///
/// Owned by a single chain; never shared between concurrent renders.
#[derive(Debug, Default)]
pub struct ExecutionContext {
    view_bag: ViewBag,
    bodies: Vec<Producer>,
    sections: HashMap<String, Producer>,
    state: RenderState,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_view_bag(view_bag: ViewBag) -> Self {
        Self {
            view_bag,
            ..Self::default()
        }
    }

    pub fn view_bag(&self) -> &ViewBag {
        &self.view_bag
    }

    pub fn view_bag_mut(&mut self) -> &mut ViewBag {
        &mut self.view_bag
    }

    pub fn into_view_bag(self) -> ViewBag {
        self.view_bag
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: RenderState) {
        self.state = state;
    }

    pub fn push_body(&mut self, body: Producer) {
        self.bodies.push(body);
    }

    /// Pop the most recently captured body.
    pub fn pop_body(&mut self) -> Result<Producer, UsageError> {
        self.bodies.pop().ok_or(UsageError::EmptyBodyStack)
    }

    pub fn pending_bodies(&self) -> usize {
        self.bodies.len()
    }

    /// Drop captured bodies and sections; the view bag is kept.
    pub(crate) fn reset_chain(&mut self) {
        self.bodies.clear();
        self.sections.clear();
    }

    /// Register `producer` under `name`; each name may be defined once.
    pub fn define_section(&mut self, name: impl Into<String>, producer: Producer) -> Result<(), UsageError> {
        let name = name.into();
        if self.sections.contains_key(&name) {
            return Err(UsageError::DuplicateSection { name });
        }
        tracing::debug!("section defined: {name}");
        self.sections.insert(name, producer);
        Ok(())
    }

    pub fn is_section_defined(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }

    /// The producer registered under `name`.
    ///
    /// A missing section is an error when `required`, otherwise an empty
    /// producer.
    pub fn render_section(&self, name: &str, required: bool) -> Result<Producer, UsageError> {
        match self.sections.get(name) {
            Some(producer) => Ok(producer.clone()),
            None if required => Err(UsageError::MissingSection {
                name: name.to_owned(),
            }),
            None => Ok(Producer::Empty),
        }
    }
}
