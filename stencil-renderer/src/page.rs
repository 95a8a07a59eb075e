//! The callback surface a compiled body renders through.

use std::any::Any;
use std::mem;

use stencil_core::{Encoding, Model, TemplateError, UsageError, Value, ViewBag};

use crate::attribute::{write_attribute_to, AttributeSegment, PositionTagged};
use crate::context::{ExecutionContext, Producer};
use crate::encode::{write_literal_to, write_to};
use crate::instance::TemplateInstance;

/// One executing template: its output sink plus access to the chain's
/// [`ExecutionContext`].
pub struct TemplatePage<'a> {
    instance: &'a TemplateInstance,
    context: &'a mut ExecutionContext,
    output: String,
    layout: Option<String>,
}

impl<'a> TemplatePage<'a> {
    pub(crate) fn new(instance: &'a TemplateInstance, context: &'a mut ExecutionContext) -> Self {
        Self {
            instance,
            context,
            output: String::new(),
            layout: instance.layout().map(str::to_owned),
        }
    }

    /// Captured output and the layout the body asked for.
    pub(crate) fn finish(self) -> (String, Option<String>) {
        (self.output, self.layout)
    }

    fn encoding(&self) -> Encoding {
        self.instance.engine().config().encoding
    }

    // -----------------------------------------------------------------------
    // Output
    // -----------------------------------------------------------------------

    /// Write a value through the encoded path.
    pub fn write(&mut self, value: impl Into<Value>) {
        let encoding = self.encoding();
        write_to(&mut self.output, &value.into(), encoding);
    }

    /// Write template text verbatim.
    pub fn write_literal(&mut self, value: impl Into<Value>) {
        write_literal_to(&mut self.output, &value.into());
    }

    /// Write one conditional attribute. See [`write_attribute_to`].
    pub fn write_attribute(
        &mut self,
        name: &str,
        prefix: PositionTagged<&str>,
        suffix: PositionTagged<&str>,
        segments: &[AttributeSegment<'_>],
    ) {
        let encoding = self.encoding();
        write_attribute_to(&mut self.output, name, prefix, suffix, segments, encoding);
    }

    /// Mark `markup` as pre-rendered.
    pub fn raw(&self, markup: impl Into<String>) -> Value {
        Value::raw(markup)
    }

    /// Text written so far by this template.
    pub fn output(&self) -> &str {
        &self.output
    }

    // -----------------------------------------------------------------------
    // Layouts, bodies, sections
    // -----------------------------------------------------------------------

    /// Render this template inside the layout called `name` once the body
    /// completes.
    pub fn set_layout(&mut self, name: impl Into<String>) {
        self.layout = Some(name.into());
    }

    pub fn layout(&self) -> Option<&str> {
        self.layout.as_deref()
    }

    /// The captured body of the template this layout wraps.
    pub fn render_body(&mut self) -> Result<Producer, TemplateError> {
        Ok(self.context.pop_body()?)
    }

    pub fn define_section(&mut self, name: impl Into<String>, producer: impl Into<Producer>) -> Result<(), TemplateError> {
        Ok(self.context.define_section(name, producer.into())?)
    }

    /// Define a section by rendering `body` into a scratch buffer now.
    pub fn define_section_with<F>(&mut self, name: impl Into<String>, body: F) -> Result<(), TemplateError>
    where
        F: FnOnce(&mut Self) -> Result<(), TemplateError>,
    {
        let name = name.into();
        if self.context.is_section_defined(&name) {
            return Err(UsageError::DuplicateSection { name }.into());
        }
        let saved = mem::take(&mut self.output);
        let result = body(self);
        let rendered = mem::replace(&mut self.output, saved);
        result?;
        self.define_section(name, Producer::Rendered(rendered))
    }

    pub fn render_section(&self, name: &str, required: bool) -> Result<Producer, TemplateError> {
        Ok(self.context.render_section(name, required)?)
    }

    pub fn is_section_defined(&self, name: &str) -> bool {
        self.context.is_section_defined(name)
    }

    /// Render the template called `name` in its own context, seeded with a
    /// copy of this chain's view bag.
    pub fn include(&self, name: &str, model: Model) -> Result<Producer, TemplateError> {
        let instance = self
            .instance
            .engine()
            .find_template(name)?
            .ok_or_else(|| UsageError::TemplateNotFound { name: name.to_owned() })?;
        let mut context = ExecutionContext::with_view_bag(self.context.view_bag().clone());
        Ok(Producer::Rendered(instance.run(model, &mut context)?))
    }

    // -----------------------------------------------------------------------
    // Model and view bag
    // -----------------------------------------------------------------------

    pub fn model(&self) -> &Model {
        self.instance.model()
    }

    /// The typed model, or `ModelTypeMismatch` if it is not a `T`.
    pub fn typed_model<T: Any>(&self) -> Result<&T, TemplateError> {
        let model = self.instance.model();
        model.downcast_ref::<T>().ok_or_else(|| {
            UsageError::ModelTypeMismatch {
                expected: std::any::type_name::<T>().to_owned(),
                found: model.model_type().name().to_owned(),
            }
            .into()
        })
    }

    /// Field of a dynamic model.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.instance.model().field(name)
    }

    pub fn view_bag(&self) -> &ViewBag {
        self.context.view_bag()
    }

    pub fn view_bag_mut(&mut self) -> &mut ViewBag {
        self.context.view_bag_mut()
    }

    pub fn instance(&self) -> &TemplateInstance {
        self.instance
    }
}
