//! Conditional HTML attribute serialization.
//!
//! A generated body turns `class="a @x b @y"` into one call with the
//! attribute's `prefix` (` class="`), `suffix` (`"`) and the value pieces in
//! source order. Each piece carries its own leading literal, which is used
//! only when an earlier piece already produced output; the first producing
//! piece is introduced by the attribute prefix instead.

use stencil_core::{Encoding, Value};

use crate::encode::{write_literal_to, write_to};

/// A value tagged with its offset in the template source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionTagged<T> {
    pub value: T,
    pub position: usize,
}

impl<T> PositionTagged<T> {
    pub fn new(value: T, position: usize) -> Self {
        Self { value, position }
    }
}

/// One literal or interpolated piece of an attribute value.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSegment<'a> {
    /// Literal text preceding the value inside the attribute.
    pub prefix: PositionTagged<&'a str>,
    pub value: PositionTagged<Value>,
    /// Write the value verbatim rather than through the encoded path.
    pub literal: bool,
}

impl<'a> AttributeSegment<'a> {
    pub fn new(prefix: PositionTagged<&'a str>, value: PositionTagged<Value>, literal: bool) -> Self {
        Self {
            prefix,
            value,
            literal,
        }
    }

    /// Static template text inside the attribute value.
    pub fn literal(prefix: &'a str, value: impl Into<Value>) -> Self {
        Self::new(PositionTagged::new(prefix, 0), PositionTagged::new(value.into(), 0), true)
    }

    /// An interpolated expression inside the attribute value.
    pub fn dynamic(prefix: &'a str, value: impl Into<Value>) -> Self {
        Self::new(PositionTagged::new(prefix, 0), PositionTagged::new(value.into(), 0), false)
    }
}

/// Write one attribute to `sink`.
///
/// - no segments: `prefix` + `suffix` (an explicitly empty value);
/// - a `false` segment drops the whole attribute;
/// - a `true` segment writes the attribute name as its value;
/// - a `null` segment is skipped together with its leading literal;
/// - if no segment produced output the attribute is omitted.
pub fn write_attribute_to(
    sink: &mut String,
    name: &str,
    prefix: PositionTagged<&str>,
    suffix: PositionTagged<&str>,
    segments: &[AttributeSegment<'_>],
    encoding: Encoding,
) {
    if segments.is_empty() {
        sink.push_str(prefix.value);
        sink.push_str(suffix.value);
        return;
    }

    // Staged so a later `false` leaves the sink untouched.
    let mut staged = String::new();
    let mut wrote_anything = false;
    for segment in segments {
        let name_value;
        let value = match &segment.value.value {
            Value::Null => continue,
            Value::Bool(false) => return,
            Value::Bool(true) => {
                name_value = Value::from(name);
                &name_value
            }
            other => other,
        };

        staged.push_str(if wrote_anything {
            segment.prefix.value
        } else {
            prefix.value
        });
        if segment.literal {
            write_literal_to(&mut staged, value);
        } else {
            write_to(&mut staged, value, encoding);
        }
        wrote_anything = true;
    }

    if wrote_anything {
        sink.push_str(&staged);
        sink.push_str(suffix.value);
    }
}
