//! Value write path: turns [`Value`]s into sink text.

use std::borrow::Cow;

use stencil_core::{Encoding, Value};

/// HTML-encode `text`, borrowing when nothing needs escaping.
pub fn html_encode(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 16);
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    Cow::Owned(out)
}

fn display_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::Null => Cow::Borrowed(""),
        Value::Str(s) | Value::Raw(s) => Cow::Borrowed(s),
        other => Cow::Owned(other.to_string()),
    }
}

/// Write `value` through the encoded path.
///
/// `Null` writes nothing and `Raw` markup is written verbatim. Everything
/// else is converted to display text and HTML-encoded unless `encoding` is
/// [`Encoding::Raw`].
pub fn write_to(sink: &mut String, value: &Value, encoding: Encoding) {
    match (value, encoding) {
        (Value::Null, _) => {}
        (Value::Raw(markup), _) => sink.push_str(markup),
        (_, Encoding::Raw) => sink.push_str(&display_text(value)),
        (_, Encoding::Html) => sink.push_str(&html_encode(&display_text(value))),
    }
}

/// Write `value` verbatim. For text already known to be safe.
pub fn write_literal_to(sink: &mut String, value: &Value) {
    sink.push_str(&display_text(value));
}
