//! Instance-document XML rendering: renders a stored back-end instance document (an opaque
//! JSON value) as XML, one element per JSON key, with attribute-style emission permanently
//! disabled and the `@`→`__` tag-rewrite quirk preserved for wire compatibility with
//! existing clients.
//!
//! There is no general-purpose crate for this particular quirky transform, so it is hand
//! rolled the way the rest of this workspace hand-rolls its other small string-assembly
//! passes (cf. `z2folio-query::assemble`).

use serde_json::Value as JsonValue;

/// The synthetic root element wrapping a rendered instance document. The instance JSON
/// object itself has no single enclosing tag name, but XML requires exactly one root
/// element, so every rendered record is wrapped in `<instance>...</instance>`.
const ROOT_TAG: &str = "instance";

/// Render a stored instance document as XML.
pub fn render_instance(value: &JsonValue) -> String {
    let mut out = String::new();
    render_element(ROOT_TAG, value, &mut out);
    out
}

/// Rewrites a tag beginning with `@` to begin with `__` instead, in both open and close
/// forms.
fn rewrite_tag(tag: &str) -> std::borrow::Cow<'_, str> {
    match tag.strip_prefix('@') {
        Some(rest) => std::borrow::Cow::Owned(format!("__{rest}")),
        None => std::borrow::Cow::Borrowed(tag),
    }
}

fn render_element(tag: &str, value: &JsonValue, out: &mut String) {
    let tag = rewrite_tag(tag);
    match value {
        // Arrays have no element of their own; each item is rendered as a sibling element
        // under the same (rewritten) tag name.
        JsonValue::Array(items) => {
            for item in items {
                render_element(&tag, item, out);
            }
        }
        JsonValue::Object(map) => {
            out.push('<');
            out.push_str(&tag);
            out.push('>');
            for (key, child) in map {
                render_element(key, child, out);
            }
            out.push_str("</");
            out.push_str(&tag);
            out.push('>');
        }
        // A null-valued key renders as an empty element, never omitted.
        JsonValue::Null => {
            out.push('<');
            out.push_str(&tag);
            out.push_str("></");
            out.push_str(&tag);
            out.push('>');
        }
        JsonValue::String(s) => render_text_element(&tag, s, out),
        JsonValue::Bool(b) => render_text_element(&tag, &b.to_string(), out),
        JsonValue::Number(n) => render_text_element(&tag, &n.to_string(), out),
    }
}

fn render_text_element(tag: &str, text: &str, out: &mut String) {
    out.push('<');
    out.push_str(tag);
    out.push('>');
    escape_text(text, out);
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

/// Escapes the characters XML text content cannot contain literally. No XML attributes are
/// ever emitted, so quote characters need no special handling here.
fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}
