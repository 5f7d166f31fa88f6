//! Lenient model of a notification payload.
//!
//! The producer's payload shape is not contractually stable, so nothing here
//! is deserialized with a strict schema. The JSON is walked by hand and every
//! missing or mistyped piece is skipped rather than failing the whole body.
//!
//! ```text
//! { "embeds": [ { "title"?, "description"?, "fields"?: [ { "name", "value" } ] } ] }
//! ```

use serde_json::Value;

/// A single `{name, value}` pair from an embed's field list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
}

/// A semi-structured block within a notification payload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Embed {
    pub title: Option<String>,
    pub description: Option<String>,
    pub fields: Vec<EmbedField>,
}

impl Embed {
    /// Reads an embed from a JSON value.
    ///
    /// Returns `None` only if the value is not an object. Non-text titles and
    /// descriptions are dropped; fields with neither a name nor a value are
    /// dropped.
    pub fn from_value(value: &Value) -> Option<Embed> {
        let object = value.as_object()?;

        let fields = object
            .get("fields")
            .and_then(Value::as_array)
            .map(|fields| fields.iter().filter_map(field_from_value).collect())
            .unwrap_or_default();

        Some(Embed {
            title: object.get("title").and_then(as_text),
            description: object.get("description").and_then(as_text),
            fields,
        })
    }

    /// Concatenates title, description and every field into one searchable text.
    ///
    /// Fields are rendered as `name: value`, one per line.
    pub fn search_text(&self) -> String {
        let mut text = String::new();
        if let Some(title) = &self.title {
            text.push_str(title);
            text.push('\n');
        }
        if let Some(description) = &self.description {
            text.push_str(description);
            text.push('\n');
        }
        for field in &self.fields {
            text.push_str(&field.name);
            text.push_str(": ");
            text.push_str(&field.value);
            text.push('\n');
        }
        text
    }
}

/// Reads the `embeds` list from a payload body.
///
/// A body without an `embeds` array yields no embeds.
pub fn embeds_from_body(body: &Value) -> Vec<Embed> {
    body.get("embeds")
        .and_then(Value::as_array)
        .map(|embeds| embeds.iter().filter_map(Embed::from_value).collect())
        .unwrap_or_default()
}

fn field_from_value(value: &Value) -> Option<EmbedField> {
    let object = value.as_object()?;
    let name = object.get("name").and_then(as_text);
    let value = object.get("value").and_then(as_text);
    if name.is_none() && value.is_none() {
        return None;
    }
    Some(EmbedField {
        name: name.unwrap_or_default(),
        value: value.unwrap_or_default(),
    })
}

/// Accepts strings as-is and renders numbers and booleans as text.
fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
