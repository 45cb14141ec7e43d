//! Field classification: which logical field kind renders a schema node.

use serde_json::Value;

use crate::schema::{
    definitions::Definitions,
    resolve::resolve_node,
    ui::UiSchema,
};

/// Logical field kind of a resolved schema node.
///
/// Computed once per node and handed to the view layer; consumers never
/// re-derive it from the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaKind {
    Object,
    Array(ArrayKind),
    /// Single choice among `enum` values.
    Enum,
    /// A string carrying an encoded file (`format: data-url`).
    File,
    Scalar(ScalarKind),
    /// The node cannot be rendered; the reason is shown by a placeholder.
    Unsupported(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayKind {
    /// `items` is a list of per-position schemas.
    Fixed,
    /// Array of encoded files.
    Files,
    /// Set of `enum` values chosen at once.
    MultiSelect,
    Normal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    String,
    Number,
    Integer,
    Boolean,
    Null,
}

impl SchemaKind {
    /// Name used to look up a renderer for this kind.
    pub fn name(&self) -> &'static str {
        match self {
            SchemaKind::Object => "object",
            SchemaKind::Array(ArrayKind::Fixed | ArrayKind::Normal) => "array",
            SchemaKind::Array(ArrayKind::Files) => "files",
            SchemaKind::Array(ArrayKind::MultiSelect) | SchemaKind::Enum => "select",
            SchemaKind::File => "file",
            SchemaKind::Scalar(ScalarKind::String) => "string",
            SchemaKind::Scalar(ScalarKind::Number | ScalarKind::Integer) => "number",
            SchemaKind::Scalar(ScalarKind::Boolean) => "boolean",
            SchemaKind::Scalar(ScalarKind::Null) => "null",
            SchemaKind::Unsupported(_) => "unsupported",
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(
            self,
            SchemaKind::Object | SchemaKind::Array(ArrayKind::Fixed | ArrayKind::Normal)
        )
    }
}

/// The JSON type of a schema node, guessed from its keywords when `type` is
/// absent. For a list of types the first non-`null` one wins.
pub fn schema_type(schema: &Value) -> Option<&str> {
    match schema.get("type") {
        Some(Value::String(ty)) => return Some(ty.as_str()),
        Some(Value::Array(types)) => {
            let types: Vec<&str> = types.iter().filter_map(Value::as_str).collect();
            return types
                .iter()
                .copied()
                .find(|t| *t != "null")
                .or_else(|| types.first().copied());
        }
        _ => {}
    }
    if let Some(value) = schema.get("const") {
        return json_type(value);
    }
    if schema.get("properties").is_some() || schema.get("additionalProperties").is_some() {
        return Some("object");
    }
    if schema.get("items").is_some() {
        return Some("array");
    }
    None
}

fn json_type(value: &Value) -> Option<&'static str> {
    Some(match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    })
}

/// Whether `items` is a list of per-position schemas.
pub fn is_fixed_items(schema: &Value) -> bool {
    schema
        .get("items")
        .and_then(Value::as_array)
        .is_some_and(|items| items.iter().all(Value::is_object))
}

/// Whether a tuple array accepts elements past its fixed positions.
pub fn allows_additional_items(schema: &Value) -> bool {
    schema.get("additionalItems").is_some_and(Value::is_object)
        || schema.get("additionalItems") == Some(&Value::Bool(true))
}

/// Schema of array element `index`: the tuple position, `additionalItems`
/// past the tuple, or the single `items` schema.
pub fn item_schema(schema: &Value, index: usize) -> Option<&Value> {
    match schema.get("items")? {
        Value::Array(items) => items.get(index).or_else(|| {
            schema
                .get("additionalItems")
                .filter(|_| allows_additional_items(schema))
        }),
        items => Some(items),
    }
}

fn is_file_schema(schema: &Value) -> bool {
    schema.get("format").and_then(Value::as_str) == Some("data-url")
}

/// Classify a resolved schema node.
///
/// Arrays are checked in order: fixed tuple, files, multi-select, plain.
pub fn classify(schema: &Value, ui: &UiSchema<'_>, definitions: &Definitions<'_>) -> SchemaKind {
    let ty = schema_type(schema);
    match ty {
        Some("object") => SchemaKind::Object,
        Some("array") => classify_array(schema, ui, definitions),
        _ if schema.get("enum").is_some() => SchemaKind::Enum,
        Some("string") if is_file_schema(schema) || ui.widget() == Some("file") => {
            SchemaKind::File
        }
        Some("string") => SchemaKind::Scalar(ScalarKind::String),
        Some("number") => SchemaKind::Scalar(ScalarKind::Number),
        Some("integer") => SchemaKind::Scalar(ScalarKind::Integer),
        Some("boolean") => SchemaKind::Scalar(ScalarKind::Boolean),
        Some("null") => SchemaKind::Scalar(ScalarKind::Null),
        Some(other) => SchemaKind::Unsupported(format!("Unknown field type {other}")),
        None => SchemaKind::Unsupported("Unknown field type".to_string()),
    }
}

fn classify_array(schema: &Value, ui: &UiSchema<'_>, definitions: &Definitions<'_>) -> SchemaKind {
    let Some(items) = schema.get("items") else {
        return SchemaKind::Unsupported("Missing items definition".to_string());
    };
    if is_fixed_items(schema) {
        return SchemaKind::Array(ArrayKind::Fixed);
    }
    let items = resolve_node(items, definitions, None).unwrap_or_else(|_| items.clone());
    if ui.widget() == Some("files") || is_file_schema(&items) {
        return SchemaKind::Array(ArrayKind::Files);
    }
    let unique = schema.get("uniqueItems").and_then(Value::as_bool) == Some(true);
    let hinted = matches!(ui.widget(), Some("checkboxes" | "multiselect"));
    if items.get("enum").is_some() && (unique || hinted) {
        return SchemaKind::Array(ArrayKind::MultiSelect);
    }
    SchemaKind::Array(ArrayKind::Normal)
}
