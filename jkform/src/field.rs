//! The field tree handed to the view layer.
//!
//! Each [`Field`] bundles what a renderer needs for one location: the
//! effective schema, its [`SchemaKind`], id, ui node, data, error node and
//! array controls. A node whose schema cannot be resolved or ordered becomes
//! an [`SchemaKind::Unsupported`] placeholder carrying the error; its
//! siblings and ancestors are built normally.

use serde_json::Value;

use crate::{
    error::FormError,
    schema::{
        Context,
        definitions::RefStack,
        kind::{ArrayKind, SchemaKind, classify, item_schema},
        resolve::effective_node,
        ui::UiSchema,
    },
    state::{
        array::{ArrayField, ItemControls},
        errors::ErrorSchema,
        id::child_id,
        order::order_properties,
    },
};

/// One renderable location of the form.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Property name or array index; `None` at the root.
    pub name: Option<String>,
    pub id: String,
    pub kind: SchemaKind,
    /// The effective schema node.
    pub schema: Value,
    /// The ui-schema node, `Null` when there is none.
    pub ui_schema: Value,
    pub data: Option<Value>,
    pub errors: ErrorSchema,
    pub required: bool,
    pub title: Option<String>,
    pub description: Option<String>,
    pub help: Option<String>,
    pub widget: Option<String>,
    /// Whether an element may be appended (arrays only).
    pub can_add: bool,
    /// Controls of this element inside its parent array.
    pub controls: Option<ItemControls>,
    /// The error that turned this field into a placeholder.
    pub error: Option<FormError>,
    pub children: Vec<Field>,
}

impl Field {
    /// Direct child by property name or index.
    pub fn child(&self, name: &str) -> Option<&Field> {
        self.children
            .iter()
            .find(|c| c.name.as_deref() == Some(name))
    }

    /// Descendant at a dotted path such as `list.0.name`.
    pub fn find(&self, path: &str) -> Option<&Field> {
        path.split('.')
            .filter(|s| !s.is_empty())
            .try_fold(self, |field, name| field.child(name))
    }

    /// Label shown for the field: its title, else its name.
    pub fn label(&self) -> &str {
        self.title
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or_default()
    }
}

/// Build the field tree of `schema` for `data` and `errors`.
pub fn build_field(schema: &Value, ctx: &Context<'_>, data: &Value, errors: &ErrorSchema) -> Field {
    let mut builder = FieldBuilder {
        ctx,
        expanding: RefStack::default(),
    };
    builder.build(
        schema,
        Location {
            name: None,
            id: ctx.id_prefix.to_string(),
            ui: ctx.ui_schema,
            required: false,
            controls: None,
        },
        Some(data),
        Some(errors),
    )
}

struct Location<'a> {
    name: Option<String>,
    id: String,
    ui: UiSchema<'a>,
    required: bool,
    controls: Option<ItemControls>,
}

struct FieldBuilder<'c, 'a> {
    ctx: &'c Context<'a>,
    expanding: RefStack,
}

impl<'a> FieldBuilder<'_, 'a> {
    fn build(
        &mut self,
        schema: &Value,
        at: Location<'a>,
        data: Option<&Value>,
        errors: Option<&ErrorSchema>,
    ) -> Field {
        let descend = !self.expanding.is_unbounded(schema, data);
        let mut field = Field {
            name: at.name,
            id: at.id,
            kind: SchemaKind::Unsupported(String::new()),
            schema: schema.clone(),
            ui_schema: at.ui.node().cloned().unwrap_or(Value::Null),
            data: data.cloned(),
            errors: errors.cloned().unwrap_or_default(),
            required: at.required,
            title: at.ui.title().map(str::to_string),
            description: at.ui.description().map(str::to_string),
            help: at.ui.help().map(str::to_string),
            widget: at.ui.widget().map(str::to_string),
            can_add: false,
            controls: at.controls,
            error: None,
            children: Vec::new(),
        };

        let node = match effective_node(schema, &self.ctx.definitions, data) {
            Ok(node) => node,
            Err(e) => {
                warn!("field {} rendered as unsupported: {e}", field.id);
                return placeholder(field, e);
            }
        };

        field.kind = classify(&node, &at.ui, &self.ctx.definitions);
        field.title = field.title.or_else(|| text(&node, "title"));
        field.description = field.description.or_else(|| text(&node, "description"));
        field.schema = node;
        if let SchemaKind::Unsupported(reason) = &field.kind {
            let error = FormError::Configuration(reason.clone());
            return placeholder(field, error);
        }
        if !descend {
            return field;
        }

        let entered = self.expanding.enter(schema);
        let children = match field.kind {
            SchemaKind::Object => self.object_children(&field, at.ui, data, errors),
            SchemaKind::Array(ArrayKind::Fixed | ArrayKind::Normal) => {
                Ok(self.array_children(&mut field, at.ui, data, errors))
            }
            _ => Ok(Vec::new()),
        };
        self.expanding.leave(entered);

        match children {
            Ok(children) => {
                field.children = children;
                field
            }
            Err(e) => {
                warn!("field {} rendered as unsupported: {e}", field.id);
                placeholder(field, e)
            }
        }
    }

    fn object_children(
        &mut self,
        field: &Field,
        ui: UiSchema<'a>,
        data: Option<&Value>,
        errors: Option<&ErrorSchema>,
    ) -> crate::Result<Vec<Field>> {
        let Some(Value::Object(properties)) = field.schema.get("properties") else {
            return Ok(Vec::new());
        };
        let required: Vec<&str> = field
            .schema
            .get("required")
            .and_then(Value::as_array)
            .map(|r| r.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        let names: Vec<&str> = properties.keys().map(String::as_str).collect();
        let hint = ui.order();
        let hint: Option<Vec<&str>> = hint.as_ref().map(|h| h.iter().map(String::as_str).collect());
        let ordered = order_properties(&names, hint.as_deref())?;

        let mut children = Vec::with_capacity(ordered.len());
        for name in ordered {
            let Some(prop) = properties.get(&name) else {
                continue;
            };
            let location = Location {
                id: child_id(&field.id, &name),
                ui: ui.property(&name),
                required: required.contains(&name.as_str()),
                controls: None,
                name: Some(name.clone()),
            };
            children.push(self.build(
                prop,
                location,
                data.and_then(|d| d.get(&name)),
                errors.and_then(|e| e.get(&name)),
            ));
        }
        Ok(children)
    }

    fn array_children(
        &mut self,
        field: &mut Field,
        ui: UiSchema<'a>,
        data: Option<&Value>,
        errors: Option<&ErrorSchema>,
    ) -> Vec<Field> {
        let items = data.and_then(Value::as_array);
        let len = items.map_or(0, Vec::len);
        let ctx = self.ctx;
        let node = field.schema.clone();
        let array = ArrayField::new(&node, ui, &ctx.definitions);
        field.can_add = array.can_add(len);

        let fixed = array.fixed_len();
        let count = len.max(fixed.unwrap_or(0));
        let mut children = Vec::with_capacity(count);
        for index in 0..count {
            let Some(schema) = item_schema(&node, index) else {
                break;
            };
            let key = index.to_string();
            let location = Location {
                name: Some(key.clone()),
                id: child_id(&field.id, index),
                ui: ui.item(index, fixed),
                required: false,
                controls: Some(array.controls(index, len)),
            };
            children.push(self.build(
                schema,
                location,
                items.and_then(|i| i.get(index)),
                errors.and_then(|e| e.get(&key)),
            ));
        }
        children
    }
}

fn text(node: &Value, key: &str) -> Option<String> {
    node.get(key).and_then(Value::as_str).map(str::to_string)
}

fn placeholder(mut field: Field, error: FormError) -> Field {
    field.kind = SchemaKind::Unsupported(error.to_string());
    field.error = Some(error);
    field.children.clear();
    field
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(schema: &Value, ui: Option<&Value>, data: &Value) -> Field {
        let ctx = Context::new(schema, ui, "root");
        build_field(schema, &ctx, data, &ErrorSchema::default())
    }

    #[test]
    fn test_object_tree() {
        let schema = json!({
            "type": "object",
            "title": "Profile",
            "required": ["name"],
            "properties": {
                "name": {"type": "string"},
                "age": {"type": "integer", "title": "Age"},
                "color": {"type": "string", "enum": ["red", "blue"]}
            }
        });
        let ui = json!({
            "ui:order": ["color", "*"],
            "age": {"ui:title": "Years", "ui:help": "whole years"}
        });
        let root = fields(&schema, Some(&ui), &json!({"name": "Ann"}));
        assert_eq!(root.kind, SchemaKind::Object);
        assert_eq!(root.label(), "Profile");
        let names: Vec<_> = root.children.iter().map(|c| c.label().to_string()).collect();
        assert_eq!(names, vec!["color", "name", "Years"]);

        let name = root.child("name").unwrap();
        assert!(name.required);
        assert_eq!(name.id, "root_name");
        assert_eq!(name.data, Some(json!("Ann")));
        assert_eq!(root.child("color").unwrap().kind, SchemaKind::Enum);
        assert_eq!(root.child("age").unwrap().help.as_deref(), Some("whole years"));
    }

    #[test]
    fn test_array_controls() {
        let schema = json!({
            "type": "object",
            "properties": {
                "tags": {"type": "array", "maxItems": 2, "items": {"type": "string"}}
            }
        });
        let root = fields(&schema, None, &json!({"tags": ["a", "b"]}));
        let tags = root.child("tags").unwrap();
        assert!(!tags.can_add);
        assert_eq!(tags.children.len(), 2);
        let first = tags.find("0").unwrap();
        assert_eq!(first.id, "root_tags_0");
        let controls = first.controls.unwrap();
        assert!(!controls.move_up && controls.move_down && controls.remove);
    }

    #[test]
    fn test_errors_are_contained() {
        let schema = json!({
            "type": "object",
            "properties": {
                "broken": {"$ref": "#/definitions/missing"},
                "list": {"type": "array"},
                "ordered": {
                    "type": "object",
                    "properties": {"x": {"type": "string"}}
                },
                "fine": {"type": "boolean"}
            },
            "definitions": {}
        });
        let ui = json!({"ordered": {"ui:order": ["x", "y"]}});
        let root = fields(&schema, Some(&ui), &json!({}));

        let broken = root.child("broken").unwrap();
        assert!(matches!(broken.error, Some(FormError::Reference { .. })));
        assert_eq!(broken.kind.name(), "unsupported");

        let list = root.child("list").unwrap();
        assert!(matches!(list.error, Some(FormError::Configuration(_))));

        let ordered = root.child("ordered").unwrap();
        assert!(matches!(ordered.error, Some(FormError::Order(_))));
        assert!(ordered.children.is_empty());

        assert!(root.child("fine").unwrap().error.is_none());
        assert!(root.error.is_none());
    }

    #[test]
    fn test_recursion_follows_data() {
        let schema = json!({
            "$ref": "#/definitions/node",
            "definitions": {
                "node": {
                    "type": "object",
                    "properties": {
                        "name": {"type": "string"},
                        "child": {"$ref": "#/definitions/node"}
                    }
                }
            }
        });
        let root = fields(&schema, None, &json!({"child": {"child": {"name": "leaf"}}}));
        let leaf = root.find("child.child.name").unwrap();
        assert_eq!(leaf.id, "root_child_child_name");
        let bottom = root.find("child.child.child").unwrap();
        assert_eq!(bottom.kind, SchemaKind::Object);
        assert!(bottom.children.is_empty());
    }

    #[test]
    fn test_error_nodes() {
        let schema = json!({"type": "object", "properties": {"a": {"type": "string"}}});
        let mut errors = ErrorSchema::default();
        errors.add_error(&["a".into()], "too short");
        let ctx = Context::new(&schema, None, "root");
        let root = build_field(&schema, &ctx, &json!({"a": ""}), &errors);
        assert_eq!(root.child("a").unwrap().errors.errors, vec!["too short"]);
    }
}
