//! Identifier paths for every location of a resolved schema.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::{
    Context,
    definitions::RefStack,
    kind::{is_fixed_items, item_schema, schema_type},
    resolve::effective_node,
};

/// Separator between an ancestor's identifier and a child segment.
pub const ID_SEPARATOR: &str = "_";

/// Tree of identifiers mirroring the resolved schema's shape.
///
/// Serializes as `{"$id": "root", "name": {"$id": "root_name"}}`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IdSchema {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(flatten)]
    pub children: IndexMap<String, IdSchema>,
}

impl IdSchema {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            children: IndexMap::new(),
        }
    }

    /// Child node for a property name or array index.
    pub fn get(&self, key: &str) -> Option<&IdSchema> {
        self.children.get(key)
    }

    /// All identifiers, depth first, parents before children.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids = vec![self.id.as_str()];
        for child in self.children.values() {
            ids.extend(child.ids());
        }
        ids
    }
}

/// Identifier of the child `segment` of the node identified by `parent`.
pub fn child_id(parent: &str, segment: impl std::fmt::Display) -> String {
    format!("{parent}{ID_SEPARATOR}{segment}")
}

/// Build the id tree of `schema` for `data`.
///
/// The node is identified by `id` when given (e.g. an array element whose
/// identifier was derived by its parent), otherwise by the context's prefix.
/// Object properties and array elements present in `data` (plus every
/// tuple position) get children; nodes that cannot be resolved get none.
pub fn build_id_schema(
    schema: &Value,
    id: Option<&str>,
    ctx: &Context<'_>,
    data: Option<&Value>,
) -> IdSchema {
    let mut builder = IdBuilder {
        ctx,
        expanding: RefStack::default(),
    };
    builder.build(schema, id.unwrap_or(ctx.id_prefix).to_string(), data)
}

struct IdBuilder<'c, 'a> {
    ctx: &'c Context<'a>,
    expanding: RefStack,
}

impl IdBuilder<'_, '_> {
    fn build(&mut self, schema: &Value, id: String, data: Option<&Value>) -> IdSchema {
        let mut id_schema = IdSchema::new(id);
        if self.expanding.is_unbounded(schema, data) {
            return id_schema;
        }
        let node = match effective_node(schema, &self.ctx.definitions, data) {
            Ok(node) => node,
            Err(e) => {
                debug!("{} gets no children: {e}", id_schema.id);
                return id_schema;
            }
        };

        let entered = self.expanding.enter(schema);
        match schema_type(&node) {
            Some("object") => {
                if let Some(Value::Object(properties)) = node.get("properties") {
                    for (name, prop) in properties {
                        let child = self.build(
                            prop,
                            child_id(&id_schema.id, name),
                            data.and_then(|d| d.get(name)),
                        );
                        id_schema.children.insert(name.clone(), child);
                    }
                }
            }
            Some("array") => {
                let items = data.and_then(Value::as_array);
                let data_len = items.map_or(0, Vec::len);
                let fixed_len = if is_fixed_items(&node) {
                    node.get("items").and_then(Value::as_array).map_or(0, Vec::len)
                } else {
                    0
                };
                for index in 0..data_len.max(fixed_len) {
                    let Some(item) = item_schema(&node, index) else {
                        break;
                    };
                    let child = self.build(
                        item,
                        child_id(&id_schema.id, index),
                        items.and_then(|i| i.get(index)),
                    );
                    id_schema.children.insert(index.to_string(), child);
                }
            }
            _ => {}
        }
        self.expanding.leave(entered);
        id_schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ids(schema: &Value, prefix: &str, data: Option<&Value>) -> IdSchema {
        let ctx = Context::new(schema, None, prefix);
        build_id_schema(schema, None, &ctx, data)
    }

    #[test]
    fn test_prefix_and_properties() {
        let schema = json!({
            "type": "object",
            "properties": {
                "count": {"type": "number"},
                "nested": {"type": "object", "properties": {"deep": {"type": "string"}}}
            }
        });
        let tree = ids(&schema, "rjsf", None);
        assert_eq!(tree.ids(), vec!["rjsf", "rjsf_count", "rjsf_nested", "rjsf_nested_deep"]);
        assert_eq!(
            serde_json::to_value(&tree).unwrap(),
            json!({
                "$id": "rjsf",
                "count": {"$id": "rjsf_count"},
                "nested": {"$id": "rjsf_nested", "deep": {"$id": "rjsf_nested_deep"}}
            })
        );
    }

    #[test]
    fn test_array_indices() {
        let schema = json!({
            "type": "object",
            "properties": {
                "list": {
                    "type": "array",
                    "items": {"type": "object", "properties": {"name": {"type": "string"}}}
                }
            }
        });
        let data = json!({"list": [{"name": "a"}, {}]});
        let tree = ids(&schema, "root", Some(&data));
        let list = tree.get("list").unwrap();
        assert_eq!(list.get("1").unwrap().get("name").unwrap().id, "root_list_1_name");
        assert!(ids(&schema, "root", None).get("list").unwrap().children.is_empty());
    }

    #[test]
    fn test_fixed_positions_without_data() {
        let schema = json!({"type": "array", "items": [{"type": "string"}, {"type": "number"}]});
        let tree = ids(&schema, "root", None);
        assert_eq!(tree.ids(), vec!["root", "root_0", "root_1"]);
    }

    #[test]
    fn test_follows_dependency_branch() {
        let schema = json!({
            "type": "object",
            "properties": {"a": {"type": "string", "enum": ["int", "bool"]}},
            "dependencies": {
                "a": {
                    "oneOf": [
                        {"properties": {"a": {"enum": ["int"]}}},
                        {"properties": {"a": {"enum": ["bool"]}, "b": {"type": "boolean"}}}
                    ]
                }
            }
        });
        let tree = ids(&schema, "root", Some(&json!({"a": "int"})));
        assert_eq!(
            serde_json::to_value(&tree).unwrap(),
            json!({"$id": "root", "a": {"$id": "root_a"}})
        );
        let tree = ids(&schema, "root", Some(&json!({"a": "bool"})));
        assert_eq!(
            serde_json::to_value(&tree).unwrap(),
            json!({"$id": "root", "a": {"$id": "root_a"}, "b": {"$id": "root_b"}})
        );
    }

    #[test]
    fn test_recursive_and_broken_refs() {
        let schema = json!({
            "$ref": "#/definitions/node",
            "definitions": {
                "node": {
                    "type": "object",
                    "properties": {
                        "name": {"type": "string"},
                        "next": {"$ref": "#/definitions/node"},
                        "broken": {"$ref": "#/definitions/missing"}
                    }
                }
            }
        });
        let tree = ids(&schema, "root", Some(&json!({"next": {}})));
        assert_eq!(
            tree.ids(),
            vec![
                "root",
                "root_name",
                "root_next",
                "root_next_name",
                "root_next_next",
                "root_next_broken",
                "root_broken"
            ]
        );
    }

    #[test]
    fn test_explicit_id() {
        let schema = json!({"type": "object", "properties": {"x": {"type": "string"}}});
        let ctx = Context::default();
        let tree = build_id_schema(&schema, Some("root_items_3"), &ctx, None);
        assert_eq!(tree.get("x").unwrap().id, "root_items_3_x");
    }
}
