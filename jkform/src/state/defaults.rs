//! Default form state: schema-declared defaults merged with existing data.

use serde_json::{Map, Value};

use crate::schema::{
    definitions::{Definitions, RefStack},
    kind::{is_fixed_items, item_schema, schema_type},
    resolve::effective_node,
};

/// Re-resolution passes for an object whose filled values switch
/// `dependencies` branches.
const MAX_OBJECT_PASSES: usize = 3;

/// Compute the default value of `schema`, merged with `existing` data.
///
/// Returns `None` ("undefined") when the schema yields no value. Never
/// fails: a node that cannot be resolved keeps its existing data.
///
/// Applying the function to its own output returns that output unchanged.
pub fn compute_default(
    schema: &Value,
    existing: Option<&Value>,
    definitions: &Definitions<'_>,
) -> Option<Value> {
    let mut builder = DefaultBuilder {
        definitions,
        expanding: RefStack::default(),
    };
    builder.compute(schema, existing)
}

struct DefaultBuilder<'d, 'a> {
    definitions: &'d Definitions<'a>,
    expanding: RefStack,
}

impl DefaultBuilder<'_, '_> {
    fn compute(&mut self, schema: &Value, existing: Option<&Value>) -> Option<Value> {
        if self.expanding.is_unbounded(schema, existing) {
            return None;
        }
        let node = match effective_node(schema, self.definitions, existing) {
            Ok(node) => node,
            Err(e) => {
                warn!("no default computed: {e}");
                return existing.cloned();
            }
        };

        let entered = self.expanding.enter(schema);
        let value = self.compute_resolved(schema, node, existing);
        self.expanding.leave(entered);
        value
    }

    fn compute_resolved(
        &mut self,
        schema: &Value,
        node: Value,
        existing: Option<&Value>,
    ) -> Option<Value> {
        let base = existing.cloned().or_else(|| node.get("default").cloned());
        match schema_type(&node) {
            Some("object") => self.object_default(schema, node, base),
            Some("array") => self.array_default(&node, base),
            _ => base.or_else(|| {
                node.get("enum")
                    .and_then(Value::as_array)
                    .and_then(|options| options.first())
                    .cloned()
            }),
        }
    }

    fn object_default(
        &mut self,
        schema: &Value,
        mut node: Value,
        base: Option<Value>,
    ) -> Option<Value> {
        let mut base = match base {
            None => None,
            Some(Value::Object(map)) => Some(map),
            Some(other) => return Some(other),
        };

        let mut passes = 0;
        loop {
            let filled = self.fill_object(&node, base.as_ref());
            passes += 1;
            if passes >= MAX_OBJECT_PASSES {
                return Some(filled);
            }
            let next = match effective_node(schema, self.definitions, Some(&filled)) {
                Ok(next) => next,
                Err(_) => return Some(filled),
            };
            if next == node {
                return Some(filled);
            }
            trace!("defaults changed the active dependencies, refilling");
            node = next;
            base = match filled {
                Value::Object(map) => Some(map),
                _ => None,
            };
        }
    }

    fn fill_object(&mut self, node: &Value, base: Option<&Map<String, Value>>) -> Value {
        let required: Vec<&str> = node
            .get("required")
            .and_then(Value::as_array)
            .map(|r| r.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        let mut filled = Map::new();
        if let Some(Value::Object(properties)) = node.get("properties") {
            for (name, prop) in properties {
                let existing = base.and_then(|b| b.get(name));
                match self.compute(prop, existing) {
                    Some(value) => {
                        filled.insert(name.clone(), value);
                    }
                    None if required.contains(&name.as_str()) => {
                        filled.insert(name.clone(), Value::Null);
                    }
                    None => {}
                }
            }
        }
        if let Some(base) = base {
            for (name, value) in base {
                if !filled.contains_key(name) {
                    filled.insert(name.clone(), value.clone());
                }
            }
        }
        Value::Object(filled)
    }

    fn array_default(&mut self, node: &Value, base: Option<Value>) -> Option<Value> {
        match base {
            Some(Value::Array(items)) => {
                let filled = items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| match item_schema(node, i) {
                        Some(schema) => self.compute(schema, Some(item)).unwrap_or(Value::Null),
                        None => item.clone(),
                    })
                    .collect();
                Some(Value::Array(filled))
            }
            Some(other) => Some(other),
            None => {
                let mut items = Vec::new();
                if is_fixed_items(node)
                    && let Some(Value::Array(positions)) = node.get("items")
                {
                    for position in positions {
                        items.push(self.compute(position, None).unwrap_or(Value::Null));
                    }
                }
                let min_items = node
                    .get("minItems")
                    .and_then(Value::as_u64)
                    .unwrap_or(0) as usize;
                while items.len() < min_items {
                    let Some(schema) = item_schema(node, items.len()) else {
                        break;
                    };
                    let value = self.compute(schema, None).unwrap_or(Value::Null);
                    items.push(value);
                }
                Some(Value::Array(items))
            }
        }
    }
}
