use serde_json::Value;

use crate::{
    error::{FormError, Result},
    path::unescape,
};

const DEFINITIONS_PREFIX: &str = "#/definitions/";
const DEFS_PREFIX: &str = "#/$defs/";

/// Read-only registry of named sub-schemas shared by every resolution call
/// of one form instance.
///
/// The registry borrows from the root schema, so it lives exactly as long as
/// the root schema does.
#[derive(Debug, Clone, Copy, Default)]
pub struct Definitions<'a> {
    definitions: Option<&'a Value>,
    defs: Option<&'a Value>,
}

impl<'a> Definitions<'a> {
    /// Collect `definitions` and `$defs` from a root schema.
    pub fn from_root(root: &'a Value) -> Self {
        Self {
            definitions: root.get("definitions").filter(|v| v.is_object()),
            defs: root.get("$defs").filter(|v| v.is_object()),
        }
    }

    /// Build a registry from a bare `name -> schema` mapping, addressed
    /// through `#/definitions/<name>`.
    pub fn new(definitions: &'a Value) -> Self {
        Self {
            definitions: Some(definitions),
            defs: None,
        }
    }

    /// Look up the schema a `$ref` points to.
    ///
    /// Path-style references such as `#/definitions/node/properties/name`
    /// are walked segment by segment. When a segment lands on a schema that
    /// is itself a `$ref`, that reference is followed before continuing.
    pub fn find(&self, reference: &str) -> Result<&'a Value> {
        let mut chain = vec![reference.to_string()];
        self.find_in_chain(reference, &mut chain)
    }

    fn find_in_chain(&self, reference: &str, chain: &mut Vec<String>) -> Result<&'a Value> {
        let (registry, path) = if let Some(path) = reference.strip_prefix(DEFINITIONS_PREFIX) {
            (self.definitions, path)
        } else if let Some(path) = reference.strip_prefix(DEFS_PREFIX) {
            (self.defs, path)
        } else {
            return Err(FormError::reference(
                reference,
                "only local #/definitions/ and #/$defs/ references are supported",
            ));
        };

        let registry =
            registry.ok_or_else(|| FormError::reference(reference, "no definitions registry"))?;

        if path.is_empty() {
            return Err(FormError::reference(reference, "empty definition path"));
        }

        let mut current = registry;
        for part in path.split('/') {
            let part = unescape(part);
            while let Some(next) = ref_of(current) {
                if chain.iter().any(|r| r == next) {
                    return Err(FormError::reference(next, "circular reference"));
                }
                chain.push(next.to_string());
                current = self.find_in_chain(next, chain)?;
            }
            current = match current {
                Value::Object(map) => map.get(&part),
                Value::Array(items) => part.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            }
            .ok_or_else(|| FormError::reference(reference, format!("missing segment `{part}`")))?;
        }
        Ok(current)
    }
}

/// The `$ref` string of a schema node, if any.
pub fn ref_of(schema: &Value) -> Option<&str> {
    schema.get("$ref").and_then(Value::as_str)
}

/// References currently being expanded along one descent path.
///
/// A reference that is already on the stack, met again at a location with
/// no data, marks the point where a recursive schema stops being unfolded.
#[derive(Debug, Default)]
pub(crate) struct RefStack(Vec<String>);

impl RefStack {
    /// Whether expanding `schema` here would unfold a recursion with no data
    /// to bound it.
    pub fn is_unbounded(&self, schema: &Value, data: Option<&Value>) -> bool {
        data.is_none() && ref_of(schema).is_some_and(|r| self.0.iter().any(|s| s == r))
    }

    /// Push the schema's reference, returning whether anything was pushed.
    pub fn enter(&mut self, schema: &Value) -> bool {
        match ref_of(schema) {
            Some(r) => {
                self.0.push(r.to_string());
                true
            }
            None => false,
        }
    }

    pub fn leave(&mut self, entered: bool) {
        if entered {
            self.0.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_find_simple() {
        let root = json!({"definitions": {"testdef": {"type": "string"}}});
        let defs = Definitions::from_root(&root);
        assert_eq!(
            defs.find("#/definitions/testdef").unwrap(),
            &json!({"type": "string"})
        );
    }

    #[test]
    fn test_find_deep_path() {
        let root = json!({
            "definitions": {
                "testdef": {
                    "type": "object",
                    "properties": {"bar": {"type": "string"}}
                }
            }
        });
        let defs = Definitions::from_root(&root);
        assert_eq!(
            defs.find("#/definitions/testdef/properties/bar").unwrap(),
            &json!({"type": "string"})
        );
    }

    #[test]
    fn test_find_through_intermediate_ref() {
        let root = json!({
            "definitions": {
                "alias": {"$ref": "#/definitions/target"},
                "target": {"properties": {"x": {"type": "integer"}}}
            }
        });
        let defs = Definitions::from_root(&root);
        assert_eq!(
            defs.find("#/definitions/alias/properties/x").unwrap(),
            &json!({"type": "integer"})
        );
    }

    #[test]
    fn test_find_dollar_defs() {
        let root = json!({"$defs": {"Level": {"enum": ["a", "b"]}}});
        let defs = Definitions::from_root(&root);
        assert!(defs.find("#/$defs/Level").is_ok());
        assert!(defs.find("#/definitions/Level").is_err());
    }

    #[test]
    fn test_find_missing() {
        let root = json!({"definitions": {}});
        let defs = Definitions::from_root(&root);
        let err = defs.find("#/definitions/missing").unwrap_err();
        assert!(matches!(err, FormError::Reference { .. }));
    }

    #[test]
    fn test_find_remote_unsupported() {
        let defs = Definitions::default();
        assert!(defs.find("https://example.com/schema.json").is_err());
    }

    #[test]
    fn test_ref_stack() {
        let schema = json!({"$ref": "#/definitions/node"});
        let mut stack = RefStack::default();
        assert!(!stack.is_unbounded(&schema, None));
        let entered = stack.enter(&schema);
        assert!(stack.is_unbounded(&schema, None));
        assert!(!stack.is_unbounded(&schema, Some(&json!({}))));
        stack.leave(entered);
        assert!(!stack.is_unbounded(&schema, None));
    }
}
