//! `$ref`, `dependencies` and combinator resolution against a data value.

use serde_json::{Map, Value};

use crate::{
    error::{FormError, Result},
    schema::definitions::{Definitions, RefStack, ref_of},
};

/// Resolve a schema into a concrete node relative to `data`.
///
/// The node's own `$ref` and `dependencies` are resolved, then `properties`
/// and tuple `items` are resolved recursively with the matching slice of
/// `data`. A single `items` schema and `additionalItems` apply to every
/// element alike, so they are kept as written; per-element resolution is
/// left to the caller.
///
/// Only a failure on the node itself is returned as an error. Nested
/// references that cannot be resolved are left in place so that the
/// failure stays contained to that location.
pub fn resolve_schema(
    schema: &Value,
    definitions: &Definitions<'_>,
    data: Option<&Value>,
) -> Result<Value> {
    let mut resolver = Resolver {
        definitions,
        expanding: RefStack::default(),
    };
    resolver.resolve(schema, data)
}

struct Resolver<'d, 'a> {
    definitions: &'d Definitions<'a>,
    expanding: RefStack,
}

impl Resolver<'_, '_> {
    fn resolve(&mut self, schema: &Value, data: Option<&Value>) -> Result<Value> {
        if !schema.is_object() {
            return Ok(schema.clone());
        }
        if self.expanding.is_unbounded(schema, data) {
            trace!("leaving recursive {:?} unexpanded", ref_of(schema));
            return Ok(schema.clone());
        }

        let node = resolve_node(schema, self.definitions, data)?;
        let entered = self.expanding.enter(schema);
        let resolved = self.resolve_children(node, data);
        self.expanding.leave(entered);
        Ok(resolved)
    }

    fn resolve_nested(&mut self, schema: &Value, data: Option<&Value>) -> Value {
        match self.resolve(schema, data) {
            Ok(v) => v,
            Err(e) => {
                warn!("keeping nested schema unresolved: {e}");
                schema.clone()
            }
        }
    }

    fn resolve_children(&mut self, node: Value, data: Option<&Value>) -> Value {
        let Value::Object(mut map) = node else {
            return node;
        };

        if let Some(Value::Object(properties)) = map.get("properties") {
            let mut resolved = Map::with_capacity(properties.len());
            for (name, prop) in properties {
                let child = data.and_then(|d| d.get(name));
                resolved.insert(name.clone(), self.resolve_nested(prop, child));
            }
            map.insert("properties".into(), Value::Object(resolved));
        }

        if let Some(Value::Array(items)) = map.get("items") {
            let resolved = items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    let child = data.and_then(|d| d.get(i));
                    self.resolve_nested(item, child)
                })
                .collect();
            map.insert("items".into(), Value::Array(resolved));
        }

        Value::Object(map)
    }
}

/// Resolve only the node itself: follow its `$ref` chain and apply the
/// `dependencies` that are active for `data`. Children are left untouched.
pub fn resolve_node(
    schema: &Value,
    definitions: &Definitions<'_>,
    data: Option<&Value>,
) -> Result<Value> {
    let node = expand_ref(schema, definitions, &mut Vec::new())?;
    resolve_dependencies(node, definitions, data)
}

/// [`resolve_node`] followed by `oneOf`/`anyOf` option selection: the chosen
/// option is merged into the node and the combinator keyword dropped.
///
/// This is the schema a field is actually rendered with.
pub fn effective_node(
    schema: &Value,
    definitions: &Definitions<'_>,
    data: Option<&Value>,
) -> Result<Value> {
    let node = resolve_node(schema, definitions, data)?;
    apply_option(node, definitions, data)
}

fn apply_option(
    node: Value,
    definitions: &Definitions<'_>,
    data: Option<&Value>,
) -> Result<Value> {
    let Value::Object(mut map) = node else {
        return Ok(node);
    };
    let Some((keyword, Value::Array(options))) = ["oneOf", "anyOf"]
        .into_iter()
        .find_map(|k| map.remove(k).map(|v| (k, v)))
    else {
        return Ok(Value::Object(map));
    };
    if options.is_empty() {
        return Ok(Value::Object(map));
    }

    let index = select_option(&options, definitions, data);
    trace!("{keyword} selected option {index}");
    let option = resolve_node(&options[index], definitions, data)?;
    let merged = merge_schemas(&Value::Object(map), &option);
    resolve_dependencies(merged, definitions, data)
}

/// Follow a `$ref` chain, shallow-merging the referencing schema's own keys
/// over the resolved target.
fn expand_ref(
    schema: &Value,
    definitions: &Definitions<'_>,
    chain: &mut Vec<String>,
) -> Result<Value> {
    let Some(reference) = ref_of(schema) else {
        return Ok(schema.clone());
    };
    if chain.iter().any(|r| r == reference) {
        return Err(FormError::reference(reference, "circular reference"));
    }
    chain.push(reference.to_string());
    trace!("expanding {reference}");

    let target = definitions.find(reference)?;
    let resolved = expand_ref(target, definitions, chain)?;

    let mut merged = match resolved {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    if let Some(local) = schema.as_object() {
        for (key, value) in local {
            if key != "$ref" {
                merged.insert(key.clone(), value.clone());
            }
        }
    }
    Ok(Value::Object(merged))
}

fn resolve_dependencies(
    node: Value,
    definitions: &Definitions<'_>,
    data: Option<&Value>,
) -> Result<Value> {
    // Without data nothing can be decided; the keyword stays for the validator.
    if data.is_none() {
        return Ok(node);
    }
    let Value::Object(mut map) = node else {
        return Ok(node);
    };
    let Some(dependencies) = map.remove("dependencies") else {
        return Ok(Value::Object(map));
    };
    let Value::Object(dependencies) = dependencies else {
        return Ok(Value::Object(map));
    };

    let values = data.and_then(Value::as_object);
    for (key, dependency) in &dependencies {
        let Some(value) = values.and_then(|d| d.get(key)).filter(|v| !v.is_null()) else {
            continue;
        };
        match dependency {
            Value::Array(names) => add_required(&mut map, names),
            Value::Object(_) => {
                map = with_dependent_schema(map, key, value, dependency, definitions, data)?;
            }
            _ => {}
        }
    }

    if map.contains_key("dependencies") {
        return resolve_dependencies(Value::Object(map), definitions, data);
    }
    Ok(Value::Object(map))
}

fn with_dependent_schema(
    map: Map<String, Value>,
    key: &str,
    value: &Value,
    dependency: &Value,
    definitions: &Definitions<'_>,
    data: Option<&Value>,
) -> Result<Map<String, Value>> {
    let dependent = resolve_node(dependency, definitions, data)?;
    let mut dependent = match dependent {
        Value::Object(m) => m,
        _ => Map::new(),
    };
    let one_of = dependent.remove("oneOf");
    let mut merged = merge_schemas(&Value::Object(map), &Value::Object(dependent));

    if let Some(Value::Array(options)) = one_of {
        let branch = options.iter().enumerate().find_map(|(i, option)| {
            let option = expand_ref(option, definitions, &mut Vec::new()).ok()?;
            branch_matches(&option, key, value, definitions).then_some((i, option))
        });
        match branch {
            Some((index, mut option)) => {
                trace!("dependency `{key}` selected branch {index}");
                if let Some(Value::Object(props)) = option.get_mut("properties") {
                    props.remove(key);
                }
                let option = resolve_node(&option, definitions, data)?;
                merged = merge_schemas(&merged, &option);
            }
            None => {
                warn!("no dependency branch of `{key}` matches {value}; keeping base schema")
            }
        }
    }

    Ok(match merged {
        Value::Object(m) => m,
        _ => Map::new(),
    })
}

fn branch_matches(
    option: &Value,
    key: &str,
    value: &Value,
    definitions: &Definitions<'_>,
) -> bool {
    let Some(condition) = option.get("properties").and_then(|p| p.get(key)) else {
        return false;
    };
    match expand_ref(condition, definitions, &mut Vec::new()) {
        Ok(condition) => value_matches(&condition, value),
        Err(_) => false,
    }
}

fn add_required(map: &mut Map<String, Value>, names: &[Value]) {
    let required = map
        .entry("required")
        .or_insert_with(|| Value::Array(Vec::new()));
    if let Value::Array(required) = required {
        for name in names {
            if !required.contains(name) {
                required.push(name.clone());
            }
        }
    }
}

/// Pick the first `oneOf`/`anyOf` option matching `data`, or 0.
///
/// Object options match when every `required` key is present and every
/// property carrying `const`/`enum` agrees with the data. Other options
/// match on `type`, `const` and `enum`.
pub fn select_option(
    options: &[Value],
    definitions: &Definitions<'_>,
    data: Option<&Value>,
) -> usize {
    let Some(data) = data else {
        return 0;
    };
    options
        .iter()
        .position(|option| match expand_ref(option, definitions, &mut Vec::new()) {
            Ok(option) => option_matches(&option, data),
            Err(_) => false,
        })
        .unwrap_or(0)
}

fn option_matches(option: &Value, data: &Value) -> bool {
    if !value_matches(option, data) {
        return false;
    }
    let Some(object) = data.as_object() else {
        return option.get("properties").is_none() || option.get("type").is_some();
    };
    if let Some(Value::Array(required)) = option.get("required") {
        let all_present = required
            .iter()
            .filter_map(Value::as_str)
            .all(|name| object.contains_key(name));
        if !all_present {
            return false;
        }
    }
    if let Some(Value::Object(properties)) = option.get("properties") {
        for (name, prop) in properties {
            let constrained = prop.get("const").is_some() || prop.get("enum").is_some();
            if constrained
                && let Some(v) = object.get(name)
                && !value_matches(prop, v)
            {
                return false;
            }
        }
    }
    true
}

/// Check `const`, `enum` and `type` of a schema against a value.
pub(crate) fn value_matches(schema: &Value, value: &Value) -> bool {
    if let Some(expected) = schema.get("const")
        && expected != value
    {
        return false;
    }
    if let Some(Value::Array(options)) = schema.get("enum")
        && !options.contains(value)
    {
        return false;
    }
    match schema.get("type") {
        Some(Value::String(ty)) => type_matches(ty, value),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .any(|ty| type_matches(ty, value)),
        _ => true,
    }
}

fn type_matches(ty: &str, value: &Value) -> bool {
    match ty {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => {
            value.is_i64() || value.is_u64() || value.as_f64().is_some_and(|f| f.fract() == 0.0)
        }
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        _ => false,
    }
}

/// Deep-merge two schemas: objects merge key by key, `required` arrays are
/// unioned, anything else is taken from `other`.
pub fn merge_schemas(base: &Value, other: &Value) -> Value {
    match (base, other) {
        (Value::Object(a), Value::Object(b)) => {
            let mut merged = a.clone();
            for (key, right) in b {
                let value = match (merged.get(key), right) {
                    (Some(Value::Array(left)), Value::Array(right)) if key == "required" => {
                        let mut union = left.clone();
                        for name in right {
                            if !union.contains(name) {
                                union.push(name.clone());
                            }
                        }
                        Value::Array(union)
                    }
                    (Some(left @ Value::Object(_)), Value::Object(_)) => merge_schemas(left, right),
                    _ => right.clone(),
                };
                merged.insert(key.clone(), value);
            }
            Value::Object(merged)
        }
        _ => other.clone(),
    }
}
