//! Error trees built from flat validation errors.
//!
//! Validation failures are data: a validator produces a flat list of
//! [`ValidationError`]s and [`build_error_schema`] folds them into an
//! [`ErrorSchema`] shaped like the form data.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::path::PathSegment;

/// One validation failure at a data location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Property names and array indices from the root to the failing value.
    pub location: Vec<PathSegment>,
    pub message: String,
}

impl ValidationError {
    pub fn new(
        location: impl IntoIterator<Item = impl Into<PathSegment>>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            location: location.into_iter().map(Into::into).collect(),
            message: message.into(),
        }
    }
}

/// Tree of validation messages mirroring the data shape.
///
/// Serializes as `{"__errors": ["..."], "<key>": {...}}`; `__errors` is
/// omitted when a node has no messages of its own.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ErrorSchema {
    #[serde(rename = "__errors", default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    #[serde(flatten)]
    pub children: IndexMap<String, ErrorSchema>,
}

/// Fold flat errors into a tree, keeping the input order of messages.
pub fn build_error_schema(errors: &[ValidationError]) -> ErrorSchema {
    let mut schema = ErrorSchema::default();
    for error in errors {
        schema.add_error(&error.location, error.message.clone());
    }
    schema
}

impl ErrorSchema {
    /// Whether the tree holds no message at all.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.children.values().all(ErrorSchema::is_empty)
    }

    pub fn get(&self, key: &str) -> Option<&ErrorSchema> {
        self.children.get(key)
    }

    /// Node at `path`, if it exists.
    pub fn at(&self, path: &[PathSegment]) -> Option<&ErrorSchema> {
        path.iter()
            .try_fold(self, |node, segment| node.children.get(&segment.key()))
    }

    fn entry(&mut self, path: &[PathSegment]) -> &mut ErrorSchema {
        path.iter().fold(self, |node, segment| {
            node.children.entry(segment.key()).or_default()
        })
    }

    /// Append a message at `path`, creating intermediate nodes.
    pub fn add_error(&mut self, path: &[PathSegment], message: impl Into<String>) {
        self.entry(path).errors.push(message.into());
    }

    /// Replace the subtree at `path`; `None` removes it.
    pub fn set_child(&mut self, path: &[PathSegment], node: Option<ErrorSchema>) {
        let Some((last, parents)) = path.split_last() else {
            *self = node.unwrap_or_default();
            return;
        };
        match node {
            Some(node) => {
                self.entry(parents).children.insert(last.key(), node);
            }
            None => {
                let parent = parents
                    .iter()
                    .try_fold(&mut *self, |n, s| n.children.get_mut(&s.key()));
                if let Some(parent) = parent {
                    parent.children.shift_remove(&last.key());
                }
            }
        }
    }

    /// Flatten into `"<path>: <message>"` lines, depth first.
    ///
    /// Root messages are prefixed with `root`, nested ones with their dotted
    /// location (`level1.level2`).
    pub fn to_error_list(&self) -> Vec<String> {
        let mut list = Vec::new();
        self.collect_messages(&mut Vec::new(), &mut list);
        list
    }

    fn collect_messages(&self, path: &mut Vec<String>, list: &mut Vec<String>) {
        let name = if path.is_empty() {
            "root".to_string()
        } else {
            path.join(".")
        };
        list.extend(self.errors.iter().map(|e| format!("{name}: {e}")));
        for (key, child) in &self.children {
            path.push(key.clone());
            child.collect_messages(path, list);
            path.pop();
        }
    }

    /// Locations that carry at least one message.
    pub fn dirty_paths(&self) -> Vec<Vec<PathSegment>> {
        let mut paths = Vec::new();
        self.collect_dirty(&mut Vec::new(), &mut paths);
        paths
    }

    fn collect_dirty(&self, path: &mut Vec<PathSegment>, paths: &mut Vec<Vec<PathSegment>>) {
        if !self.errors.is_empty() {
            paths.push(path.clone());
        }
        for (key, child) in &self.children {
            path.push(segment_of(key));
            child.collect_dirty(path, paths);
            path.pop();
        }
    }

    /// Whether the location or anything below it is in error.
    pub fn is_dirty(&self, path: &[PathSegment]) -> bool {
        self.at(path).is_some_and(|node| !node.is_empty())
    }

    /// Re-key index entries after removing element `index`: lower indices
    /// are kept, `index` is dropped, higher ones shift down by one.
    pub fn remove_index(&mut self, index: usize) {
        self.rekey(|i| match i {
            i if i < index => Some(i),
            i if i == index => None,
            i => Some(i - 1),
        });
    }

    /// Exchange the entries of elements `a` and `b`.
    pub fn swap_indices(&mut self, a: usize, b: usize) {
        self.rekey(|i| {
            Some(if i == a {
                b
            } else if i == b {
                a
            } else {
                i
            })
        });
    }

    /// Drop index entries at or past `len`.
    pub fn retain_indices(&mut self, len: usize) {
        self.rekey(|i| (i < len).then_some(i));
    }

    fn rekey(&mut self, map: impl Fn(usize) -> Option<usize>) {
        let mut indexed: Vec<(usize, ErrorSchema)> = Vec::new();
        let mut keyed = IndexMap::new();
        for (key, child) in std::mem::take(&mut self.children) {
            match index_key(&key) {
                Some(i) => {
                    if let Some(new) = map(i) {
                        indexed.push((new, child));
                    }
                }
                None => {
                    keyed.insert(key, child);
                }
            }
        }
        indexed.sort_by_key(|(i, _)| *i);
        self.children = indexed
            .into_iter()
            .map(|(i, child)| (i.to_string(), child))
            .chain(keyed)
            .collect();
    }
}

fn index_key(key: &str) -> Option<usize> {
    if key.is_empty() || !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    key.parse().ok()
}

fn segment_of(key: &str) -> PathSegment {
    match index_key(key) {
        Some(i) => PathSegment::Index(i),
        None => PathSegment::Key(key.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn list_errors() -> ErrorSchema {
        build_error_schema(&[
            ValidationError::new([PathSegment::from("list"), PathSegment::from(0)], "zero"),
            ValidationError::new([PathSegment::from("list"), PathSegment::from(1)], "one"),
            ValidationError::new([PathSegment::from("list"), PathSegment::from(2)], "two"),
        ])
    }

    #[test]
    fn test_nested_location() {
        let schema = build_error_schema(&[ValidationError::new(["level1", "level2"], "too short")]);
        assert_eq!(
            serde_json::to_value(&schema).unwrap(),
            json!({"level1": {"level2": {"__errors": ["too short"]}}})
        );
    }

    #[test]
    fn test_root_and_order() {
        let schema = build_error_schema(&[
            ValidationError::new(Vec::<PathSegment>::new(), "first"),
            ValidationError::new(["a"], "a1"),
            ValidationError::new(Vec::<PathSegment>::new(), "second"),
            ValidationError::new(["a"], "a1"),
        ]);
        assert_eq!(schema.errors, vec!["first", "second"]);
        assert_eq!(schema.get("a").unwrap().errors, vec!["a1", "a1"]);
        assert_eq!(
            schema.to_error_list(),
            vec!["root: first", "root: second", "a: a1", "a: a1"]
        );
    }

    #[test]
    fn test_deserialize() {
        let value = json!({"__errors": ["x"], "name": {"__errors": ["y"]}});
        let schema: ErrorSchema = serde_json::from_value(value).unwrap();
        assert_eq!(schema.errors, vec!["x"]);
        assert_eq!(schema.to_error_list(), vec!["root: x", "name: y"]);
    }

    #[test]
    fn test_dirty() {
        let schema = build_error_schema(&[ValidationError::new(
            [PathSegment::from("list"), PathSegment::from(1), PathSegment::from("name")],
            "required",
        )]);
        assert_eq!(
            schema.dirty_paths(),
            vec![vec![PathSegment::from("list"), PathSegment::from(1), PathSegment::from("name")]]
        );
        assert!(schema.is_dirty(&[PathSegment::from("list")]));
        assert!(!schema.is_dirty(&[PathSegment::from("other")]));
        assert_eq!(schema.to_error_list(), vec!["list.1.name: required"]);
    }

    #[test]
    fn test_remove_index() {
        let mut schema = list_errors();
        let list = schema.children.get_mut("list").unwrap();
        list.remove_index(1);
        assert_eq!(
            serde_json::to_value(&schema).unwrap(),
            json!({"list": {"0": {"__errors": ["zero"]}, "1": {"__errors": ["two"]}}})
        );
    }

    #[test]
    fn test_swap_and_retain() {
        let mut schema = list_errors();
        let list = schema.children.get_mut("list").unwrap();
        list.swap_indices(0, 2);
        assert_eq!(list.get("0").unwrap().errors, vec!["two"]);
        assert_eq!(list.get("2").unwrap().errors, vec!["zero"]);
        list.retain_indices(2);
        assert!(list.get("2").is_none());
        assert_eq!(list.children.len(), 2);
    }

    #[test]
    fn test_set_child() {
        let mut schema = list_errors();
        schema.set_child(&[PathSegment::from("list"), PathSegment::from(1)], None);
        assert!(schema.at(&[PathSegment::from("list"), PathSegment::from(1)]).is_none());

        let mut replacement = ErrorSchema::default();
        replacement.add_error(&[], "custom");
        schema.set_child(&[PathSegment::from("name")], Some(replacement));
        assert_eq!(schema.get("name").unwrap().errors, vec!["custom"]);
    }
}
