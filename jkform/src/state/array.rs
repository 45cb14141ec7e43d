//! Structural array edits: insert at end, remove, and swap.
//!
//! Each edit changes the data and re-keys the matching error subtree so that
//! per-index messages keep following the element they were reported for.

use serde_json::Value;

use crate::{
    error::{ArrayAction, FormError, Result},
    schema::{
        definitions::Definitions,
        kind::{allows_additional_items, is_fixed_items, item_schema},
        ui::UiSchema,
    },
    state::{defaults::compute_default, errors::ErrorSchema},
};

/// Per-element controls offered to the view layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ItemControls {
    pub move_up: bool,
    pub move_down: bool,
    pub remove: bool,
    /// Whether any control is shown at all.
    pub toolbar: bool,
}

/// A resolved array node together with its ui hints.
#[derive(Debug, Clone, Copy)]
pub struct ArrayField<'a> {
    schema: &'a Value,
    ui: UiSchema<'a>,
    definitions: &'a Definitions<'a>,
}

impl<'a> ArrayField<'a> {
    pub fn new(schema: &'a Value, ui: UiSchema<'a>, definitions: &'a Definitions<'a>) -> Self {
        Self {
            schema,
            ui,
            definitions,
        }
    }

    /// Number of tuple positions, for fixed arrays.
    pub fn fixed_len(&self) -> Option<usize> {
        if is_fixed_items(self.schema) {
            self.schema.get("items").and_then(Value::as_array).map(Vec::len)
        } else {
            None
        }
    }

    /// Whether one more element may be appended to an array of `len`.
    pub fn can_add(&self, len: usize) -> bool {
        if !self.ui.options().addable {
            return false;
        }
        if self.fixed_len().is_some() && !allows_additional_items(self.schema) {
            return false;
        }
        match self.schema.get("maxItems").and_then(Value::as_u64) {
            Some(max) => (len as u64) < max,
            None => true,
        }
    }

    /// Controls of element `index` in an array of `len` elements.
    ///
    /// Tuple positions of a fixed array can be neither removed nor moved;
    /// additional elements move only among themselves.
    pub fn controls(&self, index: usize, len: usize) -> ItemControls {
        let options = self.ui.options();
        let (move_up, move_down, remove) = match self.fixed_len() {
            Some(fixed) => {
                let additional = index >= fixed;
                (
                    options.orderable && index > fixed,
                    options.orderable && additional && index + 1 < len,
                    options.removable && additional,
                )
            }
            None => (
                options.orderable && index > 0,
                options.orderable && index + 1 < len,
                options.removable,
            ),
        };
        ItemControls {
            move_up,
            move_down,
            remove,
            toolbar: move_up || move_down || remove,
        }
    }

    /// Append the default of the next element's schema.
    pub fn add(&self, items: &mut Vec<Value>, errors: &mut ErrorSchema) -> Result<()> {
        if !self.can_add(items.len()) {
            return Err(FormError::Disabled(ArrayAction::Add));
        }
        let schema = item_schema(self.schema, items.len()).ok_or_else(|| {
            FormError::Configuration("array schema has no schema for a new element".to_string())
        })?;
        let value = compute_default(schema, None, self.definitions).unwrap_or(Value::Null);
        errors.retain_indices(items.len());
        items.push(value);
        Ok(())
    }

    /// Remove element `index`.
    pub fn remove(
        &self,
        items: &mut Vec<Value>,
        errors: &mut ErrorSchema,
        index: usize,
    ) -> Result<()> {
        check_index(index, items.len())?;
        if !self.controls(index, items.len()).remove {
            return Err(FormError::Disabled(ArrayAction::Remove));
        }
        items.remove(index);
        errors.remove_index(index);
        errors.retain_indices(items.len());
        Ok(())
    }

    /// Exchange elements `index` and `new_index`.
    pub fn reorder(
        &self,
        items: &mut [Value],
        errors: &mut ErrorSchema,
        index: usize,
        new_index: usize,
    ) -> Result<()> {
        check_index(index, items.len())?;
        check_index(new_index, items.len())?;
        if !self.ui.options().orderable {
            return Err(FormError::Disabled(ArrayAction::Reorder));
        }
        if let Some(fixed) = self.fixed_len()
            && index.min(new_index) < fixed
        {
            return Err(FormError::Disabled(ArrayAction::Reorder));
        }
        items.swap(index, new_index);
        errors.swap_indices(index, new_index);
        Ok(())
    }
}

fn check_index(index: usize, len: usize) -> Result<()> {
    if index < len {
        Ok(())
    } else {
        Err(FormError::IndexOutOfRange { index, len })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{path::PathSegment, state::errors::ValidationError};
    use serde_json::json;

    fn index_errors(n: usize) -> ErrorSchema {
        let errors: Vec<ValidationError> = (0..n)
            .map(|i| ValidationError::new([PathSegment::from(i)], format!("e{i}")))
            .collect();
        crate::state::errors::build_error_schema(&errors)
    }

    #[test]
    fn test_add_uses_item_default() {
        let schema = json!({"type": "array", "items": {"type": "string", "default": "hello"}});
        let defs = Definitions::default();
        let array = ArrayField::new(&schema, UiSchema::default(), &defs);
        let mut items = Vec::new();
        array.add(&mut items, &mut ErrorSchema::default()).unwrap();
        assert_eq!(Value::Array(items), json!(["hello"]));
    }

    #[test]
    fn test_add_limits() {
        let schema = json!({"type": "array", "maxItems": 1, "items": {"type": "number"}});
        let defs = Definitions::default();
        let array = ArrayField::new(&schema, UiSchema::default(), &defs);
        let mut items = Vec::new();
        array.add(&mut items, &mut ErrorSchema::default()).unwrap();
        assert_eq!(items, vec![Value::Null]);
        assert_eq!(
            array.add(&mut items, &mut ErrorSchema::default()),
            Err(FormError::Disabled(ArrayAction::Add))
        );

        let ui = json!({"ui:options": {"addable": false}});
        let schema = json!({"type": "array", "items": {"type": "number"}});
        let array = ArrayField::new(&schema, UiSchema::new(Some(&ui)), &defs);
        assert!(!array.can_add(0));
    }

    #[test]
    fn test_add_past_tuple() {
        let schema = json!({
            "type": "array",
            "items": [{"type": "string"}],
            "additionalItems": {"type": "number", "default": 7}
        });
        let defs = Definitions::default();
        let array = ArrayField::new(&schema, UiSchema::default(), &defs);
        let mut items = vec![json!("x")];
        array.add(&mut items, &mut ErrorSchema::default()).unwrap();
        assert_eq!(items, vec![json!("x"), json!(7)]);

        let closed = json!({"type": "array", "items": [{"type": "string"}]});
        let array = ArrayField::new(&closed, UiSchema::default(), &defs);
        assert!(!array.can_add(1));
    }

    #[test]
    fn test_remove_reindexes_errors() {
        let schema = json!({"type": "array", "items": {"type": "string"}});
        let defs = Definitions::default();
        let array = ArrayField::new(&schema, UiSchema::default(), &defs);
        let mut items = vec![json!("a"), json!("b"), json!("c")];
        let mut errors = index_errors(3);
        array.remove(&mut items, &mut errors, 1).unwrap();
        assert_eq!(items, vec![json!("a"), json!("c")]);
        assert_eq!(errors.get("0").unwrap().errors, vec!["e0"]);
        assert_eq!(errors.get("1").unwrap().errors, vec!["e2"]);
        assert!(errors.children.keys().all(|k| k.parse::<usize>().unwrap() < items.len()));

        assert_eq!(
            array.remove(&mut items, &mut errors, 5),
            Err(FormError::IndexOutOfRange { index: 5, len: 2 })
        );
    }

    #[test]
    fn test_reorder_swaps_errors() {
        let schema = json!({"type": "array", "items": {"type": "string"}});
        let defs = Definitions::default();
        let array = ArrayField::new(&schema, UiSchema::default(), &defs);
        let mut items = vec![json!("a"), json!("b")];
        let mut errors = index_errors(1);
        array.reorder(&mut items, &mut errors, 0, 1).unwrap();
        assert_eq!(items, vec![json!("b"), json!("a")]);
        assert!(errors.get("0").is_none());
        assert_eq!(errors.get("1").unwrap().errors, vec!["e0"]);

        let ui = json!({"ui:orderable": false});
        let array = ArrayField::new(&schema, UiSchema::new(Some(&ui)), &defs);
        assert_eq!(
            array.reorder(&mut items, &mut errors, 0, 1),
            Err(FormError::Disabled(ArrayAction::Reorder))
        );
    }

    #[test]
    fn test_controls() {
        let schema = json!({"type": "array", "items": {"type": "string"}});
        let defs = Definitions::default();
        let array = ArrayField::new(&schema, UiSchema::default(), &defs);
        let first = array.controls(0, 3);
        assert!(!first.move_up && first.move_down && first.remove && first.toolbar);
        let last = array.controls(2, 3);
        assert!(last.move_up && !last.move_down);

        let ui = json!({"ui:options": {"orderable": false, "removable": false}});
        let array = ArrayField::new(&schema, UiSchema::new(Some(&ui)), &defs);
        assert_eq!(array.controls(1, 3), ItemControls::default());
    }

    #[test]
    fn test_fixed_controls() {
        let schema = json!({
            "type": "array",
            "items": [{"type": "string"}, {"type": "string"}],
            "additionalItems": {"type": "string"}
        });
        let defs = Definitions::default();
        let array = ArrayField::new(&schema, UiSchema::default(), &defs);
        assert_eq!(array.controls(1, 4), ItemControls::default());
        let first_extra = array.controls(2, 4);
        assert!(!first_extra.move_up && first_extra.move_down && first_extra.remove);
        assert!(array.controls(3, 4).move_up);

        let mut items = vec![json!("a"), json!("b"), json!("c")];
        assert_eq!(
            array.remove(&mut items, &mut ErrorSchema::default(), 0),
            Err(FormError::Disabled(ArrayAction::Remove))
        );
    }
}
