//! The form state holder: one derivation cycle per input change.

use std::fmt;

use schemars::JsonSchema;
use serde_json::Value;

use crate::{
    error::{FormError, Result},
    field::{Field, build_field},
    path::PathSegment,
    schema::{
        Context, DEFAULT_ID_PREFIX,
        definitions::{Definitions, ref_of},
        kind::{item_schema, schema_type},
        resolve::{effective_node, resolve_schema},
        ui::UiSchema,
    },
    state::{
        array::ArrayField,
        defaults::compute_default,
        errors::{ErrorSchema, ValidationError, build_error_schema},
        id::{IdSchema, build_id_schema},
    },
    validate::{JsonSchemaValidator, Validator},
};

/// Rewrites the validator's flat errors before they become a tree.
pub type TransformErrors = Box<dyn Fn(Vec<ValidationError>) -> Vec<ValidationError> + Send + Sync>;

/// Form behaviour switches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormOptions {
    /// Identifier of the root node.
    pub id_prefix: String,
    /// Validate on every change instead of only on submit.
    pub live_validate: bool,
    /// Never validate; submit always succeeds.
    pub no_validate: bool,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            id_prefix: DEFAULT_ID_PREFIX.to_string(),
            live_validate: false,
            no_validate: false,
        }
    }
}

impl FormOptions {
    pub fn id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.id_prefix = prefix.into();
        self
    }

    pub fn live_validate(mut self, enabled: bool) -> Self {
        self.live_validate = enabled;
        self
    }

    pub fn no_validate(mut self, enabled: bool) -> Self {
        self.no_validate = enabled;
        self
    }

    fn must_validate(&self) -> bool {
        self.live_validate && !self.no_validate
    }
}

/// Outcome of [`FormState::submit`].
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// The data passed validation (or validation is disabled).
    Accepted(Value),
    /// The data failed validation; the error tree now reflects these errors.
    Rejected(Vec<ValidationError>),
}

/// Schema, ui schema and data of one form, with every derived tree.
///
/// All derived trees are recomputed from scratch whenever an input changes.
pub struct FormState<V = JsonSchemaValidator> {
    schema: Value,
    ui_schema: Value,
    options: FormOptions,
    validator: V,
    transform_errors: Option<TransformErrors>,
    resolved: Value,
    form_data: Value,
    id_schema: IdSchema,
    error_schema: ErrorSchema,
}

impl<V> fmt::Debug for FormState<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormState")
            .field("options", &self.options)
            .field("form_data", &self.form_data)
            .field("id_schema", &self.id_schema)
            .field("error_schema", &self.error_schema)
            .finish_non_exhaustive()
    }
}

impl FormState<JsonSchemaValidator> {
    /// Build a form for the JSON Schema of a Rust type.
    pub fn for_type<T: JsonSchema>(data: Option<Value>, options: FormOptions) -> Result<Self> {
        let schema = schemars::schema_for!(T).to_value();
        Self::new(schema, None, data, options, JsonSchemaValidator)
    }
}

impl<V: Validator> FormState<V> {
    /// Run the first derivation cycle.
    ///
    /// # Errors
    ///
    /// Fails when the root schema is not an object, its own `$ref` cannot be
    /// resolved, or it is an array without `items`.
    pub fn new(
        schema: Value,
        ui_schema: Option<Value>,
        data: Option<Value>,
        options: FormOptions,
        validator: V,
    ) -> Result<Self> {
        let mut state = Self {
            schema,
            ui_schema: ui_schema.unwrap_or_else(|| Value::Object(Default::default())),
            options,
            validator,
            transform_errors: None,
            resolved: Value::Null,
            form_data: Value::Null,
            id_schema: IdSchema::default(),
            error_schema: ErrorSchema::default(),
        };
        state.derive(data)?;
        if state.options.must_validate() {
            state.apply_validation()?;
        }
        Ok(state)
    }

    /// Install a hook that rewrites or filters validator errors.
    pub fn with_transform_errors<F>(mut self, transform: F) -> Self
    where
        F: Fn(Vec<ValidationError>) -> Vec<ValidationError> + Send + Sync + 'static,
    {
        self.transform_errors = Some(Box::new(transform));
        self
    }

    pub fn schema(&self) -> &Value {
        &self.schema
    }

    pub fn ui_schema(&self) -> &Value {
        &self.ui_schema
    }

    pub fn options(&self) -> &FormOptions {
        &self.options
    }

    /// The root schema resolved against the current data.
    pub fn resolved_schema(&self) -> &Value {
        &self.resolved
    }

    /// Current data, default-filled.
    pub fn form_data(&self) -> &Value {
        &self.form_data
    }

    pub fn id_schema(&self) -> &IdSchema {
        &self.id_schema
    }

    pub fn error_schema(&self) -> &ErrorSchema {
        &self.error_schema
    }

    /// The current errors as `"<path>: <message>"` lines.
    pub fn error_list(&self) -> Vec<String> {
        self.error_schema.to_error_list()
    }

    pub fn set_schema(&mut self, schema: Value) -> Result<()> {
        self.schema = schema;
        self.refresh(Some(self.form_data.clone()))
    }

    pub fn set_ui_schema(&mut self, ui_schema: Value) -> Result<()> {
        self.ui_schema = ui_schema;
        self.refresh(Some(self.form_data.clone()))
    }

    /// Replace the data from outside the form.
    pub fn set_form_data(&mut self, data: Option<Value>) -> Result<()> {
        self.refresh(data)
    }

    fn refresh(&mut self, data: Option<Value>) -> Result<()> {
        self.derive(data)?;
        if self.options.must_validate() {
            self.apply_validation()?;
        }
        Ok(())
    }

    /// Accept an edited data value.
    ///
    /// With live validation the error tree is recomputed; otherwise an
    /// explicitly supplied error tree replaces the current one.
    pub fn on_change(&mut self, data: Value, error_schema: Option<ErrorSchema>) -> Result<()> {
        self.derive(Some(data))?;
        if self.options.must_validate() {
            self.apply_validation()?;
        } else if !self.options.no_validate
            && let Some(error_schema) = error_schema
        {
            self.error_schema = error_schema;
        }
        Ok(())
    }

    /// Accept an edit of the value at `path`, leaving siblings untouched.
    ///
    /// `None` stands for "undefined": an object key is removed, an array
    /// slot becomes `null`. A supplied error tree replaces the subtree at
    /// `path`.
    pub fn on_change_at(
        &mut self,
        path: &[PathSegment],
        value: Option<Value>,
        error_schema: Option<ErrorSchema>,
    ) -> Result<()> {
        let mut data = self.form_data.clone();
        set_in(&mut data, path, value)?;
        let error_schema = error_schema.map(|node| {
            let mut merged = self.error_schema.clone();
            merged.set_child(path, Some(node));
            merged
        });
        self.on_change(data, error_schema)
    }

    /// Run the validator over the resolved schema and current data.
    pub fn validate(&self) -> Result<Vec<ValidationError>> {
        let errors = self.validator.validate(&self.resolved, &self.form_data)?;
        Ok(match &self.transform_errors {
            Some(transform) => transform(errors),
            None => errors,
        })
    }

    fn apply_validation(&mut self) -> Result<()> {
        let errors = self.validate()?;
        debug!("validation produced {} errors", errors.len());
        self.error_schema = build_error_schema(&errors);
        Ok(())
    }

    /// Validate and hand out the data, or keep the errors in the tree.
    pub fn submit(&mut self) -> Result<Submission> {
        if !self.options.no_validate {
            let errors = self.validate()?;
            if !errors.is_empty() {
                self.error_schema = build_error_schema(&errors);
                return Ok(Submission::Rejected(errors));
            }
        }
        self.error_schema = ErrorSchema::default();
        Ok(Submission::Accepted(self.form_data.clone()))
    }

    /// Append a default element to the array at `path`.
    pub fn add_item(&mut self, path: &[PathSegment]) -> Result<()> {
        self.edit_array(path, |array, items, errors| array.add(items, errors))
    }

    /// Remove element `index` of the array at `path`.
    pub fn remove_item(&mut self, path: &[PathSegment], index: usize) -> Result<()> {
        self.edit_array(path, |array, items, errors| array.remove(items, errors, index))
    }

    /// Swap elements `index` and `new_index` of the array at `path`.
    pub fn reorder_item(
        &mut self,
        path: &[PathSegment],
        index: usize,
        new_index: usize,
    ) -> Result<()> {
        self.edit_array(path, |array, items, errors| {
            array.reorder(items, errors, index, new_index)
        })
    }

    fn edit_array<F>(&mut self, path: &[PathSegment], edit: F) -> Result<()>
    where
        F: FnOnce(&ArrayField<'_>, &mut Vec<Value>, &mut ErrorSchema) -> Result<()>,
    {
        let definitions = Definitions::from_root(&self.schema);
        let (node, ui) = self.locate(path, &definitions)?;
        if schema_type(&node) != Some("array") {
            return Err(FormError::Configuration(format!(
                "{} is not an array",
                display_path(path)
            )));
        }

        let mut items = match value_at(&self.form_data, path) {
            Some(Value::Array(items)) => items.clone(),
            None | Some(Value::Null) => Vec::new(),
            Some(_) => {
                return Err(FormError::Configuration(format!(
                    "data at {} is not an array",
                    display_path(path)
                )));
            }
        };
        let mut errors = self.error_schema.at(path).cloned().unwrap_or_default();

        let array = ArrayField::new(&node, ui, &definitions);
        edit(&array, &mut items, &mut errors)?;

        let mut data = self.form_data.clone();
        set_in(&mut data, path, Some(Value::Array(items)))?;
        let mut error_schema = self.error_schema.clone();
        error_schema.set_child(path, Some(errors));
        self.on_change(data, Some(error_schema))
    }

    /// Effective schema and ui node at `path`.
    fn locate<'s>(
        &'s self,
        path: &[PathSegment],
        definitions: &Definitions<'_>,
    ) -> Result<(Value, UiSchema<'s>)> {
        let mut ui = UiSchema::new(Some(&self.ui_schema));
        let mut node = effective_node(&self.schema, definitions, Some(&self.form_data))?;
        let mut data = Some(&self.form_data);

        for segment in path {
            let child = data.and_then(|d| step(d, segment));
            let schema = match segment {
                PathSegment::Key(name) => {
                    ui = ui.property(name);
                    node.get("properties").and_then(|p| p.get(name))
                }
                PathSegment::Index(index) => {
                    let fixed = node.get("items").and_then(Value::as_array).map(Vec::len);
                    ui = ui.item(*index, fixed);
                    item_schema(&node, *index)
                }
            };
            let schema = schema.ok_or_else(|| {
                FormError::Configuration(format!("no schema at {}", display_path(path)))
            })?;
            node = effective_node(schema, definitions, child)?;
            data = child;
        }
        Ok((node, ui))
    }

    /// The view-layer field tree of the whole form.
    pub fn field(&self) -> Field {
        let ctx = Context::new(&self.schema, Some(&self.ui_schema), &self.options.id_prefix);
        build_field(&self.schema, &ctx, &self.form_data, &self.error_schema)
    }

    fn derive(&mut self, data: Option<Value>) -> Result<()> {
        debug!("deriving form state");
        self.check_root()?;
        let ctx = Context::new(&self.schema, Some(&self.ui_schema), &self.options.id_prefix);

        let form_data =
            compute_default(&self.schema, data.as_ref(), &ctx.definitions).unwrap_or(Value::Null);
        let resolved = resolve_schema(&self.schema, &ctx.definitions, Some(&form_data))?;
        if schema_type(&resolved) == Some("array") && resolved.get("items").is_none() {
            return Err(FormError::Configuration(
                "root array schema has no items definition".to_string(),
            ));
        }
        let id_schema = build_id_schema(&self.schema, None, &ctx, Some(&form_data));

        self.resolved = resolved;
        self.form_data = form_data;
        self.id_schema = id_schema;
        Ok(())
    }

    fn check_root(&self) -> Result<()> {
        if !self.schema.is_object() {
            return Err(FormError::Configuration(
                "root schema must be an object".to_string(),
            ));
        }
        if let Some(reference) = ref_of(&self.schema) {
            Definitions::from_root(&self.schema).find(reference)?;
        }
        Ok(())
    }
}

fn step<'v>(value: &'v Value, segment: &PathSegment) -> Option<&'v Value> {
    match (value, segment) {
        (Value::Object(map), segment) => map.get(&segment.key()),
        (Value::Array(items), segment) => items.get(segment.as_index()?),
        _ => None,
    }
}

fn value_at<'v>(value: &'v Value, path: &[PathSegment]) -> Option<&'v Value> {
    path.iter().try_fold(value, |v, segment| step(v, segment))
}

fn display_path(path: &[PathSegment]) -> String {
    if path.is_empty() {
        return "root".to_string();
    }
    path.iter()
        .map(PathSegment::key)
        .collect::<Vec<_>>()
        .join(".")
}

/// Write `value` at `path`, creating containers along the way.
///
/// Fails when the path runs through a scalar, or names a property of an
/// array.
fn set_in(target: &mut Value, path: &[PathSegment], value: Option<Value>) -> Result<()> {
    write_at(target, path, value).map_err(|(depth, found)| {
        FormError::Configuration(format!(
            "cannot write {}: {} is {found}",
            display_path(path),
            display_path(&path[..depth])
        ))
    })
}

/// On failure returns the depth of the offending container and what was found there.
fn write_at(
    target: &mut Value,
    path: &[PathSegment],
    value: Option<Value>,
) -> std::result::Result<(), (usize, &'static str)> {
    let Some((segment, rest)) = path.split_first() else {
        *target = value.unwrap_or(Value::Null);
        return Ok(());
    };

    if target.is_null() {
        *target = match segment {
            PathSegment::Index(_) => Value::Array(Vec::new()),
            PathSegment::Key(_) => Value::Object(Default::default()),
        };
    }

    let nested = |(depth, found): (usize, &'static str)| (depth + 1, found);
    match target {
        Value::Array(items) => {
            let Some(index) = segment.as_index() else {
                return Err((0, "an array"));
            };
            if items.len() <= index {
                items.resize(index + 1, Value::Null);
            }
            write_at(&mut items[index], rest, value).map_err(nested)
        }
        Value::Object(map) => {
            let key = segment.key();
            if !rest.is_empty() {
                let child = map.entry(key).or_insert(Value::Null);
                return write_at(child, rest, value).map_err(nested);
            }
            match value {
                Some(value) => {
                    map.insert(key, value);
                }
                None => {
                    map.shift_remove(&key);
                }
            }
            Ok(())
        }
        Value::Bool(_) => Err((0, "a boolean")),
        Value::Number(_) => Err((0, "a number")),
        Value::String(_) => Err((0, "a string")),
        Value::Null => Ok(()),
    }
}
