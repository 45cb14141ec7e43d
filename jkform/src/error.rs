//! Error types and result definitions for form-state derivation.

use thiserror::Error;

/// Structural array operation, used to report a disabled action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayAction {
    /// Append a new element.
    Add,
    /// Remove an element.
    Remove,
    /// Move an element to a neighbouring position.
    Reorder,
}

impl std::fmt::Display for ArrayAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ArrayAction::Add => "add",
            ArrayAction::Remove => "remove",
            ArrayAction::Reorder => "reorder",
        };
        f.write_str(name)
    }
}

/// Errors raised while deriving form state from a schema.
///
/// Validation failures are not represented here: they are data and flow
/// through [`ErrorSchema`](crate::ErrorSchema).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormError {
    /// A `$ref` target is absent from the definitions registry, or the
    /// reference chain loops back on itself.
    #[error("could not find a definition for {reference}: {reason}")]
    Reference { reference: String, reason: String },

    /// Malformed `ui:order` hint.
    #[error("invalid ui:order: {0}")]
    Order(String),

    /// The schema is missing keys required by its structure, e.g. an array
    /// without `items`, or the ui schema names an unknown widget.
    #[error("invalid schema configuration: {0}")]
    Configuration(String),

    /// Array index outside of the current data length.
    #[error("index {index} is out of range for an array of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// The array action is disabled by `ui:options` or by `maxItems`.
    #[error("array action `{0}` is disabled for this field")]
    Disabled(ArrayAction),

    /// The validator could not compile the schema.
    #[error("validator error: {0}")]
    Validator(String),
}

impl FormError {
    pub(crate) fn reference(reference: &str, reason: impl Into<String>) -> Self {
        FormError::Reference {
            reference: reference.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, FormError>;
