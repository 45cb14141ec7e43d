//! # jkform
//!
//! A JSON Schema driven form-state engine.
//!
//! JKForm derives everything a form view needs from a JSON Schema, optional
//! UI hints and the current data, and keeps it consistent as the data or the
//! schema change. Drawing the form is left to a renderer of your choice.
//!
//! ## Features
//!
//! - `$ref`/`definitions`/`$defs` resolution, including recursive schemas
//! - `dependencies` (property, schema and `oneOf` branch forms) and
//!   `oneOf`/`anyOf` option selection against live data
//! - Default-filled data, stable id paths and nested error trees
//! - `ui:order`, `ui:widget` and `ui:options` (`addable`, `orderable`, `removable`)
//! - Index-shifting array edits that keep errors attached to their element
//! - Pluggable validation, with a `jsonschema` backed validator included
//!
//! ## Quick Start
//!
//! ```rust
//! use jkform::{FormOptions, FormState, JsonSchemaValidator, Submission};
//! use serde_json::json;
//!
//! let schema = json!({
//!     "type": "object",
//!     "required": ["name"],
//!     "properties": {
//!         "name": {"type": "string", "default": "guest"},
//!         "tags": {"type": "array", "items": {"type": "string"}}
//!     }
//! });
//!
//! let mut form = FormState::new(schema, None, None, FormOptions::default(), JsonSchemaValidator)?;
//! assert_eq!(form.form_data(), &json!({"name": "guest", "tags": []}));
//! assert_eq!(form.id_schema().get("name").unwrap().id, "root_name");
//!
//! assert!(matches!(form.submit()?, Submission::Accepted(_)));
//! # Ok::<(), jkform::FormError>(())
//! ```
//!
//! ## Modules
//!
//! - [`schema`] - Schema resolution and field classification
//! - [`state`] - Derived trees: defaults, ids, property order, errors, arrays
//! - [`form`] - The form state holder
//! - [`field`] - The field tree handed to renderers
//! - [`registry`] - Renderer lookup
//! - [`validate`] - Validator boundary

#[macro_use]
extern crate log;

mod error;

/// Location segments inside form data.
pub mod path;

/// Schema resolution and field classification.
///
/// Turns a possibly self-referential, polymorphic schema into concrete
/// nodes relative to the current data.
pub mod schema;

/// Derived form state: defaults, id paths, property order, error trees and
/// array edits.
pub mod state;

/// The form state holder.
pub mod form;

/// The field tree handed to renderers.
pub mod field;

/// Renderer lookup by field kind and widget.
pub mod registry;

/// Validator boundary and the `jsonschema` adapter.
pub mod validate;

pub use error::{ArrayAction, FormError, Result};
pub use field::Field;
pub use form::{FormOptions, FormState, Submission};
pub use path::PathSegment;
pub use registry::{Registry, Render};
pub use schema::{Context, Definitions, SchemaKind, UiSchema};
pub use state::{ErrorSchema, IdSchema, ValidationError};
pub use validate::{JsonSchemaValidator, Validator};
pub use serde_json::Value;
