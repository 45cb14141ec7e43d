//! Schema resolution and classification.
//!
//! This module turns a (possibly self-referential, polymorphic) JSON Schema
//! plus a data value into concrete schema nodes:
//!
//! - [`definitions`] - The read-only `$ref` registry
//! - [`resolve`] - `$ref`, `dependencies` and `oneOf`/`anyOf` resolution
//! - [`kind`] - Field classification of a resolved node
//! - [`ui`] - Accessors over ui-schema nodes

/// Definitions registry and `$ref` lookup.
pub mod definitions;

/// Field kind classification.
pub mod kind;

/// Schema resolution against data.
pub mod resolve;

/// UI schema hints.
pub mod ui;

pub use definitions::Definitions;
pub use kind::{ArrayKind, ScalarKind, SchemaKind, classify};
pub use resolve::{effective_node, resolve_node, resolve_schema, select_option};
pub use ui::{UiOptions, UiSchema};

/// Everything a recursive derivation needs besides the node it is at.
///
/// One value is threaded through every recursive call instead of passing
/// the registry, the ui root and the id prefix separately.
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    pub definitions: Definitions<'a>,
    pub ui_schema: UiSchema<'a>,
    pub id_prefix: &'a str,
}

/// Identifier of the root node when the caller gives no prefix.
pub const DEFAULT_ID_PREFIX: &str = "root";

impl<'a> Context<'a> {
    /// Context for a root schema, its ui schema and an id prefix.
    pub fn new(
        root: &'a serde_json::Value,
        ui_schema: Option<&'a serde_json::Value>,
        id_prefix: &'a str,
    ) -> Self {
        Self {
            definitions: Definitions::from_root(root),
            ui_schema: UiSchema::new(ui_schema),
            id_prefix,
        }
    }
}

impl Default for Context<'_> {
    fn default() -> Self {
        Self {
            definitions: Definitions::default(),
            ui_schema: UiSchema::default(),
            id_prefix: DEFAULT_ID_PREFIX,
        }
    }
}
