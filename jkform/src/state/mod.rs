//! Derived form state.
//!
//! Every tree here is a value recomputed from scratch for each input change:
//!
//! - [`defaults`] - Default-filled data
//! - [`id`] - Identifier paths
//! - [`order`] - Property display order
//! - [`errors`] - Error trees from flat validation errors
//! - [`array`] - Index-shifting array edits

pub mod array;
pub mod defaults;
pub mod errors;
pub mod id;
pub mod order;

pub use array::{ArrayField, ItemControls};
pub use defaults::compute_default;
pub use errors::{ErrorSchema, ValidationError, build_error_schema};
pub use id::{ID_SEPARATOR, IdSchema, build_id_schema, child_id};
pub use order::order_properties;
