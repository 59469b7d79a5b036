//! Schema inference and normalization over record collections.
//!
//! Every operation works on an explicit collection of [`Record`]s and a
//! [`FieldPolicy`] describing which fields participate. Nothing here holds
//! state between calls; mutating operations take exclusive access to the
//! records for the duration of the call.

pub mod editor;
pub mod normalize;
pub mod policy;
pub mod profile;
pub mod types;

pub use editor::{EditError, FieldName, add_field, coerce_default, remove_field};
pub use normalize::normalize;
pub use policy::FieldPolicy;
pub use profile::{TypeConflict, presence_percentage, profile, type_conflicts};
pub use types::{FieldProfile, Inconsistency, NullCount, Record, SchemaReport, ValueType};
