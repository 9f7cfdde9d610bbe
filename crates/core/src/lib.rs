pub mod definition;
pub mod draft;
pub mod error;
pub mod field_type;
pub mod ids;
pub mod validate;

pub use definition::{FieldDefinition, SelectBinding, StaticField};
pub use draft::Draft;
pub use error::CoreError;
pub use field_type::FieldType;
pub use ids::*;
