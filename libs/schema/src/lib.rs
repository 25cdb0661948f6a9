//! Message schema model shared by the template codec and the publisher.
//!
//! A schema is an owned, finite tree: every nested message and enum is resolved
//! when the schema is loaded, and loaders refuse cyclic type references.

pub mod descriptor;
pub mod error;
pub mod registry;
pub mod types;

pub use error::SchemaError;
pub use types::{Cardinality, EnumSchema, EnumValue, FieldDescriptor, Kind, MessageSchema, ScalarType};

use std::path::Path;

/// Load a schema from a file, picking the provider by extension.
///
/// `.toml` is read as a schema registry, anything else as a serialized
/// `FileDescriptorSet` (`protoc --descriptor_set_out`).
pub fn load(path: impl AsRef<Path>, message: Option<&str>) -> Result<MessageSchema, SchemaError> {
    let path = path.as_ref();
    let is_toml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("toml"));

    let schema = if is_toml {
        MessageSchema::from_toml_file(path, message)?
    } else {
        let message = message.ok_or_else(|| SchemaError::MessageRequired(path.display().to_string()))?;
        MessageSchema::from_descriptor_set(path, message)?
    };

    tracing::debug!(path = %path.display(), message = %schema.full_name, fields = schema.fields.len(), "loaded schema");
    Ok(schema)
}
