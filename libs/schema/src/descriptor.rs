//! Schema provider backed by a protobuf `FileDescriptorSet`.

use std::path::Path;

use prost_reflect::{DescriptorPool, MessageDescriptor};

use crate::types::{Cardinality, EnumSchema, EnumValue, FieldDescriptor, Kind, MessageSchema, ScalarType};
use crate::SchemaError;

impl MessageSchema {
    /// Load a FileDescriptorSet (.bin from `protoc --descriptor_set_out`) and
    /// resolve `message` (fully qualified, e.g. `apollo.common.Chatter`).
    pub fn from_descriptor_set(path: impl AsRef<Path>, message: &str) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| SchemaError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_descriptor_bytes(&bytes, message)
    }

    pub fn from_descriptor_bytes(bytes: &[u8], message: &str) -> Result<Self, SchemaError> {
        let pool = DescriptorPool::decode(bytes)?;
        Self::from_descriptor_pool(&pool, message)
    }

    pub fn from_descriptor_pool(pool: &DescriptorPool, message: &str) -> Result<Self, SchemaError> {
        let descriptor = pool
            .get_message_by_name(message)
            .ok_or_else(|| SchemaError::MessageNotFound(message.to_string()))?;
        let mut stack = Vec::new();
        convert_message(&descriptor, &mut stack)
    }
}

fn convert_message(descriptor: &MessageDescriptor, stack: &mut Vec<String>) -> Result<MessageSchema, SchemaError> {
    let full_name = descriptor.full_name().to_string();
    if stack.contains(&full_name) {
        let mut path = stack.clone();
        path.push(full_name);
        return Err(SchemaError::Cycle(path));
    }
    stack.push(full_name.clone());

    let mut fields = Vec::new();
    for field in descriptor.fields() {
        let kind = if field.is_group() {
            Kind::Unsupported("group".into())
        } else {
            convert_kind(field.kind(), stack)?
        };
        // Map fields are repeated entry messages, the way text format spells them.
        let cardinality = if field.is_list() || field.is_map() {
            Cardinality::Repeated
        } else {
            Cardinality::Singular
        };
        fields.push(FieldDescriptor::new(field.name(), field.number(), kind, cardinality));
    }

    stack.pop();
    Ok(MessageSchema::new(full_name, fields))
}

fn convert_kind(kind: prost_reflect::Kind, stack: &mut Vec<String>) -> Result<Kind, SchemaError> {
    use prost_reflect::Kind as K;

    let scalar = match kind {
        K::Double => ScalarType::Double,
        K::Float => ScalarType::Float,
        K::Int32 => ScalarType::Int32,
        K::Int64 => ScalarType::Int64,
        K::Uint32 => ScalarType::Uint32,
        K::Uint64 => ScalarType::Uint64,
        K::Sint32 => ScalarType::Sint32,
        K::Sint64 => ScalarType::Sint64,
        K::Fixed32 => ScalarType::Fixed32,
        K::Fixed64 => ScalarType::Fixed64,
        K::Sfixed32 => ScalarType::Sfixed32,
        K::Sfixed64 => ScalarType::Sfixed64,
        K::Bool => ScalarType::Bool,
        K::String => ScalarType::String,
        K::Bytes => ScalarType::Bytes,
        K::Enum(e) => {
            return Ok(Kind::Enum(EnumSchema {
                full_name: e.full_name().to_string(),
                values: e
                    .values()
                    .map(|v| EnumValue {
                        name: v.name().to_string(),
                        number: v.number(),
                    })
                    .collect(),
            }));
        }
        K::Message(m) => return Ok(Kind::Message(convert_message(&m, stack)?)),
    };
    Ok(Kind::Scalar(scalar))
}
