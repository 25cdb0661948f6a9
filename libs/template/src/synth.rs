use mock_schema::{EnumSchema, Kind, MessageSchema, ScalarType};

use crate::instance::{Instance, Value};

/// Placeholder for singular and repeated string fields.
pub const PLACEHOLDER_STRING: &str = "PLACEHOLDER_STRING";

/// Elements written into every repeated field: enough to show the repeated
/// syntax without bloating the template.
const REPEATED_SAMPLES: usize = 2;

/// Build an instance with every field populated by a deterministic placeholder.
///
/// Depth-first in declaration order. Schema trees are finite by construction
/// (providers reject cyclic references), so recursion always terminates.
pub fn synthesize(schema: &MessageSchema) -> Instance {
    let mut instance = Instance::empty(schema);

    for (index, field) in schema.fields.iter().enumerate() {
        if field.is_repeated() {
            match &field.kind {
                Kind::Enum(e) => {
                    let first = first_number(e);
                    let second = e.values.get(1).map_or(first, |v| v.number);
                    instance.push(index, Value::Enum(first));
                    instance.push(index, Value::Enum(second));
                }
                kind => {
                    for _ in 0..REPEATED_SAMPLES {
                        instance.push(index, placeholder(kind));
                    }
                }
            }
        } else {
            instance.set(index, placeholder(&field.kind));
        }
    }

    instance
}

fn placeholder(kind: &Kind) -> Value {
    match kind {
        Kind::Message(child) => Value::Message(synthesize(child)),
        Kind::Enum(e) => Value::Enum(first_number(e)),
        Kind::Scalar(scalar) => scalar_placeholder(*scalar),
        Kind::Unsupported(_) => Value::Null,
    }
}

/// Enums without declared values fall back to number 0.
fn first_number(e: &EnumSchema) -> i32 {
    e.values.first().map_or(0, |v| v.number)
}

fn scalar_placeholder(scalar: ScalarType) -> Value {
    match scalar {
        ScalarType::String => Value::String(PLACEHOLDER_STRING.to_string()),
        ScalarType::Bytes => Value::Bytes(Vec::new()),
        ScalarType::Bool => Value::Bool(false),
        s if s.is_floating() => Value::Float(0.0),
        s if s.is_unsigned_integer() => Value::UInt(0),
        _ => Value::Int(0),
    }
}
