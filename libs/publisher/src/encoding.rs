use std::fmt;
use std::str::FromStr;

use base64::Engine;
use prost::encoding::{self, WireType};
use serde::Deserialize;
use serde_json::{Map, Number, Value as Json};

use mock_schema::{FieldDescriptor, Kind, MessageSchema, ScalarType};
use mock_template::{Instance, Slot, Value, render_line};

use crate::error::BusError;

/// Payload format for buses that put bytes on a wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// One-line text format.
    #[default]
    Text,
    /// Protobuf wire format keyed by field number.
    Binary,
    /// JSON object keyed by field name.
    Json,
}

impl Encoding {
    pub fn encode(&self, instance: &Instance, schema: &MessageSchema) -> Result<Vec<u8>, BusError> {
        match self {
            Encoding::Text => Ok(render_line(instance, schema).into_bytes()),
            Encoding::Binary => {
                let mut buf = Vec::new();
                encode_message(instance, schema, &mut buf)?;
                Ok(buf)
            }
            Encoding::Json => {
                let object = json_message(instance, schema)?;
                serde_json::to_vec(&object).map_err(|e| BusError::Encode(e.to_string()))
            }
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Encoding::Text => "text",
            Encoding::Binary => "binary",
            Encoding::Json => "json",
        })
    }
}

impl FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Encoding::Text),
            "binary" => Ok(Encoding::Binary),
            "json" => Ok(Encoding::Json),
            other => Err(format!("unknown encoding '{other}', expected text, binary or json")),
        }
    }
}

fn mismatch(field: &FieldDescriptor, value: &Value) -> BusError {
    BusError::Encode(format!("field '{}' ({}) holds {value:?}", field.name, field.kind))
}

// ═══════════════════════════════════════════════════════════════
//  Binary
// ═══════════════════════════════════════════════════════════════

fn encode_message(instance: &Instance, schema: &MessageSchema, buf: &mut Vec<u8>) -> Result<(), BusError> {
    for (field, slot) in schema.fields.iter().zip(instance.slots()) {
        for value in slot.values() {
            encode_field(field, value, buf)?;
        }
    }
    Ok(())
}

fn encode_field(field: &FieldDescriptor, value: &Value, buf: &mut Vec<u8>) -> Result<(), BusError> {
    let tag = field.number;
    match (&field.kind, value) {
        (_, Value::Null) | (Kind::Unsupported(_), _) => {}
        (Kind::Message(child), Value::Message(inner)) => {
            let mut nested = Vec::new();
            encode_message(inner, child, &mut nested)?;
            encoding::encode_key(tag, WireType::LengthDelimited, buf);
            encoding::encode_varint(nested.len() as u64, buf);
            buf.extend_from_slice(&nested);
        }
        (Kind::Enum(_), Value::Enum(n)) => encoding::int32::encode(tag, n, buf),
        (Kind::Scalar(scalar), value) => encode_scalar(tag, *scalar, value, buf).ok_or_else(|| mismatch(field, value))?,
        (_, value) => return Err(mismatch(field, value)),
    }
    Ok(())
}

fn encode_scalar(tag: u32, scalar: ScalarType, value: &Value, buf: &mut Vec<u8>) -> Option<()> {
    match (scalar, value) {
        (ScalarType::String, Value::String(s)) => encoding::string::encode(tag, s, buf),
        (ScalarType::Bytes, Value::Bytes(b)) => encoding::bytes::encode(tag, b, buf),
        (ScalarType::Bool, Value::Bool(b)) => encoding::bool::encode(tag, b, buf),
        (ScalarType::Double, Value::Float(f)) => encoding::double::encode(tag, f, buf),
        (ScalarType::Float, Value::Float(f)) => encoding::float::encode(tag, &(*f as f32), buf),
        (s, Value::Int(i)) if s.is_signed_integer() => {
            let i = *i;
            match s {
                ScalarType::Int32 => encoding::int32::encode(tag, &(i as i32), buf),
                ScalarType::Sint32 => encoding::sint32::encode(tag, &(i as i32), buf),
                ScalarType::Sfixed32 => encoding::sfixed32::encode(tag, &(i as i32), buf),
                ScalarType::Int64 => encoding::int64::encode(tag, &i, buf),
                ScalarType::Sint64 => encoding::sint64::encode(tag, &i, buf),
                ScalarType::Sfixed64 => encoding::sfixed64::encode(tag, &i, buf),
                _ => return None,
            }
        }
        (s, Value::UInt(u)) if s.is_unsigned_integer() => {
            let u = *u;
            match s {
                ScalarType::Uint32 => encoding::uint32::encode(tag, &(u as u32), buf),
                ScalarType::Fixed32 => encoding::fixed32::encode(tag, &(u as u32), buf),
                ScalarType::Uint64 => encoding::uint64::encode(tag, &u, buf),
                ScalarType::Fixed64 => encoding::fixed64::encode(tag, &u, buf),
                _ => return None,
            }
        }
        _ => return None,
    }
    Some(())
}

// ═══════════════════════════════════════════════════════════════
//  JSON
// ═══════════════════════════════════════════════════════════════

fn json_message(instance: &Instance, schema: &MessageSchema) -> Result<Json, BusError> {
    let mut object = Map::new();
    for (field, slot) in schema.fields.iter().zip(instance.slots()) {
        match slot {
            Slot::Unset => {}
            Slot::Single(Value::Null) => {}
            Slot::Single(value) => {
                object.insert(field.name.clone(), json_value(field, value)?);
            }
            Slot::Repeated(values) => {
                let items = values
                    .iter()
                    .filter(|v| !matches!(v, Value::Null))
                    .map(|v| json_value(field, v))
                    .collect::<Result<Vec<_>, _>>()?;
                object.insert(field.name.clone(), Json::Array(items));
            }
        }
    }
    Ok(Json::Object(object))
}

/// 64-bit integers are strings and bytes are base64, as in the canonical JSON mapping.
fn json_value(field: &FieldDescriptor, value: &Value) -> Result<Json, BusError> {
    let wide = matches!(field.kind, Kind::Scalar(s) if s.is_integer() && !s.is_32bit());
    let json = match value {
        Value::String(s) => Json::String(s.clone()),
        Value::Bytes(b) => Json::String(base64::engine::general_purpose::STANDARD.encode(b)),
        Value::Int(i) if wide => Json::String(i.to_string()),
        Value::UInt(u) if wide => Json::String(u.to_string()),
        Value::Int(i) => Json::Number((*i).into()),
        Value::UInt(u) => Json::Number((*u).into()),
        Value::Float(f) => match Number::from_f64(*f) {
            Some(n) => Json::Number(n),
            None if f.is_nan() => Json::String("NaN".into()),
            None if *f > 0.0 => Json::String("Infinity".into()),
            None => Json::String("-Infinity".into()),
        },
        Value::Bool(b) => Json::Bool(*b),
        Value::Enum(n) => match &field.kind {
            Kind::Enum(e) => match e.name_of(*n) {
                Some(name) => Json::String(name.to_string()),
                None => Json::Number((*n).into()),
            },
            _ => return Err(mismatch(field, value)),
        },
        Value::Message(inner) => match &field.kind {
            Kind::Message(child) => json_message(inner, child)?,
            _ => return Err(mismatch(field, value)),
        },
        Value::Null => Json::Null,
    };
    Ok(json)
}
