use serde::{Deserialize, Serialize};

// ════════════════════════════════════════════════════════════════
//  Scalar Type
// ════════════════════════════════════════════════════════════════

/// Primitive field types. Names follow the protobuf scalar names so a
/// schema registry and a descriptor set describe the same thing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarType {
    String,
    Bytes,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Sint32,
    Sint64,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    Float,
    Double,
    Bool,
}

impl ScalarType {
    pub fn from_name(name: &str) -> Option<Self> {
        let ty = match name {
            "string" => ScalarType::String,
            "bytes" => ScalarType::Bytes,
            "int32" => ScalarType::Int32,
            "int64" => ScalarType::Int64,
            "uint32" => ScalarType::Uint32,
            "uint64" => ScalarType::Uint64,
            "sint32" => ScalarType::Sint32,
            "sint64" => ScalarType::Sint64,
            "fixed32" => ScalarType::Fixed32,
            "fixed64" => ScalarType::Fixed64,
            "sfixed32" => ScalarType::Sfixed32,
            "sfixed64" => ScalarType::Sfixed64,
            "float" => ScalarType::Float,
            "double" => ScalarType::Double,
            "bool" => ScalarType::Bool,
            _ => return None,
        };
        Some(ty)
    }

    pub fn is_signed_integer(self) -> bool {
        matches!(
            self,
            ScalarType::Int32
                | ScalarType::Int64
                | ScalarType::Sint32
                | ScalarType::Sint64
                | ScalarType::Sfixed32
                | ScalarType::Sfixed64
        )
    }

    pub fn is_unsigned_integer(self) -> bool {
        matches!(
            self,
            ScalarType::Uint32 | ScalarType::Uint64 | ScalarType::Fixed32 | ScalarType::Fixed64
        )
    }

    pub fn is_integer(self) -> bool {
        self.is_signed_integer() || self.is_unsigned_integer()
    }

    pub fn is_floating(self) -> bool {
        matches!(self, ScalarType::Float | ScalarType::Double)
    }

    /// 32-bit numeric types. Values are range-checked and wrapped at 32 bits.
    pub fn is_32bit(self) -> bool {
        matches!(
            self,
            ScalarType::Int32
                | ScalarType::Uint32
                | ScalarType::Sint32
                | ScalarType::Fixed32
                | ScalarType::Sfixed32
                | ScalarType::Float
        )
    }
}

impl std::fmt::Display for ScalarType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ScalarType::String => "string",
            ScalarType::Bytes => "bytes",
            ScalarType::Int32 => "int32",
            ScalarType::Int64 => "int64",
            ScalarType::Uint32 => "uint32",
            ScalarType::Uint64 => "uint64",
            ScalarType::Sint32 => "sint32",
            ScalarType::Sint64 => "sint64",
            ScalarType::Fixed32 => "fixed32",
            ScalarType::Fixed64 => "fixed64",
            ScalarType::Sfixed32 => "sfixed32",
            ScalarType::Sfixed64 => "sfixed64",
            ScalarType::Float => "float",
            ScalarType::Double => "double",
            ScalarType::Bool => "bool",
        };
        f.write_str(name)
    }
}

// ════════════════════════════════════════════════════════════════
//  Enums
// ════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumValue {
    pub name: String,
    pub number: i32,
}

/// Enumeration with its values in declaration order. May be empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumSchema {
    pub full_name: String,
    pub values: Vec<EnumValue>,
}

impl EnumSchema {
    pub fn new(full_name: impl Into<String>, values: impl IntoIterator<Item = (&'static str, i32)>) -> Self {
        Self {
            full_name: full_name.into(),
            values: values
                .into_iter()
                .map(|(name, number)| EnumValue { name: name.to_string(), number })
                .collect(),
        }
    }

    pub fn name_of(&self, number: i32) -> Option<&str> {
        self.values.iter().find(|v| v.number == number).map(|v| v.name.as_str())
    }

    pub fn number_of(&self, name: &str) -> Option<i32> {
        self.values.iter().find(|v| v.name == name).map(|v| v.number)
    }
}

// ════════════════════════════════════════════════════════════════
//  Field & MessageSchema
// ════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    Singular,
    Repeated,
}

/// What a field holds. Nested messages and enums are owned by the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Kind {
    Scalar(ScalarType),
    Enum(EnumSchema),
    Message(MessageSchema),
    /// A primitive the tool has no text form or placeholder for (proto2 groups).
    Unsupported(String),
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Kind::Scalar(s) => write!(f, "{s}"),
            Kind::Enum(e) => write!(f, "enum {}", e.full_name),
            Kind::Message(m) => write!(f, "message {}", m.full_name),
            Kind::Unsupported(name) => write!(f, "{name}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    /// Protobuf field number, used by the binary wire encoding.
    pub number: u32,
    pub kind: Kind,
    pub cardinality: Cardinality,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, number: u32, kind: Kind, cardinality: Cardinality) -> Self {
        Self {
            name: name.into(),
            number,
            kind,
            cardinality,
        }
    }

    /// Shortcut: singular scalar field.
    pub fn scalar(name: impl Into<String>, number: u32, scalar: ScalarType) -> Self {
        Self::new(name, number, Kind::Scalar(scalar), Cardinality::Singular)
    }

    /// Shortcut: singular nested message field.
    pub fn message(name: impl Into<String>, number: u32, schema: MessageSchema) -> Self {
        Self::new(name, number, Kind::Message(schema), Cardinality::Singular)
    }

    /// Shortcut: singular enum field.
    pub fn enumeration(name: impl Into<String>, number: u32, schema: EnumSchema) -> Self {
        Self::new(name, number, Kind::Enum(schema), Cardinality::Singular)
    }

    /// Same field, repeated.
    pub fn repeated(mut self) -> Self {
        self.cardinality = Cardinality::Repeated;
        self
    }

    pub fn is_repeated(&self) -> bool {
        self.cardinality == Cardinality::Repeated
    }
}

/// Message type: fully qualified name plus fields in declaration order.
///
/// Field position in `fields` is the slot index used by instances.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageSchema {
    pub full_name: String,
    pub fields: Vec<FieldDescriptor>,
}

impl MessageSchema {
    pub fn new(full_name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            full_name: full_name.into(),
            fields,
        }
    }

    /// Last segment of the fully qualified name (`pkg.Chatter` → `Chatter`).
    pub fn short_name(&self) -> &str {
        self.full_name.rsplit('.').next().unwrap_or(&self.full_name)
    }

    pub fn index_of(&self, field: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == field)
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Depth of the deepest nested message chain (0 for a flat message).
    pub fn depth(&self) -> usize {
        self.fields
            .iter()
            .filter_map(|f| match &f.kind {
                Kind::Message(m) => Some(1 + m.depth()),
                _ => None,
            })
            .max()
            .unwrap_or(0)
    }
}
