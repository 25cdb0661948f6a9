//! TOML schema registry.
//!
//! ```toml
//! [[messages]]
//! name = "demo.Chatter"
//! fields = [
//!   { name = "header", type = "demo.Header" },
//!   { name = "color", type = "Color", repeated = true },
//!   { name = "content", type = "string", number = 7 },
//! ]
//!
//! [[enums]]
//! name = "demo.Color"
//! values = [{ name = "RED", number = 0 }, { name = "BLUE", number = 1 }]
//! ```
//!
//! Type references may use the fully qualified name or, when unambiguous, the
//! last segment only. Field numbers default to the declaration position + 1.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::types::{Cardinality, EnumSchema, EnumValue, FieldDescriptor, Kind, MessageSchema, ScalarType};
use crate::SchemaError;

#[derive(Debug, Default, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    messages: Vec<MessageDef>,
    #[serde(default)]
    enums: Vec<EnumDef>,
}

#[derive(Debug, Deserialize)]
struct MessageDef {
    name: String,
    #[serde(default)]
    fields: Vec<FieldDef>,
}

#[derive(Debug, Deserialize)]
struct FieldDef {
    name: String,
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default)]
    repeated: bool,
    number: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct EnumDef {
    name: String,
    #[serde(default)]
    values: Vec<EnumValue>,
}

enum TypeRef<'a> {
    Message(&'a MessageDef),
    Enum(&'a EnumDef),
}

fn matches_name(full: &str, wanted: &str) -> bool {
    full == wanted
        || full
            .strip_suffix(wanted)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

impl RegistryFile {
    fn lookup(&self, wanted: &str) -> Result<Option<TypeRef<'_>>, SchemaError> {
        // Exact names win over short-name matches.
        if let Some(m) = self.messages.iter().find(|m| m.name == wanted) {
            return Ok(Some(TypeRef::Message(m)));
        }
        if let Some(e) = self.enums.iter().find(|e| e.name == wanted) {
            return Ok(Some(TypeRef::Enum(e)));
        }

        let mut found = self
            .messages
            .iter()
            .filter(|m| matches_name(&m.name, wanted))
            .map(TypeRef::Message)
            .chain(
                self.enums
                    .iter()
                    .filter(|e| matches_name(&e.name, wanted))
                    .map(TypeRef::Enum),
            );

        let first = found.next();
        if found.next().is_some() {
            return Err(SchemaError::AmbiguousType(wanted.to_string()));
        }
        Ok(first)
    }
}

struct Resolver<'a> {
    file: &'a RegistryFile,
    /// Messages currently being resolved, outermost first.
    stack: Vec<String>,
}

impl Resolver<'_> {
    fn message(&mut self, def: &MessageDef) -> Result<MessageSchema, SchemaError> {
        if self.stack.iter().any(|name| *name == def.name) {
            let mut path = self.stack.clone();
            path.push(def.name.clone());
            return Err(SchemaError::Cycle(path));
        }
        self.stack.push(def.name.clone());

        let mut seen = HashSet::new();
        let mut fields = Vec::with_capacity(def.fields.len());
        for (i, field) in def.fields.iter().enumerate() {
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField {
                    message: def.name.clone(),
                    field: field.name.clone(),
                });
            }
            let kind = self.kind(&def.name, field)?;
            let cardinality = if field.repeated {
                Cardinality::Repeated
            } else {
                Cardinality::Singular
            };
            let number = field.number.unwrap_or(i as u32 + 1);
            fields.push(FieldDescriptor::new(field.name.clone(), number, kind, cardinality));
        }

        self.stack.pop();
        Ok(MessageSchema::new(def.name.clone(), fields))
    }

    fn kind(&mut self, message: &str, field: &FieldDef) -> Result<Kind, SchemaError> {
        if let Some(scalar) = ScalarType::from_name(&field.type_name) {
            return Ok(Kind::Scalar(scalar));
        }
        match self.file.lookup(&field.type_name)? {
            Some(TypeRef::Message(def)) => Ok(Kind::Message(self.message(def)?)),
            Some(TypeRef::Enum(def)) => Ok(Kind::Enum(EnumSchema {
                full_name: def.name.clone(),
                values: def.values.clone(),
            })),
            None => Err(SchemaError::UnknownType {
                message: message.to_string(),
                field: field.name.clone(),
                type_name: field.type_name.clone(),
            }),
        }
    }
}

impl MessageSchema {
    /// Resolve `message` (or the first declared message) from a TOML registry.
    pub fn from_toml_str(content: &str, message: Option<&str>) -> Result<Self, SchemaError> {
        let file: RegistryFile = toml::from_str(content).map_err(|source| SchemaError::Toml {
            path: "<inline>".into(),
            source,
        })?;
        resolve_root(&file, message)
    }

    pub fn from_toml_file(path: impl AsRef<Path>, message: Option<&str>) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let file: RegistryFile = toml::from_str(&content).map_err(|source| SchemaError::Toml {
            path: path.display().to_string(),
            source,
        })?;
        resolve_root(&file, message)
    }
}

fn resolve_root(file: &RegistryFile, message: Option<&str>) -> Result<MessageSchema, SchemaError> {
    let root = match message {
        Some(name) => match file.lookup(name)? {
            Some(TypeRef::Message(def)) => def,
            _ => return Err(SchemaError::MessageNotFound(name.to_string())),
        },
        None => file.messages.first().ok_or(SchemaError::Empty)?,
    };

    let mut resolver = Resolver { file, stack: Vec::new() };
    resolver.message(root)
}
