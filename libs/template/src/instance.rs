use mock_schema::MessageSchema;

/// Field value. Integer signedness follows the field's scalar type.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Bytes(Vec<u8>),
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
    /// Enum number; rendered by name when the schema declares it.
    Enum(i32),
    Message(Instance),
    /// No usable placeholder for the field's kind.
    Null,
}

impl Value {
    pub fn as_message(&self) -> Option<&Instance> {
        match self {
            Value::Message(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_message_mut(&mut self) -> Option<&mut Instance> {
        match self {
            Value::Message(m) => Some(m),
            _ => None,
        }
    }
}

/// One field of an instance.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Slot {
    #[default]
    Unset,
    Single(Value),
    Repeated(Vec<Value>),
}

impl Slot {
    pub fn is_set(&self) -> bool {
        match self {
            Slot::Unset => false,
            Slot::Single(_) => true,
            Slot::Repeated(values) => !values.is_empty(),
        }
    }

    pub fn values(&self) -> &[Value] {
        match self {
            Slot::Unset => &[],
            Slot::Single(v) => std::slice::from_ref(v),
            Slot::Repeated(values) => values,
        }
    }
}

/// Value tree mirroring a `MessageSchema`.
///
/// Positional: `slots[i]` belongs to `schema.fields[i]`. The schema is not
/// stored, every operation that needs names takes it explicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    slots: Vec<Slot>,
}

impl Instance {
    /// Instance with every singular field unset and every repeated field empty.
    pub fn empty(schema: &MessageSchema) -> Self {
        let slots = schema
            .fields
            .iter()
            .map(|f| if f.is_repeated() { Slot::Repeated(Vec::new()) } else { Slot::Unset })
            .collect();
        Self { slots }
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    pub fn slot_mut(&mut self, index: usize) -> Option<&mut Slot> {
        self.slots.get_mut(index)
    }

    /// Look a slot up by field name.
    pub fn get<'a>(&'a self, schema: &MessageSchema, field: &str) -> Option<&'a Slot> {
        schema.index_of(field).and_then(|i| self.slots.get(i))
    }

    pub fn get_mut<'a>(&'a mut self, schema: &MessageSchema, field: &str) -> Option<&'a mut Slot> {
        schema.index_of(field).and_then(|i| self.slots.get_mut(i))
    }

    pub fn set(&mut self, index: usize, value: Value) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = Slot::Single(value);
        }
    }

    /// Append to a repeated slot. An unset or single slot becomes repeated.
    pub fn push(&mut self, index: usize, value: Value) {
        let Some(slot) = self.slots.get_mut(index) else {
            return;
        };
        match slot {
            Slot::Repeated(values) => values.push(value),
            Slot::Unset => *slot = Slot::Repeated(vec![value]),
            Slot::Single(_) => {
                if let Slot::Single(first) = std::mem::take(slot) {
                    *slot = Slot::Repeated(vec![first, value]);
                }
            }
        }
    }
}
