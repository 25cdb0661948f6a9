use serde::Deserialize;

use mock_schema::{Kind, MessageSchema, ScalarType};
use mock_template::{Instance, Slot, Value};

/// Where the header lives and what its fields are called.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HeaderLayout {
    /// Singular message field on the root message.
    pub field: String,
    /// Floating-point seconds since the Unix epoch.
    pub timestamp: String,
    /// Integer incremented once per delivery.
    pub sequence: String,
}

impl Default for HeaderLayout {
    fn default() -> Self {
        Self {
            field: "header".into(),
            timestamp: "timestamp_sec".into(),
            sequence: "sequence_num".into(),
        }
    }
}

struct HeaderSlots {
    index: usize,
    schema: MessageSchema,
    timestamp: Option<(usize, ScalarType)>,
    sequence: Option<(usize, ScalarType)>,
}

/// Resolves the header once per schema and stamps it right before delivery.
pub struct HeaderStamper {
    slots: Option<HeaderSlots>,
}

impl HeaderStamper {
    pub fn new(schema: &MessageSchema, layout: &HeaderLayout) -> Self {
        let slots = schema.index_of(&layout.field).and_then(|index| {
            let field = &schema.fields[index];
            let Kind::Message(header) = &field.kind else {
                tracing::debug!(field = %field.name, "header field is not a message, not stamping");
                return None;
            };
            if field.is_repeated() {
                tracing::debug!(field = %field.name, "header field is repeated, not stamping");
                return None;
            }

            let timestamp = header.index_of(&layout.timestamp).and_then(|i| {
                let f = &header.fields[i];
                match f.kind {
                    Kind::Scalar(s) if s.is_floating() && !f.is_repeated() => Some((i, s)),
                    _ => None,
                }
            });
            let sequence = header.index_of(&layout.sequence).and_then(|i| {
                let f = &header.fields[i];
                match f.kind {
                    Kind::Scalar(s) if s.is_integer() && !f.is_repeated() => Some((i, s)),
                    _ => None,
                }
            });

            Some(HeaderSlots {
                index,
                schema: header.clone(),
                timestamp,
                sequence,
            })
        });

        Self { slots }
    }

    pub fn has_header(&self) -> bool {
        self.slots.is_some()
    }

    /// Stamp with the current wall-clock time. Returns the new sequence number.
    pub fn stamp(&self, instance: &mut Instance) -> Option<u64> {
        self.stamp_at(instance, wall_clock_secs())
    }

    /// No-op (`None`) when the schema has no header. An unset header is created.
    pub fn stamp_at(&self, instance: &mut Instance, now_secs: f64) -> Option<u64> {
        let slots = self.slots.as_ref()?;
        let slot = instance.slot_mut(slots.index)?;
        if !matches!(slot, Slot::Single(Value::Message(_))) {
            *slot = Slot::Single(Value::Message(Instance::empty(&slots.schema)));
        }
        let header = match slot {
            Slot::Single(Value::Message(header)) => header,
            _ => return None,
        };

        if let Some((index, scalar)) = slots.timestamp {
            let now = match scalar {
                ScalarType::Float => now_secs as f32 as f64,
                _ => now_secs,
            };
            header.set(index, Value::Float(now));
        }

        let (index, scalar) = slots.sequence?;
        let current = match header.slot(index) {
            Some(Slot::Single(value)) => value.clone(),
            _ => Value::UInt(0),
        };
        let (next, reported) = next_sequence(&current, scalar);
        header.set(index, next);
        Some(reported)
    }
}

/// Increment by one, wrapping at the field width.
fn next_sequence(current: &Value, scalar: ScalarType) -> (Value, u64) {
    if scalar.is_unsigned_integer() {
        let current = match current {
            Value::UInt(u) => *u,
            Value::Int(i) => *i as u64,
            _ => 0,
        };
        let next = if scalar.is_32bit() {
            u64::from((current as u32).wrapping_add(1))
        } else {
            current.wrapping_add(1)
        };
        (Value::UInt(next), next)
    } else {
        let current = match current {
            Value::Int(i) => *i,
            Value::UInt(u) => *u as i64,
            _ => 0,
        };
        let next = if scalar.is_32bit() {
            i64::from((current as i32).wrapping_add(1))
        } else {
            current.wrapping_add(1)
        };
        (Value::Int(next), next as u64)
    }
}

fn wall_clock_secs() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}
