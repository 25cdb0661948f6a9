use std::fmt::Write;

use mock_schema::{FieldDescriptor, Kind, MessageSchema, ScalarType};

use crate::instance::{Instance, Slot, Value};

/// Multi-line text format, two spaces of indentation per nesting level.
pub fn render(instance: &Instance, schema: &MessageSchema) -> String {
    let mut printer = Printer::new(false);
    printer.message(instance, schema);
    printer.out
}

/// Single-line text format, used as a wire payload and in logs.
pub fn render_line(instance: &Instance, schema: &MessageSchema) -> String {
    let mut printer = Printer::new(true);
    printer.message(instance, schema);
    printer.out
}

struct Printer {
    out: String,
    indent: usize,
    one_line: bool,
}

impl Printer {
    fn new(one_line: bool) -> Self {
        Self {
            out: String::new(),
            indent: 0,
            one_line,
        }
    }

    fn message(&mut self, instance: &Instance, schema: &MessageSchema) {
        for (field, slot) in schema.fields.iter().zip(instance.slots()) {
            match slot {
                Slot::Unset => {}
                Slot::Single(value) => self.field(field, value),
                Slot::Repeated(values) => {
                    for value in values {
                        self.field(field, value);
                    }
                }
            }
        }
    }

    fn field(&mut self, field: &FieldDescriptor, value: &Value) {
        match (value, &field.kind) {
            (Value::Message(child), Kind::Message(child_schema)) => {
                self.begin_line();
                self.out.push_str(&field.name);
                self.out.push_str(" {");
                self.end_line();
                self.indent += 1;
                self.message(child, child_schema);
                self.indent -= 1;
                self.begin_line();
                self.out.push('}');
                self.end_line();
            }
            (Value::Null, kind) => {
                // Comments would swallow the rest of a single-line payload.
                if !self.one_line {
                    self.begin_line();
                    let _ = write!(self.out, "# {}: no placeholder for {kind}", field.name);
                    self.end_line();
                }
            }
            (value, kind) => {
                self.begin_line();
                self.out.push_str(&field.name);
                self.out.push_str(": ");
                literal(&mut self.out, value, kind);
                self.end_line();
            }
        }
    }

    fn begin_line(&mut self) {
        if self.one_line {
            if !self.out.is_empty() {
                self.out.push(' ');
            }
        } else {
            for _ in 0..self.indent {
                self.out.push_str("  ");
            }
        }
    }

    fn end_line(&mut self) {
        if !self.one_line {
            self.out.push('\n');
        }
    }
}

fn literal(out: &mut String, value: &Value, kind: &Kind) {
    match value {
        Value::String(s) => quote_str(out, s),
        Value::Bytes(b) => quote_bytes(out, b),
        Value::Int(i) => {
            let _ = write!(out, "{i}");
        }
        Value::UInt(u) => {
            let _ = write!(out, "{u}");
        }
        Value::Float(f) => {
            let single = matches!(kind, Kind::Scalar(ScalarType::Float));
            out.push_str(&format_float(*f, single));
        }
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Enum(number) => match kind {
            Kind::Enum(e) => match e.name_of(*number) {
                Some(name) => out.push_str(name),
                None => {
                    let _ = write!(out, "{number}");
                }
            },
            _ => {
                let _ = write!(out, "{number}");
            }
        },
        // A message value under a non-message field: nothing sensible to print.
        Value::Message(_) => out.push_str("{}"),
        Value::Null => {}
    }
}

/// Floats always carry a decimal point or exponent so they read as floats.
pub(crate) fn format_float(f: f64, single: bool) -> String {
    if f.is_nan() {
        "nan".to_string()
    } else if f.is_infinite() {
        if f > 0.0 { "inf".to_string() } else { "-inf".to_string() }
    } else if single {
        format!("{:?}", f as f32)
    } else {
        format!("{f:?}")
    }
}

fn quote_str(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '"' => out.push_str("\\\""),
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                let _ = write!(out, "\\{:03o}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

fn quote_bytes(out: &mut String, bytes: &[u8]) {
    out.push('"');
    for &b in bytes {
        match b {
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            b'"' => out.push_str("\\\""),
            b'\'' => out.push_str("\\'"),
            b'\\' => out.push_str("\\\\"),
            0x20..=0x7e => out.push(b as char),
            _ => {
                let _ = write!(out, "\\{b:03o}");
            }
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use mock_schema::{EnumSchema, FieldDescriptor};

    #[test]
    fn floats_keep_a_decimal_point() {
        assert_eq!(format_float(0.0, false), "0.0");
        assert_eq!(format_float(1.5, false), "1.5");
        assert_eq!(format_float(1e-7, false), "1e-7");
        assert_eq!(format_float(0.1, true), "0.1");
        assert_eq!(format_float(f64::NEG_INFINITY, false), "-inf");
        assert_eq!(format_float(f64::NAN, true), "nan");
    }

    #[test]
    fn escapes_strings_and_bytes() {
        let mut out = String::new();
        quote_str(&mut out, "say \"hi\"\n\u{1}ümlaut");
        assert_eq!(out, r#""say \"hi\"\n\001ümlaut""#);

        let mut out = String::new();
        quote_bytes(&mut out, &[b'a', 0, 0xff, b'\\']);
        assert_eq!(out, r#""a\000\377\\""#);
    }

    #[test]
    fn unknown_enum_numbers_render_numerically() {
        let schema = MessageSchema::new(
            "t.E",
            vec![FieldDescriptor::enumeration("e", 1, EnumSchema::new("t.Kind", [("A", 0)])).repeated()],
        );
        let mut instance = Instance::empty(&schema);
        instance.push(0, Value::Enum(0));
        instance.push(0, Value::Enum(7));
        assert_eq!(render(&instance, &schema), "e: A\ne: 7\n");
    }

    #[test]
    fn null_values_become_comments() {
        let schema = MessageSchema::new(
            "t.Legacy",
            vec![
                FieldDescriptor::new("grp", 1, Kind::Unsupported("group".into()), mock_schema::Cardinality::Singular),
                FieldDescriptor::scalar("ok", 2, ScalarType::Bool),
            ],
        );
        let mut instance = Instance::empty(&schema);
        instance.set(0, Value::Null);
        instance.set(1, Value::Bool(true));

        assert_eq!(render(&instance, &schema), "# grp: no placeholder for group\nok: true\n");
        assert_eq!(render_line(&instance, &schema), "ok: true");
    }

    #[test]
    fn unset_fields_are_omitted() {
        let schema = MessageSchema::new(
            "t.S",
            vec![
                FieldDescriptor::scalar("a", 1, ScalarType::Int32),
                FieldDescriptor::scalar("b", 2, ScalarType::Int32),
            ],
        );
        let mut instance = Instance::empty(&schema);
        instance.set(1, Value::Int(3));
        assert_eq!(render(&instance, &schema), "b: 3\n");
    }
}
