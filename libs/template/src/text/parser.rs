use mock_schema::{EnumSchema, FieldDescriptor, Kind, MessageSchema, ScalarType};

use crate::error::{ParseError, ParseErrorKind};
use crate::instance::{Instance, Slot, Value};
use crate::text::lexer::{Token, TokenKind};

/// Open block: closing delimiter, field name and the line it started on.
struct Block<'a> {
    close: char,
    field: &'a str,
    line: usize,
}

pub(crate) struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub(crate) fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    pub(crate) fn parse_root(mut self, schema: &MessageSchema) -> Result<Instance, ParseError> {
        self.message(schema, None)
    }

    // ── token helpers ──

    fn peek(&self) -> &Token {
        // The lexer always terminates the stream with Eof.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn next(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn at_punct(&self, c: char) -> bool {
        self.peek().kind == TokenKind::Punct(c)
    }

    fn eat_punct(&mut self, c: char) -> bool {
        if self.at_punct(c) {
            self.next();
            true
        } else {
            false
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        let token = self.peek();
        ParseError::new(
            token.line,
            token.column,
            ParseErrorKind::UnexpectedToken {
                expected: expected.to_string(),
                found: token.kind.describe(),
            },
        )
    }

    // ── messages ──

    fn message(&mut self, schema: &MessageSchema, block: Option<Block<'_>>) -> Result<Instance, ParseError> {
        let mut instance = Instance::empty(schema);

        loop {
            let token = self.peek().clone();
            match &token.kind {
                TokenKind::Eof => {
                    if let Some(block) = block {
                        return Err(ParseError::new(
                            token.line,
                            token.column,
                            ParseErrorKind::Unterminated {
                                field: block.field.to_string(),
                                opened_line: block.line,
                            },
                        ));
                    }
                    return Ok(instance);
                }
                TokenKind::Punct(c) if block.as_ref().is_some_and(|b| b.close == *c) => {
                    self.next();
                    return Ok(instance);
                }
                TokenKind::Ident(name) => {
                    self.next();
                    let index = schema.index_of(name).ok_or_else(|| {
                        ParseError::new(
                            token.line,
                            token.column,
                            ParseErrorKind::UnknownField {
                                message: schema.full_name.clone(),
                                field: name.clone(),
                            },
                        )
                    })?;
                    self.field(&mut instance, index, &schema.fields[index], &token)?;
                    // Optional separators between fields.
                    if !self.eat_punct(',') {
                        self.eat_punct(';');
                    }
                }
                _ => return Err(self.unexpected("field name")),
            }
        }
    }

    fn field(
        &mut self,
        instance: &mut Instance,
        index: usize,
        field: &FieldDescriptor,
        name_token: &Token,
    ) -> Result<(), ParseError> {
        let had_colon = self.eat_punct(':');

        if self.at_punct('[') {
            if !field.is_repeated() {
                return Err(ParseError::new(
                    name_token.line,
                    name_token.column,
                    ParseErrorKind::NotRepeated { field: field.name.clone() },
                ));
            }
            self.next();
            if self.eat_punct(']') {
                return Ok(());
            }
            loop {
                let value = self.value(field, had_colon)?;
                instance.push(index, value);
                if self.eat_punct(']') {
                    return Ok(());
                }
                if !self.eat_punct(',') {
                    return Err(self.unexpected("',' or ']'"));
                }
            }
        }

        let value = self.value(field, had_colon)?;
        if field.is_repeated() {
            instance.push(index, value);
            return Ok(());
        }
        if matches!(instance.slot(index), Some(Slot::Single(_))) {
            return Err(ParseError::new(
                name_token.line,
                name_token.column,
                ParseErrorKind::DuplicateField { field: field.name.clone() },
            ));
        }
        instance.set(index, value);
        Ok(())
    }

    fn value(&mut self, field: &FieldDescriptor, had_colon: bool) -> Result<Value, ParseError> {
        match &field.kind {
            Kind::Message(child) => {
                let open = self.peek().clone();
                let close = match open.kind {
                    TokenKind::Punct('{') => '}',
                    TokenKind::Punct('<') => '>',
                    _ => return Err(self.unexpected("'{' or '<'")),
                };
                self.next();
                let block = Block {
                    close,
                    field: &field.name,
                    line: open.line,
                };
                Ok(Value::Message(self.message(child, Some(block))?))
            }
            _ if !had_colon => Err(self.unexpected("':'")),
            Kind::Unsupported(kind) => {
                let token = self.peek();
                Err(ParseError::new(
                    token.line,
                    token.column,
                    ParseErrorKind::UnsupportedKind {
                        field: field.name.clone(),
                        kind: kind.clone(),
                    },
                ))
            }
            Kind::Enum(e) => self.enum_value(field, e),
            Kind::Scalar(scalar) => self.scalar(field, *scalar),
        }
    }

    /// Literal text of a (possibly negated) number or identifier.
    fn signed_word(&mut self, field: &FieldDescriptor, expected: &str) -> Result<(String, Token), ParseError> {
        let negative = self.eat_punct('-');
        let token = self.next();
        let word = match &token.kind {
            TokenKind::Number(n) => n.clone(),
            TokenKind::Ident(i) => i.clone(),
            _ => {
                return Err(ParseError::new(
                    token.line,
                    token.column,
                    ParseErrorKind::InvalidValue {
                        field: field.name.clone(),
                        expected: expected.to_string(),
                        literal: token.kind.describe(),
                    },
                ));
            }
        };
        let text = if negative { format!("-{word}") } else { word };
        Ok((text, token))
    }

    fn enum_value(&mut self, field: &FieldDescriptor, e: &EnumSchema) -> Result<Value, ParseError> {
        let (text, token) = self.signed_word(field, "enum value")?;
        if let Some(number) = e.number_of(&text) {
            return Ok(Value::Enum(number));
        }
        // Numeric values are accepted even when undeclared (open enums).
        parse_integer(&text)
            .and_then(|n| i32::try_from(n).ok())
            .map(Value::Enum)
            .ok_or_else(|| invalid(field, &format!("enum {}", e.full_name), &text, &token))
    }

    fn scalar(&mut self, field: &FieldDescriptor, scalar: ScalarType) -> Result<Value, ParseError> {
        match scalar {
            ScalarType::String | ScalarType::Bytes => {
                let token = self.peek().clone();
                let mut bytes = match self.next().kind {
                    TokenKind::Str(b) => b,
                    other => {
                        return Err(invalid(field, &scalar.to_string(), &other.describe(), &token));
                    }
                };
                // Adjacent literals concatenate.
                while let TokenKind::Str(more) = &self.peek().kind {
                    bytes.extend_from_slice(more);
                    self.next();
                }
                if scalar == ScalarType::Bytes {
                    return Ok(Value::Bytes(bytes));
                }
                String::from_utf8(bytes)
                    .map(Value::String)
                    .map_err(|e| invalid(field, "UTF-8 string", &String::from_utf8_lossy(e.as_bytes()), &token))
            }
            ScalarType::Bool => {
                let (text, token) = self.signed_word(field, "bool")?;
                match text.as_str() {
                    "true" | "True" | "t" | "1" => Ok(Value::Bool(true)),
                    "false" | "False" | "f" | "0" => Ok(Value::Bool(false)),
                    _ => Err(invalid(field, "bool", &text, &token)),
                }
            }
            s if s.is_floating() => {
                let (text, token) = self.signed_word(field, &s.to_string())?;
                let value = parse_float(&text).ok_or_else(|| invalid(field, &s.to_string(), &text, &token))?;
                if s == ScalarType::Float {
                    Ok(Value::Float(value as f32 as f64))
                } else {
                    Ok(Value::Float(value))
                }
            }
            s => {
                let (text, token) = self.signed_word(field, &s.to_string())?;
                let n = parse_integer(&text).ok_or_else(|| invalid(field, &s.to_string(), &text, &token))?;
                integer_value(n, s).ok_or_else(|| invalid(field, &s.to_string(), &text, &token))
            }
        }
    }
}

fn invalid(field: &FieldDescriptor, expected: &str, literal: &str, at: &Token) -> ParseError {
    ParseError::new(
        at.line,
        at.column,
        ParseErrorKind::InvalidValue {
            field: field.name.clone(),
            expected: expected.to_string(),
            literal: literal.to_string(),
        },
    )
}

/// Decimal, `0x` hex or leading-zero octal, optionally negated.
fn parse_integer(text: &str) -> Option<i128> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let magnitude = if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()?
    } else if digits.len() > 1 && digits.starts_with('0') {
        u64::from_str_radix(&digits[1..], 8).ok()?
    } else {
        digits.parse::<u64>().ok()?
    };
    let magnitude = i128::from(magnitude);
    Some(if negative { -magnitude } else { magnitude })
}

fn integer_value(n: i128, scalar: ScalarType) -> Option<Value> {
    if scalar.is_unsigned_integer() {
        let max = if scalar.is_32bit() { u32::MAX as i128 } else { u64::MAX as i128 };
        (0..=max).contains(&n).then(|| Value::UInt(n as u64))
    } else {
        let (min, max) = if scalar.is_32bit() {
            (i32::MIN as i128, i32::MAX as i128)
        } else {
            (i64::MIN as i128, i64::MAX as i128)
        };
        (min..=max).contains(&n).then(|| Value::Int(n as i64))
    }
}

fn parse_float(text: &str) -> Option<f64> {
    let lower = text.to_ascii_lowercase();
    let unsigned = lower.trim_start_matches('-');
    match unsigned {
        "inf" | "infinity" => return Some(if lower.starts_with('-') { f64::NEG_INFINITY } else { f64::INFINITY }),
        "nan" => return Some(f64::NAN),
        _ => {}
    }
    if unsigned.starts_with("0x") {
        return None;
    }
    // `1.5f` suffix is valid text format.
    let trimmed = lower.strip_suffix('f').unwrap_or(&lower);
    if !trimmed
        .trim_start_matches('-')
        .starts_with(|c: char| c.is_ascii_digit() || c == '.')
    {
        return None;
    }
    trimmed.parse::<f64>().ok()
}
