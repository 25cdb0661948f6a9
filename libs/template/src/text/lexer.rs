use crate::error::{ParseError, ParseErrorKind};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Ident(String),
    /// Unsigned numeric literal as written; a leading `-` is a separate token.
    Number(String),
    /// Decoded string literal bytes.
    Str(Vec<u8>),
    Punct(char),
    Eof,
}

impl TokenKind {
    pub(crate) fn describe(&self) -> String {
        match self {
            TokenKind::Ident(s) => format!("'{s}'"),
            TokenKind::Number(s) => format!("number {s}"),
            TokenKind::Str(_) => "string literal".to_string(),
            TokenKind::Punct(c) => format!("'{c}'"),
            TokenKind::Eof => "end of input".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    column: usize,
}

impl Lexer<'_> {
    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek() {
            if c == '#' {
                while let Some(c) = self.bump() {
                    if c == '\n' {
                        break;
                    }
                }
            } else if c.is_whitespace() {
                self.bump();
            } else {
                break;
            }
        }
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError::new(self.line, self.column, kind)
    }

    fn word(&mut self, first: char) -> String {
        let mut word = String::from(first);
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                word.push(c);
                self.bump();
            } else {
                break;
            }
        }
        word
    }

    fn number(&mut self, first: char) -> String {
        let mut text = String::from(first);
        while let Some(c) = self.peek() {
            let exponent_sign = (c == '+' || c == '-')
                && matches!(text.chars().last(), Some('e' | 'E'))
                && !text.starts_with("0x")
                && !text.starts_with("0X");
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' || exponent_sign {
                text.push(c);
                self.bump();
            } else {
                break;
            }
        }
        text
    }

    fn string(&mut self, quote: char) -> Result<Vec<u8>, ParseError> {
        let mut bytes = Vec::new();
        loop {
            let c = match self.peek() {
                None | Some('\n') => return Err(self.error(ParseErrorKind::UnterminatedString)),
                Some(c) => c,
            };
            self.bump();
            if c == quote {
                return Ok(bytes);
            }
            if c != '\\' {
                let mut buf = [0u8; 4];
                bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                continue;
            }
            self.escape(&mut bytes)?;
        }
    }

    fn escape(&mut self, bytes: &mut Vec<u8>) -> Result<(), ParseError> {
        let Some(c) = self.bump() else {
            return Err(self.error(ParseErrorKind::UnterminatedString));
        };
        match c {
            'n' => bytes.push(b'\n'),
            'r' => bytes.push(b'\r'),
            't' => bytes.push(b'\t'),
            'a' => bytes.push(0x07),
            'b' => bytes.push(0x08),
            'f' => bytes.push(0x0c),
            'v' => bytes.push(0x0b),
            '\\' | '\'' | '"' | '?' => bytes.push(c as u8),
            '0'..='7' => {
                let mut value = c.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match self.peek().and_then(|d| d.to_digit(8)) {
                        Some(d) => {
                            value = value * 8 + d;
                            self.bump();
                        }
                        None => break,
                    }
                }
                if value > 0xff {
                    return Err(self.error(ParseErrorKind::InvalidEscape(format!("{value:o}"))));
                }
                bytes.push(value as u8);
            }
            'x' => {
                let digits = self.hex_digits(2);
                if digits.is_empty() {
                    return Err(self.error(ParseErrorKind::InvalidEscape("x".into())));
                }
                let value = u8::from_str_radix(&digits, 16)
                    .map_err(|_| self.error(ParseErrorKind::InvalidEscape(format!("x{digits}"))))?;
                bytes.push(value);
            }
            'u' | 'U' => {
                let width = if c == 'u' { 4 } else { 8 };
                let digits = self.hex_digits(width);
                let ch = u32::from_str_radix(&digits, 16)
                    .ok()
                    .filter(|_| digits.len() == width)
                    .and_then(char::from_u32)
                    .ok_or_else(|| self.error(ParseErrorKind::InvalidEscape(format!("{c}{digits}"))))?;
                let mut buf = [0u8; 4];
                bytes.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
            }
            other => return Err(self.error(ParseErrorKind::InvalidEscape(other.to_string()))),
        }
        Ok(())
    }

    fn hex_digits(&mut self, max: usize) -> String {
        let mut digits = String::new();
        while digits.len() < max {
            match self.peek() {
                Some(d) if d.is_ascii_hexdigit() => {
                    digits.push(d);
                    self.bump();
                }
                _ => break,
            }
        }
        digits
    }
}

pub(crate) fn tokenize(text: &str) -> Result<Vec<Token>, ParseError> {
    let mut lexer = Lexer {
        chars: text.chars().peekable(),
        line: 1,
        column: 1,
    };
    let mut tokens = Vec::new();

    loop {
        lexer.skip_trivia();
        let (line, column) = (lexer.line, lexer.column);
        let Some(c) = lexer.bump() else {
            tokens.push(Token { kind: TokenKind::Eof, line, column });
            return Ok(tokens);
        };

        let kind = match c {
            '{' | '}' | '<' | '>' | '[' | ']' | ':' | ',' | ';' | '-' => TokenKind::Punct(c),
            '"' | '\'' => TokenKind::Str(lexer.string(c)?),
            c if c.is_ascii_digit() => TokenKind::Number(lexer.number(c)),
            '.' if lexer.peek().is_some_and(|d| d.is_ascii_digit()) => TokenKind::Number(lexer.number(c)),
            c if c.is_ascii_alphabetic() || c == '_' => TokenKind::Ident(lexer.word(c)),
            other => return Err(ParseError::new(line, column, ParseErrorKind::UnexpectedChar(other))),
        };
        tokens.push(Token { kind, line, column });
    }
}
