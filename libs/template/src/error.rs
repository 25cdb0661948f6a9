/// Template text could not be read back into an instance.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("line {line}, column {column}: {kind}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub(crate) fn new(line: usize, column: usize, kind: ParseErrorKind) -> Self {
        Self { line, column, kind }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseErrorKind {
    #[error("message type '{message}' has no field named '{field}'")]
    UnknownField { message: String, field: String },

    #[error("field '{field}': cannot read {literal:?} as {expected}")]
    InvalidValue {
        field: String,
        expected: String,
        literal: String,
    },

    #[error("block '{field}' opened on line {opened_line} is never closed")]
    Unterminated { field: String, opened_line: usize },

    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("invalid escape sequence '\\{0}'")]
    InvalidEscape(String),

    #[error("unexpected character {0:?}")]
    UnexpectedChar(char),

    #[error("expected {expected}, found {found}")]
    UnexpectedToken { expected: String, found: String },

    #[error("non-repeated field '{field}' is specified multiple times")]
    DuplicateField { field: String },

    #[error("field '{field}' is not repeated, list syntax is not allowed")]
    NotRepeated { field: String },

    #[error("field '{field}' has kind '{kind}' which has no text form")]
    UnsupportedKind { field: String, kind: String },
}

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("template '{path}': {source}")]
    Io { path: String, source: std::io::Error },

    #[error("bad template '{path}': {source}")]
    Parse { path: String, source: ParseError },
}
