//! Placeholder templates for schema-described messages.
//!
//! `synthesize` builds a fully populated instance, `text` converts between
//! instances and protobuf text format, `file` reads and writes template files.

pub mod error;
pub mod file;
pub mod instance;
pub mod synth;
pub mod text;

pub use error::{ParseError, ParseErrorKind, TemplateError};
pub use file::{default_template_path, load_template, write_template};
pub use instance::{Instance, Slot, Value};
pub use synth::{synthesize, PLACEHOLDER_STRING};
pub use text::{parse, render, render_line, render_template};
