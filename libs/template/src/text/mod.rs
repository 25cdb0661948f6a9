//! Protobuf text format: `name: value` lines, `name { ... }` blocks, repeated
//! fields written once per element, `#` comments.

mod lexer;
mod parser;
mod render;

use mock_schema::MessageSchema;

use crate::error::ParseError;
use crate::instance::Instance;

pub use render::{render, render_line};

/// Render with the editing preamble a template file starts with.
pub fn render_template(instance: &Instance, schema: &MessageSchema) -> String {
    let mut out = preamble(schema);
    out.push_str(&render(instance, schema));
    out
}

/// Parse text format into an instance of `schema`.
///
/// Fields missing from the text stay unset.
pub fn parse(text: &str, schema: &MessageSchema) -> Result<Instance, ParseError> {
    let tokens = lexer::tokenize(text)?;
    parser::Parser::new(tokens).parse_root(schema)
}

fn preamble(schema: &MessageSchema) -> String {
    format!(
        "# Text format template for message: {}\n\
         #\n\
         # How to edit:\n\
         # 1. Replace each placeholder with the value to publish.\n\
         # 2. Repeat a field name to add more entries to a repeated field.\n\
         # 3. Write enum fields with the symbolic value names.\n\
         # 4. Delete a field line to leave that field at its default.\n\
         # 5. Lines starting with '#' are ignored.\n\
         #\n",
        schema.full_name
    )
}
