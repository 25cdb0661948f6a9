use std::path::PathBuf;

use mock_template::{default_template_path, write_template};

use super::config::Effective;
use super::error::ProtoMockError;

/// Write a placeholder template for the configured message.
pub fn run(args: &Effective) -> Result<PathBuf, ProtoMockError> {
    let schema = mock_schema::load(&args.schema, args.message.as_deref())?;
    let path = args.output.clone().unwrap_or_else(|| default_template_path(&schema));

    write_template(&path, &schema)?;
    println!("Template for {} written to {}", schema.full_name, path.display());
    println!("Edit the values, then run `proto-mock publish --input {}`", path.display());
    Ok(path)
}
