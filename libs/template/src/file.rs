use std::path::{Path, PathBuf};

use mock_schema::MessageSchema;

use crate::error::TemplateError;
use crate::instance::Instance;
use crate::synth::synthesize;
use crate::text::{parse, render_template};

/// `<MessageName>_template.txt` in the working directory.
pub fn default_template_path(schema: &MessageSchema) -> PathBuf {
    PathBuf::from(format!("{}_template.txt", schema.short_name()))
}

/// Synthesize a placeholder instance and write it as an editable template.
pub fn write_template(path: impl AsRef<Path>, schema: &MessageSchema) -> Result<Instance, TemplateError> {
    let path = path.as_ref();
    let instance = synthesize(schema);
    let text = render_template(&instance, schema);

    std::fs::write(path, text).map_err(|source| TemplateError::Io {
        path: path.display().to_string(),
        source,
    })?;

    tracing::info!(message = %schema.full_name, path = %path.display(), "generated text format template");
    Ok(instance)
}

/// Read an edited template back into an instance.
pub fn load_template(path: impl AsRef<Path>, schema: &MessageSchema) -> Result<Instance, TemplateError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| TemplateError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let instance = parse(&text, schema).map_err(|source| TemplateError::Parse {
        path: path.display().to_string(),
        source,
    })?;

    tracing::info!(message = %schema.full_name, path = %path.display(), "loaded message from template");
    Ok(instance)
}
