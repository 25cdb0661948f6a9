#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("cannot read schema '{path}': {source}")]
    Io { path: String, source: std::io::Error },

    #[error("bad schema registry '{path}': {source}")]
    Toml { path: String, source: toml::de::Error },

    #[error("bad descriptor set: {0}")]
    Descriptor(#[from] prost_reflect::DescriptorError),

    #[error("message type '{0}' not found in schema")]
    MessageNotFound(String),

    #[error("schema '{0}' holds a descriptor set, --message is required")]
    MessageRequired(String),

    #[error("schema registry declares no messages")]
    Empty,

    #[error("field '{message}.{field}': unknown type '{type_name}'")]
    UnknownType { message: String, field: String, type_name: String },

    #[error("type name '{0}' is ambiguous, use the fully qualified name")]
    AmbiguousType(String),

    #[error("message '{message}' declares field '{field}' twice")]
    DuplicateField { message: String, field: String },

    #[error("cyclic type reference: {}", .0.join(" -> "))]
    Cycle(Vec<String>),
}
