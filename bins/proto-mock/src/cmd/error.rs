use mock_publisher::PublishError;
use mock_schema::SchemaError;
use mock_template::TemplateError;

#[derive(Debug, thiserror::Error)]
pub enum ProtoMockError {
    #[error("config: {0}")]
    Config(String),

    #[error("{0}")]
    Usage(String),

    #[error("schema: {0}")]
    Schema(#[from] SchemaError),

    #[error("template: {0}")]
    Template(#[from] TemplateError),

    #[error("publish: {0}")]
    Publish(#[from] PublishError),

    #[error("signal handler: {0}")]
    Signal(std::io::Error),
}

impl ProtoMockError {
    /// 2 for bad invocations, 1 for everything that went wrong at runtime.
    pub fn exit_code(&self) -> i32 {
        match self {
            ProtoMockError::Usage(_) => 2,
            _ => 1,
        }
    }
}
