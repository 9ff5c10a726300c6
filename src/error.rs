/// Core error types for docsession.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to read session record: {0}")]
    Read(#[source] CollectionError),

    #[error("Failed to write session record: {0}")]
    Write(#[source] CollectionError),

    #[error("Failed to delete old session records: {0}")]
    Maintenance(#[source] CollectionError),

    #[error("Failed to serialize session contents: {0}")]
    Contents(#[from] serde_json::Error),

    #[error("Operation not supported by this session store: {0}")]
    Unsupported(&'static str),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid config: {0}")]
    Invalid(String),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors reported by a document collection backend.
#[derive(Debug, thiserror::Error)]
pub enum CollectionError {
    #[error("Duplicate value for unique field '{0}'")]
    DuplicateKey(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, SessionError>;
