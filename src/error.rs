//! Error types for the litscope engine.

use thiserror::Error;

/// Main error type for litscope operations.
#[derive(Error, Debug)]
pub enum LitscopeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Configuration-related errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// Corpus and citation source errors.
#[derive(Error, Debug)]
pub enum SourceError {
    /// No embeddings have been computed for the project yet.
    #[error("Embeddings unavailable for project {0}")]
    EmbeddingsUnavailable(String),

    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Invalid library snapshot: {0}")]
    Snapshot(String),
}

/// Persistence sink errors.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Cluster not found: {0}")]
    ClusterNotFound(String),

    #[error("Write failed: {0}")]
    Write(String),
}

/// Errors raised by the clustering and gap analysis loops.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Analysis cancelled")]
    Cancelled,

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type alias for litscope operations.
pub type Result<T> = std::result::Result<T, LitscopeError>;

impl LitscopeError {
    /// Whether this error means the project simply has no embeddings yet.
    pub fn is_embeddings_unavailable(&self) -> bool {
        matches!(self, LitscopeError::Source(SourceError::EmbeddingsUnavailable(_)))
    }
}
