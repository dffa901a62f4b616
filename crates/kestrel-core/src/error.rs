/// Errors that can occur across the Kestrel platform.
///
/// Each variant wraps a specific error domain. Library crates use this type
/// directly; the binary crate converts to `miette::Report` at the boundary.
///
/// # Examples
///
/// ```
/// use kestrel_core::KestrelError;
///
/// let err = KestrelError::Config("missing API key".into());
/// assert!(err.to_string().contains("missing API key"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum KestrelError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Diff text could not be parsed (malformed hunk header).
    #[error("parse error: {0}")]
    Parse(String),

    /// Completion service returned no usable response.
    #[error("completion error: {0}")]
    Completion(String),

    /// Assembled conversation exceeds the model's token limit.
    #[error("token budget exceeded: {0}")]
    Budget(String),

    /// Vector similarity store request failure.
    #[error("vector store error: {0}")]
    VectorStore(String),

    /// GitHub API failure.
    #[error("git error: {0}")]
    Git(String),

    /// Aggregated review data could not be safely encoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// JSON serialization / deserialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
