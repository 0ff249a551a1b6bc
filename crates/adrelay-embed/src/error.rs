use thiserror::Error;

/// Errors returned by the embedding gateway.
#[derive(Debug, Error)]
pub enum EmbedError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered but the response is unusable (non-2xx status,
    /// wrong vector count, wrong vector dimension).
    #[error("embedding provider error: {0}")]
    Api(String),

    /// The response body could not be deserialized into the expected shape.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Similarity math over vectors of different lengths. Never coerced.
    #[error("dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },
}
