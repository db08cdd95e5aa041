use thiserror::Error;

#[derive(Error, Debug)]
pub enum RagchatError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Embedding service unavailable: {message}")]
    EmbeddingUnavailable { message: String, transient: bool },

    #[error("Generation service unavailable: {message}")]
    GenerationUnavailable { message: String, transient: bool },

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Document not found: id {0}")]
    DocumentNotFound(i64),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl RagchatError {
    /// Permanent embedding failure (bad payload, 4xx, wrong shape)
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::EmbeddingUnavailable {
            message: message.into(),
            transient: false,
        }
    }

    /// Permanent generation failure
    pub fn generation(message: impl Into<String>) -> Self {
        Self::GenerationUnavailable {
            message: message.into(),
            transient: false,
        }
    }

    /// Whether a retry has a chance of succeeding.
    ///
    /// Only provider failures flagged at the source (transport errors, timeouts,
    /// 429 and 5xx responses) qualify.
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::EmbeddingUnavailable { transient, .. }
            | Self::GenerationUnavailable { transient, .. } => *transient,
            _ => false,
        }
    }
}

/// Whether an HTTP status from a provider should be retried
pub fn is_transient_status(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

pub type Result<T> = std::result::Result<T, RagchatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        let transient = RagchatError::EmbeddingUnavailable {
            message: "timeout".to_string(),
            transient: true,
        };
        assert!(transient.is_transient());

        assert!(!RagchatError::embedding("bad payload").is_transient());
        assert!(!RagchatError::generation("400 Bad Request").is_transient());
        assert!(!RagchatError::Validation("empty".to_string()).is_transient());
        assert!(!RagchatError::DimensionMismatch {
            expected: 3,
            actual: 2
        }
        .is_transient());
    }

    #[test]
    fn test_transient_status() {
        assert!(is_transient_status(reqwest::StatusCode::TOO_MANY_REQUESTS));
        assert!(is_transient_status(reqwest::StatusCode::BAD_GATEWAY));
        assert!(!is_transient_status(reqwest::StatusCode::UNAUTHORIZED));
        assert!(!is_transient_status(reqwest::StatusCode::NOT_FOUND));
    }

    #[test]
    fn test_error_display() {
        let error = RagchatError::DimensionMismatch {
            expected: 1536,
            actual: 768,
        };
        assert_eq!(
            error.to_string(),
            "Embedding dimension mismatch: expected 1536, got 768"
        );

        let error = RagchatError::generation("LlamaCpp server returned 503: overloaded");
        assert!(error.to_string().contains("503"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: RagchatError = io_err.into();
        assert!(matches!(err, RagchatError::Io(_)));
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid json}").unwrap_err();
        let err: RagchatError = json_err.into();
        assert!(matches!(err, RagchatError::Serialization(_)));
    }
}
