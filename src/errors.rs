use thiserror::Error;

use crate::context::Interrupted;

/// Boxed cause carried by backend failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Invalid document identifier: {0}")]
    Validation(String),

    #[error("No document found with the given ID: {0}")]
    NotFound(String),

    #[error("Document store {operation} failed: {source}")]
    Backend {
        operation: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("Document store {operation} was cancelled")]
    Cancelled { operation: &'static str },

    #[error("Document store {operation} exceeded its deadline")]
    DeadlineExceeded { operation: &'static str },
}

impl RepositoryError {
    pub fn backend(operation: &'static str, source: impl Into<BoxError>) -> Self {
        RepositoryError::Backend {
            operation,
            source: source.into(),
        }
    }

    pub(crate) fn interrupted(operation: &'static str, reason: Interrupted) -> Self {
        match reason {
            Interrupted::Cancelled => RepositoryError::Cancelled { operation },
            Interrupted::DeadlineExceeded => RepositoryError::DeadlineExceeded { operation },
        }
    }

    /// HTTP status a caller should surface for this failure.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            RepositoryError::Validation(_) => 400,
            RepositoryError::NotFound(_) => 404,
            RepositoryError::Backend { .. } => 500,
            RepositoryError::Cancelled { .. } => 503,
            RepositoryError::DeadlineExceeded { .. } => 504,
        }
    }
}

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Tracer provider already shut down")]
    AlreadyShutdown,

    #[error("Span processor failed to shut down: {0}")]
    Processor(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),

    #[error("Environment variable {name} is empty")]
    Empty { name: &'static str },
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing body")]
    MissingBody,

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Request contains '{0}'")]
    FaultInjected(String),

    #[error("No document found with the given ID: {0}")]
    DocumentMissing(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ApiError {
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::MissingBody | ApiError::InvalidBody(_) => 400,
            ApiError::DocumentMissing(_) => 404,
            ApiError::FaultInjected(_) => 500,
            ApiError::Repository(e) => e.status_code(),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(error: serde_json::Error) -> Self {
        ApiError::InvalidBody(error.to_string())
    }
}
