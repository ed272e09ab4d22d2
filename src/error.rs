use thiserror::Error;

use crate::validation::map_backend_error;

/// Failure reported by a remote collaborator (identity provider or document store).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct BackendError {
    pub code: String,
    pub message: String,
}

impl BackendError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Message suitable for showing next to a form.
    pub fn user_message(&self) -> String {
        map_backend_error(&self.code, Some(&self.message))
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("document not found: {collection}/{key}")]
    NotFound { collection: String, key: String },

    #[error("malformed document {collection}/{key}: {source}")]
    Decode {
        collection: String,
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0}")]
    Validation(String),
}

impl StoreError {
    pub fn not_found(collection: &str, key: &str) -> Self {
        Self::NotFound {
            collection: collection.to_string(),
            key: key.to_string(),
        }
    }

    /// Backend code of the failure, if it came from a collaborator.
    pub fn code(&self) -> Option<&str> {
        match self {
            StoreError::Backend(e) => Some(&e.code),
            StoreError::NotFound { .. } => Some("store/not-found"),
            _ => None,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            StoreError::Backend(e) => e.user_message(),
            StoreError::Validation(msg) => msg.clone(),
            other => map_backend_error("", Some(&other.to_string())),
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Backend(BackendError::new("store/unavailable", err.to_string()))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
