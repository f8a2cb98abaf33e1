use thiserror::Error;

/// Failure taxonomy for the service layer. The derivation engine itself is
/// total and never produces one of these; they come from the boundaries
/// around it (validation, lookups, catalog calls, storage).
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{service}: {message}")]
    External { service: String, message: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn catalog(message: impl Into<String>) -> Self {
        Self::External {
            service: "TVmaze".to_string(),
            message: message.into(),
        }
    }
}
