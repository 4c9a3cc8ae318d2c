//! # AppError
//!
//! Centralized error handling for the clinic console.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;

use crate::validation::ValidationErrors;

/// The primary error type for all lc-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Submission refused by the validation gate; fixed by correcting input.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationErrors),

    /// Resource not found (e.g., Case, Appointment, SponsorshipCase)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Missing or expired staff credentials
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The entity store or media store call failed
    #[error("transport error: {0}")]
    Transport(String),
}

impl AppError {
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        AppError::NotFound(entity.to_string(), id.to_string())
    }

    /// The first reason to show the actor.
    pub fn headline(&self) -> String {
        match self {
            AppError::Validation(errors) => errors
                .first()
                .map(str::to_string)
                .unwrap_or_else(|| self.to_string()),
            other => other.to_string(),
        }
    }
}

/// Port implementations report failures through `anyhow`; at the service
/// boundary they all become transport errors.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Transport(format!("{err:#}"))
    }
}

/// A specialized Result type for clinic logic.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headline_prefers_first_validation_reason() {
        let err = AppError::from(ValidationErrors(vec!["age is required".into(), "phone is required".into()]));
        assert_eq!(err.headline(), "age is required");
        assert_eq!(err.to_string(), "validation error: age is required; phone is required");
    }

    #[test]
    fn anyhow_failures_become_transport_errors() {
        let err: AppError = anyhow::anyhow!("connection refused").context("listing cases").into();
        match err {
            AppError::Transport(message) => assert_eq!(message, "listing cases: connection refused"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
