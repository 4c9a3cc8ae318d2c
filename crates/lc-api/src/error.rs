//! HTTP rendering of `AppError`.

use std::fmt;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use lc_core::error::AppError;
use lc_core::validation::ValidationErrors;
use serde_json::json;

/// `AppError` lives in lc-core, so the actix impl goes on a local wrapper.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl ApiError {
    pub fn unauthorized(reason: &str) -> Self {
        ApiError(AppError::Unauthorized(reason.to_string()))
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        ApiError(AppError::Validation(ValidationErrors::single(reason)))
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(err: ValidationErrors) -> Self {
        ApiError(AppError::Validation(err))
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match &self.0 {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(..) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Transport(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// `{"error": "<first reason>", "reasons": [...]}`
    fn error_response(&self) -> HttpResponse {
        let reasons: Vec<String> = match &self.0 {
            AppError::Validation(errors) => errors.reasons().to_vec(),
            other => vec![other.to_string()],
        };
        if let AppError::Transport(message) = &self.0 {
            log::error!("request failed upstream: {message}");
        }
        HttpResponse::build(self.status_code()).json(json!({
            "error": self.0.headline(),
            "reasons": reasons,
        }))
    }
}
