//! limbcare/crates/lc-api/src/middleware.rs Middleware
//!
//! Custom middleware for security, logging, and traffic control.

use actix_cors::Cors;
use actix_web::body::MessageBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::header;
use actix_web::middleware::{DefaultHeaders, Logger, Next};
use actix_web::{web, HttpMessage};
use lc_core::error::AppError;

use crate::error::ApiError;
use crate::extract::bearer_token;
use crate::handlers::AppState;

// Access log without the query string; search boxes carry patient names.
// remote-ip "method path" status-code response-size duration
pub fn standard_middleware() -> Logger {
    Logger::new("%a \"%{METHOD}xi %U\" %s %b %T")
        .custom_request_replace("METHOD", |req| req.method().to_string())
}

// Configures CORS (Cross-Origin Resource Sharing)
// The public site and the staff console are served from different origins.
pub fn cors_policy() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET", "POST", "PATCH", "DELETE"])
        .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .max_age(3600)
}

// Security headers on every response.
pub fn security_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
        .add((header::REFERRER_POLICY, "strict-origin-when-cross-origin"))
        .add((header::X_FRAME_OPTIONS, "DENY"))
}

// Staff scope guard. Runs before any body is read, so an anonymous request is
// always a 401 whatever its payload. The session is left in the request
// extensions for the `Staff` extractor.
pub async fn require_staff(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, actix_web::Error> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .cloned()
        .ok_or_else(|| ApiError(AppError::Transport("application state is not configured".into())))?;
    let token = bearer_token(req.request()).ok_or_else(|| ApiError::unauthorized("missing bearer token"))?;
    let session = state
        .auth
        .authenticate(&token)
        .await
        .ok_or_else(|| ApiError::unauthorized("session is invalid or expired"))?;
    req.extensions_mut().insert(session);
    next.call(req).await
}
