use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;

use super::AppState;
use crate::error::ApiError;
use crate::extract::bearer_token;

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Exchanges staff credentials for a bearer token.
pub async fn login(
    data: web::Data<AppState>,
    form: web::Json<LoginForm>,
) -> Result<HttpResponse, ApiError> {
    if form.email.trim().is_empty() || form.password.is_empty() {
        return Err(ApiError::invalid("email and password are required"));
    }
    match data.auth.login(&form.email, &form.password).await {
        Ok(Some(issued)) => Ok(HttpResponse::Ok().json(issued)),
        Ok(None) => Err(ApiError::unauthorized("invalid email or password")),
        Err(err) => Err(ApiError(err.into())),
    }
}

/// Revokes the presented token. Unknown tokens are ignored.
pub async fn logout(data: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    if let Some(token) = bearer_token(&req) {
        data.auth.logout(&token).await;
    }
    HttpResponse::NoContent().finish()
}
