//! Request extractors: the staff bearer guard and the multipart form collector.

use std::collections::HashMap;

use actix_multipart::Multipart;
use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{web, FromRequest, HttpMessage, HttpRequest};
use futures_util::future::LocalBoxFuture;
use futures_util::TryStreamExt;
use lc_core::error::AppError;
use lc_core::models::{StaffSession, Upload};
use lc_core::validation::MAX_UPLOAD_BYTES;
use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::handlers::AppState;

/// The token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(req: &HttpRequest) -> Option<String> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| token.to_string())
}

/// An authenticated staff member. Handlers taking this extractor are staff-only.
pub struct Staff(pub StaffSession);

impl FromRequest for Staff {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        if let Some(session) = req.extensions().get::<StaffSession>().cloned() {
            return Box::pin(async move { Ok(Staff(session)) });
        }
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let token = bearer_token(req);
        Box::pin(async move {
            let state = state.ok_or_else(|| ApiError(AppError::Transport("application state is not configured".into())))?;
            let token = token.ok_or_else(|| ApiError::unauthorized("missing bearer token"))?;
            state
                .auth
                .authenticate(&token)
                .await
                .map(Staff)
                .ok_or_else(|| ApiError::unauthorized("session is invalid or expired"))
        })
    }
}

/// Text fields and files of a `multipart/form-data` submission.
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: serde_json::Map<String, serde_json::Value>,
    files: HashMap<String, Upload>,
}

impl MultipartForm {
    /// Drains the payload. Files are capped one byte past the upload limit so
    /// the validation gate can still report the oversize.
    pub async fn collect(mut payload: Multipart) -> Result<Self, ApiError> {
        let mut form = MultipartForm::default();
        while let Some(mut field) = payload
            .try_next()
            .await
            .map_err(|err| ApiError::invalid(format!("malformed upload: {err}")))?
        {
            let disposition = field.content_disposition();
            let Some(name) = disposition.get_name().map(str::to_string) else {
                continue;
            };
            let file_name = disposition.get_filename().map(str::to_string);
            let content_type = field
                .content_type()
                .map(|mime| mime.essence_str().to_string())
                .unwrap_or_else(|| "application/octet-stream".to_string());

            let mut data = Vec::new();
            while let Some(chunk) = field
                .try_next()
                .await
                .map_err(|err| ApiError::invalid(format!("malformed upload: {err}")))?
            {
                let room = (MAX_UPLOAD_BYTES + 1).saturating_sub(data.len());
                data.extend_from_slice(&chunk[..chunk.len().min(room)]);
            }

            match file_name {
                Some(file_name) => {
                    if !data.is_empty() {
                        form.files.insert(name, Upload { file_name: Some(file_name), content_type, data });
                    }
                }
                None => {
                    let text = String::from_utf8(data)
                        .map_err(|_| ApiError::invalid(format!("{name} must be text")))?;
                    form.fields.insert(name, serde_json::Value::String(text));
                }
            }
        }
        Ok(form)
    }

    /// Builds a typed form from the text fields.
    pub fn parse<F: DeserializeOwned>(&self) -> Result<F, ApiError> {
        serde_json::from_value(serde_json::Value::Object(self.fields.clone()))
            .map_err(|err| ApiError::invalid(format!("malformed form: {err}")))
    }

    pub fn text(&self, name: &str) -> &str {
        self.fields.get(name).and_then(|v| v.as_str()).unwrap_or("")
    }

    pub fn take_file(&mut self, name: &str) -> Option<Upload> {
        self.files.remove(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn bearer_token_is_read_from_authorization_header() {
        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer abc.def"))
            .to_http_request();
        assert_eq!(bearer_token(&req).as_deref(), Some("abc.def"));

        let basic = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Basic Zm9vOmJhcg=="))
            .to_http_request();
        assert_eq!(bearer_token(&basic), None);
        assert_eq!(bearer_token(&TestRequest::default().to_http_request()), None);
    }
}
