//! # lc-api Handlers
//!
//! This module coordinates the flow between HTTP requests and the clinic service.

pub mod auth;
pub mod public;
pub mod staff;

use std::sync::Arc;

use lc_core::service::ClinicService;
use lc_core::traits::StaffAuth;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

/// State shared across all Actix-web workers.
pub struct AppState {
    pub service: ClinicService,
    pub auth: Arc<dyn StaffAuth>,
}

impl AppState {
    pub fn new(service: ClinicService, auth: Arc<dyn StaffAuth>) -> Self {
        Self { service, auth }
    }
}

/// Body of every `PATCH .../status` route.
#[derive(Debug, Deserialize)]
pub struct StatusChange {
    #[serde(default)]
    pub status: String,
}

fn parse_id(raw: &str, label: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::invalid(format!("{label} is not a valid identifier")))
}
