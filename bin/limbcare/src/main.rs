//! # LimbCare Binary
//!
//! The entry point that assembles the clinic console based on compile-time features.

mod settings;

use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use anyhow::Context as _;
use lc_api::{configure_routes, middleware, AppState};
use lc_core::models::StaffAccount;
use lc_core::service::ClinicService;
use uuid::Uuid;

use settings::Settings;

// Feature-gated imports: This is the "Compiled-to-Order" magic
#[cfg(feature = "db-sqlite")]
use lc_db_sqlite::SqliteClinicStore;

#[cfg(feature = "storage-local")]
use lc_storage_local::LocalMediaStore;

#[cfg(feature = "auth-simple")]
use lc_auth_simple::SimpleStaffAuth;

#[cfg(not(all(feature = "db-sqlite", feature = "storage-local", feature = "auth-simple")))]
compile_error!("limbcare needs one backend of each kind: enable db-sqlite, storage-local and auth-simple");

/// The configured administrator, if a password hash was supplied.
fn staff_accounts(settings: &Settings) -> Vec<StaffAccount> {
    if settings.admin_password_hash.trim().is_empty() {
        log::warn!("LIMBCARE_ADMIN_PASSWORD_HASH is not set; the staff console is locked");
        return Vec::new();
    }
    vec![StaffAccount {
        id: settings.admin_id.unwrap_or_else(|| {
            log::warn!("LIMBCARE_ADMIN_ID is not set; note authorship will not survive a restart");
            Uuid::now_v7()
        }),
        email: settings.admin_email.clone(),
        name: settings.admin_name.clone(),
        password_hash: settings.admin_password_hash.clone(),
    }]
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let settings = Settings::load()?;

    // 1. Initialize Database Implementation
    #[cfg(feature = "db-sqlite")]
    let store = Arc::new(
        SqliteClinicStore::new(&settings.database_url)
            .await
            .context("failed to init SQLite")?,
    );

    // 2. Initialize Storage Implementation
    std::fs::create_dir_all(&settings.upload_dir)
        .with_context(|| format!("cannot create {}", settings.upload_dir.display()))?;
    #[cfg(feature = "storage-local")]
    let media = Arc::new(LocalMediaStore::new(
        settings.upload_dir.clone(),
        settings.upload_url_prefix.clone(),
    ));

    // 3. Initialize Auth Implementation
    #[cfg(feature = "auth-simple")]
    let auth = Arc::new(SimpleStaffAuth::with_ttl(
        staff_accounts(&settings),
        chrono::Duration::hours(settings.session_ttl_hours),
    ));

    // 4. Wrap in AppState (Using dynamic dispatch for maximum flexibility)
    let state = web::Data::new(AppState::new(ClinicService::with_store(store, media), auth));

    let (host, port) = settings.bind_address();
    log::info!("LimbCare starting on http://{host}:{port}");

    let upload_dir = settings.upload_dir.clone();
    let upload_prefix = settings.upload_url_prefix.clone();
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::standard_middleware())
            .wrap(middleware::security_headers())
            .wrap(middleware::cors_policy())
            .service(actix_files::Files::new(&upload_prefix, upload_dir.clone()))
            .configure(configure_routes)
    })
    .bind((host, port))?
    .run()
    .await?;
    Ok(())
}
