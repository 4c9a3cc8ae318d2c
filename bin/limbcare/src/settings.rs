use std::path::PathBuf;

use anyhow::Context as _;
use serde::Deserialize;
use uuid::Uuid;

/// Runtime settings. Read from an optional file named by `LIMBCARE_CONFIG_FILE`,
/// then from `LIMBCARE_*` environment variables, which win.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub upload_dir: PathBuf,
    pub upload_url_prefix: String,
    /// Stable id for the administrator, so notes keep their author across restarts.
    #[serde(default)]
    pub admin_id: Option<Uuid>,
    pub admin_email: String,
    /// Argon2 PHC string. Without it the staff console stays locked.
    #[serde(default)]
    pub admin_password_hash: String,
    pub admin_name: String,
    pub session_ttl_hours: i64,
}

impl Settings {
    pub fn load() -> anyhow::Result<Self> {
        let mut cfg = config::Config::builder()
            .set_default("host", "127.0.0.1")?
            .set_default("port", 8080)?
            .set_default("database_url", "sqlite:limbcare.db")?
            .set_default("upload_dir", "./data/uploads")?
            .set_default("upload_url_prefix", "/static/uploads")?
            .set_default("admin_email", "admin@limbcare.local")?
            .set_default("admin_name", "Administrator")?
            .set_default("session_ttl_hours", 12)?;

        if let Ok(file) = std::env::var("LIMBCARE_CONFIG_FILE") {
            cfg = cfg.add_source(config::File::with_name(&file));
        }

        cfg.add_source(config::Environment::with_prefix("LIMBCARE"))
            .build()
            .context("failed to build config")?
            .try_deserialize::<Self>()
            .context("failed to deserialize config")
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}
