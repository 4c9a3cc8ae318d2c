//! # lc-auth-simple
//!
//! Argon2-based implementation of `StaffAuth`.
//! Verifies staff credentials against configured accounts and keeps bearer
//! sessions in memory. Sessions do not survive a restart.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use base64::Engine;
use chrono::{Duration, Utc};
use dashmap::DashMap;
use lc_core::models::{IssuedToken, StaffAccount, StaffSession};
use lc_core::traits::StaffAuth;
use sha2::{Digest, Sha256};

pub const DEFAULT_SESSION_TTL_HOURS: i64 = 12;

pub struct SimpleStaffAuth {
    accounts: Vec<StaffAccount>,
    /// Keyed by the SHA-256 of the token so raw tokens never sit in memory.
    sessions: DashMap<String, StaffSession>,
    ttl: Duration,
}

impl SimpleStaffAuth {
    pub fn new(accounts: Vec<StaffAccount>) -> Self {
        Self::with_ttl(accounts, Duration::hours(DEFAULT_SESSION_TTL_HOURS))
    }

    pub fn with_ttl(accounts: Vec<StaffAccount>, ttl: Duration) -> Self {
        Self { accounts, sessions: DashMap::new(), ttl }
    }

    fn find_account(&self, email: &str) -> Option<&StaffAccount> {
        let email = email.trim();
        self.accounts.iter().find(|a| a.email.eq_ignore_ascii_case(email))
    }
}

/// Hashes a password into an Argon2 PHC string, for seeding staff accounts.
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| anyhow::anyhow!("hashing password: {err}"))?;
    Ok(hash.to_string())
}

/// Verifies if a provided password matches a stored Argon2 hash.
fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(p) => p,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

fn token_key(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

fn generate_token() -> anyhow::Result<String> {
    let mut bytes = [0u8; 32];
    getrandom::getrandom(&mut bytes).map_err(|err| anyhow::anyhow!("no entropy for token: {err}"))?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
}

#[async_trait]
impl StaffAuth for SimpleStaffAuth {
    async fn login(&self, email: &str, password: &str) -> anyhow::Result<Option<IssuedToken>> {
        let Some(account) = self.find_account(email) else {
            log::warn!("login refused: unknown account");
            return Ok(None);
        };
        if !verify_password(password, &account.password_hash) {
            log::warn!("login refused for staff {}", account.id);
            return Ok(None);
        }

        let token = generate_token()?;
        let session = StaffSession {
            staff_id: account.id,
            email: account.email.clone(),
            name: account.name.clone(),
            expires_at: Utc::now() + self.ttl,
        };
        self.sessions.insert(token_key(&token), session.clone());
        log::info!("staff {} signed in", account.id);
        Ok(Some(IssuedToken { token, session }))
    }

    async fn authenticate(&self, token: &str) -> Option<StaffSession> {
        let key = token_key(token);
        let session = self.sessions.get(&key).map(|entry| entry.value().clone())?;
        if session.expires_at <= Utc::now() {
            self.sessions.remove(&key);
            log::debug!("session of staff {} expired", session.staff_id);
            return None;
        }
        Some(session)
    }

    async fn logout(&self, token: &str) {
        if let Some((_, session)) = self.sessions.remove(&token_key(token)) {
            log::info!("staff {} signed out", session.staff_id);
        }
    }
}
