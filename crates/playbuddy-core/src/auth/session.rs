use std::io::ErrorKind;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::AuthGate;

const SESSION_FILE: &str = "session.json";

/// Lifetime of an access token when the issuer does not say otherwise.
pub const DEFAULT_TOKEN_LIFETIME_MINUTES: i64 = 60;

/// How long before expiry a token counts as due for refresh
const REFRESH_WINDOW_MINUTES: i64 = 5;

/// A signed-in user's access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    pub token: String,
    pub auth_user_id: String,
    #[serde(default)]
    pub email: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl SessionData {
    /// Token issued now with the default lifetime.
    pub fn new(token: String, auth_user_id: String, email: Option<String>) -> Self {
        Self {
            token,
            auth_user_id,
            email,
            expires_at: Utc::now() + Duration::minutes(DEFAULT_TOKEN_LIFETIME_MINUTES),
        }
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = expires_at;
        self
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    pub fn needs_refresh(&self) -> bool {
        Utc::now() + Duration::minutes(REFRESH_WINDOW_MINUTES) >= self.expires_at
    }

    /// Whole minutes left, never negative.
    pub fn minutes_until_expiry(&self) -> i64 {
        (self.expires_at - Utc::now()).num_minutes().max(0)
    }

    /// Email if known, else the user id
    pub fn display_name(&self) -> &str {
        self.email.as_deref().unwrap_or(&self.auth_user_id)
    }
}

/// The current session, persisted as `session.json` in the cache dir.
#[derive(Debug)]
pub struct Session {
    cache_dir: PathBuf,
    pub data: Option<SessionData>,
}

impl Session {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            data: None,
        }
    }

    /// Read the saved session. Returns whether a usable one was found;
    /// expired sessions are left on disk but not loaded.
    pub fn load(&mut self) -> Result<bool> {
        let path = self.session_path();
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e).with_context(|| format!("Failed to read {}", path.display())),
        };
        let data: SessionData = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        if data.is_expired() {
            return Ok(false);
        }
        self.data = Some(data);
        Ok(true)
    }

    /// Persist the session. Does nothing when signed out.
    pub fn save(&self) -> Result<()> {
        let Some(data) = &self.data else {
            return Ok(());
        };
        std::fs::create_dir_all(&self.cache_dir)
            .with_context(|| format!("Failed to create {}", self.cache_dir.display()))?;
        let contents = serde_json::to_string_pretty(data)?;
        std::fs::write(self.session_path(), contents).context("Failed to write session file")
    }

    /// Sign out, removing the saved session.
    pub fn clear(&mut self) -> Result<()> {
        self.data = None;
        match std::fs::remove_file(self.session_path()) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e).context("Failed to remove session file"),
            _ => Ok(()),
        }
    }

    pub fn update(&mut self, data: SessionData) {
        self.data = Some(data);
    }

    /// Bearer token, while the session is valid
    pub fn token(&self) -> Option<&str> {
        self.current().map(|d| d.token.as_str())
    }

    pub fn auth_user_id(&self) -> Option<&str> {
        self.current().map(|d| d.auth_user_id.as_str())
    }

    pub fn is_valid(&self) -> bool {
        self.current().is_some()
    }

    /// Unexpired session data, if any.
    pub fn current(&self) -> Option<&SessionData> {
        self.data.as_ref().filter(|d| !d.is_expired())
    }

    /// Gate that is open while this session is valid
    pub fn gate(&self) -> AuthGate {
        AuthGate::from_session(self)
    }

    fn session_path(&self) -> PathBuf {
        self.cache_dir.join(SESSION_FILE)
    }
}
