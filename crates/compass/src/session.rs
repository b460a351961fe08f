//! Sign-in stub. Any non-empty username and password is accepted; the session is
//! remembered in a small JSON file until logout.

use anyhow::{Context, Result};
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Local-storage key the session is kept under.
pub const STORAGE_KEY: &str = "cvguide_auth";
const APP_DIR: &str = "compass";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoginError {
    #[error("Please enter both username and password.")]
    MissingCredentials,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub username: String,
    pub token: String,
}

/// Opaque token: base64 of `username:password:millis`.
pub fn make_token(username: &str, password: &str, at: DateTime<Utc>) -> String {
    base64::engine::general_purpose::STANDARD.encode(format!(
        "{username}:{password}:{}",
        at.timestamp_millis()
    ))
}

pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Store kept in `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(format!("{STORAGE_KEY}.json")),
        }
    }

    /// Store in the platform's local data directory.
    pub fn open() -> Result<Self> {
        let dir = dirs::data_local_dir()
            .map(|d| d.join(APP_DIR))
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        Ok(Self::in_dir(&dir))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored session; a missing or unreadable record means logged out.
    pub fn load(&self) -> Option<Session> {
        let contents = std::fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&contents) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "ignoring unreadable session"
                );
                None
            }
        }
    }

    pub fn login(&self, username: &str, password: &str) -> Result<Session> {
        self.login_at(username, password, Utc::now())
    }

    pub fn login_at(&self, username: &str, password: &str, at: DateTime<Utc>) -> Result<Session> {
        let username = username.trim();
        if username.is_empty() || password.trim().is_empty() {
            return Err(LoginError::MissingCredentials.into());
        }
        let session = Session {
            username: username.to_string(),
            token: make_token(username, password, at),
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(&session)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        tracing::debug!(user = %session.username, "session stored");
        Ok(session)
    }

    /// Forget the session. Returns whether one existed.
    pub fn logout(&self) -> Result<bool> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {}", self.path.display())),
        }
    }
}
