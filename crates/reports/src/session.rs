//! Login session persistence.
//!
//! The backend issues a bearer token at login; the session pairs it with the
//! operator's identity and lives on disk between invocations. Components
//! receive the [`Session`] explicitly rather than reading ambient state.

use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use canteen_core::{AdminId, BuildingId, Email, Role, UserId};

/// Errors that can occur while loading or storing a session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Reading or writing the session file failed.
    #[error("Session file error: {0}")]
    Io(#[from] std::io::Error),

    /// The session file is corrupt.
    #[error("Session file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// No session is stored.
    #[error("Not logged in. Run `canteen login` first.")]
    NotLoggedIn,
}

/// Who is logged in and what they may see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
    pub name: String,
    #[serde(default)]
    pub email: Option<Email>,
    pub role: Role,
    /// Building managed by this operator, if any.
    #[serde(default)]
    pub building_id: Option<BuildingId>,
    /// Vendor admin account owning outlets, if any.
    #[serde(default)]
    pub admin_id: Option<AdminId>,
}

impl Identity {
    /// Identity with no building or outlet assignments.
    #[must_use]
    pub fn new(user_id: UserId, name: impl Into<String>, role: Role) -> Self {
        Self {
            user_id,
            name: name.into(),
            email: None,
            role,
            building_id: None,
            admin_id: None,
        }
    }

    #[must_use]
    pub const fn with_building(mut self, building_id: BuildingId) -> Self {
        self.building_id = Some(building_id);
        self
    }

    #[must_use]
    pub const fn with_admin(mut self, admin_id: AdminId) -> Self {
        self.admin_id = Some(admin_id);
        self
    }

    #[must_use]
    pub fn with_email(mut self, email: Email) -> Self {
        self.email = Some(email);
        self
    }
}

/// An authenticated session.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct Session {
    token: SecretString,
    identity: Identity,
}

impl Session {
    #[must_use]
    pub fn new(token: impl Into<String>, identity: Identity) -> Self {
        Self {
            token: SecretString::from(token.into()),
            identity,
        }
    }

    /// Bearer token for backend calls.
    #[must_use]
    pub const fn token(&self) -> &SecretString {
        &self.token
    }

    #[must_use]
    pub const fn identity(&self) -> &Identity {
        &self.identity
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &"[REDACTED]")
            .field("identity", &self.identity)
            .finish()
    }
}

/// On-disk form. `SecretString` deliberately does not serialize.
#[derive(Serialize, Deserialize)]
struct StoredSession {
    token: String,
    identity: Identity,
}

/// File-backed session storage with an explicit load/save/clear lifecycle.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored session, if any.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the file exists but cannot be read or parsed.
    pub fn load(&self) -> Result<Option<Session>, SessionError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let stored: StoredSession = serde_json::from_str(&raw)?;
        Ok(Some(Session {
            token: SecretString::from(stored.token),
            identity: stored.identity,
        }))
    }

    /// Load the stored session or fail with [`SessionError::NotLoggedIn`].
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if no session is stored or it cannot be read.
    pub fn require(&self) -> Result<Session, SessionError> {
        self.load()?.ok_or(SessionError::NotLoggedIn)
    }

    /// Persist a session, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the file cannot be written.
    pub fn save(&self, session: &Session) -> Result<(), SessionError> {
        let stored = StoredSession {
            token: session.token.expose_secret().to_owned(),
            identity: session.identity.clone(),
        };
        let json = serde_json::to_string_pretty(&stored)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, json)?;
        tracing::info!(path = %self.path.display(), user_id = %session.identity.user_id, "Session saved");
        Ok(())
    }

    /// Forget the stored session. Clearing an absent session is not an error.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the file exists but cannot be removed.
    pub fn clear(&self) -> Result<(), SessionError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::info!(path = %self.path.display(), "Session cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
