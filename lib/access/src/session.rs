//! Browser sessions.
//!
//! A session is the only state that survives the two redirects of a CAS
//! login (application → CAS server → application). It carries:
//! - the pending post-login redirect (`next_url`), written when login starts
//!   and consumed when the callback completes
//! - flash messages shown once on the next page render
//! - the authenticated user, once login succeeds

use casbridge_core::UserId;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unique identifier for a session.
///
/// Session IDs are opaque strings carried in the session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Creates a session ID from a string.
    #[must_use]
    pub fn new(id: String) -> Self {
        Self(id)
    }

    /// Generates a fresh session ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(Ulid::new().to_string())
    }

    /// Returns the session ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Server-side state of one browser session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    id: SessionId,
    /// Set once a login completes.
    user_id: Option<UserId>,
    /// Where to send the browser after login. Unvalidated until consumed.
    next_url: Option<String>,
    /// Messages to show on the next page render.
    flashes: Vec<String>,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl Session {
    /// Creates an anonymous session.
    #[must_use]
    pub fn anonymous(id: SessionId, duration: Duration) -> Self {
        let now = Utc::now();
        Self {
            id,
            user_id: None,
            next_url: None,
            flashes: Vec::new(),
            created_at: now,
            expires_at: now + duration,
        }
    }

    /// Creates a session with all fields specified.
    ///
    /// Use this when reconstituting a session from storage.
    #[must_use]
    pub fn with_all_fields(
        id: SessionId,
        user_id: Option<UserId>,
        next_url: Option<String>,
        flashes: Vec<String>,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            next_url,
            flashes,
            created_at,
            expires_at,
        }
    }

    /// Returns a new session, under a new ID, logged in as `user_id`.
    ///
    /// Rotating the ID on login keeps a session ID planted before login
    /// from becoming an authenticated one. The pending redirect is not
    /// carried over.
    #[must_use]
    pub fn authenticated(&self, user_id: UserId, duration: Duration) -> Self {
        let mut session = Self::anonymous(SessionId::generate(), duration);
        session.user_id = Some(user_id);
        session.flashes = self.flashes.clone();
        session
    }

    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    /// Returns true if a user is logged in on this session.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    #[must_use]
    pub fn next_url(&self) -> Option<&str> {
        self.next_url.as_deref()
    }

    /// Records where to go after login, replacing any earlier value.
    pub fn set_next_url(&mut self, next_url: impl Into<String>) {
        self.next_url = Some(next_url.into());
    }

    #[must_use]
    pub fn flashes(&self) -> &[String] {
        &self.flashes
    }

    /// Queues a message for the next page render.
    pub fn push_flash(&mut self, message: impl Into<String>) {
        self.flashes.push(message.into());
    }

    /// Consumes all queued messages.
    pub fn take_flashes(&mut self) -> Vec<String> {
        std::mem::take(&mut self.flashes)
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Returns true if the session has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}
