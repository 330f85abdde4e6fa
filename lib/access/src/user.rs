//! User domain type.
//!
//! A user belongs to exactly one organization and is identified there by
//! the principal identifier its identity provider vouched for.

use casbridge_core::{OrgId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user of one organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Internal user ID.
    id: UserId,
    /// The organization this user belongs to.
    org_id: OrgId,
    /// Principal identifier from the identity provider (e.g. CAS username).
    identifier: String,
    /// Display name shown in the UI.
    name: String,
    /// Whether the user may administer the organization's settings.
    is_admin: bool,
    /// When the user was disabled, if ever. Disabled users cannot log in.
    disabled_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl User {
    /// Creates a new, enabled, non-admin user.
    #[must_use]
    pub fn new(org_id: OrgId, identifier: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::new(),
            org_id,
            identifier: identifier.into(),
            name: name.into(),
            is_admin: false,
            disabled_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates a user with all fields specified.
    ///
    /// Use this when reconstituting a user from storage.
    #[must_use]
    #[expect(clippy::too_many_arguments)]
    pub fn with_all_fields(
        id: UserId,
        org_id: OrgId,
        identifier: String,
        name: String,
        is_admin: bool,
        disabled_at: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            org_id,
            identifier,
            name,
            is_admin,
            disabled_at,
            created_at,
            updated_at,
        }
    }

    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    #[must_use]
    pub fn org_id(&self) -> OrgId {
        self.org_id
    }

    /// Returns the principal identifier.
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    #[must_use]
    pub fn disabled_at(&self) -> Option<DateTime<Utc>> {
        self.disabled_at
    }

    /// Returns true if the user has been disabled.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.disabled_at.is_some()
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Sets the display name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.updated_at = Utc::now();
    }

    /// Grants or revokes organization admin rights.
    pub fn set_admin(&mut self, is_admin: bool) {
        self.is_admin = is_admin;
        self.updated_at = Utc::now();
    }

    /// Disables the user.
    pub fn disable(&mut self) {
        let now = Utc::now();
        self.disabled_at = Some(now);
        self.updated_at = now;
    }
}
