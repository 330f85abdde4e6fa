//! Storage traits.
//!
//! The login flow reads and writes organizations, users and sessions only
//! through these traits. The server binds them to Postgres; the
//! [`memory`](crate::memory) module provides in-process implementations.

use async_trait::async_trait;
use casbridge_core::UserId;
use rootcause::prelude::Report;

use crate::error::StoreError;
use crate::org::{OrgSettings, Organization};
use crate::policy::MembershipDirectory;
use crate::session::{Session, SessionId};
use crate::user::User;

/// Trait for looking up organizations.
#[async_trait]
pub trait OrganizationStore: Send + Sync {
    /// Finds an organization by its routing slug.
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Organization>, Report<StoreError>>;

    /// Replaces an organization's settings map.
    async fn update_settings(
        &self,
        org: &Organization,
        settings: &OrgSettings,
    ) -> Result<(), Report<StoreError>>;
}

/// Trait for storing users.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Finds a user by ID.
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, Report<StoreError>>;

    /// Finds a user of `org` by principal identifier.
    async fn find_by_identifier(
        &self,
        org: &Organization,
        identifier: &str,
    ) -> Result<Option<User>, Report<StoreError>>;

    /// Stores a new user.
    ///
    /// Fails with `StoreError::Conflict` if the organization already has a
    /// user with the same identifier.
    async fn create(&self, user: &User) -> Result<(), Report<StoreError>>;

    /// Stores changes to an existing user.
    async fn update(&self, user: &User) -> Result<(), Report<StoreError>>;
}

/// Trait for storing sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Finds a session by ID. Expired sessions are not returned.
    async fn find_by_id(&self, id: &SessionId) -> Result<Option<Session>, Report<StoreError>>;

    /// Inserts or replaces a session.
    async fn save(&self, session: &Session) -> Result<(), Report<StoreError>>;

    /// Deletes a session. Deleting a missing session is not an error.
    async fn delete(&self, id: &SessionId) -> Result<(), Report<StoreError>>;

    /// Deletes all expired sessions, returning how many were removed.
    async fn delete_expired(&self) -> Result<u64, Report<StoreError>>;
}

#[async_trait]
impl<T: UserStore + ?Sized> MembershipDirectory for T {
    async fn has_user(
        &self,
        org: &Organization,
        identifier: &str,
    ) -> Result<bool, Report<StoreError>> {
        Ok(self.find_by_identifier(org, identifier).await?.is_some())
    }
}
