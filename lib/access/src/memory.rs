//! In-memory store implementations.
//!
//! Useful for tests and single-process deployments without a database.
//! Nothing here survives a restart.

use std::collections::HashMap;

use async_trait::async_trait;
use casbridge_core::{OrgId, UserId};
use rootcause::prelude::Report;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::org::{OrgSettings, Organization};
use crate::session::{Session, SessionId};
use crate::store::{OrganizationStore, SessionStore, UserStore};
use crate::user::User;

/// Organizations keyed by slug.
#[derive(Debug, Default)]
pub struct MemoryOrganizationStore {
    orgs: RwLock<HashMap<String, Organization>>,
}

impl MemoryOrganizationStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an organization.
    pub async fn insert(&self, org: Organization) {
        self.orgs.write().await.insert(org.slug().to_string(), org);
    }
}

#[async_trait]
impl OrganizationStore for MemoryOrganizationStore {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Organization>, Report<StoreError>> {
        Ok(self.orgs.read().await.get(slug).cloned())
    }

    async fn update_settings(
        &self,
        org: &Organization,
        settings: &OrgSettings,
    ) -> Result<(), Report<StoreError>> {
        let mut orgs = self.orgs.write().await;
        let stored = orgs
            .get_mut(org.slug())
            .filter(|stored| stored.id() == org.id())
            .ok_or_else(|| StoreError::Backend {
                details: format!("organization '{}' not found", org.slug()),
            })?;
        *stored.settings_mut() = settings.clone();
        Ok(())
    }
}

/// Users keyed by ID.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<UserId, User>>,
}

impl MemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a user without uniqueness checks.
    pub async fn insert(&self, user: User) {
        self.users.write().await.insert(user.id(), user);
    }

    /// Returns the number of stored users.
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    /// Returns true if no users are stored.
    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }

    fn find_in(
        users: &HashMap<UserId, User>,
        org_id: OrgId,
        identifier: &str,
    ) -> Option<User> {
        users
            .values()
            .find(|u| u.org_id() == org_id && u.identifier() == identifier)
            .cloned()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, Report<StoreError>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_identifier(
        &self,
        org: &Organization,
        identifier: &str,
    ) -> Result<Option<User>, Report<StoreError>> {
        let users = self.users.read().await;
        Ok(Self::find_in(&users, org.id(), identifier))
    }

    async fn create(&self, user: &User) -> Result<(), Report<StoreError>> {
        let mut users = self.users.write().await;
        if Self::find_in(&users, user.org_id(), user.identifier()).is_some() {
            return Err(StoreError::Conflict {
                details: format!("user '{}' already exists", user.identifier()),
            }
            .into());
        }
        users.insert(user.id(), user.clone());
        Ok(())
    }

    async fn update(&self, user: &User) -> Result<(), Report<StoreError>> {
        let mut users = self.users.write().await;
        match users.get_mut(&user.id()) {
            Some(stored) => {
                *stored = user.clone();
                Ok(())
            }
            None => Err(StoreError::Backend {
                details: format!("user {} not found", user.id()),
            }
            .into()),
        }
    }
}

/// Sessions keyed by ID.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored sessions, expired ones included.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Returns true if no sessions are stored.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn find_by_id(&self, id: &SessionId) -> Result<Option<Session>, Report<StoreError>> {
        Ok(self
            .sessions
            .read()
            .await
            .get(id)
            .filter(|s| !s.is_expired())
            .cloned())
    }

    async fn save(&self, session: &Session) -> Result<(), Report<StoreError>> {
        self.sessions
            .write()
            .await
            .insert(session.id().clone(), session.clone());
        Ok(())
    }

    async fn delete(&self, id: &SessionId) -> Result<(), Report<StoreError>> {
        self.sessions.write().await.remove(id);
        Ok(())
    }

    async fn delete_expired(&self) -> Result<u64, Report<StoreError>> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired());
        Ok((before - sessions.len()) as u64)
    }
}
