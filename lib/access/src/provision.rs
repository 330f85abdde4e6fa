//! Just-in-time user provisioning.

use rootcause::prelude::Report;
use tracing::{debug, info, instrument};

use crate::error::{ProvisioningError, StoreError};
use crate::org::Organization;
use crate::store::UserStore;
use crate::user::User;

/// Finds or creates the user `identifier` in `org`, ready to log in.
///
/// An existing user whose display name differs from `display_name` is
/// renamed. A missing user is created as an enabled non-admin. If another
/// login creates the same user between the lookup and the insert, that user
/// is reloaded and used instead.
///
/// # Errors
///
/// Returns `ProvisioningError::Disabled` if the user exists but is
/// disabled, or `ProvisioningError::Store` if the store fails.
#[instrument(skip(store, org), fields(org = %org.slug()))]
pub async fn provision_user<S>(
    store: &S,
    org: &Organization,
    display_name: &str,
    identifier: &str,
) -> Result<User, Report<ProvisioningError>>
where
    S: UserStore + ?Sized,
{
    let mut user = match find_user(store, org, identifier).await? {
        Some(user) => user,
        None => {
            let user = User::new(org.id(), identifier, display_name);
            match store.create(&user).await {
                Ok(()) => {
                    info!(user_id = %user.id(), "provisioned new user");
                    return Ok(user);
                }
                Err(e) if matches!(e.current_context(), StoreError::Conflict { .. }) => {
                    debug!("user was created concurrently, reloading");
                    find_user(store, org, identifier)
                        .await?
                        .ok_or_else(|| ProvisioningError::Store {
                            details: format!(
                                "user '{identifier}' conflicted on insert but cannot be found"
                            ),
                        })?
                }
                Err(e) => {
                    return Err(ProvisioningError::Store {
                        details: e.to_string(),
                    }
                    .into());
                }
            }
        }
    };

    if user.is_disabled() {
        info!(user_id = %user.id(), "disabled user attempted to log in");
        return Err(ProvisioningError::Disabled {
            identifier: identifier.to_string(),
        }
        .into());
    }

    if user.name() != display_name {
        debug!(user_id = %user.id(), "updating user display name");
        user.set_name(display_name);
        store.update(&user).await.map_err(|e| ProvisioningError::Store {
            details: e.to_string(),
        })?;
    }
    Ok(user)
}

async fn find_user<S>(
    store: &S,
    org: &Organization,
    identifier: &str,
) -> Result<Option<User>, ProvisioningError>
where
    S: UserStore + ?Sized,
{
    store
        .find_by_identifier(org, identifier)
        .await
        .map_err(|e| ProvisioningError::Store {
            details: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryUserStore;
    use async_trait::async_trait;
    use casbridge_core::UserId;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// User store where another login inserts the same user right before
    /// the first `create` call lands.
    struct ConcurrentInsertStore {
        inner: MemoryUserStore,
        raced: AtomicBool,
        other_disabled: bool,
    }

    impl ConcurrentInsertStore {
        fn new(other_disabled: bool) -> Self {
            Self {
                inner: MemoryUserStore::new(),
                raced: AtomicBool::new(false),
                other_disabled,
            }
        }
    }

    #[async_trait]
    impl UserStore for ConcurrentInsertStore {
        async fn find_by_id(&self, id: UserId) -> Result<Option<User>, Report<StoreError>> {
            self.inner.find_by_id(id).await
        }

        async fn find_by_identifier(
            &self,
            org: &Organization,
            identifier: &str,
        ) -> Result<Option<User>, Report<StoreError>> {
            self.inner.find_by_identifier(org, identifier).await
        }

        async fn create(&self, user: &User) -> Result<(), Report<StoreError>> {
            if !self.raced.swap(true, Ordering::SeqCst) {
                let mut other = User::new(user.org_id(), user.identifier(), user.identifier());
                if self.other_disabled {
                    other.disable();
                }
                self.inner.create(&other).await?;
            }
            self.inner.create(user).await
        }

        async fn update(&self, user: &User) -> Result<(), Report<StoreError>> {
            self.inner.update(user).await
        }
    }

    #[tokio::test]
    async fn creates_missing_user() {
        let store = MemoryUserStore::new();
        let org = Organization::new("acme", "Acme");

        let user = provision_user(&store, &org, "jdoe", "jdoe").await.unwrap();

        assert_eq!(user.org_id(), org.id());
        assert_eq!(user.identifier(), "jdoe");
        assert!(!user.is_admin());
        let stored = store.find_by_identifier(&org, "jdoe").await.unwrap();
        assert_eq!(stored, Some(user));
    }

    #[tokio::test]
    async fn reuses_existing_user_and_updates_name() {
        let store = MemoryUserStore::new();
        let org = Organization::new("acme", "Acme");
        let existing = User::new(org.id(), "jdoe", "jdoe");
        store.insert(existing.clone()).await;

        let user = provision_user(&store, &org, "Jane Doe", "jdoe")
            .await
            .unwrap();

        assert_eq!(user.id(), existing.id());
        assert_eq!(user.name(), "Jane Doe");
        let stored = store.find_by_id(existing.id()).await.unwrap().unwrap();
        assert_eq!(stored.name(), "Jane Doe");
    }

    #[tokio::test]
    async fn refuses_disabled_user() {
        let store = MemoryUserStore::new();
        let org = Organization::new("acme", "Acme");
        let mut existing = User::new(org.id(), "jdoe", "jdoe");
        existing.disable();
        store.insert(existing).await;

        let err = provision_user(&store, &org, "jdoe", "jdoe")
            .await
            .unwrap_err();

        assert!(err.to_string().contains("is disabled"));
    }

    #[tokio::test]
    async fn same_identifier_in_two_orgs_is_two_users() {
        let store = MemoryUserStore::new();
        let acme = Organization::new("acme", "Acme");
        let globex = Organization::new("globex", "Globex");

        let a = provision_user(&store, &acme, "jdoe", "jdoe").await.unwrap();
        let b = provision_user(&store, &globex, "jdoe", "jdoe").await.unwrap();

        assert_ne!(a.id(), b.id());
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn concurrent_first_login_reuses_the_other_insert() {
        let store = ConcurrentInsertStore::new(false);
        let org = Organization::new("acme", "Acme");

        let user = provision_user(&store, &org, "Jane Doe", "jdoe")
            .await
            .unwrap();

        assert_eq!(store.inner.len().await, 1);
        let stored = store
            .find_by_identifier(&org, "jdoe")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.id(), stored.id());
        assert_eq!(stored.name(), "Jane Doe");
    }

    #[tokio::test]
    async fn concurrent_insert_of_disabled_user_is_refused() {
        let store = ConcurrentInsertStore::new(true);
        let org = Organization::new("acme", "Acme");

        let err = provision_user(&store, &org, "Jane Doe", "jdoe")
            .await
            .unwrap_err();

        assert!(matches!(
            err.current_context(),
            ProvisioningError::Disabled { .. }
        ));
    }
}
