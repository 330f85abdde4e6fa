//! User repository.

use async_trait::async_trait;
use casbridge_access::{Organization, StoreError, User, UserStore};
use casbridge_core::{OrgId, UserId};
use chrono::{DateTime, Utc};
use rootcause::prelude::Report;
use sqlx::{FromRow, PgPool};
use std::str::FromStr;

use super::backend_error;

/// Row type for user queries.
#[derive(FromRow)]
struct UserRow {
    id: String,
    org_id: String,
    identifier: String,
    name: String,
    is_admin: bool,
    disabled_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn try_into_user(self) -> Result<User, StoreError> {
        let id = UserId::from_str(&self.id).map_err(|e| StoreError::Corrupt {
            details: format!("invalid user id '{}': {}", self.id, e),
        })?;
        let org_id = OrgId::from_str(&self.org_id).map_err(|e| StoreError::Corrupt {
            details: format!("invalid organization id '{}': {}", self.org_id, e),
        })?;
        Ok(User::with_all_fields(
            id,
            org_id,
            self.identifier,
            self.name,
            self.is_admin,
            self.disabled_at,
            self.created_at,
            self.updated_at,
        ))
    }
}

/// Repository for user operations.
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Creates a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, Report<StoreError>> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT id, org_id, identifier, name, is_admin, disabled_at, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend_error)?;

        match row {
            Some(r) => Ok(Some(r.try_into_user()?)),
            None => Ok(None),
        }
    }

    async fn find_by_identifier(
        &self,
        org: &Organization,
        identifier: &str,
    ) -> Result<Option<User>, Report<StoreError>> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT id, org_id, identifier, name, is_admin, disabled_at, created_at, updated_at
            FROM users
            WHERE org_id = $1 AND identifier = $2
            "#,
        )
        .bind(org.id().to_string())
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend_error)?;

        match row {
            Some(r) => Ok(Some(r.try_into_user()?)),
            None => Ok(None),
        }
    }

    async fn create(&self, user: &User) -> Result<(), Report<StoreError>> {
        sqlx::query(
            r#"
            INSERT INTO users (id, org_id, identifier, name, is_admin, disabled_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(user.id().to_string())
        .bind(user.org_id().to_string())
        .bind(user.identifier())
        .bind(user.name())
        .bind(user.is_admin())
        .bind(user.disabled_at())
        .bind(user.created_at())
        .bind(user.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict {
                details: format!("user '{}' already exists", user.identifier()),
            },
            other => backend_error(other),
        })?;

        Ok(())
    }

    async fn update(&self, user: &User) -> Result<(), Report<StoreError>> {
        sqlx::query(
            r#"
            UPDATE users
            SET name = $2, is_admin = $3, disabled_at = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(user.id().to_string())
        .bind(user.name())
        .bind(user.is_admin())
        .bind(user.disabled_at())
        .bind(user.updated_at())
        .execute(&self.pool)
        .await
        .map_err(backend_error)?;

        Ok(())
    }
}
