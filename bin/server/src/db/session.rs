//! Session repository.

use async_trait::async_trait;
use casbridge_access::{Session, SessionId, SessionStore, StoreError};
use casbridge_core::UserId;
use chrono::{DateTime, Utc};
use rootcause::prelude::Report;
use sqlx::{FromRow, PgPool};
use std::str::FromStr;

use super::backend_error;

/// Row type for session queries.
#[derive(FromRow)]
struct SessionRow {
    id: String,
    user_id: Option<String>,
    next_url: Option<String>,
    flashes: serde_json::Value,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl SessionRow {
    fn try_into_session(self) -> Result<Session, StoreError> {
        let user_id = self
            .user_id
            .as_deref()
            .map(UserId::from_str)
            .transpose()
            .map_err(|e| StoreError::Corrupt {
                details: format!("invalid user id in session '{}': {}", self.id, e),
            })?;
        let flashes: Vec<String> =
            serde_json::from_value(self.flashes).map_err(|e| StoreError::Corrupt {
                details: format!("invalid flash messages in session '{}': {}", self.id, e),
            })?;

        Ok(Session::with_all_fields(
            SessionId::new(self.id),
            user_id,
            self.next_url,
            flashes,
            self.created_at,
            self.expires_at,
        ))
    }
}

/// Repository for session operations.
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    /// Creates a new session repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for SessionRepository {
    async fn find_by_id(&self, id: &SessionId) -> Result<Option<Session>, Report<StoreError>> {
        let row: Option<SessionRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, next_url, flashes, created_at, expires_at
            FROM sessions
            WHERE id = $1 AND expires_at > NOW()
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend_error)?;

        match row {
            Some(r) => Ok(Some(r.try_into_session()?)),
            None => Ok(None),
        }
    }

    async fn save(&self, session: &Session) -> Result<(), Report<StoreError>> {
        let flashes_json = serde_json::to_value(session.flashes()).map_err(|e| StoreError::Corrupt {
            details: format!("failed to encode flash messages: {e}"),
        })?;

        sqlx::query(
            r#"
            INSERT INTO sessions (id, user_id, next_url, flashes, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE
            SET user_id = EXCLUDED.user_id,
                next_url = EXCLUDED.next_url,
                flashes = EXCLUDED.flashes,
                expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(session.id().as_str())
        .bind(session.user_id().map(|id| id.to_string()))
        .bind(session.next_url())
        .bind(flashes_json)
        .bind(session.created_at())
        .bind(session.expires_at())
        .execute(&self.pool)
        .await
        .map_err(backend_error)?;

        Ok(())
    }

    async fn delete(&self, id: &SessionId) -> Result<(), Report<StoreError>> {
        sqlx::query(
            r#"
            DELETE FROM sessions
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .execute(&self.pool)
        .await
        .map_err(backend_error)?;

        Ok(())
    }

    async fn delete_expired(&self) -> Result<u64, Report<StoreError>> {
        let result = sqlx::query(
            r#"
            DELETE FROM sessions
            WHERE expires_at < NOW()
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(backend_error)?;

        Ok(result.rows_affected())
    }
}
