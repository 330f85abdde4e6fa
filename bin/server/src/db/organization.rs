//! Organization repository.

use async_trait::async_trait;
use casbridge_access::{OrgSettings, Organization, OrganizationStore, StoreError};
use casbridge_core::OrgId;
use rootcause::prelude::Report;
use sqlx::{FromRow, PgPool};
use std::str::FromStr;

use super::backend_error;

/// Row type for organization queries.
#[derive(FromRow)]
struct OrganizationRow {
    id: String,
    slug: String,
    name: String,
    is_public: bool,
    settings: serde_json::Value,
}

impl OrganizationRow {
    fn try_into_organization(self) -> Result<Organization, StoreError> {
        let id = OrgId::from_str(&self.id).map_err(|e| StoreError::Corrupt {
            details: format!("invalid organization id '{}': {}", self.id, e),
        })?;
        let settings = match self.settings {
            serde_json::Value::Object(map) => OrgSettings::from(map),
            serde_json::Value::Null => OrgSettings::new(),
            other => {
                return Err(StoreError::Corrupt {
                    details: format!("organization '{}' settings are not an object: {other}", self.slug),
                });
            }
        };
        Ok(Organization::with_all_fields(
            id,
            self.slug,
            self.name,
            self.is_public,
            settings,
        ))
    }
}

/// Repository for organization operations.
pub struct OrganizationRepository {
    pool: PgPool,
}

impl OrganizationRepository {
    /// Creates a new organization repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrganizationStore for OrganizationRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Organization>, Report<StoreError>> {
        let row: Option<OrganizationRow> = sqlx::query_as(
            r#"
            SELECT id, slug, name, is_public, settings
            FROM organizations
            WHERE slug = $1
            "#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend_error)?;

        match row {
            Some(r) => Ok(Some(r.try_into_organization()?)),
            None => Ok(None),
        }
    }

    async fn update_settings(
        &self,
        org: &Organization,
        settings: &OrgSettings,
    ) -> Result<(), Report<StoreError>> {
        let settings_json = serde_json::Value::Object(settings.as_map().clone());

        let result = sqlx::query(
            r#"
            UPDATE organizations
            SET settings = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(org.id().to_string())
        .bind(settings_json)
        .execute(&self.pool)
        .await
        .map_err(backend_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Backend {
                details: format!("organization '{}' not found", org.slug()),
            }
            .into());
        }

        Ok(())
    }
}
