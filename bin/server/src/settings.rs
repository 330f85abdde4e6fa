//! Organization CAS settings, editable by organization admins.

use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use casbridge_access::{CasSettings, SettingsError};
use tracing::{error, info};

use crate::app::AppState;
use crate::auth::RequireAdmin;

/// Returns the organization's CAS settings.
pub async fn show(RequireAdmin { org, .. }: RequireAdmin) -> Json<CasSettings> {
    Json(CasSettings::from_org(&org))
}

/// Validates and stores new CAS settings.
pub async fn update(
    State(state): State<Arc<AppState>>,
    RequireAdmin { org, user }: RequireAdmin,
    Json(submitted): Json<CasSettings>,
) -> Result<Json<CasSettings>, SettingsRejection> {
    let mut settings = org.settings().clone();
    submitted.apply(&mut settings)?;

    state
        .organizations
        .update_settings(&org, &settings)
        .await
        .map_err(|e| {
            error!(org = %org.slug(), error = %e, "failed to store CAS settings");
            SettingsRejection::Internal
        })?;

    info!(
        org = %org.slug(),
        user_id = %user.id(),
        enabled = submitted.enabled,
        protocol_version = submitted.protocol_version,
        "CAS settings updated"
    );

    let updated = org.with_settings(settings);
    Ok(Json(CasSettings::from_org(&updated)))
}

/// Rejection for settings updates.
#[derive(Debug)]
pub enum SettingsRejection {
    Invalid(SettingsError),
    Internal,
}

impl From<SettingsError> for SettingsRejection {
    fn from(error: SettingsError) -> Self {
        Self::Invalid(error)
    }
}

impl IntoResponse for SettingsRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Invalid(error) => {
                (StatusCode::UNPROCESSABLE_ENTITY, error.to_string()).into_response()
            }
            Self::Internal => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}
