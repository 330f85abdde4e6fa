//! Authentication extractors for Axum.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts, Path},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use casbridge_access::{Organization, Session, User};
use tracing::{error, warn};

use super::{found, load_session};
use crate::app::{AppState, login_path};

/// A logged-in session and its user.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub session: Session,
    pub user: User,
}

/// Extractor for requiring an authenticated user.
///
/// If the user is not authenticated, they will be redirected to the login
/// page of the organization in the request path.
pub struct RequireAuth(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireAuth
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = Arc::<AppState>::from_ref(state);
        let login = org_slug(parts, state)
            .await
            .map_or_else(|| "/".to_string(), |slug| login_path(&slug));
        let not_authenticated = || AuthRejection::NotAuthenticated {
            login_path: login.clone(),
        };

        let jar = CookieJar::from_request_parts(parts, state)
            .await
            .map_err(|_| AuthRejection::InternalError)?;

        let session = load_session(&app_state, &jar)
            .await
            .map_err(|e| {
                error!(error = %e, "failed to load session");
                AuthRejection::InternalError
            })?
            .ok_or_else(not_authenticated)?;

        let user_id = session.user_id().ok_or_else(not_authenticated)?;
        let user = app_state
            .users
            .find_by_id(user_id)
            .await
            .map_err(|e| {
                error!(error = %e, "failed to load session user");
                AuthRejection::InternalError
            })?
            .ok_or_else(not_authenticated)?;

        if user.is_disabled() {
            warn!(user_id = %user.id(), "disabled user presented a live session");
            return Err(not_authenticated());
        }

        Ok(RequireAuth(CurrentUser { session, user }))
    }
}

/// Extractor for requiring an admin of the organization in the request path.
pub struct RequireAdmin {
    pub org: Organization,
    pub user: User,
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RequireAuth(current) = RequireAuth::from_request_parts(parts, state).await?;
        let app_state = Arc::<AppState>::from_ref(state);

        let slug = org_slug(parts, state).await.ok_or(AuthRejection::NotFound)?;
        let org = app_state
            .organizations
            .find_by_slug(&slug)
            .await
            .map_err(|e| {
                error!(org = %slug, error = %e, "failed to load organization");
                AuthRejection::InternalError
            })?
            .ok_or(AuthRejection::NotFound)?;

        if current.user.org_id() != org.id() || !current.user.is_admin() {
            return Err(AuthRejection::AdminRequired);
        }

        Ok(RequireAdmin {
            org,
            user: current.user,
        })
    }
}

async fn org_slug<S>(parts: &mut Parts, state: &S) -> Option<String>
where
    S: Send + Sync,
{
    Path::<HashMap<String, String>>::from_request_parts(parts, state)
        .await
        .ok()
        .and_then(|Path(params)| params.get("org_slug").cloned())
}

/// Rejection type for authentication extractors.
#[derive(Debug)]
pub enum AuthRejection {
    NotAuthenticated { login_path: String },
    AdminRequired,
    NotFound,
    InternalError,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::NotAuthenticated { login_path } => found(&login_path),
            Self::AdminRequired => (StatusCode::FORBIDDEN, "Admin access required").into_response(),
            Self::NotFound => (StatusCode::NOT_FOUND, "Not found").into_response(),
            Self::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}
