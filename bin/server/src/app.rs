//! Application state and router.

use std::sync::Arc;

use axum::{Router, routing::get};
use casbridge_access::{
    AuthorizationPolicy, Organization, OrganizationStore, SessionStore, UserStore,
};
use casbridge_cas::{CasClientFactory, HttpCasClientFactory};
use sqlx::PgPool;
use tower_http::trace::TraceLayer;

use crate::auth;
use crate::cas;
use crate::config::{ServerConfig, SessionConfig};
use crate::db::{OrganizationRepository, SessionRepository, UserRepository};
use crate::pages;
use crate::settings;

/// Shared application state.
pub struct AppState {
    /// Organization lookup and settings.
    pub organizations: Arc<dyn OrganizationStore>,
    /// Users of all organizations.
    pub users: Arc<dyn UserStore>,
    /// Server-side browser sessions.
    pub sessions: Arc<dyn SessionStore>,
    /// Builds a CAS client per request.
    pub cas_clients: Arc<dyn CasClientFactory>,
    /// Login authorization policy.
    pub policy: AuthorizationPolicy,
    /// Public base URL, without a trailing slash.
    pub public_url: String,
    /// Session configuration.
    pub session_config: SessionConfig,
}

impl AppState {
    /// Creates application state backed by Postgres and real CAS servers.
    #[must_use]
    pub fn from_pool(pool: PgPool, config: &ServerConfig) -> Self {
        Self {
            organizations: Arc::new(OrganizationRepository::new(pool.clone())),
            users: Arc::new(UserRepository::new(pool.clone())),
            sessions: Arc::new(SessionRepository::new(pool)),
            cas_clients: Arc::new(HttpCasClientFactory::new(config.cas.validation_timeout())),
            policy: AuthorizationPolicy::new(config.cas.unknown_user_policy),
            public_url: config.public_base().to_string(),
            session_config: config.session.clone(),
        }
    }
}

/// Returns the index path of an organization.
///
/// Slugs that are not valid organization slugs map to `/`, so a decoded
/// path parameter never reaches a `Location` header.
#[must_use]
pub fn index_path(org_slug: &str) -> String {
    org_path(org_slug, "")
}

/// Returns the login page path of an organization, or `/` for an invalid slug.
#[must_use]
pub fn login_path(org_slug: &str) -> String {
    org_path(org_slug, "login")
}

fn org_path(org_slug: &str, page: &str) -> String {
    if Organization::is_valid_slug(org_slug) {
        format!("/{org_slug}/{page}")
    } else {
        "/".to_string()
    }
}

/// Builds the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/{org_slug}/", get(pages::index))
        .route("/{org_slug}/login", get(pages::login))
        .route("/{org_slug}/logout", get(auth::logout))
        .route("/{org_slug}/cas/login", get(cas::login))
        .route("/{org_slug}/cas/callback", get(cas::callback))
        .route(
            "/{org_slug}/settings/cas",
            get(settings::show).post(settings::update),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
