//! CAS single sign-on for organizations.
//!
//! A login is a two-redirect round trip:
//! 1. `/{org}/cas/login` records where to go afterwards and sends the
//!    browser to the organization's CAS server.
//! 2. The CAS server sends the browser back to `/{org}/cas/callback` with a
//!    service ticket, which is exchanged for the principal's identity,
//!    checked against the authorization policy, and turned into a session.
//!
//! Clients are built from the organization's settings on every request,
//! since administrators may change them at any time.

pub mod routes;

use casbridge_access::Organization;
use casbridge_cas::{CasClient, CasClientConfig};
use rootcause::prelude::Report;
use tracing::error;

use crate::app::AppState;
use crate::error::CasSetupError;

pub use routes::{callback, login};

/// Returns the service (callback) URL of an organization.
#[must_use]
pub fn service_url(public_url: &str, org_slug: &str) -> String {
    format!("{}/{org_slug}/cas/callback", public_url.trim_end_matches('/'))
}

/// Builds the CAS client configuration of an organization.
///
/// # Errors
///
/// Returns an error if the organization has no CAS server URL, or its
/// settings do not form a valid configuration.
pub fn client_config(
    org: &Organization,
    public_url: &str,
) -> Result<CasClientConfig, CasSetupError> {
    let server_url = org
        .cas_server_url()
        .ok_or(CasSetupError::MissingServerUrl)?;
    let version = org
        .cas_protocol_version()
        .map_err(|e| CasSetupError::InvalidSettings {
            details: e.to_string(),
        })?;

    CasClientConfig::new(version, &server_url, &service_url(public_url, org.slug())).map_err(|e| {
        CasSetupError::InvalidSettings {
            details: e.to_string(),
        }
    })
}

/// Builds a CAS client for an organization.
///
/// # Errors
///
/// Returns an error if the organization's CAS settings are incomplete or
/// invalid.
pub fn client_for(
    state: &AppState,
    org: &Organization,
) -> Result<Box<dyn CasClient>, Report<CasSetupError>> {
    let config = client_config(org, &state.public_url)?;
    Ok(state.cas_clients.client(config))
}

/// Looks up an organization that can serve a CAS login.
///
/// Unknown organizations, organizations with CAS disabled, incomplete CAS
/// settings and store failures are all logged here and yield `None`, so
/// callers answer them identically.
pub(crate) async fn cas_organization(
    state: &AppState,
    org_slug: &str,
) -> Option<(Organization, Box<dyn CasClient>)> {
    let org = match state.organizations.find_by_slug(org_slug).await {
        Ok(Some(org)) => org,
        Ok(None) => {
            error!(org = %org_slug, "CAS login requested for unknown organization");
            return None;
        }
        Err(e) => {
            error!(org = %org_slug, error = %e, "failed to load organization");
            return None;
        }
    };

    if !org.cas_enabled() {
        error!(org = %org_slug, "CAS is not enabled for this organization");
        return None;
    }

    match client_for(state, &org) {
        Ok(client) => Some((org, client)),
        Err(e) => {
            error!(org = %org_slug, error = %e, "CAS configuration error");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use casbridge_access::{OrgSettings, settings_keys};
    use casbridge_cas::ProtocolVersion;

    fn org(server_url: Option<&str>, version: Option<i64>) -> Organization {
        let mut settings = OrgSettings::new();
        settings.set_setting(settings_keys::CAS_ENABLED, true);
        if let Some(url) = server_url {
            settings.set_setting(settings_keys::CAS_SERVER_URL, url);
        }
        if let Some(version) = version {
            settings.set_setting(settings_keys::CAS_PROTOCOL_VERSION, version);
        }
        Organization::new("acme", "Acme").with_settings(settings)
    }

    #[test]
    fn service_url_is_tenant_scoped() {
        assert_eq!(
            service_url("https://app.example/", "acme"),
            "https://app.example/acme/cas/callback"
        );
    }

    #[test]
    fn config_defaults_to_version_two() {
        let config = client_config(
            &org(Some("https://cas.acme.example"), None),
            "https://app.example",
        )
        .unwrap();

        assert_eq!(config.protocol_version(), ProtocolVersion::V2);
        assert_eq!(
            config.service_url().as_str(),
            "https://app.example/acme/cas/callback"
        );
        assert!(
            config
                .login_url()
                .as_str()
                .starts_with("https://cas.acme.example/login?service=")
        );
    }

    #[test]
    fn missing_server_url_is_a_configuration_error() {
        let err = client_config(&org(None, None), "https://app.example").unwrap_err();
        assert!(matches!(err, CasSetupError::MissingServerUrl));
    }

    #[test]
    fn unsupported_version_is_a_configuration_error() {
        let err = client_config(
            &org(Some("https://cas.acme.example"), Some(7)),
            "https://app.example",
        )
        .unwrap_err();
        assert!(matches!(err, CasSetupError::InvalidSettings { .. }));
    }
}
