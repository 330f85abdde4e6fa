//! Per-tenant CAS client configuration.

use url::Url;

use crate::error::CasError;
use crate::ticket::ServiceTicket;
use crate::version::ProtocolVersion;

/// Configuration binding a client to one CAS server and one service URL.
///
/// This is a value object derived from tenant settings on every request.
/// It is never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CasClientConfig {
    protocol_version: ProtocolVersion,
    /// CAS server base URL, always ending in `/`.
    server_url: Url,
    /// The fully-qualified callback URL the CAS server redirects back to.
    service_url: Url,
}

impl CasClientConfig {
    /// Creates a configuration from raw URL strings.
    ///
    /// The server URL is treated as a directory: `https://sso.example/cas`
    /// and `https://sso.example/cas/` both place the login endpoint at
    /// `https://sso.example/cas/login`.
    ///
    /// # Errors
    ///
    /// Returns `CasError::Configuration` if either URL is not an absolute
    /// http(s) URL.
    pub fn new(
        protocol_version: ProtocolVersion,
        server_url: &str,
        service_url: &str,
    ) -> Result<Self, CasError> {
        let mut server_url = parse_http_url("server", server_url)?;
        if !server_url.path().ends_with('/') {
            let path = format!("{}/", server_url.path());
            server_url.set_path(&path);
        }
        server_url.set_query(None);
        server_url.set_fragment(None);

        let service_url = parse_http_url("service", service_url)?;

        Ok(Self {
            protocol_version,
            server_url,
            service_url,
        })
    }

    /// Returns the protocol version.
    #[must_use]
    pub fn protocol_version(&self) -> ProtocolVersion {
        self.protocol_version
    }

    /// Returns the CAS server base URL.
    #[must_use]
    pub fn server_url(&self) -> &Url {
        &self.server_url
    }

    /// Returns the service (callback) URL.
    #[must_use]
    pub fn service_url(&self) -> &Url {
        &self.service_url
    }

    /// Returns the CAS login URL the browser is sent to.
    #[must_use]
    pub fn login_url(&self) -> Url {
        let mut url = self.endpoint("login");
        url.query_pairs_mut()
            .append_pair("service", self.service_url.as_str());
        url
    }

    /// Returns the URL used to validate a service ticket.
    #[must_use]
    pub fn validation_url(&self, ticket: &ServiceTicket) -> Url {
        let mut url = self.endpoint(self.protocol_version.validation_path());
        url.query_pairs_mut()
            .append_pair("service", self.service_url.as_str())
            .append_pair("ticket", ticket.as_str());
        url
    }

    fn endpoint(&self, path: &str) -> Url {
        // `path` is a fixed relative reference, so joining onto a base that
        // ends in `/` cannot fail.
        self.server_url
            .join(path)
            .unwrap_or_else(|_| self.server_url.clone())
    }
}

fn parse_http_url(which: &str, raw: &str) -> Result<Url, CasError> {
    let url = Url::parse(raw.trim()).map_err(|e| CasError::Configuration {
        details: format!("invalid {which} URL '{raw}': {e}"),
    })?;

    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(url),
        _ => Err(CasError::Configuration {
            details: format!("{which} URL '{raw}' must be an absolute http(s) URL"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acme_config(version: ProtocolVersion) -> CasClientConfig {
        CasClientConfig::new(
            version,
            "https://cas.acme.example",
            "https://app.example.com/acme/cas/callback",
        )
        .expect("valid config")
    }

    #[test]
    fn login_url_carries_service() {
        let url = acme_config(ProtocolVersion::V2).login_url();

        assert_eq!(url.host_str(), Some("cas.acme.example"));
        assert_eq!(url.path(), "/login");
        let service = url
            .query_pairs()
            .find(|(k, _)| k == "service")
            .map(|(_, v)| v.into_owned());
        assert_eq!(
            service.as_deref(),
            Some("https://app.example.com/acme/cas/callback")
        );
        assert!(url.as_str().contains("%2Facme%2Fcas%2Fcallback"));
    }

    #[test]
    fn server_path_is_treated_as_directory() {
        let config = CasClientConfig::new(
            ProtocolVersion::V2,
            "https://sso.example.com/cas",
            "https://app.example.com/acme/cas/callback",
        )
        .unwrap();

        assert_eq!(config.server_url().as_str(), "https://sso.example.com/cas/");
        assert_eq!(config.login_url().path(), "/cas/login");
    }

    #[test]
    fn validation_url_depends_on_version() {
        let ticket = ServiceTicket::new("ST-123").unwrap();

        let v1 = acme_config(ProtocolVersion::V1).validation_url(&ticket);
        let v2 = acme_config(ProtocolVersion::V2).validation_url(&ticket);
        let v3 = acme_config(ProtocolVersion::V3).validation_url(&ticket);

        assert_eq!(v1.path(), "/validate");
        assert_eq!(v2.path(), "/serviceValidate");
        assert_eq!(v3.path(), "/p3/serviceValidate");

        let pairs: Vec<(String, String)> = v2
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert!(pairs.contains(&("ticket".to_string(), "ST-123".to_string())));
        assert!(pairs.contains(&(
            "service".to_string(),
            "https://app.example.com/acme/cas/callback".to_string()
        )));
    }

    #[test]
    fn rejects_relative_or_non_http_urls() {
        assert!(
            CasClientConfig::new(ProtocolVersion::V2, "/cas", "https://app/cb").is_err()
        );
        assert!(
            CasClientConfig::new(ProtocolVersion::V2, "ftp://cas.example", "https://app/cb")
                .is_err()
        );
        assert!(
            CasClientConfig::new(ProtocolVersion::V2, "https://cas.example", "callback").is_err()
        );
    }

    #[test]
    fn drops_query_from_server_url() {
        let config = CasClientConfig::new(
            ProtocolVersion::V3,
            "https://cas.example/?locale=en",
            "https://app/acme/cas/callback",
        )
        .unwrap();
        assert_eq!(config.server_url().query(), None);
    }
}
