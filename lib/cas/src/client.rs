//! CAS protocol clients.

use async_trait::async_trait;
use rootcause::prelude::Report;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::config::CasClientConfig;
use crate::error::CasError;
use crate::response::parse_validation_response;
use crate::ticket::{ServiceTicket, TicketValidation};

/// A client bound to one CAS server and one service URL.
#[async_trait]
pub trait CasClient: Send + Sync {
    /// Returns the URL of the CAS server's login page for this service.
    fn login_url(&self) -> String;

    /// Exchanges a service ticket for the identity it was issued to.
    ///
    /// A ticket the server refuses is `Ok(TicketValidation::Invalid)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the server could not be reached, answered with a
    /// non-success status, or sent a response that is not a CAS response.
    /// Errors are never retried: the server may already have consumed the
    /// ticket.
    async fn verify_ticket(
        &self,
        ticket: &ServiceTicket,
    ) -> Result<TicketValidation, Report<CasError>>;
}

/// Builds clients from per-request configuration.
pub trait CasClientFactory: Send + Sync {
    /// Returns a client bound to the given configuration.
    fn client(&self, config: CasClientConfig) -> Box<dyn CasClient>;
}

/// CAS client speaking HTTP to a real CAS server.
#[derive(Debug, Clone)]
pub struct HttpCasClient {
    config: CasClientConfig,
    timeout: Duration,
}

impl HttpCasClient {
    /// Creates a client with the given validation timeout.
    #[must_use]
    pub fn new(config: CasClientConfig, timeout: Duration) -> Self {
        Self { config, timeout }
    }

    /// Returns the configuration this client is bound to.
    #[must_use]
    pub fn config(&self) -> &CasClientConfig {
        &self.config
    }
}

#[async_trait]
impl CasClient for HttpCasClient {
    fn login_url(&self) -> String {
        self.config.login_url().to_string()
    }

    #[instrument(skip(self), fields(server = %self.config.server_url(), version = %self.config.protocol_version()))]
    async fn verify_ticket(
        &self,
        ticket: &ServiceTicket,
    ) -> Result<TicketValidation, Report<CasError>> {
        // A fresh client per verification: nothing is pooled across requests
        // or tenants.
        let http_client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(self.timeout)
            .build()
            .map_err(|e| CasError::Transport {
                details: format!("failed to create HTTP client: {e}"),
            })?;

        let response = http_client
            .get(self.config.validation_url(ticket))
            .send()
            .await
            .map_err(|e| CasError::Transport {
                details: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CasError::HttpStatus {
                status: status.as_u16(),
            }
            .into());
        }

        let body = response.text().await.map_err(|e| CasError::Transport {
            details: format!("failed to read response body: {e}"),
        })?;

        let validation = parse_validation_response(self.config.protocol_version(), &body)?;
        debug!(
            valid = validation.assertion().is_some(),
            "CAS ticket validation completed"
        );

        Ok(validation)
    }
}

/// Factory producing [`HttpCasClient`]s.
#[derive(Debug, Clone)]
pub struct HttpCasClientFactory {
    timeout: Duration,
}

impl HttpCasClientFactory {
    /// Creates a factory whose clients use the given validation timeout.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl CasClientFactory for HttpCasClientFactory {
    fn client(&self, config: CasClientConfig) -> Box<dyn CasClient> {
        Box::new(HttpCasClient::new(config, self.timeout))
    }
}
