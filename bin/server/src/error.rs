//! Domain error types for server operations.

use std::fmt;

/// Errors that stop the server from starting or serving.
#[derive(Debug)]
pub enum ServerError {
    /// Configuration is missing or invalid.
    Config { details: String },
    /// The database could not be reached.
    Database { details: String },
    /// Migrations failed to apply.
    Migration { details: String },
    /// The listen address could not be bound.
    Bind { addr: String, details: String },
    /// The HTTP server stopped with an error.
    Serve { details: String },
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { details } => write!(f, "invalid configuration: {details}"),
            Self::Database { details } => write!(f, "database connection failed: {details}"),
            Self::Migration { details } => write!(f, "database migration failed: {details}"),
            Self::Bind { addr, details } => write!(f, "failed to bind to '{addr}': {details}"),
            Self::Serve { details } => write!(f, "server error: {details}"),
        }
    }
}

impl std::error::Error for ServerError {}

/// Why a CAS client could not be built for an organization.
#[derive(Debug)]
pub enum CasSetupError {
    /// CAS is enabled but no server URL is configured.
    MissingServerUrl,
    /// The stored settings do not form a valid client configuration.
    InvalidSettings { details: String },
}

impl fmt::Display for CasSetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingServerUrl => write!(f, "CAS is enabled but no server URL is configured"),
            Self::InvalidSettings { details } => write!(f, "invalid CAS settings: {details}"),
        }
    }
}

impl std::error::Error for CasSetupError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_error_names_address() {
        let err = ServerError::Bind {
            addr: "127.0.0.1:3000".to_string(),
            details: "address in use".to_string(),
        };
        assert!(err.to_string().contains("127.0.0.1:3000"));
    }

    #[test]
    fn setup_error_display() {
        assert!(
            CasSetupError::MissingServerUrl
                .to_string()
                .contains("server URL")
        );
    }
}
