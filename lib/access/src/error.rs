//! Error types for the access crate.
//!
//! Errors are wrapped in rootcause `Report`s at the storage boundary:
//! - `StoreError`: the backing store failed
//! - `ProvisioningError`: a user could not be created or logged in
//! - `SettingsError`: submitted CAS settings are invalid

use std::fmt;

/// Errors from a storage backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backend failed to execute the operation.
    Backend { details: String },
    /// A stored record could not be decoded.
    Corrupt { details: String },
    /// The record conflicts with an existing one.
    Conflict { details: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backend { details } => write!(f, "storage backend error: {details}"),
            Self::Corrupt { details } => write!(f, "corrupt stored record: {details}"),
            Self::Conflict { details } => write!(f, "conflicting record: {details}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Errors from creating or logging in a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisioningError {
    /// The user exists but has been disabled.
    Disabled { identifier: String },
    /// The user store failed.
    Store { details: String },
}

impl fmt::Display for ProvisioningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled { identifier } => write!(f, "user '{identifier}' is disabled"),
            Self::Store { details } => write!(f, "user provisioning failed: {details}"),
        }
    }
}

impl std::error::Error for ProvisioningError {}

/// Errors from validating CAS settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    /// CAS is enabled but no server URL was given.
    MissingServerUrl,
    /// The server URL is not an absolute http(s) URL.
    InvalidServerUrl { url: String, reason: String },
    /// The protocol version is not one of 1, 2 or 3.
    UnsupportedProtocolVersion { version: i64 },
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingServerUrl => write!(f, "a CAS server URL is required"),
            Self::InvalidServerUrl { url, reason } => {
                write!(f, "invalid CAS server URL '{url}': {reason}")
            }
            Self::UnsupportedProtocolVersion { version } => {
                write!(f, "unsupported CAS protocol version {version}")
            }
        }
    }
}

impl std::error::Error for SettingsError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provisioning_disabled_display() {
        let err = ProvisioningError::Disabled {
            identifier: "jdoe".to_string(),
        };
        assert!(err.to_string().contains("jdoe"));
        assert!(err.to_string().contains("disabled"));
    }

    #[test]
    fn settings_error_display() {
        let err = SettingsError::UnsupportedProtocolVersion { version: 9 };
        assert!(err.to_string().contains('9'));
        assert!(SettingsError::MissingServerUrl.to_string().contains("required"));
    }

    #[test]
    fn store_error_display() {
        let err = StoreError::Backend {
            details: "connection reset".to_string(),
        };
        assert!(err.to_string().contains("connection reset"));
    }
}
