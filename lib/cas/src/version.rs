//! CAS protocol versions.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CasError;

/// The CAS protocol version spoken with a server.
///
/// Versions differ in where tickets are validated and in how rich the
/// validation response is:
/// - `V1`: plain-text `validate` endpoint, principal only
/// - `V2`: XML `serviceValidate` endpoint, attributes when the server releases them
/// - `V3`: XML `p3/serviceValidate` endpoint with attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum ProtocolVersion {
    V1,
    V2,
    V3,
}

impl ProtocolVersion {
    /// Version used when a tenant has not configured one.
    pub const DEFAULT: Self = Self::V2;

    /// Returns the version number.
    #[must_use]
    pub fn number(self) -> i64 {
        match self {
            Self::V1 => 1,
            Self::V2 => 2,
            Self::V3 => 3,
        }
    }

    /// Returns the validation endpoint, relative to the CAS server base URL.
    #[must_use]
    pub fn validation_path(self) -> &'static str {
        match self {
            Self::V1 => "validate",
            Self::V2 => "serviceValidate",
            Self::V3 => "p3/serviceValidate",
        }
    }

    /// Returns true if validation responses can carry principal attributes.
    #[must_use]
    pub fn supports_attributes(self) -> bool {
        !matches!(self, Self::V1)
    }
}

impl Default for ProtocolVersion {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<i64> for ProtocolVersion {
    type Error = CasError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::V1),
            2 => Ok(Self::V2),
            3 => Ok(Self::V3),
            other => Err(CasError::Configuration {
                details: format!("unsupported CAS protocol version {other}"),
            }),
        }
    }
}

impl From<ProtocolVersion> for i64 {
    fn from(version: ProtocolVersion) -> Self {
        version.number()
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_version_two() {
        assert_eq!(ProtocolVersion::default(), ProtocolVersion::V2);
    }

    #[test]
    fn converts_from_number() {
        assert_eq!(ProtocolVersion::try_from(1).unwrap(), ProtocolVersion::V1);
        assert_eq!(ProtocolVersion::try_from(3).unwrap(), ProtocolVersion::V3);
        assert!(ProtocolVersion::try_from(0).is_err());
        assert!(ProtocolVersion::try_from(4).is_err());
    }

    #[test]
    fn validation_paths() {
        assert_eq!(ProtocolVersion::V1.validation_path(), "validate");
        assert_eq!(ProtocolVersion::V2.validation_path(), "serviceValidate");
        assert_eq!(ProtocolVersion::V3.validation_path(), "p3/serviceValidate");
    }

    #[test]
    fn only_v1_lacks_attributes() {
        assert!(!ProtocolVersion::V1.supports_attributes());
        assert!(ProtocolVersion::V2.supports_attributes());
        assert!(ProtocolVersion::V3.supports_attributes());
    }

    #[test]
    fn deserializes_from_number() {
        let version: ProtocolVersion = serde_json::from_str("3").expect("deserialize");
        assert_eq!(version, ProtocolVersion::V3);
        assert!(serde_json::from_str::<ProtocolVersion>("7").is_err());
    }
}
