//! Error types for the CAS client.
//!
//! A `CasError` means the exchange with the CAS server could not be completed.
//! A ticket the server refuses is not an error; it is reported as
//! [`TicketValidation::Invalid`](crate::TicketValidation::Invalid).

use std::fmt;

/// Errors from building a CAS client or talking to a CAS server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CasError {
    /// The tenant's CAS configuration is unusable.
    Configuration { details: String },
    /// The request to the CAS server did not complete.
    Transport { details: String },
    /// The CAS server answered with a non-success HTTP status.
    HttpStatus { status: u16 },
    /// The CAS server's response could not be understood.
    MalformedResponse { details: String },
}

impl fmt::Display for CasError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration { details } => {
                write!(f, "CAS configuration error: {details}")
            }
            Self::Transport { details } => {
                write!(f, "CAS server request failed: {details}")
            }
            Self::HttpStatus { status } => {
                write!(f, "CAS server returned HTTP status {status}")
            }
            Self::MalformedResponse { details } => {
                write!(f, "malformed CAS response: {details}")
            }
        }
    }
}

impl std::error::Error for CasError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_display() {
        let err = CasError::HttpStatus { status: 503 };
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn malformed_response_display() {
        let err = CasError::MalformedResponse {
            details: "missing cas:user".to_string(),
        };
        assert!(err.to_string().contains("malformed"));
        assert!(err.to_string().contains("missing cas:user"));
    }
}
