//! Service tickets and validation results.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::CasError;

/// An opaque, single-use ticket issued by the CAS server.
///
/// Single use is enforced by the CAS server, not here: replaying a consumed
/// ticket simply yields [`TicketValidation::Invalid`].
#[derive(Clone, PartialEq, Eq)]
pub struct ServiceTicket(String);

impl ServiceTicket {
    /// Wraps a ticket received on the callback.
    ///
    /// # Errors
    ///
    /// Returns `CasError::MalformedResponse` if the ticket is blank.
    pub fn new(ticket: impl Into<String>) -> Result<Self, CasError> {
        let ticket = ticket.into();
        if ticket.trim().is_empty() {
            return Err(CasError::MalformedResponse {
                details: "empty service ticket".to_string(),
            });
        }
        Ok(Self(ticket))
    }

    /// Returns the ticket as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Tickets are bearer credentials until consumed; keep them out of logs.
impl fmt::Debug for ServiceTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix: String = self.0.chars().take(3).collect();
        write!(f, "ServiceTicket({prefix}…)")
    }
}

/// Principal attributes released by the CAS server.
///
/// Every attribute is multi-valued; single values are one-element lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(BTreeMap<String, Vec<String>>);

impl Attributes {
    /// Creates an empty attribute set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value to the named attribute.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.entry(name.into()).or_default().push(value.into());
    }

    /// Returns all values of the named attribute.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.0.get(name).map(Vec::as_slice)
    }

    /// Returns the first value of the named attribute, if it is non-empty.
    #[must_use]
    pub fn first(&self, name: &str) -> Option<&str> {
        self.get(name)
            .and_then(<[String]>::first)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Returns true if no attributes were released.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of distinct attribute names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates over attribute names and their values.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

impl fmt::Display for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, values)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}: [{}]", values.join(", "))?;
        }
        write!(f, "}}")
    }
}

impl<K, V> FromIterator<(K, V)> for Attributes
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attributes = Self::new();
        for (name, value) in iter {
            attributes.push(name, value);
        }
        attributes
    }
}

/// A successfully validated identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assertion {
    principal: String,
    attributes: Attributes,
    proxy_granting_ticket_iou: Option<String>,
}

impl Assertion {
    /// Creates an assertion for a principal.
    #[must_use]
    pub fn new(principal: impl Into<String>) -> Self {
        Self {
            principal: principal.into(),
            attributes: Attributes::new(),
            proxy_granting_ticket_iou: None,
        }
    }

    /// Sets the released attributes.
    #[must_use]
    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Sets the proxy-granting ticket IOU.
    #[must_use]
    pub fn with_proxy_granting_ticket_iou(mut self, iou: Option<String>) -> Self {
        self.proxy_granting_ticket_iou = iou;
        self
    }

    /// Returns the authenticated principal identifier.
    #[must_use]
    pub fn principal(&self) -> &str {
        &self.principal
    }

    /// Returns the released attributes.
    #[must_use]
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Returns the proxy-granting ticket IOU, if the server issued one.
    #[must_use]
    pub fn proxy_granting_ticket_iou(&self) -> Option<&str> {
        self.proxy_granting_ticket_iou.as_deref()
    }
}

/// Outcome of validating a service ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketValidation {
    /// The server vouched for a non-empty principal.
    Valid(Assertion),
    /// The server refused the ticket, or vouched for nobody.
    Invalid {
        /// CAS failure code (e.g. `INVALID_TICKET`).
        code: String,
        /// Human-readable detail from the server, for logs only.
        message: String,
    },
}

impl TicketValidation {
    /// Code used when a success response names an empty principal.
    pub const EMPTY_PRINCIPAL: &'static str = "EMPTY_PRINCIPAL";

    /// Builds a validation result, mapping a blank principal to `Invalid`.
    #[must_use]
    pub fn from_assertion(assertion: Assertion) -> Self {
        if assertion.principal.trim().is_empty() {
            return Self::Invalid {
                code: Self::EMPTY_PRINCIPAL.to_string(),
                message: "server returned an empty principal".to_string(),
            };
        }
        Self::Valid(assertion)
    }

    /// Returns the assertion if the ticket was valid.
    #[must_use]
    pub fn assertion(&self) -> Option<&Assertion> {
        match self {
            Self::Valid(assertion) => Some(assertion),
            Self::Invalid { .. } => None,
        }
    }
}
