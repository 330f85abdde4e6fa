//! Parsing of CAS validation responses.
//!
//! Version 1 servers answer `validate` with two lines of plain text:
//!
//! ```text
//! yes
//! jdoe
//! ```
//!
//! Versions 2 and 3 answer `serviceValidate` with an XML document:
//!
//! ```xml
//! <cas:serviceResponse xmlns:cas="http://www.yale.edu/tp/cas">
//!   <cas:authenticationSuccess>
//!     <cas:user>jdoe</cas:user>
//!     <cas:attributes>
//!       <cas:displayName>Jane Doe</cas:displayName>
//!     </cas:attributes>
//!     <cas:proxyGrantingTicket>PGTIOU-84678-8a9d</cas:proxyGrantingTicket>
//!   </cas:authenticationSuccess>
//! </cas:serviceResponse>
//! ```

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::CasError;
use crate::ticket::{Assertion, Attributes, TicketValidation};
use crate::version::ProtocolVersion;

/// Parses a validation response body for the given protocol version.
///
/// # Errors
///
/// Returns `CasError::MalformedResponse` if the body is not a recognizable
/// CAS response.
pub fn parse_validation_response(
    version: ProtocolVersion,
    body: &str,
) -> Result<TicketValidation, CasError> {
    match version {
        ProtocolVersion::V1 => parse_v1(body),
        ProtocolVersion::V2 | ProtocolVersion::V3 => parse_service_response(body),
    }
}

fn parse_v1(body: &str) -> Result<TicketValidation, CasError> {
    let mut lines = body.lines().map(str::trim);

    match lines.next() {
        Some("yes") => {
            let principal = lines.next().unwrap_or_default();
            Ok(TicketValidation::from_assertion(Assertion::new(principal)))
        }
        Some("no") => Ok(TicketValidation::Invalid {
            code: "INVALID_TICKET".to_string(),
            message: "ticket not recognized".to_string(),
        }),
        _ => Err(CasError::MalformedResponse {
            details: "expected 'yes' or 'no' on the first line".to_string(),
        }),
    }
}

/// Where in the document the reader currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Outside,
    Response,
    Success,
    Attributes,
    Failure,
}

#[derive(Debug, Default)]
struct ServiceResponse {
    saw_root: bool,
    success: bool,
    failure_code: Option<String>,
    failure_message: String,
    user: Option<String>,
    pgt_iou: Option<String>,
    attributes: Attributes,
}

fn parse_service_response(body: &str) -> Result<TicketValidation, CasError> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut parsed = ServiceResponse::default();
    let mut section = Section::Outside;
    // Name of the element whose text is being collected, if any.
    let mut capturing: Option<String> = None;
    let mut text = String::new();

    loop {
        let event = reader.read_event().map_err(|e| CasError::MalformedResponse {
            details: format!("invalid XML at byte {}: {e}", reader.buffer_position()),
        })?;

        match event {
            Event::Start(element) => {
                let name = local_name(&element);
                match (section, name.as_str()) {
                    (Section::Outside, "serviceResponse") => {
                        parsed.saw_root = true;
                        section = Section::Response;
                    }
                    (Section::Response, "authenticationSuccess") => {
                        parsed.success = true;
                        section = Section::Success;
                    }
                    (Section::Response, "authenticationFailure") => {
                        parsed.failure_code = Some(
                            attribute(&element, "code")?.unwrap_or_else(|| "UNKNOWN".to_string()),
                        );
                        section = Section::Failure;
                    }
                    (Section::Success, "attributes") => section = Section::Attributes,
                    (Section::Success, _) | (Section::Attributes, _) => {
                        capturing = Some(name);
                        text.clear();
                    }
                    _ => {}
                }
            }
            Event::Empty(element) => {
                let name = local_name(&element);
                match (section, name.as_str()) {
                    (Section::Response, "authenticationFailure") => {
                        parsed.failure_code = Some(
                            attribute(&element, "code")?.unwrap_or_else(|| "UNKNOWN".to_string()),
                        );
                    }
                    (Section::Response, "authenticationSuccess") => parsed.success = true,
                    // Older servers release `<cas:attribute name=".." value=".."/>`.
                    (Section::Attributes, "attribute") => {
                        if let (Some(attr_name), Some(value)) =
                            (attribute(&element, "name")?, attribute(&element, "value")?)
                        {
                            parsed.attributes.push(attr_name, value);
                        }
                    }
                    (Section::Attributes, _) => parsed.attributes.push(name, ""),
                    (Section::Success, "user") => parsed.user = Some(String::new()),
                    _ => {}
                }
            }
            Event::Text(content) => {
                let unescaped = content.unescape().map_err(|e| CasError::MalformedResponse {
                    details: format!("invalid text content: {e}"),
                })?;
                if capturing.is_some() {
                    text.push_str(&unescaped);
                } else if section == Section::Failure {
                    parsed.failure_message.push_str(&unescaped);
                }
            }
            Event::CData(content) => {
                let raw = String::from_utf8_lossy(&content.into_inner()).into_owned();
                if capturing.is_some() {
                    text.push_str(&raw);
                } else if section == Section::Failure {
                    parsed.failure_message.push_str(&raw);
                }
            }
            Event::End(element) => {
                let name = String::from_utf8_lossy(element.local_name().as_ref()).into_owned();
                if capturing.as_deref() == Some(name.as_str()) {
                    let value = std::mem::take(&mut text);
                    capturing = None;
                    match section {
                        Section::Success if name == "user" => parsed.user = Some(value),
                        Section::Success if name == "proxyGrantingTicket" => {
                            parsed.pgt_iou = Some(value).filter(|v| !v.is_empty());
                        }
                        Section::Attributes => parsed.attributes.push(name, value),
                        _ => {}
                    }
                    continue;
                }
                section = match (section, name.as_str()) {
                    (Section::Attributes, "attributes") => Section::Success,
                    (Section::Success, "authenticationSuccess")
                    | (Section::Failure, "authenticationFailure") => Section::Response,
                    (Section::Response, "serviceResponse") => Section::Outside,
                    (current, _) => current,
                };
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !parsed.saw_root {
        return Err(CasError::MalformedResponse {
            details: "missing cas:serviceResponse element".to_string(),
        });
    }

    if let Some(code) = parsed.failure_code {
        return Ok(TicketValidation::Invalid {
            code,
            message: parsed.failure_message.trim().to_string(),
        });
    }

    if !parsed.success {
        return Err(CasError::MalformedResponse {
            details: "response has neither authenticationSuccess nor authenticationFailure"
                .to_string(),
        });
    }

    let assertion = Assertion::new(parsed.user.unwrap_or_default().trim())
        .with_attributes(parsed.attributes)
        .with_proxy_granting_ticket_iou(parsed.pgt_iou);

    Ok(TicketValidation::from_assertion(assertion))
}

fn local_name(element: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(element.local_name().as_ref()).into_owned()
}

fn attribute(element: &BytesStart<'_>, name: &str) -> Result<Option<String>, CasError> {
    let malformed = |e: &dyn std::fmt::Display| CasError::MalformedResponse {
        details: format!("invalid attribute '{name}': {e}"),
    };

    let Some(attr) = element.try_get_attribute(name).map_err(|e| malformed(&e))? else {
        return Ok(None);
    };
    let value = attr.unescape_value().map_err(|e| malformed(&e))?;
    Ok(Some(value.into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUCCESS_WITH_ATTRIBUTES: &str = r#"
        <cas:serviceResponse xmlns:cas="http://www.yale.edu/tp/cas">
          <cas:authenticationSuccess>
            <cas:user>jdoe</cas:user>
            <cas:attributes>
              <cas:displayName>Jane Doe</cas:displayName>
              <cas:memberOf>staff</cas:memberOf>
              <cas:memberOf>admins</cas:memberOf>
            </cas:attributes>
            <cas:proxyGrantingTicket>PGTIOU-84678-8a9d</cas:proxyGrantingTicket>
          </cas:authenticationSuccess>
        </cas:serviceResponse>"#;

    const FAILURE: &str = r#"
        <cas:serviceResponse xmlns:cas="http://www.yale.edu/tp/cas">
          <cas:authenticationFailure code="INVALID_TICKET">
            Ticket ST-1856339-aA5Yuvrxzpv8Tau1cYQ7 not recognized
          </cas:authenticationFailure>
        </cas:serviceResponse>"#;

    #[test]
    fn v2_success_with_attributes() {
        let validation =
            parse_validation_response(ProtocolVersion::V2, SUCCESS_WITH_ATTRIBUTES).unwrap();
        let assertion = validation.assertion().expect("valid ticket");

        assert_eq!(assertion.principal(), "jdoe");
        assert_eq!(assertion.attributes().first("displayName"), Some("Jane Doe"));
        assert_eq!(
            assertion.attributes().get("memberOf").map(<[String]>::len),
            Some(2)
        );
        assert_eq!(
            assertion.proxy_granting_ticket_iou(),
            Some("PGTIOU-84678-8a9d")
        );
    }

    #[test]
    fn v3_failure_reports_code_and_message() {
        let validation = parse_validation_response(ProtocolVersion::V3, FAILURE).unwrap();
        match validation {
            TicketValidation::Invalid { code, message } => {
                assert_eq!(code, "INVALID_TICKET");
                assert!(message.contains("not recognized"));
            }
            TicketValidation::Valid(_) => panic!("expected invalid ticket"),
        }
    }

    #[test]
    fn success_without_user_is_invalid() {
        let body = r#"<cas:serviceResponse xmlns:cas="http://www.yale.edu/tp/cas">
            <cas:authenticationSuccess><cas:user></cas:user></cas:authenticationSuccess>
        </cas:serviceResponse>"#;
        let validation = parse_validation_response(ProtocolVersion::V2, body).unwrap();
        assert!(matches!(
            validation,
            TicketValidation::Invalid { ref code, .. } if code == TicketValidation::EMPTY_PRINCIPAL
        ));
    }

    #[test]
    fn accepts_name_value_attribute_form() {
        let body = r#"<cas:serviceResponse xmlns:cas="http://www.yale.edu/tp/cas">
            <cas:authenticationSuccess>
              <cas:user>jdoe</cas:user>
              <cas:attributes>
                <cas:attribute name="displayName" value="Jane &amp; Co"/>
              </cas:attributes>
            </cas:authenticationSuccess>
        </cas:serviceResponse>"#;
        let validation = parse_validation_response(ProtocolVersion::V3, body).unwrap();
        let assertion = validation.assertion().expect("valid ticket");
        assert_eq!(assertion.attributes().first("displayName"), Some("Jane & Co"));
    }

    #[test]
    fn cdata_user_is_read() {
        let body = r#"<cas:serviceResponse xmlns:cas="http://www.yale.edu/tp/cas">
            <cas:authenticationSuccess><cas:user><![CDATA[j<doe>]]></cas:user></cas:authenticationSuccess>
        </cas:serviceResponse>"#;
        let validation = parse_validation_response(ProtocolVersion::V2, body).unwrap();
        assert_eq!(validation.assertion().unwrap().principal(), "j<doe>");
    }

    #[test]
    fn non_cas_document_is_malformed() {
        let err = parse_validation_response(ProtocolVersion::V2, "<html><body>oops</body></html>")
            .unwrap_err();
        assert!(matches!(err, CasError::MalformedResponse { .. }));
    }

    #[test]
    fn broken_xml_is_malformed() {
        let err = parse_validation_response(
            ProtocolVersion::V2,
            "<cas:serviceResponse><cas:authenticationSuccess></cas:user>",
        )
        .unwrap_err();
        assert!(matches!(err, CasError::MalformedResponse { .. }));
    }

    #[test]
    fn v1_yes_and_no() {
        let yes = parse_validation_response(ProtocolVersion::V1, "yes\njdoe\n").unwrap();
        assert_eq!(yes.assertion().unwrap().principal(), "jdoe");

        let no = parse_validation_response(ProtocolVersion::V1, "no\n\n").unwrap();
        assert!(no.assertion().is_none());

        assert!(parse_validation_response(ProtocolVersion::V1, "maybe").is_err());
    }

    #[test]
    fn v1_yes_without_user_is_invalid() {
        let validation = parse_validation_response(ProtocolVersion::V1, "yes\n").unwrap();
        assert!(validation.assertion().is_none());
    }
}
