//! Builds an [`Event`] from a raw webhook request.
//!
//! # Parsing Strategy
//!
//! 1. The body must be declared as `application/json`
//! 2. `X-GitHub-Event` and `X-GitHub-Delivery` must be present
//! 3. The signature is checked BEFORE the body is decoded
//! 4. The body must decode to a JSON object
//!
//! Any failure here is a hard failure: no handler runs for the delivery.

use http::HeaderMap;
use serde_json::Value;
use thiserror::Error;

use super::events::{DeliveryId, Event, EventKind};
use super::signature::verify_signature;

/// Header name for GitHub event type.
pub const HEADER_EVENT: &str = "x-github-event";
/// Header name for GitHub delivery ID.
pub const HEADER_DELIVERY: &str = "x-github-delivery";
/// Header name for GitHub signature.
pub const HEADER_SIGNATURE: &str = "x-hub-signature-256";

const HEADER_CONTENT_TYPE: &str = "content-type";

/// Error type for webhook request parsing and verification.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Missing required header.
    #[error("missing required header: {0}")]
    MissingHeader(&'static str),

    /// Body is not declared as JSON.
    #[error("unsupported content type: {0:?}")]
    UnsupportedContentType(Option<String>),

    /// A secret is configured but the request carries no signature.
    #[error("signature required but x-hub-signature-256 header is missing")]
    MissingSignature,

    /// Signature does not match the body.
    #[error("invalid signature")]
    InvalidSignature,

    /// The request is signed but no secret was configured to check it with.
    #[error("request is signed but no webhook secret is configured")]
    UnexpectedSignature,

    /// Body is not a JSON object.
    #[error("invalid JSON body: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("webhook body must be a JSON object")]
    NotAnObject,
}

impl Event {
    /// Parses and verifies a webhook request.
    ///
    /// # Arguments
    ///
    /// * `headers` - The request headers
    /// * `body` - The raw body bytes, exactly as signed by GitHub
    /// * `secret` - The webhook secret, if one is configured
    ///
    /// # Examples
    ///
    /// ```
    /// use http::HeaderMap;
    /// use triage_bot::webhooks::{Event, EventKind};
    ///
    /// let mut headers = HeaderMap::new();
    /// headers.insert("content-type", "application/json".parse().unwrap());
    /// headers.insert("x-github-event", "ping".parse().unwrap());
    /// headers.insert("x-github-delivery", "72d3162e".parse().unwrap());
    ///
    /// let event = Event::from_http(&headers, br#"{"zen": "Keep it logically awesome."}"#, None).unwrap();
    /// assert_eq!(event.kind(), &EventKind::Ping);
    /// assert_eq!(event.delivery_id().as_str(), "72d3162e");
    /// ```
    pub fn from_http(
        headers: &HeaderMap,
        body: &[u8],
        secret: Option<&[u8]>,
    ) -> Result<Event, ParseError> {
        let content_type = header_str(headers, HEADER_CONTENT_TYPE);
        if !is_json_content_type(content_type) {
            return Err(ParseError::UnsupportedContentType(
                content_type.map(str::to_string),
            ));
        }

        let event_type = require_header(headers, HEADER_EVENT)?;
        let delivery_id = DeliveryId::new(require_header(headers, HEADER_DELIVERY)?);

        let signature = header_str(headers, HEADER_SIGNATURE);
        match (secret, signature) {
            (Some(secret), Some(signature)) => {
                if !verify_signature(body, signature, secret) {
                    return Err(ParseError::InvalidSignature);
                }
            }
            (Some(_), None) => return Err(ParseError::MissingSignature),
            (None, Some(_)) => return Err(ParseError::UnexpectedSignature),
            (None, None) => {}
        }

        let payload: Value = serde_json::from_slice(body)?;
        if !payload.is_object() {
            return Err(ParseError::NotAnObject);
        }

        Ok(Event::new(EventKind::parse(event_type), payload, delivery_id))
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn require_header<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<&'a str, ParseError> {
    header_str(headers, name).ok_or(ParseError::MissingHeader(name))
}

/// Accepts `application/json` with optional parameters such as `charset`.
fn is_json_content_type(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|ct| ct.split(';').next())
        .map(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
        .unwrap_or(false)
}
