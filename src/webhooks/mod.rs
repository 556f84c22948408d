//! Webhook intake: turning a raw GitHub delivery into an [`Event`].
//!
//! - [`signature`]: HMAC-SHA256 verification of `X-Hub-Signature-256`
//! - [`events`]: the immutable per-delivery event model and typed payload views
//! - [`parser`]: header/body validation and event construction

pub mod events;
pub mod parser;
pub mod signature;

pub use events::{
    Action, DeliveryId, Event, EventKind, IssueState, IssueView, LabelRef, PayloadError,
    PullRequestView,
};
pub use parser::{HEADER_DELIVERY, HEADER_EVENT, HEADER_SIGNATURE, ParseError};
pub use signature::{
    compute_signature, format_signature_header, parse_signature_header, verify_signature,
};
