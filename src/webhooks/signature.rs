//! Webhook payload signatures.
//!
//! GitHub signs each delivery with HMAC-SHA256 keyed by the webhook secret and
//! sends the digest as `X-Hub-Signature-256: sha256=<hex>`. A delivery whose
//! signature does not verify must be dropped before its body is trusted.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Decodes a `sha256=<hex>` header value into raw digest bytes.
///
/// Returns `None` when the prefix is missing or the hex is malformed.
///
/// # Examples
///
/// ```
/// use triage_bot::webhooks::parse_signature_header;
///
/// assert_eq!(parse_signature_header("sha256=0aff"), Some(vec![0x0a, 0xff]));
/// assert!(parse_signature_header("sha1=0aff").is_none());
/// assert!(parse_signature_header("sha256=zz").is_none());
/// ```
pub fn parse_signature_header(header: &str) -> Option<Vec<u8>> {
    header
        .strip_prefix("sha256=")
        .and_then(|hex_sig| hex::decode(hex_sig).ok())
}

/// Signs `payload` with `secret`. Used to build test deliveries.
pub fn compute_signature(payload: &[u8], secret: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

/// Formats a digest as a `sha256=<hex>` header value.
pub fn format_signature_header(signature: &[u8]) -> String {
    format!("sha256={}", hex::encode(signature))
}

/// Checks a delivery's signature header against its body.
///
/// The comparison is constant-time. Malformed headers verify as `false`.
///
/// # Examples
///
/// ```
/// use triage_bot::webhooks::{compute_signature, format_signature_header, verify_signature};
///
/// let body = br#"{"zen": "Design for failure."}"#;
/// let header = format_signature_header(&compute_signature(body, b"s3cret"));
///
/// assert!(verify_signature(body, &header, b"s3cret"));
/// assert!(!verify_signature(body, &header, b"other"));
/// ```
pub fn verify_signature(payload: &[u8], signature_header: &str, secret: &[u8]) -> bool {
    let Some(expected) = parse_signature_header(signature_header) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(payload);
    mac.verify_slice(&expected).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parse_accepts_uppercase_hex() {
        assert_eq!(
            parse_signature_header("sha256=ABCD1234"),
            Some(vec![0xab, 0xcd, 0x12, 0x34])
        );
    }

    #[test]
    fn parse_rejects_odd_length_hex() {
        assert_eq!(parse_signature_header("sha256=abc"), None);
    }

    #[test]
    fn parse_rejects_legacy_sha1_header() {
        assert_eq!(
            parse_signature_header("sha1=c28e33b2e56e548956c446e890929a6cbec3ac89"),
            None
        );
    }

    /// Test vector from GitHub's webhook validation docs.
    #[test]
    fn github_documentation_vector() {
        let header = "sha256=757107ea0eb2509fc211221cce984b8a37570b6d7586c22c46f4379c8b043e17";
        assert!(verify_signature(
            b"Hello, World!",
            header,
            b"It's a Secret to Everybody"
        ));
    }

    #[test]
    fn malformed_headers_do_not_verify() {
        for header in ["", "sha256=", "sha256=nothex", "sha1=abc123", "garbage"] {
            assert!(!verify_signature(b"body", header, b"secret"), "{header}");
        }
    }

    #[test]
    fn truncated_signature_does_not_verify() {
        let full = compute_signature(b"body", b"secret");
        let header = format_signature_header(&full[..16]);
        assert!(!verify_signature(b"body", &header, b"secret"));
    }

    proptest! {
        #[test]
        fn prop_signed_payload_verifies(payload: Vec<u8>, secret: Vec<u8>) {
            let header = format_signature_header(&compute_signature(&payload, &secret));
            prop_assert!(verify_signature(&payload, &header, &secret));
        }

        #[test]
        fn prop_wrong_secret_fails(
            payload in any::<Vec<u8>>(),
            secret1 in "[a-zA-Z0-9]{1,32}",
            secret2 in "[a-zA-Z0-9]{1,32}",
        ) {
            // Zero-padded keys collide in HMAC, so keep secrets free of NUL bytes.
            prop_assume!(secret1 != secret2);
            let header = format_signature_header(&compute_signature(&payload, secret1.as_bytes()));
            prop_assert!(!verify_signature(&payload, &header, secret2.as_bytes()));
        }

        #[test]
        fn prop_tampered_payload_fails(original: Vec<u8>, modified: Vec<u8>, secret: Vec<u8>) {
            prop_assume!(original != modified);
            let header = format_signature_header(&compute_signature(&original, &secret));
            prop_assert!(!verify_signature(&modified, &header, &secret));
        }

        #[test]
        fn prop_arbitrary_header_never_panics(header: String, payload: Vec<u8>) {
            let _ = verify_signature(&payload, &header, b"secret");
        }
    }
}
