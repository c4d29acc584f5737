//! Delivery signature computation.
//!
//! Deliveries are signed with HMAC-SHA256 over a canonical encoding of the
//! JSON payload, and the signature travels as a lowercase hex string.
//!
//! ## Canonical encoding
//!
//! HMAC is encoding-sensitive, so signer and verifier must agree on one
//! byte representation of the payload. This receiver uses `serde_json`'s
//! compact serialization of the parsed value: no whitespace, object keys in
//! sorted order. Senders must serialize the same way before signing, which
//! makes the signature insensitive to wire-level whitespace and key order.

use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// The canonical byte representation of a payload, as signed by senders.
pub fn canonical_encode(payload: &Value) -> Vec<u8> {
    serde_json::to_vec(payload).expect("JSON value serialization cannot fail")
}

/// The expected signature for a payload under a secret: the lowercase hex
/// HMAC-SHA256 digest of the canonical payload encoding.
///
/// Exposed so senders (and tests) can produce valid signatures.
pub fn expected_signature(secret: &str, payload: &Value) -> String {
    hmac_hex(secret, &canonical_encode(payload))
}

/// Verify a supplied signature against the expected one for this payload.
///
/// The comparison runs in constant time over the supplied string. A
/// malformed signature (wrong length, non-hex, uppercase) can never equal
/// the expected lowercase hex digest and is rejected through the same path.
pub fn verify_signature(secret: &str, payload: &Value, supplied: &str) -> bool {
    let expected = expected_signature(secret, payload);
    constant_time_compare(expected.as_bytes(), supplied.as_bytes())
}

fn hmac_hex(secret: &str, message: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC-SHA256 accepts keys of any length");
    mac.update(message);
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time comparison to prevent timing attacks.
///
/// The length pre-check leaks only the length, which is fixed by the
/// digest algorithm.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
