//! API key comparison and HMAC-SHA256 request signature verification.
//!
//! The signature covers `"{timestamp}\n{nonce}\n{raw_body}"`. Both the
//! API key compare and the signature compare run in constant time over
//! their full length, rather than short-circuiting on the first
//! mismatched byte.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// How far a request's `X-Timestamp` may drift from server time before
/// it's rejected, in seconds.
pub const TIMESTAMP_TOLERANCE_SECONDS: i64 = 300;

/// Byte-for-byte constant-time equality; always walks the longer of the
/// two lengths so early mismatches don't shorten execution time.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

/// Compare a caller-supplied API key against the configured one.
pub fn verify_api_key(supplied: &str, configured: &str) -> bool {
    constant_time_eq(supplied.as_bytes(), configured.as_bytes())
}

/// Compute `hex(HMAC-SHA256(secret, "{ts}\n{nonce}\n{raw_body}"))`.
pub fn compute_signature(secret: &str, timestamp: &str, nonce: &str, raw_body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts a key of any length");
    mac.update(timestamp.as_bytes());
    mac.update(b"\n");
    mac.update(nonce.as_bytes());
    mac.update(b"\n");
    mac.update(raw_body);
    hex::encode(mac.finalize().into_bytes())
}

/// Verify a caller-supplied signature against the expected one, in
/// constant time.
pub fn verify_signature(secret: &str, timestamp: &str, nonce: &str, raw_body: &[u8], supplied_signature: &str) -> bool {
    let expected = compute_signature(secret, timestamp, nonce, raw_body);
    constant_time_eq(expected.as_bytes(), supplied_signature.as_bytes())
}

/// `true` when `timestamp` (unix seconds) is within
/// `TIMESTAMP_TOLERANCE_SECONDS` of `now` (unix seconds).
pub fn timestamp_in_range(timestamp: i64, now: i64) -> bool {
    (now - timestamp).abs() <= TIMESTAMP_TOLERANCE_SECONDS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_api_keys_compare_equal() {
        assert!(verify_api_key("s3cr3t", "s3cr3t"));
    }

    #[test]
    fn mismatched_api_keys_compare_unequal() {
        assert!(!verify_api_key("s3cr3t", "other"));
    }

    #[test]
    fn signature_round_trips() {
        let sig = compute_signature("secret", "1700000000", "abc123", b"{\"query\":\"hi\"}");
        assert!(verify_signature("secret", "1700000000", "abc123", b"{\"query\":\"hi\"}", &sig));
    }

    #[test]
    fn tampered_body_fails_signature_check() {
        let sig = compute_signature("secret", "1700000000", "abc123", b"{\"query\":\"hi\"}");
        assert!(!verify_signature("secret", "1700000000", "abc123", b"{\"query\":\"bye\"}", &sig));
    }

    #[test]
    fn timestamp_within_tolerance_passes() {
        assert!(timestamp_in_range(1700000000, 1700000000 + 299));
        assert!(!timestamp_in_range(1700000000, 1700000000 + 301));
    }
}
