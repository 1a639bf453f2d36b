//! Ties HMAC verification, nonce freshness, and rate limiting into a
//! single admission check the gateway's middleware calls once per
//! request.

use crate::hmac_auth::{timestamp_in_range, verify_api_key, verify_signature};
use crate::nonce::NonceStore;
use crate::rate_limit::RateLimiter;

/// Hard cap on request body size, in bytes (10 MiB).
pub const MAX_BODY_BYTES: u64 = 10 * 1024 * 1024;

/// The four headers an authenticated request must carry.
#[derive(Debug, Clone)]
pub struct RequestHeaders<'a> {
    pub api_key: &'a str,
    pub timestamp: &'a str,
    pub nonce: &'a str,
    pub signature: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionError {
    MissingApiKey,
    InvalidApiKey,
    MalformedTimestamp,
    TimestampOutOfRange,
    Replay,
    InvalidSignature,
    RateLimited,
    BodyTooLarge,
    MissingContentLength,
}

/// Configuration loaded once at startup and passed by reference —
/// no global mutable state.
pub struct AdmissionConfig {
    pub api_key: String,
    pub api_secret: String,
}

/// The shared, lock-guarded admission substrates: nonce store and rate
/// limiter. One instance lives for the gateway's whole process lifetime.
pub struct AdmissionGuard {
    config: AdmissionConfig,
    nonces: NonceStore,
    rate_limiter: RateLimiter,
}

impl AdmissionGuard {
    pub fn new(config: AdmissionConfig) -> Self {
        AdmissionGuard { config, nonces: NonceStore::new(), rate_limiter: RateLimiter::default() }
    }

    /// Run every admission check in spec order: API key, timestamp
    /// freshness, nonce replay, signature, then rate limit.
    pub fn admit(&self, headers: &RequestHeaders, raw_body: &[u8], now_unix: i64, now_monotonic: f64) -> Result<(), AdmissionError> {
        if headers.api_key.is_empty() {
            return Err(AdmissionError::MissingApiKey);
        }
        if !verify_api_key(headers.api_key, &self.config.api_key) {
            return Err(AdmissionError::InvalidApiKey);
        }

        let timestamp: i64 = headers.timestamp.parse().map_err(|_| AdmissionError::MalformedTimestamp)?;
        if !timestamp_in_range(timestamp, now_unix) {
            return Err(AdmissionError::TimestampOutOfRange);
        }

        if !self.nonces.check_and_record(headers.nonce, now_unix) {
            return Err(AdmissionError::Replay);
        }

        if !verify_signature(&self.config.api_secret, headers.timestamp, headers.nonce, raw_body, headers.signature) {
            return Err(AdmissionError::InvalidSignature);
        }

        if !self.rate_limiter.try_acquire(headers.api_key, now_monotonic) {
            return Err(AdmissionError::RateLimited);
        }

        Ok(())
    }

    /// Checks `content_length` against [`MAX_BODY_BYTES`] ahead of
    /// reading the body at all.
    pub fn check_content_length(content_length: Option<u64>) -> Result<(), AdmissionError> {
        match content_length {
            None => Err(AdmissionError::MissingContentLength),
            Some(len) if len > MAX_BODY_BYTES => Err(AdmissionError::BodyTooLarge),
            Some(_) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hmac_auth::compute_signature;

    fn guard() -> AdmissionGuard {
        AdmissionGuard::new(AdmissionConfig { api_key: "key123".to_string(), api_secret: "secret456".to_string() })
    }

    fn signed_headers<'a>(secret: &str, ts: &'a str, nonce: &'a str, body: &[u8], api_key: &'a str, sig: &'a mut String) -> RequestHeaders<'a> {
        *sig = compute_signature(secret, ts, nonce, body);
        RequestHeaders { api_key, timestamp: ts, nonce, signature: sig }
    }

    #[test]
    fn valid_request_is_admitted() {
        let guard = guard();
        let mut sig = String::new();
        let headers = signed_headers("secret456", "1000", "n1", b"{}", "key123", &mut sig);
        assert!(guard.admit(&headers, b"{}", 1000, 0.0).is_ok());
    }

    #[test]
    fn wrong_api_key_is_rejected() {
        let guard = guard();
        let mut sig = String::new();
        let headers = signed_headers("secret456", "1000", "n1", b"{}", "wrong-key", &mut sig);
        assert_eq!(guard.admit(&headers, b"{}", 1000, 0.0), Err(AdmissionError::InvalidApiKey));
    }

    #[test]
    fn stale_timestamp_is_rejected() {
        let guard = guard();
        let mut sig = String::new();
        let headers = signed_headers("secret456", "1000", "n1", b"{}", "key123", &mut sig);
        assert_eq!(guard.admit(&headers, b"{}", 1000 + 301, 0.0), Err(AdmissionError::TimestampOutOfRange));
    }

    #[test]
    fn replayed_nonce_is_rejected_on_second_use() {
        let guard = guard();
        let mut sig = String::new();
        let headers = signed_headers("secret456", "1000", "n1", b"{}", "key123", &mut sig);
        assert!(guard.admit(&headers, b"{}", 1000, 0.0).is_ok());
        assert_eq!(guard.admit(&headers, b"{}", 1001, 1.0), Err(AdmissionError::Replay));
    }

    #[test]
    fn tampered_body_fails_signature_check() {
        let guard = guard();
        let mut sig = String::new();
        let headers = signed_headers("secret456", "1000", "n1", b"{}", "key123", &mut sig);
        assert_eq!(guard.admit(&headers, b"{\"tampered\":true}", 1000, 0.0), Err(AdmissionError::InvalidSignature));
    }

    #[test]
    fn oversized_content_length_is_rejected() {
        assert_eq!(AdmissionGuard::check_content_length(Some(MAX_BODY_BYTES + 1)), Err(AdmissionError::BodyTooLarge));
        assert!(AdmissionGuard::check_content_length(Some(1024)).is_ok());
        assert_eq!(AdmissionGuard::check_content_length(None), Err(AdmissionError::MissingContentLength));
    }
}
