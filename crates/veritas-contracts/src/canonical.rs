//! Canonical JSON serialization used for hashing, signing, and
//! self-healing input-signature comparison.
//!
//! Canonical JSON: keys sorted, UTF-8, `,`/`:` separators, no inserted
//! whitespace, non-ASCII left as-is. `serde_json::Value`'s `Serialize`
//! impl already sorts map keys when the `preserve_order` feature is off
//! (the default), and `to_string`/`to_vec` never insert whitespace, so
//! canonicalization reduces to: serialize to `Value`, then re-serialize
//! compactly.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::{VeritasError, VeritasResult};

/// Serialize `value` to canonical JSON: sorted keys, compact separators,
/// UTF-8, non-escaped non-ASCII.
pub fn to_canonical_string<T: Serialize>(value: &T) -> VeritasResult<String> {
    let as_value = serde_json::to_value(value).map_err(|e| VeritasError::SchemaValidation {
        reason: format!("failed to serialize to canonical JSON: {e}"),
    })?;
    canonical_string_from_value(&as_value)
}

/// Serialize an already-constructed [`Value`] to canonical JSON.
pub fn canonical_string_from_value(value: &Value) -> VeritasResult<String> {
    serde_json::to_string(value).map_err(|e| VeritasError::SchemaValidation {
        reason: format!("failed to serialize to canonical JSON: {e}"),
    })
}

/// SHA-256 hex digest of the canonical JSON form of `value`.
pub fn sha256_of_canonical<T: Serialize>(value: &T) -> VeritasResult<String> {
    let canonical = to_canonical_string(value)?;
    Ok(sha256_hex(canonical.as_bytes()))
}

/// SHA-256 hex digest of raw bytes.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
