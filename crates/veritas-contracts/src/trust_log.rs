//! Trust Log entry types: the hash-chained, Ed25519-signed audit record
//! every pipeline decision is appended to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::canonical::{sha256_hex, to_canonical_string};
use crate::error::VeritasResult;

/// The genesis marker used as `prev_hash` for the first entry in a chain.
pub const GENESIS_HASH: &str = "GENESIS";

/// One append-only Trust Log record.
///
/// `payload_hash` is `sha256(canonical_json(payload))` alone, and
/// `signature` is the Ed25519 signature over `payload_hash`'s hex bytes —
/// so a caller can check the payload's integrity and authenticity without
/// needing the rest of the chain. `hash` additionally commits the whole
/// entry (including `payload_hash` and chain position) and is what the
/// next entry's `prev_hash` links to. All three are computed by the
/// writer immediately before appending; constructing an entry directly
/// leaves them unset so a partially-built entry can never be mistaken for
/// a sealed one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustLogEntry {
    pub seq: u64,
    pub entry_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub request_id: String,
    pub decision_id: Option<String>,
    pub payload: Value,
    pub prev_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl TrustLogEntry {
    /// Build an unsealed entry; the writer seals it (computes
    /// `payload_hash`, `hash`, and `signature`) immediately before
    /// appending it to the chain.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        seq: u64,
        entry_id: String,
        event_type: impl Into<String>,
        request_id: impl Into<String>,
        decision_id: Option<String>,
        payload: Value,
        prev_hash: String,
    ) -> Self {
        TrustLogEntry {
            seq,
            entry_id,
            timestamp: Utc::now(),
            event_type: event_type.into(),
            request_id: request_id.into(),
            decision_id,
            payload,
            prev_hash,
            payload_hash: None,
            hash: None,
            signature: None,
        }
    }

    /// `sha256(canonical_json(payload))`, independent of whatever is
    /// currently stored in `self.payload_hash`. This is the value that
    /// gets signed, and the value a verifier recomputes to detect a
    /// tampered payload in isolation from the rest of the chain.
    pub fn compute_payload_hash(&self) -> VeritasResult<String> {
        let canonical = to_canonical_string(&self.payload)?;
        Ok(sha256_hex(canonical.as_bytes()))
    }

    /// Canonical JSON of the hashable fields — everything except `hash`
    /// and `signature` themselves, so the entry hash commits to the chain
    /// position (`seq`, `prev_hash`), the payload hash, and the rest of
    /// the content, but not to itself.
    pub fn hashable_string(&self) -> VeritasResult<String> {
        let hashable = serde_json::json!({
            "seq": self.seq,
            "entry_id": self.entry_id,
            "timestamp": self.timestamp.to_rfc3339(),
            "event_type": self.event_type,
            "request_id": self.request_id,
            "decision_id": self.decision_id,
            "payload": self.payload,
            "payload_hash": self.payload_hash,
            "prev_hash": self.prev_hash,
        });
        to_canonical_string(&hashable)
    }

    /// Compute `sha256(canonical_json(hashable_fields))`, independent of
    /// whatever is currently stored in `self.hash`. Requires
    /// `payload_hash` to already be set for the result to mean anything
    /// chain-wise, but will happily hash `null` if called too early.
    pub fn compute_hash(&self) -> VeritasResult<String> {
        let canonical = self.hashable_string()?;
        Ok(sha256_hex(canonical.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry() -> TrustLogEntry {
        TrustLogEntry::new(1, "e1".into(), "decision", "r1", Some("d1".into()), json!({"a": 1}), "GENESIS".into())
    }

    #[test]
    fn payload_hash_is_stable_across_repeated_computation() {
        let e = entry();
        assert_eq!(e.compute_payload_hash().unwrap(), e.compute_payload_hash().unwrap());
    }

    #[test]
    fn payload_hash_changes_when_payload_changes() {
        let mut e = entry();
        let a = e.compute_payload_hash().unwrap();
        e.payload = json!({"a": 2});
        let b = e.compute_payload_hash().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn hash_is_stable_across_repeated_computation() {
        let entry = entry();
        assert_eq!(entry.compute_hash().unwrap(), entry.compute_hash().unwrap());
    }

    #[test]
    fn hash_changes_when_prev_hash_changes() {
        let mut a = entry();
        let hash_a = a.compute_hash().unwrap();
        a.prev_hash = "something-else".into();
        let hash_b = a.compute_hash().unwrap();
        assert_ne!(hash_a, hash_b);
    }

    #[test]
    fn hash_changes_when_payload_hash_changes() {
        let mut a = entry();
        a.payload_hash = Some("one".into());
        let hash_a = a.compute_hash().unwrap();
        a.payload_hash = Some("two".into());
        let hash_b = a.compute_hash().unwrap();
        assert_ne!(hash_a, hash_b);
    }
}
