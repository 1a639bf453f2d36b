//! Hash-chain and signature verification over a sequence of
//! [`TrustLogEntry`] records.

use serde::{Deserialize, Serialize};

use veritas_contracts::trust_log::{TrustLogEntry, GENESIS_HASH};

use crate::keys::verify_hash_signature;

/// Why a single entry failed verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainIssueReason {
    PayloadHashMismatch,
    PreviousHashMismatch,
    SignatureInvalid,
}

/// One broken rule found at one chain position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainIssue {
    pub index: usize,
    pub reason: ChainIssueReason,
}

/// The outcome of verifying a chain of entries. Walks every entry rather
/// than stopping at the first broken one, so `issues` reports the full
/// blast radius of tampering in a single pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainVerification {
    pub ok: bool,
    pub entries_checked: usize,
    pub issues: Vec<ChainIssue>,
}

/// Verify, for every entry:
/// - `payload_hash` matches a fresh `sha256(canonical_json(payload))`
/// - `prev_hash` matches the previous entry's stored `hash` (or
///   [`GENESIS_HASH`] for the first entry)
/// - when `public_key_b64` is given, the signature over `payload_hash`
///   verifies against it
///
/// Collects every violation found rather than returning on the first one.
pub fn verify_chain(entries: &[TrustLogEntry], public_key_b64: Option<&str>) -> ChainVerification {
    let mut issues = Vec::new();
    let mut expected_prev = GENESIS_HASH.to_string();

    for (index, entry) in entries.iter().enumerate() {
        if entry.prev_hash != expected_prev {
            issues.push(ChainIssue { index, reason: ChainIssueReason::PreviousHashMismatch });
        }

        let payload_hash_ok = match (&entry.payload_hash, entry.compute_payload_hash()) {
            (Some(stored), Ok(recomputed)) => *stored == recomputed,
            _ => false,
        };
        if !payload_hash_ok {
            issues.push(ChainIssue { index, reason: ChainIssueReason::PayloadHashMismatch });
        }

        if let Some(public_key_b64) = public_key_b64 {
            let signature_ok = match (&entry.payload_hash, &entry.signature) {
                (Some(payload_hash), Some(signature)) => verify_hash_signature(payload_hash, signature, public_key_b64),
                _ => false,
            };
            if !signature_ok {
                issues.push(ChainIssue { index, reason: ChainIssueReason::SignatureInvalid });
            }
        }

        // Chain continuity is checked against what was actually written,
        // not against this entry's own recomputed hash, so a single
        // tampered entry doesn't cascade into spurious mismatches on
        // every entry after it.
        expected_prev = entry.hash.clone().unwrap_or_default();
    }

    ChainVerification { ok: issues.is_empty(), entries_checked: entries.len(), issues }
}
