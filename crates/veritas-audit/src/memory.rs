//! In-memory Trust Log, used by tests and by the gateway when no on-disk
//! log directory is configured (e.g. ephemeral CI runs).

use std::sync::Mutex;

use async_trait::async_trait;

use veritas_contracts::error::{VeritasError, VeritasResult};
use veritas_contracts::trust_log::{TrustLogEntry, GENESIS_HASH};
use veritas_core::traits::TrustLogWriter;

use crate::chain::{verify_chain, ChainVerification};
use crate::keys::AuditKeypair;

struct State {
    entries: Vec<TrustLogEntry>,
    last_hash: String,
}

/// A `Mutex`-guarded, Ed25519-signed, in-memory hash chain.
pub struct InMemoryTrustLog {
    state: Mutex<State>,
    keypair: AuditKeypair,
}

impl InMemoryTrustLog {
    pub fn new(keypair: AuditKeypair) -> Self {
        InMemoryTrustLog {
            state: Mutex::new(State {
                entries: Vec::new(),
                last_hash: GENESIS_HASH.to_string(),
            }),
            keypair,
        }
    }

    pub fn entries(&self) -> Vec<TrustLogEntry> {
        self.state.lock().expect("trust log lock poisoned").entries.clone()
    }

    pub fn verify_integrity(&self) -> ChainVerification {
        let state = self.state.lock().expect("trust log lock poisoned");
        verify_chain(&state.entries, Some(&self.keypair.public_key_b64()))
    }
}

#[async_trait]
impl TrustLogWriter for InMemoryTrustLog {
    async fn append(&self, mut entry: TrustLogEntry) -> VeritasResult<String> {
        let mut state = self.state.lock().map_err(|e| VeritasError::AuditWriteFailed {
            reason: format!("trust log lock poisoned: {e}"),
        })?;

        entry.seq = state.entries.len() as u64;
        entry.prev_hash = state.last_hash.clone();
        let payload_hash = entry.compute_payload_hash()?;
        entry.payload_hash = Some(payload_hash.clone());
        entry.signature = Some(self.keypair.sign_hash(&payload_hash));
        let hash = entry.compute_hash()?;
        entry.hash = Some(hash.clone());

        let entry_id = entry.entry_id.clone();
        state.entries.push(entry);
        state.last_hash = hash;
        Ok(entry_id)
    }
}
