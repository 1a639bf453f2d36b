//! # veritas-audit
//!
//! The hash-chained, Ed25519-signed, append-only Trust Log for the VERITAS
//! runtime.
//!
//! Every decision the orchestrator makes — pass or reject — is wrapped in
//! a [`veritas_contracts::trust_log::TrustLogEntry`] that links to the
//! previous entry via its SHA-256 hash and is signed with an Ed25519 key.
//! Tampering with any entry, even a single byte, breaks the chain and is
//! detected by [`chain::verify_chain`].
//!
//! Two backends implement `veritas_core::traits::TrustLogWriter`:
//! [`memory::InMemoryTrustLog`] for tests and ephemeral runs, and
//! [`file::FileTrustLog`] for the durable JSONL-backed production log.

pub mod chain;
pub mod file;
pub mod keys;
pub mod memory;
pub mod verify;

pub use chain::{verify_chain, ChainIssue, ChainIssueReason, ChainVerification};
pub use file::FileTrustLog;
pub use keys::AuditKeypair;
pub use memory::InMemoryTrustLog;
