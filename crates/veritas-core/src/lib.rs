//! # veritas-core
//!
//! The orchestration runtime for the VERITAS decision pipeline.
//!
//! This crate provides:
//! - The collaborator traits (`EvidenceSource`, `Planner`, `SafetyGate`,
//!   `TrustLogWriter`, `LlmClient`, `SafetyHead`) that `veritas-evidence`,
//!   `veritas-planner`, `veritas-policy`, and `veritas-audit` implement.
//! - The `Orchestrator` that sequences them in the correct trust order.
//! - The self-healing retry policy (C8).
//! - Environment-driven runtime configuration.

pub mod config;
pub mod healing;
pub mod orchestrator;
pub mod traits;

pub use config::Config;
pub use orchestrator::Orchestrator;
