//! # veritas-policy
//!
//! The FUJI safety gate: a three-stage risk screen run on every candidate
//! before it is allowed to leave the orchestrator.
//!
//! ## Overview
//!
//! [`engine::FujiGate`] implements
//! [`SafetyGate`](veritas_core::traits::SafetyGate). Stage A
//! ([`rules`]) is a deterministic regex/keyword screen loaded from YAML.
//! Stage B ([`safety_head`]) combines Stage A's verdict with a model or
//! heuristic risk score under a floor rule: Stage B can only raise risk,
//! never clear a Stage A flag. Stage C, in `engine`, adds title-integrity
//! and evidence-sufficiency checks and returns the final
//! [`FujiDecision`](veritas_contracts::fuji::FujiDecision).
//!
//! [`sanitize`] holds the PII detectors Stage A's screen relies on.

pub mod engine;
pub mod rules;
pub mod safety_head;
pub mod sanitize;

pub use engine::FujiGate;
pub use rules::{StageAConfig, StageAVerdict};
pub use safety_head::StageBVerdict;
