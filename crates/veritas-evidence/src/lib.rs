//! # veritas-evidence
//!
//! Evidence collection for the VERITAS decision pipeline.
//!
//! Three [`EvidenceSource`](veritas_core::traits::EvidenceSource)
//! implementations: [`heuristics::LocalHeuristics`] (deterministic,
//! offline rules), [`memory::CosineMemoryIndex`] (recall from prior
//! decisions), and [`web::WebEvidenceSource`] (normalized web search,
//! parameterized over a caller-supplied [`web::SearchClient`] so this
//! crate carries no networking dependency of its own). [`normalize`]
//! holds the shared dedupe and defaulting logic all three rely on.

pub mod heuristics;
pub mod memory;
pub mod normalize;
pub mod web;

pub use heuristics::LocalHeuristics;
pub use memory::CosineMemoryIndex;
pub use web::{SearchClient, WebEvidenceSource};
