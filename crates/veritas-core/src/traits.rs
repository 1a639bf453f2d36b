//! Collaborator traits for the VERITAS decision pipeline.
//!
//! - `EvidenceSource` — untrusted I/O (memory index, web search, local
//!   heuristics) consulted during evidence collection.
//! - `LlmClient`      — untrusted generation, used by the planner and the
//!   debate critics.
//! - `SafetyHead`     — a fast heuristic/model risk classifier consulted by
//!   the FUJI gate's Stage B, before the (slower, more expensive) policy
//!   evaluation in Stage C.
//!
//! All three are `async_trait` because the gateway's real implementations
//! do network I/O (vector search, web search, LLM calls). The orchestrator
//! never calls an untrusted collaborator without a deterministic fallback
//! available — a collaborator timing out or erroring degrades the pipeline
//! rather than failing the whole request, except where the gate explicitly
//! fails closed.

use async_trait::async_trait;
use veritas_contracts::error::VeritasResult;
use veritas_contracts::evidence::Evidence;
use veritas_contracts::fuji::{FujiDecision, PolicyContext};
use veritas_contracts::fuji_codes::FujiRejection;
use veritas_contracts::option::Alternative;
use veritas_contracts::request::DecisionRequest;
use veritas_contracts::safety::SafetyAnalysis;
use veritas_contracts::trust_log::TrustLogEntry;

/// A source of evidence consulted during evidence collection (C3).
///
/// Implementations are expected to be best-effort: a failing or slow
/// source should return an empty `Vec`, not propagate an error, unless the
/// failure is itself diagnostic (e.g. a malformed local config).
#[async_trait]
pub trait EvidenceSource: Send + Sync {
    /// Human-readable source name, used in `Evidence::source` and metrics.
    fn name(&self) -> &str;

    /// Collect evidence relevant to `request.query`, optionally narrowed
    /// by `request.context` (e.g. `stakes`, `goals`, `constraints`,
    /// `intent`). `request.fast_mode` suppresses optional I/O.
    async fn collect(&self, request: &DecisionRequest) -> VeritasResult<Vec<Evidence>>;
}

/// A chat-completion-style client used by the planner and debate stages.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Produce free-form completion text for `prompt`. Implementations
    /// should apply their own timeout; the caller treats a returned error
    /// as "no usable completion" and falls back to a deterministic plan.
    async fn complete(&self, prompt: &str) -> VeritasResult<String>;
}

/// A risk classifier consulted by FUJI Stage B.
///
/// Returns `{risk_score ∈ [0,1], categories, rationale, model}`; the gate
/// combines this with the deterministic Stage A screen under a floor rule
/// (see `veritas-policy::safety_head`).
#[async_trait]
pub trait SafetyHead: Send + Sync {
    async fn analyze(&self, text: &str) -> VeritasResult<SafetyAnalysis>;
}

/// A deterministic `SafetyHead` that flags nothing — used when no model
/// backend is configured, so Stage B degrades to Stage A's regex screen
/// alone rather than failing the request.
pub struct NullSafetyHead;

#[async_trait]
impl SafetyHead for NullSafetyHead {
    async fn analyze(&self, _text: &str) -> VeritasResult<SafetyAnalysis> {
        Ok(SafetyAnalysis {
            risk_score: 0.0,
            categories: Vec::new(),
            rationale: "no safety head configured".to_string(),
            model: "heuristic_fallback".to_string(),
        })
    }
}

/// The FUJI safety gate, as seen by the orchestrator.
///
/// `veritas-policy` implements this trait; `veritas-core` only depends on
/// the trait, which keeps the orchestration crate free of policy-loading
/// and regex/YAML concerns.
#[async_trait]
pub trait SafetyGate: Send + Sync {
    /// Evaluate `candidate` (its title, description, and the evidence
    /// backing it) and return a decision. `text` is the full text surface
    /// to run the Stage A/B screens over (candidate text plus query).
    async fn evaluate(
        &self,
        request_id: &str,
        text: &str,
        candidate: &Alternative,
        evidence: &[Evidence],
        policy_context: &PolicyContext,
    ) -> VeritasResult<FujiDecision>;
}

/// The Trust Log, as seen by the orchestrator.
///
/// `veritas-audit` implements this trait against its hash-chained,
/// Ed25519-signed file backend (or an in-memory backend for tests).
#[async_trait]
pub trait TrustLogWriter: Send + Sync {
    /// Seal and append `entry` to the chain, returning its final
    /// `entry_id` (identical to `entry.entry_id` on success).
    async fn append(&self, entry: TrustLogEntry) -> VeritasResult<String>;
}

/// A `TrustLogWriter` that discards every entry — used where a collaborator
/// needs one to satisfy its constructor but no durable log is configured
/// (e.g. a gate built with `with_default_safety_head` in a unit test).
pub struct NullTrustLog;

#[async_trait]
impl TrustLogWriter for NullTrustLog {
    async fn append(&self, entry: TrustLogEntry) -> VeritasResult<String> {
        Ok(entry.entry_id)
    }
}

/// The outcome of a planning (and debate/value-scoring) pass: a scored,
/// verdict-banded set of alternatives and how many debate rounds ran.
#[derive(Debug, Clone)]
pub struct PlanOutcome {
    pub alternatives: Vec<Alternative>,
    pub debate_rounds: u32,
}

/// The planner, debate, and value-scoring stages (C4/C5), as seen by the
/// orchestrator. `veritas-planner` implements this trait.
#[async_trait]
pub trait Planner: Send + Sync {
    /// Generate or augment alternatives for `request` given `evidence`,
    /// running them through debate critique and value scoring.
    async fn plan(
        &self,
        request: &DecisionRequest,
        evidence: &[Evidence],
    ) -> VeritasResult<PlanOutcome>;

    /// Produce a revised candidate addressing `rejection`, for the
    /// self-healing retry loop. Implementations should bias the revision
    /// toward the rejection's `feedback.hint`.
    async fn revise(
        &self,
        request: &DecisionRequest,
        evidence: &[Evidence],
        rejection: &FujiRejection,
        previous: &Alternative,
    ) -> VeritasResult<Alternative>;
}
