//! Outbound decision response types.

use serde::{Deserialize, Serialize};

use crate::{
    evidence::Evidence,
    fuji::{DecisionStatusExternal, FujiDecision, GateResult},
    option::Alternative,
};

/// Pipeline timing and sizing metrics, always present in `extras.metrics`
/// even when every stage ran instantly or was skipped (zero rather than
/// absent).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metrics {
    pub evidence_count: usize,
    pub alternatives_count: usize,
    pub debate_rounds: u32,
    pub elapsed_ms: u64,
    /// Evidence items contributed by the memory source, before dedupe.
    pub mem_hits: usize,
    /// Evidence items contributed by the memory source, after dedupe —
    /// what actually reached the planner.
    pub memory_evidence_count: usize,
    /// Evidence items contributed by the web source, before dedupe.
    pub web_hits: usize,
    /// Evidence items contributed by the web source, after dedupe.
    pub web_evidence_count: usize,
    pub fast_mode: bool,
}

/// The fast-mode flag threaded through the memory-search metadata, so a
/// caller can see why memory search was (or wasn't) skipped without
/// cross-referencing the request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryContext {
    pub fast: bool,
}

/// Metadata about the memory search performed during evidence collection,
/// always present even when memory search was skipped or empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryMeta {
    pub hits: usize,
    pub skipped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
    pub context: MemoryContext,
}

/// Self-healing summary, always present even when healing never triggered.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelfHealingSummary {
    /// Whether self-healing was available for this request (the gateway
    /// config and `context.self_healing_enabled` both allowed it) — not
    /// whether a retry actually ran; see `triggered` for that.
    pub enabled: bool,
    pub attempts: u32,
    pub triggered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_code: Option<String>,
    /// A summary of what changed between the most recent retry's input
    /// and the one before it (e.g. `"changed_fields:last_output,rejection"`),
    /// or absent if no retry ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff_summary: Option<String>,
}

/// The mandatory `extras` envelope. `metrics`, `memory_meta`, and
/// `self_healing` are always present (never omitted) so callers can treat
/// their absence as a contract violation rather than "no data".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Extras {
    pub metrics: Metrics,
    pub memory_meta: MemoryMeta,
    pub self_healing: SelfHealingSummary,
}

/// The complete decision returned to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionResponse {
    pub request_id: String,
    pub decision_id: String,
    /// Bit-exact external decision status, derived from `fuji.status` —
    /// see `FujiStatus::external`.
    pub decision_status: DecisionStatusExternal,
    pub chosen: Option<Alternative>,
    pub alternatives: Vec<Alternative>,
    pub evidence: Vec<Evidence>,
    pub gate: GateResult,
    pub fuji: FujiDecision,
    pub trust_log_id: String,
    pub extras: Extras,
}

impl DecisionResponse {
    /// `true` once the FUJI gate blocked the request — `chosen` is `None`
    /// in that case.
    pub fn was_rejected(&self) -> bool {
        self.chosen.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fuji::FujiDecision;

    #[test]
    fn extras_default_is_fully_populated_not_absent() {
        let extras = Extras::default();
        assert_eq!(extras.metrics.evidence_count, 0);
        assert!(!extras.memory_meta.skipped || extras.memory_meta.skip_reason.is_none());
        assert!(!extras.self_healing.triggered);
        assert!(extras.self_healing.diff_summary.is_none());
    }

    #[test]
    fn rejected_response_has_no_chosen_alternative() {
        let fuji = FujiDecision::pass("A");
        let response = DecisionResponse {
            request_id: "r1".into(),
            decision_id: "d1".into(),
            decision_status: fuji.status.external(),
            chosen: None,
            alternatives: vec![],
            evidence: vec![],
            gate: GateResult::from(&fuji),
            fuji,
            trust_log_id: "tl1".into(),
            extras: Extras::default(),
        };
        assert!(response.was_rejected());
    }
}
