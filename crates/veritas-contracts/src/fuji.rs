//! FUJI safety-gate decision types.
//!
//! The gate produces one of four internal outcomes
//! (`allow`/`allow_with_warning`/`needs_human_review`/`deny`). Two
//! external vocabularies are derived from them: the current
//! `allow`/`hold`/`deny` vocabulary and the legacy v1
//! `allow`/`modify`/`rejected` vocabulary kept for callers still on the
//! old decision-status contract. The mapping is bit-exact: `deny` is the
//! only internal status that ever maps to an external `deny`, and
//! `needs_human_review` is the only one that ever maps to `hold`.

use serde::{Deserialize, Serialize};

use crate::fuji_codes::FujiRejection;

/// The gate's internal verdict, independent of which external vocabulary a
/// caller expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FujiStatus {
    Allow,
    AllowWithWarning,
    NeedsHumanReview,
    Deny,
}

impl FujiStatus {
    /// `true` for `Allow` and `AllowWithWarning` — the two internal
    /// statuses that carry no rejection.
    pub fn is_pass(self) -> bool {
        matches!(self, FujiStatus::Allow | FujiStatus::AllowWithWarning)
    }

    /// Map to the current external decision status: `allow`, `hold`, or
    /// `deny`.
    pub fn external(self) -> DecisionStatusExternal {
        match self {
            FujiStatus::Allow | FujiStatus::AllowWithWarning => DecisionStatusExternal::Allow,
            FujiStatus::NeedsHumanReview => DecisionStatusExternal::Hold,
            FujiStatus::Deny => DecisionStatusExternal::Deny,
        }
    }

    /// Map to the legacy v1 `DecisionStatus` vocabulary: `NeedsHumanReview`
    /// collapses into `Modify`, since v1 callers only understand a
    /// three-way allow/modify/reject split.
    pub fn legacy(self) -> DecisionStatus {
        match self {
            FujiStatus::Allow | FujiStatus::AllowWithWarning => DecisionStatus::Allow,
            FujiStatus::NeedsHumanReview => DecisionStatus::Modify,
            FujiStatus::Deny => DecisionStatus::Rejected,
        }
    }
}

/// The current external decision status vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionStatusExternal {
    Allow,
    Hold,
    Deny,
}

/// The legacy (v1) three-way decision status, preserved for backward
/// compatibility with callers integrated before the FUJI v2 gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionStatus {
    Allow,
    Modify,
    Rejected,
}

/// Inputs Stage C needs beyond the text/candidate/evidence already passed
/// to `SafetyGate::evaluate`, pulled from the caller's request context.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolicyContext {
    /// Caller-declared stakes in `[0,1]`, from `DecisionRequest::stakes`.
    pub stakes: Option<f64>,
    /// The candidate's value-alignment score, used as a proxy for how much
    /// is riding on this particular recommendation.
    pub telos_score: Option<f64>,
    /// `true` when the caller already ran the candidate text through a
    /// sanitizer before submitting it, softening the PII violation.
    pub safe_applied: bool,
    /// Minimum evidence count required to pass, overriding
    /// `MIN_EVIDENCE_COUNT` when set.
    pub min_evidence: Option<usize>,
}

/// A caller-facing summary of the gate's verdict, independent of the
/// detailed rejection payload in [`FujiDecision::rejection`]. This is
/// the `gate` field of the decision response; `fuji` carries the full
/// decision for callers that need the code/feedback detail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateResult {
    pub decision_status: DecisionStatusExternal,
    pub legacy_status: DecisionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub blocking: bool,
}

impl From<&FujiDecision> for GateResult {
    fn from(decision: &FujiDecision) -> Self {
        GateResult {
            decision_status: decision.status.external(),
            legacy_status: decision.status.legacy(),
            code: decision.rejection.as_ref().map(|r| r.error.code.clone()),
            blocking: decision.is_blocking(),
        }
    }
}

/// The outcome of running a candidate through the FUJI safety gate.
#[derive(Debug, Clone, Serialize)]
pub struct FujiDecision {
    pub status: FujiStatus,
    /// The gate's standardized payload for a non-`Allow` status. Carries
    /// guidance for both `NeedsHumanReview` (hold) and `Deny` outcomes,
    /// but only a `Deny` status exposes it to callers as a
    /// `rejection_reason` — see [`Self::rejection_reason`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection: Option<FujiRejection>,
    /// Which stage produced the terminal verdict: `"A"`, `"B"`, or `"C"`.
    pub stage: &'static str,
}

impl FujiDecision {
    pub fn pass(stage: &'static str) -> Self {
        FujiDecision {
            status: FujiStatus::Allow,
            rejection: None,
            stage,
        }
    }

    pub fn allow_with_warning(stage: &'static str, warning: FujiRejection) -> Self {
        FujiDecision {
            status: FujiStatus::AllowWithWarning,
            rejection: Some(warning),
            stage,
        }
    }

    pub fn rejected(stage: &'static str, rejection: FujiRejection) -> Self {
        FujiDecision {
            status: FujiStatus::Deny,
            rejection: Some(rejection),
            stage,
        }
    }

    pub fn needs_review(stage: &'static str, rejection: FujiRejection) -> Self {
        FujiDecision {
            status: FujiStatus::NeedsHumanReview,
            rejection: Some(rejection),
            stage,
        }
    }

    pub fn is_blocking(&self) -> bool {
        self.rejection.as_ref().is_some_and(|r| r.error.blocking)
    }

    /// `rejection_reason` as defined by the external contract: non-null
    /// if and only if the status is `Deny`. `NeedsHumanReview` carries
    /// the same kind of payload internally but it surfaces as hold
    /// guidance, not a denial reason.
    pub fn rejection_reason(&self) -> Option<&str> {
        if self.status == FujiStatus::Deny {
            self.rejection.as_ref().map(|r| r.error.message.as_str())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fuji_codes::build_rejection;

    #[test]
    fn needs_human_review_collapses_to_modify_in_legacy_vocabulary() {
        assert_eq!(FujiStatus::NeedsHumanReview.legacy(), DecisionStatus::Modify);
        assert_eq!(FujiStatus::Allow.legacy(), DecisionStatus::Allow);
        assert_eq!(FujiStatus::AllowWithWarning.legacy(), DecisionStatus::Allow);
        assert_eq!(FujiStatus::Deny.legacy(), DecisionStatus::Rejected);
    }

    #[test]
    fn external_mapping_is_bit_exact() {
        assert_eq!(FujiStatus::Allow.external(), DecisionStatusExternal::Allow);
        assert_eq!(FujiStatus::AllowWithWarning.external(), DecisionStatusExternal::Allow);
        assert_eq!(FujiStatus::NeedsHumanReview.external(), DecisionStatusExternal::Hold);
        assert_eq!(FujiStatus::Deny.external(), DecisionStatusExternal::Deny);
    }

    #[test]
    fn pass_decision_has_no_rejection_payload() {
        let decision = FujiDecision::pass("A");
        assert!(decision.rejection.is_none());
        assert!(!decision.is_blocking());
        assert!(decision.rejection_reason().is_none());
    }

    #[test]
    fn rejected_decision_carries_blocking_flag_from_registry() {
        let rejection = build_rejection("F-4001", "tl-1", None, None);
        let decision = FujiDecision::rejected("C", rejection);
        assert!(decision.is_blocking());
        assert!(decision.rejection_reason().is_some());
    }

    #[test]
    fn needs_review_never_surfaces_a_rejection_reason() {
        let rejection = build_rejection("F-2203", "tl-2", None, None);
        let decision = FujiDecision::needs_review("B", rejection);
        assert_eq!(decision.status.external(), DecisionStatusExternal::Hold);
        assert!(decision.rejection_reason().is_none());
    }

    #[test]
    fn deny_iff_rejection_reason_present() {
        for status in [FujiStatus::Allow, FujiStatus::AllowWithWarning, FujiStatus::NeedsHumanReview, FujiStatus::Deny] {
            let has_reason = status == FujiStatus::Deny;
            assert_eq!(status.external() == DecisionStatusExternal::Deny, has_reason);
        }
    }
}
