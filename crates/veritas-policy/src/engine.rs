//! FUJI Stage C: the final policy decision, combining Stage A/B's risk
//! screen with evidence-sufficiency and value-ordering checks.
//!
//! Every Stage B invocation — pass, hold, or deny — emits a `fuji_evaluate`
//! Trust Log event carrying `{risk_score, categories, policy_version,
//! latency_ms, text_preview}` so operators can audit near-miss and
//! blocked paths, not only the ones that reach a terminal decision.

use std::time::Instant;

use async_trait::async_trait;
use serde_json::json;
use uuid::Uuid;

use veritas_contracts::error::VeritasResult;
use veritas_contracts::evidence::Evidence;
use veritas_contracts::fuji::{FujiDecision, PolicyContext};
use veritas_contracts::fuji_codes::build_rejection;
use veritas_contracts::option::Alternative;
use veritas_contracts::safety::SafetyAnalysis;
use veritas_contracts::trust_log::{TrustLogEntry, GENESIS_HASH};
use veritas_core::traits::{NullSafetyHead, NullTrustLog, SafetyGate, SafetyHead, TrustLogWriter};

use crate::rules::{screen_detailed, StageAConfig, StageAVerdict};
use crate::safety_head::{combine, StageBVerdict};

/// Minimum evidence count below which a candidate is rejected for
/// insufficient evidence (`F-1002`), unless the candidate is a direct
/// caller-supplied option with no generated claims to back, or
/// `PolicyContext::min_evidence` overrides it.
pub const MIN_EVIDENCE_COUNT: usize = 1;

/// Risk score at or above which a bare `illicit` category (one that
/// didn't already trip Stage A/B's own blocking path) denies outright.
pub const ILLICIT_DENY_THRESHOLD: f64 = 0.6;

/// Risk score at or above which a low-evidence candidate is denied
/// outright rather than held for human review. Set below
/// `ILLICIT_DENY_THRESHOLD` since an `illicit` finding at or above that
/// threshold is already denied earlier in Stage C — this branch only ever
/// sees a `Clean`-gated Stage B analysis, whose risk is otherwise capped
/// below Stage B's own review band.
pub const LOW_EVIDENCE_DENY_RISK_THRESHOLD: f64 = 0.5;

/// Risk ceiling enforced when `fallback_pii_hits` is `{name_like}` alone —
/// a weak, easily-false-positive signal that should never drive the
/// decision on its own.
pub const FALLBACK_PII_RISK_CAP: f64 = 0.20;

/// Risk ceiling enforced when the caller declares the text was already
/// sanitized (`PolicyContext::safe_applied`).
pub const SAFE_APPLIED_RISK_CAP: f64 = 0.40;

const POLICY_VERSION: &str = "fuji-stage-c-v2";
const TEXT_PREVIEW_LEN: usize = 160;

/// The FUJI safety gate: Stage A (deterministic screen) → Stage B (risk
/// score combination) → Stage C (policy decision).
pub struct FujiGate {
    stage_a: StageAConfig,
    safety_head: Box<dyn SafetyHead>,
    banned_title_keywords: Vec<String>,
    trust_log: std::sync::Arc<dyn TrustLogWriter>,
}

impl FujiGate {
    pub fn new(
        stage_a: StageAConfig,
        safety_head: Box<dyn SafetyHead>,
        trust_log: std::sync::Arc<dyn TrustLogWriter>,
    ) -> Self {
        let banned_title_keywords = stage_a.banned_title_keywords.clone();
        FujiGate {
            stage_a,
            safety_head,
            banned_title_keywords,
            trust_log,
        }
    }

    /// Build a gate with no model-backed safety head and no durable Trust
    /// Log — Stage B degrades to Stage A's regex screen alone and
    /// `fuji_evaluate` events are discarded. Only suitable for unit tests;
    /// a real deployment always wires a real `TrustLogWriter` through
    /// [`Self::new`].
    pub fn with_default_safety_head(stage_a: StageAConfig) -> Self {
        Self::new(stage_a, Box::new(NullSafetyHead), std::sync::Arc::new(NullTrustLog))
    }

    async fn log_fuji_evaluate(&self, request_id: &str, analysis: &SafetyAnalysis, latency_ms: u64, text: &str) {
        let text_preview: String = crate::sanitize::mask(text).chars().take(TEXT_PREVIEW_LEN).collect();
        let payload = json!({
            "risk_score": analysis.risk_score,
            "categories": analysis.categories,
            "policy_version": POLICY_VERSION,
            "latency_ms": latency_ms,
            "text_preview": text_preview,
        });
        let entry = TrustLogEntry::new(
            0,
            Uuid::now_v7().to_string(),
            "fuji_evaluate",
            request_id,
            None,
            payload,
            GENESIS_HASH.to_string(),
        );
        if let Err(err) = self.trust_log.append(entry).await {
            tracing::warn!(error = %err, "failed to log fuji_evaluate event");
        }
    }
}

#[async_trait]
impl SafetyGate for FujiGate {
    async fn evaluate(
        &self,
        request_id: &str,
        text: &str,
        candidate: &Alternative,
        evidence: &[Evidence],
        policy_context: &PolicyContext,
    ) -> VeritasResult<FujiDecision> {
        if let Err(err) = Alternative::check_title_integrity(&candidate.title, &self.banned_title_keywords) {
            let rejection = build_rejection("F-4003", String::new(), Some(err.to_string()), None);
            return Ok(FujiDecision::rejected("A", rejection));
        }

        let (stage_a, pii_categories) = screen_detailed(&self.stage_a, text);
        let started = Instant::now();
        let stage_b = combine(self.safety_head.as_ref(), stage_a, &self.stage_a.hard_block_keywords, text).await?;
        let latency_ms = started.elapsed().as_millis() as u64;

        self.log_fuji_evaluate(request_id, stage_b.analysis(), latency_ms, text).await;

        match &stage_b {
            StageBVerdict::Blocking(StageAVerdict::PromptInjection, _) => {
                let rejection = build_rejection("F-4001", String::new(), None, None);
                return Ok(FujiDecision::rejected("B", rejection));
            }
            StageBVerdict::Blocking(StageAVerdict::SensitiveInfo, _) => {
                let rejection = build_rejection("F-4003", String::new(), None, None);
                return Ok(FujiDecision::rejected("B", rejection));
            }
            StageBVerdict::Blocking(StageAVerdict::Clean, _) => unreachable!("Clean never blocks"),
            StageBVerdict::ReviewBand(analysis) => {
                let rejection = build_rejection(
                    "F-2203",
                    String::new(),
                    Some(format!("stage-B risk score {:.2} fell in the review band", analysis.risk_score)),
                    None,
                );
                return Ok(FujiDecision::needs_review("B", rejection));
            }
            StageBVerdict::Clean(_) => {}
        }

        let analysis = stage_b.analysis();
        let mut risk = analysis.risk_score;

        // `fallback_pii_hits = {name_like}` alone is a weak signal — clamp
        // it down rather than let it drive a deny/hold decision.
        let fallback_pii_only = !pii_categories.is_empty() && pii_categories.iter().all(|c| *c == "name_like");
        if fallback_pii_only {
            risk = risk.min(FALLBACK_PII_RISK_CAP);
        }

        // The caller already sanitized the text — soften the residual PII
        // risk instead of treating it as a fresh violation.
        if policy_context.safe_applied {
            risk = risk.min(SAFE_APPLIED_RISK_CAP);
        }

        if analysis.has_category("illicit") && risk >= ILLICIT_DENY_THRESHOLD {
            // F-2101 is the only registry code whose feedback action is
            // RE-DEBATE, which fits a bare illicit-category finding (no
            // prompt-injection or PII trigger already claimed this path)
            // better than forcing a human-review-only F-4xxx code.
            let rejection = build_rejection(
                "F-2101",
                String::new(),
                Some(format!("illicit category detected with combined risk {risk:.2}")),
                None,
            );
            return Ok(FujiDecision::rejected("C", rejection));
        }

        let min_evidence = policy_context.min_evidence.unwrap_or(MIN_EVIDENCE_COUNT);
        if evidence.len() < min_evidence && !candidate.blocked {
            let detail = format!(
                "low_evidence: {} evidence item(s) below the required minimum of {min_evidence}",
                evidence.len()
            );
            if risk >= LOW_EVIDENCE_DENY_RISK_THRESHOLD {
                let rejection = build_rejection("F-1002", String::new(), Some(detail), None);
                return Ok(FujiDecision::rejected("C", rejection));
            }
            let rejection = build_rejection("F-1002", String::new(), Some(detail), None);
            return Ok(FujiDecision::needs_review("C", rejection));
        }

        Ok(FujiDecision::pass("C"))
    }
}
