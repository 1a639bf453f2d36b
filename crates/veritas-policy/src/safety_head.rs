//! FUJI Stage B: combine the deterministic Stage A screen with a model (or
//! heuristic) risk score under a floor rule.
//!
//! Floor rule: Stage A's verdict is never overridden by a low Stage B
//! score — Stage A is a hard pattern match, Stage B only ever raises risk,
//! it cannot lower a Stage A flag back to clean. The bias is always
//! toward stopping or requesting more evidence, never toward silently
//! allowing.
//!
//! The combined risk score itself is deterministic even though one input
//! (the model-backed `SafetyHead`) is not: `final_risk = max(llm,
//! heuristic)`, nudged up another `+0.05` when the heuristic alone is the
//! higher of the two (the local pattern match is trusted more than an
//! absent or under-confident model score), and floored at `0.7` whenever
//! the heuristic alone flags `illicit` — a model that misses an
//! illicit-content hit a keyword list already caught does not get to
//! silently clear it.

use veritas_contracts::safety::SafetyAnalysis;
use veritas_core::traits::SafetyHead;

use crate::rules::StageAVerdict;
use crate::sanitize;

/// Risk score threshold above which Stage B alone escalates to a rejection
/// even when Stage A found nothing.
pub const HIGH_RISK_THRESHOLD: f64 = 0.75;
/// Risk score threshold above which Stage B escalates to human review.
pub const REVIEW_THRESHOLD: f64 = 0.45;
/// Risk floor applied when the heuristic alone (not the model) flags
/// `illicit` content.
pub const ILLICIT_RISK_FLOOR: f64 = 0.7;
/// How much higher the heuristic score is trusted over the model's, when
/// the heuristic is the larger of the two.
pub const HEURISTIC_LEAD_BONUS: f64 = 0.05;

/// The combined Stage A + Stage B outcome, always carrying the
/// [`SafetyAnalysis`] that produced it so Stage C and the `fuji_evaluate`
/// Trust Log event have the full `{risk_score, categories}` to work with,
/// even on a path Stage A itself decided.
#[derive(Debug, Clone)]
pub enum StageBVerdict {
    Clean(SafetyAnalysis),
    /// Risk score landed in the review band; not blocking on its own.
    ReviewBand(SafetyAnalysis),
    /// Stage A's verdict, or a high Stage B score, escalated to blocking.
    Blocking(StageAVerdict, SafetyAnalysis),
}

impl StageBVerdict {
    pub fn analysis(&self) -> &SafetyAnalysis {
        match self {
            StageBVerdict::Clean(a) | StageBVerdict::ReviewBand(a) | StageBVerdict::Blocking(_, a) => a,
        }
    }
}

/// Keyword-and-regex-driven fallback analysis. Always computed alongside
/// any model result — not just when the model is unavailable — so Stage B
/// can apply the illicit/PII floors regardless of what the model says.
pub fn heuristic_analysis(text: &str, hard_block_keywords: &[String]) -> SafetyAnalysis {
    let lower = text.to_lowercase();
    let mut categories: Vec<String> = Vec::new();
    let mut risk: f64 = 0.0;

    if hard_block_keywords.iter().any(|kw| lower.contains(&kw.to_lowercase())) {
        categories.push("illicit".to_string());
        risk = risk.max(0.8);
    }

    for category in sanitize::detect_categories(text) {
        categories.push(category.to_string());
        risk = risk.max(if category == "name_like" { 0.2 } else { 0.5 });
    }

    let rationale = if categories.is_empty() {
        "no heuristic signal".to_string()
    } else {
        format!("heuristic match: {}", categories.join(", "))
    };

    SafetyAnalysis {
        risk_score: risk,
        categories,
        rationale,
        model: "heuristic_fallback".to_string(),
    }
}

/// Combine a model-backed analysis with the local heuristic analysis
/// under the floor rule described in the module doc comment.
pub fn combine_scores(llm: &SafetyAnalysis, heuristic: &SafetyAnalysis) -> SafetyAnalysis {
    let mut risk = llm.risk_score.max(heuristic.risk_score);
    if heuristic.risk_score > llm.risk_score {
        risk = (heuristic.risk_score + HEURISTIC_LEAD_BONUS).min(1.0);
    }
    if heuristic.has_category("illicit") && !llm.has_category("illicit") {
        risk = risk.max(ILLICIT_RISK_FLOOR);
    }

    let mut categories = llm.categories.clone();
    for category in &heuristic.categories {
        if !categories.contains(category) {
            categories.push(category.clone());
        }
    }

    SafetyAnalysis {
        risk_score: risk,
        categories,
        rationale: format!("llm: {} | heuristic: {}", llm.rationale, heuristic.rationale),
        model: llm.model.clone(),
    }
}

/// Combine `stage_a` with a freshly computed Stage B risk score. On a
/// `SafetyHead::analyze` error, the model's contribution degrades to the
/// same heuristic analysis rather than failing the request.
pub async fn combine(
    safety_head: &dyn SafetyHead,
    stage_a: StageAVerdict,
    hard_block_keywords: &[String],
    text: &str,
) -> veritas_contracts::error::VeritasResult<StageBVerdict> {
    let heuristic = heuristic_analysis(text, hard_block_keywords);
    let llm = match safety_head.analyze(text).await {
        Ok(analysis) => analysis,
        Err(_) => heuristic.clone(),
    };
    let analysis = combine_scores(&llm, &heuristic);

    if stage_a != StageAVerdict::Clean {
        return Ok(StageBVerdict::Blocking(stage_a, analysis));
    }
    // An `illicit` finding owns its own Stage C threshold (see
    // `engine::ILLICIT_DENY_THRESHOLD`) rather than Stage B's generic
    // escalation, so the gate can pick the illicit-specific code instead
    // of the generic prompt-injection one.
    if analysis.has_category("illicit") {
        return Ok(StageBVerdict::Clean(analysis));
    }
    if analysis.risk_score >= HIGH_RISK_THRESHOLD {
        return Ok(StageBVerdict::Blocking(StageAVerdict::PromptInjection, analysis));
    }
    if analysis.risk_score >= REVIEW_THRESHOLD {
        return Ok(StageBVerdict::ReviewBand(analysis));
    }
    Ok(StageBVerdict::Clean(analysis))
}
