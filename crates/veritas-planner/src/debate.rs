//! The debate stage: four roles critique each candidate step and produce
//! a scored, verdict-banded [`Alternative`].
//!
//! Architect scores feasibility, Critic scores weaknesses (inverted into
//! a score), Safety scores risk (inverted), and Judge averages the three
//! into the factors `scoring::weighted_score` consumes. Options flagged
//! `blocked` or containing a banned keyword are skipped outright; if
//! every option ends up skipped, a degraded fallback option is created
//! explicitly so the caller always has something to act on.

use std::collections::HashMap;

use veritas_contracts::option::{Alternative, Verdict};

use crate::plan::PlanStep;
use crate::scoring::{compute_value_factor, weighted_score};

/// Per-role critique output for one candidate step.
#[derive(Debug, Clone, Copy)]
struct RoleScores {
    architect: f64,
    critic: f64,
    safety: f64,
}

/// Architect rewards low risk and short horizons (feasibility). Critic
/// penalizes steps with no listed dependencies reasoning (treated as a
/// thinness signal) by scoring lower when `why` is empty. Safety scores
/// the inverse of `risk` directly.
fn critique(step: &PlanStep) -> RoleScores {
    let architect = (1.0 - 0.4 * step.risk.clamp(0.0, 1.0)) * if step.eta_hours > 0.0 { 1.0 } else { 0.9 };
    let critic: f64 = if step.why.trim().is_empty() { 0.5 } else { 0.85 };
    let safety = 1.0 - step.risk.clamp(0.0, 1.0);
    RoleScores {
        architect: architect.clamp(0.0, 1.0),
        critic: critic.clamp(0.0, 1.0),
        safety: safety.clamp(0.0, 1.0),
    }
}

/// Judge averages the three role scores into the named factors the
/// weighted scorer expects.
fn judge(roles: RoleScores) -> HashMap<String, f64> {
    let utility = (roles.architect + roles.critic) / 2.0;
    HashMap::from([("safety".to_string(), roles.safety), ("utility".to_string(), utility)])
}

fn contains_banned_keyword(text: &str, banned_keywords: &[String]) -> Option<String> {
    let lower = text.to_lowercase();
    banned_keywords.iter().find(|k| lower.contains(&k.to_lowercase())).cloned()
}

/// Run the four-role debate over every step, producing scored
/// alternatives. `weights` is the caller's (normalized) safety/utility
/// weight vector.
pub fn debate_steps(steps: &[PlanStep], weights: &HashMap<String, f64>, banned_keywords: &[String]) -> Vec<Alternative> {
    let mut alternatives: Vec<Alternative> = steps
        .iter()
        .map(|step| {
            let blocked = contains_banned_keyword(&step.title, banned_keywords).is_some()
                || contains_banned_keyword(&step.detail, banned_keywords).is_some();

            let roles = critique(step);
            let factors = judge(roles);
            let score_raw = weighted_score(weights, &factors);
            let value_factor = compute_value_factor(step.risk, step.eta_hours);
            let score = (score_raw * value_factor).clamp(0.0, 1.0);

            Alternative {
                id: step.id.clone(),
                title: step.title.clone(),
                description: step.detail.clone(),
                score,
                score_raw: Some(score_raw),
                verdict: Verdict::from_score(score),
                blocked,
            }
        })
        .collect();

    if alternatives.iter().all(|a| a.blocked || a.verdict == Verdict::Rejected) {
        alternatives.push(degraded_fallback());
    }

    alternatives
}

/// A minimal, always-safe alternative used when every real candidate was
/// blocked or rejected by scoring, so the caller never ends up with zero
/// viable options.
pub fn degraded_fallback() -> Alternative {
    Alternative {
        id: "degraded-fallback".to_string(),
        title: "Pause and request human guidance".to_string(),
        description: "No generated option passed the debate stage; defer to a human before proceeding.".to_string(),
        score: 0.4,
        score_raw: Some(0.4),
        verdict: Verdict::NeedsReview,
        blocked: false,
    }
}
