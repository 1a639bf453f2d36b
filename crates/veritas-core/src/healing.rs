//! Self-healing retry policy (C8): decide whether and how to re-run a
//! rejected candidate using FUJI feedback, subject to budget guardrails.

use serde_json::Value;
use veritas_contracts::canonical::sha256_of_canonical;
use veritas_contracts::fuji_codes::FujiAction;
use veritas_contracts::healing::{HealingBudget, HealingState};

/// The policy's decision for one FUJI rejection code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealingDecision {
    pub action: FujiAction,
    pub allow: bool,
    pub reason: &'static str,
    pub stop_reason: Option<&'static str>,
}

/// `true` for the safety/security layer (`F-4xxx`), which is never
/// self-healed — those codes always require a human.
pub fn is_safety_code(code: &str) -> bool {
    code.starts_with("F-4")
}

/// Map a FUJI rejection code (plus its registry feedback action, as a
/// fallback for codes not explicitly listed below) to a healing decision.
///
/// Safety codes and two specific value/ethics codes (`F-3001`, `F-3008`)
/// always stop for human review regardless of their registry feedback
/// action.
pub fn decide_healing_action(code: &str, feedback_action: FujiAction) -> HealingDecision {
    if is_safety_code(code) {
        return HealingDecision {
            action: FujiAction::HumanReview,
            allow: false,
            reason: "safety_or_security_code_requires_human_review",
            stop_reason: Some("safety_code_blocked"),
        };
    }
    if code == "F-3008" {
        return HealingDecision {
            action: FujiAction::HumanReview,
            allow: false,
            reason: "ethical_boundary_requires_human_review",
            stop_reason: Some("ethical_boundary"),
        };
    }
    if code == "F-3001" {
        return HealingDecision {
            action: FujiAction::HumanReview,
            allow: false,
            reason: "value_core_mismatch_requires_human_review",
            stop_reason: Some("value_core_mismatch"),
        };
    }

    let action = match code {
        "F-1002" => FujiAction::RequestEvidence,
        "F-1005" => FujiAction::ReCritique,
        "F-2101" | "F-2203" => FujiAction::ReDebate,
        _ => feedback_action,
    };

    if action == FujiAction::HumanReview {
        return HealingDecision {
            action,
            allow: false,
            reason: "feedback_requires_human_review",
            stop_reason: Some("feedback_human_review"),
        };
    }

    HealingDecision {
        action,
        allow: true,
        reason: "policy_map_matched",
        stop_reason: None,
    }
}

/// One healing-loop retry input: what gets re-run, with full provenance of
/// the rejection that triggered it.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct HealingInput {
    pub original_task: String,
    pub last_output: Value,
    pub rejection: Value,
    pub attempt: u32,
    pub policy_decision: String,
}

/// Deterministic signature over a healing input, excluding `attempt` so a
/// genuinely no-op retry (same task, same output, same rejection) is
/// detected even though the attempt counter always increases.
pub fn healing_input_signature(input: &HealingInput) -> String {
    let without_attempt = serde_json::json!({
        "original_task": input.original_task,
        "last_output": input.last_output,
        "rejection": input.rejection,
        "policy_decision": input.policy_decision,
    });
    sha256_of_canonical(&without_attempt).unwrap_or_default()
}

/// Summarize what changed between two healing inputs, for the Trust Log
/// diff summary. Compares top-level fields rather than full deep diffs.
pub fn diff_summary(prev: Option<&HealingInput>, next: &HealingInput) -> String {
    let Some(prev) = prev else {
        return "initial_healing_input".to_string();
    };
    let mut changed = Vec::new();
    if prev.original_task != next.original_task {
        changed.push("original_task");
    }
    if prev.last_output != next.last_output {
        changed.push("last_output");
    }
    if prev.rejection != next.rejection {
        changed.push("rejection");
    }
    if prev.policy_decision != next.policy_decision {
        changed.push("policy_decision");
    }
    if changed.is_empty() {
        "no_meaningful_change".to_string()
    } else {
        format!("changed_fields:{}", changed.join(","))
    }
}

/// Evaluate every guardrail in `budget` against `state` plus the pending
/// attempt's `code`/`signature`, returning the first violated guardrail's
/// name, or `None` if the attempt may proceed.
pub fn check_guardrails(
    state: &HealingState,
    budget: &HealingBudget,
    code: &str,
    signature: &str,
) -> Option<&'static str> {
    if state.attempts + 1 > budget.max_attempts {
        return Some("max_attempts_exceeded");
    }
    if state.steps >= budget.max_steps {
        return Some("budget_steps_exceeded");
    }
    if state.elapsed_seconds >= budget.max_seconds {
        return Some("budget_time_exceeded");
    }

    let next_same_error = if !code.is_empty() && Some(code) == state.last_code.as_deref() {
        state.same_error_streak + 1
    } else {
        1
    };
    if next_same_error >= budget.max_same_error {
        return Some("same_error_consecutive_limit");
    }

    if state.is_no_op_retry(signature) {
        return Some("no_meaningful_change");
    }

    None
}
