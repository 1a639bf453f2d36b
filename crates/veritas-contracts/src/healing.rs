//! Self-healing retry state shared between `veritas-core`'s healing loop
//! and the response `extras.self_healing` summary.
//!
//! The retry algorithm itself (budget enforcement, code-to-action mapping,
//! no-op detection) lives in `veritas-core`; this crate only defines the
//! data it operates on, so `veritas-contracts` stays free of orchestration
//! logic.

use serde::{Deserialize, Serialize};

/// Guardrails bounding a single self-healing retry loop.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HealingBudget {
    pub max_attempts: u32,
    pub max_steps: u32,
    pub max_seconds: f64,
    pub max_same_error: u32,
}

impl Default for HealingBudget {
    fn default() -> Self {
        HealingBudget {
            max_attempts: 3,
            max_steps: 6,
            max_seconds: 30.0,
            max_same_error: 2,
        }
    }
}

/// Mutable progress through a healing loop for a single request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealingState {
    pub attempts: u32,
    pub steps: u32,
    pub elapsed_seconds: f64,
    /// The most recently seen FUJI rejection code, used for
    /// same-error-streak tracking.
    pub last_code: Option<String>,
    pub same_error_streak: u32,
    /// SHA-256 of the canonical JSON of the last retried input, used to
    /// detect a no-op retry (the planner produced an identical candidate).
    pub last_input_signature: Option<String>,
}

impl HealingState {
    /// Record one retry attempt, updating the same-error streak based on
    /// whether `code` repeats the previous attempt's code.
    pub fn record_attempt(&mut self, code: &str, steps_taken: u32, seconds_taken: f64) {
        self.attempts += 1;
        self.steps += steps_taken;
        self.elapsed_seconds += seconds_taken;
        match &self.last_code {
            Some(prev) if prev == code => self.same_error_streak += 1,
            _ => self.same_error_streak = 1,
        }
        self.last_code = Some(code.to_string());
    }

    /// `true` once any guardrail in `budget` has been exhausted.
    pub fn budget_exhausted(&self, budget: &HealingBudget) -> bool {
        self.attempts >= budget.max_attempts
            || self.steps >= budget.max_steps
            || self.elapsed_seconds >= budget.max_seconds
            || self.same_error_streak >= budget.max_same_error
    }

    /// `true` when the newly proposed input signature matches the last
    /// retried one, meaning the retry produced no change worth re-running.
    pub fn is_no_op_retry(&self, new_signature: &str) -> bool {
        self.last_input_signature
            .as_deref()
            .is_some_and(|prev| prev == new_signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_error_streak_resets_on_code_change() {
        let mut state = HealingState::default();
        state.record_attempt("F-2101", 1, 1.0);
        state.record_attempt("F-2101", 1, 1.0);
        assert_eq!(state.same_error_streak, 2);
        state.record_attempt("F-3001", 1, 1.0);
        assert_eq!(state.same_error_streak, 1);
    }

    #[test]
    fn budget_exhausted_on_max_attempts() {
        let budget = HealingBudget::default();
        let mut state = HealingState::default();
        for _ in 0..budget.max_attempts {
            state.record_attempt("F-1002", 1, 0.1);
        }
        assert!(state.budget_exhausted(&budget));
    }

    #[test]
    fn no_op_retry_detected_on_matching_signature() {
        let mut state = HealingState::default();
        state.last_input_signature = Some("sig-a".into());
        assert!(state.is_no_op_retry("sig-a"));
        assert!(!state.is_no_op_retry("sig-b"));
    }
}
