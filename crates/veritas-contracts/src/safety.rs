//! The shape a `SafetyHead` capability returns to FUJI Stage B.

use serde::{Deserialize, Serialize};

/// One risk assessment of a text surface: a score plus the categories and
/// rationale that produced it. Both the LLM-backed and heuristic-fallback
/// safety heads return this same shape so Stage B can combine them without
/// caring which one ran.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyAnalysis {
    pub risk_score: f64,
    pub categories: Vec<String>,
    pub rationale: String,
    pub model: String,
}

impl SafetyAnalysis {
    pub fn has_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }
}
