//! Value scoring: weight normalization, the `ValueCore` multiplicative
//! factor, and intent-based filtering.
//!
//! Weights are clipped into `[0,1]` and rescaled so the largest weight is
//! exactly 1, rather than rejected outright when a caller supplies
//! something out of range.

use std::collections::HashMap;

/// `safety: 0.6, utility: 0.4` unless the caller overrides the vector.
pub fn default_weights() -> HashMap<String, f64> {
    HashMap::from([("safety".to_string(), 0.6), ("utility".to_string(), 0.4)])
}

/// Clip every weight into `[0,1]`; if the resulting max exceeds 1, rescale
/// the whole vector so the max is exactly 1. An empty map returns the
/// defaults.
pub fn normalize_weights(weights: &HashMap<String, f64>) -> HashMap<String, f64> {
    if weights.is_empty() {
        return default_weights();
    }
    let mut clipped: HashMap<String, f64> = weights.iter().map(|(k, v)| (k.clone(), v.clamp(0.0, 1.0))).collect();
    let max = clipped.values().cloned().fold(0.0_f64, f64::max);
    if max > 1.0 + 1e-9 {
        for v in clipped.values_mut() {
            *v /= max;
        }
    }
    clipped
}

/// A detected high-level intent, used to filter out alternatives whose
/// title doesn't match what the query was actually about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Weather,
    Health,
    Learn,
    Plan,
}

impl Intent {
    pub fn keyword(self) -> &'static str {
        match self {
            Intent::Weather => "weather",
            Intent::Health => "health",
            Intent::Learn => "learn",
            Intent::Plan => "plan",
        }
    }
}

/// Detect an intent from the query text, if any of the known keywords
/// appear. Returns `None` for queries with no recognizable intent, in
/// which case no filtering is applied.
pub fn detect_intent(query: &str) -> Option<Intent> {
    let q = query.to_lowercase();
    for intent in [Intent::Weather, Intent::Health, Intent::Learn, Intent::Plan] {
        if q.contains(intent.keyword()) {
            return Some(intent);
        }
    }
    None
}

/// Drop titles that don't mention the detected intent's keyword, when an
/// intent was actually detected. With no intent, every title passes.
pub fn intent_filter<'a>(intent: Option<Intent>, titles: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    match intent {
        None => titles.collect(),
        Some(intent) => titles.filter(|t| t.to_lowercase().contains(intent.keyword())).collect(),
    }
}

/// `ValueCore.compute_value_score`: a small multiplicative adjustment
/// layered on top of the raw weighted score, rewarding lower risk and
/// shorter time horizons without letting either dominate the weighted
/// base score.
pub fn compute_value_factor(risk: f64, eta_hours: f64) -> f64 {
    let risk_term = 1.0 - 0.3 * risk.clamp(0.0, 1.0);
    let time_term = 1.0 - 0.1 * (eta_hours / 24.0).clamp(0.0, 1.0);
    (risk_term * time_term).clamp(0.5, 1.0)
}

/// Weighted base score over named factors (e.g. `{"safety": 0.9, "utility": 0.7}`).
pub fn weighted_score(weights: &HashMap<String, f64>, factors: &HashMap<String, f64>) -> f64 {
    let normalized = normalize_weights(weights);
    let total_weight: f64 = normalized.values().sum();
    if total_weight <= 0.0 {
        return 0.0;
    }
    let weighted_sum: f64 = normalized
        .iter()
        .map(|(k, w)| w * factors.get(k).copied().unwrap_or(0.0))
        .sum();
    (weighted_sum / total_weight).clamp(0.0, 1.0)
}
