//! Inbound decision request types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{evidence::Evidence, option::Alternative};

/// An immutable decision request accepted by the gateway.
///
/// `fast_mode` suppresses optional I/O in the evidence collector (web
/// search) and shortens debate depth — it never changes which stages run,
/// only how much optional work each stage does.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecisionRequest {
    /// The natural-language decision question.
    pub query: String,

    /// Arbitrary caller-supplied context (goals, stakes, constraints, ...).
    #[serde(default)]
    pub context: HashMap<String, Value>,

    /// Caller-proposed alternatives, if any. The planner augments this set
    /// rather than replacing it.
    #[serde(default)]
    pub options: Option<Vec<Alternative>>,

    /// Caller-pre-aggregated evidence. When present, the memory search in
    /// the evidence collector is skipped.
    #[serde(default)]
    pub evidence: Option<Vec<Evidence>>,

    /// Identifies the calling user/service for rate limiting and audit.
    #[serde(default)]
    pub user_id: Option<String>,

    /// Suppresses optional I/O (web search, deep debate) when true.
    #[serde(default)]
    pub fast_mode: bool,
}

impl DecisionRequest {
    /// Return `context["_pipeline_evidence"]` was set, signaling the
    /// evidence collector to skip its own memory search.
    pub fn has_pre_aggregated_evidence(&self) -> bool {
        self.context.contains_key("_pipeline_evidence")
    }

    /// Return the caller-declared `stakes` value in `[0,1]`, if present and
    /// numeric.
    pub fn stakes(&self) -> Option<f64> {
        self.context.get("stakes").and_then(Value::as_f64)
    }

    /// Return whether `context.self_healing_enabled` was explicitly set to
    /// `false`.
    pub fn self_healing_disabled(&self) -> bool {
        matches!(
            self.context.get("self_healing_enabled"),
            Some(Value::Bool(false))
        )
    }

    /// `true` when the caller declares the text was already run through a
    /// PII sanitizer before submission.
    pub fn safe_applied(&self) -> bool {
        matches!(self.context.get("safe_applied"), Some(Value::Bool(true)))
    }

    /// Caller-supplied override for the minimum evidence count FUJI Stage
    /// C requires, if present and a non-negative integer.
    pub fn min_evidence(&self) -> Option<usize> {
        self.context
            .get("min_evidence")
            .and_then(Value::as_u64)
            .map(|n| n as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_minimal_request() {
        let json = r#"{"query": "what time is it"}"#;
        let req: DecisionRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.query, "what time is it");
        assert!(!req.fast_mode);
        assert!(req.options.is_none());
    }

    #[test]
    fn detects_pre_aggregated_evidence() {
        let mut req = DecisionRequest {
            query: "x".into(),
            context: HashMap::new(),
            options: None,
            evidence: None,
            user_id: None,
            fast_mode: false,
        };
        assert!(!req.has_pre_aggregated_evidence());
        req.context
            .insert("_pipeline_evidence".to_string(), serde_json::json!([]));
        assert!(req.has_pre_aggregated_evidence());
    }

    #[test]
    fn safe_applied_requires_explicit_true() {
        let mut req = DecisionRequest::default();
        assert!(!req.safe_applied());
        req.context.insert("safe_applied".to_string(), serde_json::json!(false));
        assert!(!req.safe_applied());
        req.context.insert("safe_applied".to_string(), serde_json::json!(true));
        assert!(req.safe_applied());
    }

    #[test]
    fn min_evidence_reads_a_non_negative_integer() {
        let mut req = DecisionRequest::default();
        assert_eq!(req.min_evidence(), None);
        req.context.insert("min_evidence".to_string(), serde_json::json!(3));
        assert_eq!(req.min_evidence(), Some(3));
    }
}
