//! Local, LLM-free evidence heuristics.
//!
//! These never call out to anything; they exist so a request always has at
//! least one piece of evidence to reason from, even with no memory hits and
//! no web search configured.

use async_trait::async_trait;
use std::collections::HashMap;

use serde_json::Value;
use veritas_contracts::error::VeritasResult;
use veritas_contracts::evidence::Evidence;
use veritas_core::traits::EvidenceSource;

use crate::normalize::from_local_heuristic;

/// Caps the number of heuristic items returned per query so a query that
/// matches every rule doesn't drown out the evidence that matters.
const MAX_ITEMS: usize = 4;

/// Local deterministic evidence: fatigue/health cues, high-stakes caution,
/// constraint restatement, weather context, and a generic fallback.
pub struct LocalHeuristics;

impl LocalHeuristics {
    pub fn collect(query: &str, context: &HashMap<String, Value>) -> Vec<Evidence> {
        let mut out = Vec::new();
        let q = query.to_lowercase();

        let goals = context
            .get("goals")
            .and_then(Value::as_array)
            .map(|a| a.iter().filter_map(Value::as_str).collect::<Vec<_>>())
            .unwrap_or_default();

        let mentions_fatigue = q.contains("tired") || q.contains("exhausted") || q.contains("fatigue");
        let health_goal = goals.iter().any(|g| *g == "health" || *g == "recovery");
        if mentions_fatigue || health_goal {
            out.push(from_local_heuristic(
                "local",
                "fatigue",
                0.6,
                "When fatigued, prioritizing recovery tends to produce fewer regrets; noting recent tiredness, health, and sleep patterns helps later self-review.",
                vec!["selfcare".into(), "health".into()],
            ));
        }

        let stakes = context.get("stakes").and_then(Value::as_f64);
        if let Some(stakes) = stakes {
            if stakes >= 0.7 {
                out.push(from_local_heuristic(
                    "local",
                    "stakes",
                    stakes,
                    format!("High stakes (stakes={stakes:.2}) favor erring toward caution, which tends to produce fewer regrets."),
                    vec!["stakes".into(), "caution".into()],
                ));
            }
        }

        if let Some(constraints) = context.get("constraints").and_then(Value::as_array) {
            if !constraints.is_empty() {
                let joined = constraints
                    .iter()
                    .map(|c| c.as_str().map(str::to_string).unwrap_or_else(|| c.to_string()))
                    .collect::<Vec<_>>()
                    .join(" / ");
                out.push(from_local_heuristic(
                    "local",
                    "constraints",
                    0.5,
                    format!("Constraints: {joined} should frame the plan."),
                    vec!["constraints".into()],
                ));
            }
        }

        if context.get("intent").and_then(Value::as_str) == Some("weather") {
            out.push(from_local_heuristic(
                "local",
                "weather",
                0.5,
                "Weather has outsized influence, so outdoor activity, travel, and physical condition should be planned around it.",
                vec!["weather".into(), "context".into()],
            ));
        }

        if out.is_empty() {
            out.push(from_local_heuristic(
                "local",
                "fallback",
                0.2,
                "No goals, stakes, or constraints were given; clarifying the desired outcome, acceptable risk, and constraints like time or budget would improve the decision.",
                vec!["meta".into(), "fallback".into()],
            ));
        }

        out.truncate(MAX_ITEMS);
        out
    }

    /// Guarantees at least two evidence items for a "step1 inventory" style
    /// query: a feature inventory and a list of known issues.
    pub fn step1_minimum_evidence(context: &HashMap<String, Value>) -> Vec<Evidence> {
        let features = [
            "API: decision gateway HTTP surface",
            "Decision pipeline: Planner -> (optional web search) -> Debate -> FUJI Gate -> Trust Log",
            "Evidence: local heuristics + memory recall + web search normalization",
            "Logging: Trust Log hash-chain with rotation and signature verification",
        ];
        let inventory_snippet = format!("Current capabilities (inventory):\n- {}", features.join("\n- "));

        let mut known = vec![
            "Web search degrades to empty results when no provider is configured; the pipeline still satisfies its evidence contract.".to_string(),
            "Local port conflicts can occur when running the gateway alongside another instance.".to_string(),
        ];
        if let Some(summary) = context.get("test_summary").and_then(Value::as_str) {
            known.insert(0, format!("Test status: {summary}"));
        }
        let issues_snippet = format!("Known issues/notes:\n- {}", known.join("\n- "));

        vec![
            from_local_heuristic("local", "inventory", 0.65, inventory_snippet, vec!["inventory".into(), "system".into()]),
            from_local_heuristic("local", "known_issues", 0.60, issues_snippet, vec!["issues".into(), "quality".into()]),
        ]
    }
}

/// Recognizes the "step1 inventory" query shape that guarantees an
/// `inventory` and a `known_issues` evidence item regardless of what the
/// deterministic rules above would otherwise produce.
fn is_step1_inventory_query(query: &str) -> bool {
    let q = query.to_lowercase();
    (q.contains("step 1") || q.contains("step1")) && q.contains("inventory")
}

#[async_trait]
impl EvidenceSource for LocalHeuristics {
    fn name(&self) -> &str {
        "local-heuristics"
    }

    async fn collect(&self, request: &veritas_contracts::request::DecisionRequest) -> VeritasResult<Vec<Evidence>> {
        if is_step1_inventory_query(&request.query) {
            return Ok(Self::step1_minimum_evidence(&request.context));
        }
        Ok(Self::collect(&request.query, &request.context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_context_yields_fallback_item() {
        let ctx = HashMap::new();
        let ev = LocalHeuristics::collect("anything", &ctx);
        assert_eq!(ev.len(), 1);
        assert_eq!(ev[0].kind, "fallback");
    }

    #[test]
    fn high_stakes_adds_caution_item() {
        let mut ctx = HashMap::new();
        ctx.insert("stakes".to_string(), Value::from(0.9));
        let ev = LocalHeuristics::collect("should I quit my job", &ctx);
        assert!(ev.iter().any(|e| e.kind == "stakes"));
    }

    #[test]
    fn step1_minimum_evidence_returns_two_items() {
        let ctx = HashMap::new();
        let ev = LocalHeuristics::step1_minimum_evidence(&ctx);
        assert_eq!(ev.len(), 2);
        assert!(ev.iter().any(|e| e.kind == "inventory"));
        assert!(ev.iter().any(|e| e.kind == "known_issues"));
    }

    #[test]
    fn output_is_capped_at_four_items() {
        let mut ctx = HashMap::new();
        ctx.insert("stakes".to_string(), Value::from(0.9));
        ctx.insert("constraints".to_string(), Value::from(vec!["budget", "time"]));
        ctx.insert("intent".to_string(), Value::from("weather"));
        let ev = LocalHeuristics::collect("tired and planning a trip", &ctx);
        assert!(ev.len() <= MAX_ITEMS);
    }
}
