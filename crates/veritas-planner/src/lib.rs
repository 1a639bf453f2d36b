//! # veritas-planner
//!
//! Candidate generation and scoring: [`plan`] turns an LLM completion
//! into structured steps (with a JSON-recovery ladder for imperfect
//! output), [`debate`] runs the four-role critique that scores and bands
//! each step into an [`Alternative`](veritas_contracts::option::Alternative),
//! [`scoring`] holds the weight normalization and value-factor math both
//! of those rely on, and [`integrity`] holds the title checks that run
//! ahead of scoring.
//!
//! [`DebatePlanner`] wires all four into the
//! [`Planner`](veritas_core::traits::Planner) trait the orchestrator
//! calls.

pub mod debate;
pub mod integrity;
pub mod plan;
pub mod scoring;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use veritas_contracts::error::VeritasResult;
use veritas_contracts::evidence::Evidence;
use veritas_contracts::fuji_codes::FujiRejection;
use veritas_contracts::option::{Alternative, Verdict};
use veritas_contracts::request::DecisionRequest;
use veritas_core::traits::{LlmClient, PlanOutcome, Planner};

use plan::{recover_plan, simple_qa_plan};
use scoring::{default_weights, detect_intent, intent_filter};

fn render_prompt(request: &DecisionRequest, evidence: &[Evidence]) -> String {
    let evidence_block = evidence
        .iter()
        .map(|e| format!("- [{}] {}: {}", e.source, e.title, e.snippet))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Query: {}\n\nEvidence:\n{}\n\nRespond with JSON: {{\"steps\": [{{\"id\": str, \"title\": str, \"detail\": str, \"why\": str, \"eta_hours\": number, \"risk\": number, \"dependencies\": [str]}}]}}",
        request.query, evidence_block
    )
}

/// Generates plans via an [`LlmClient`], recovers structured steps from
/// whatever the model returns, runs the four-role debate, and filters by
/// detected intent and banned keywords.
pub struct DebatePlanner {
    llm: Arc<dyn LlmClient>,
    weights: HashMap<String, f64>,
    banned_keywords: Vec<String>,
}

impl DebatePlanner {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        DebatePlanner { llm, weights: default_weights(), banned_keywords: Vec::new() }
    }

    pub fn with_weights(mut self, weights: HashMap<String, f64>) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_banned_keywords(mut self, banned_keywords: Vec<String>) -> Self {
        self.banned_keywords = banned_keywords;
        self
    }

    fn build_alternatives(&self, request: &DecisionRequest, plan: &plan::Plan) -> Vec<Alternative> {
        let mut alternatives = debate::debate_steps(&plan.steps, &self.weights, &self.banned_keywords);

        if let Some(intent) = detect_intent(&request.query) {
            let kept_titles: Vec<String> = intent_filter(Some(intent), alternatives.iter().map(|a| a.title.as_str()))
                .into_iter()
                .map(str::to_string)
                .collect();
            if !kept_titles.is_empty() {
                alternatives.retain(|a| kept_titles.contains(&a.title));
            }
        }

        if alternatives.is_empty() {
            alternatives.push(debate::degraded_fallback());
        }

        alternatives
    }
}

#[async_trait]
impl Planner for DebatePlanner {
    async fn plan(&self, request: &DecisionRequest, evidence: &[Evidence]) -> VeritasResult<PlanOutcome> {
        if let Some(plan) = simple_qa_plan(&request.query) {
            let alternatives = debate::debate_steps(&plan.steps, &self.weights, &self.banned_keywords);
            return Ok(PlanOutcome { alternatives, debate_rounds: 0 });
        }

        let prompt = render_prompt(request, evidence);
        let completion = self.llm.complete(&prompt).await?;
        let plan = recover_plan(&request.query, &completion);
        let alternatives = self.build_alternatives(request, &plan);

        Ok(PlanOutcome { alternatives, debate_rounds: 1 })
    }

    async fn revise(
        &self,
        request: &DecisionRequest,
        evidence: &[Evidence],
        rejection: &FujiRejection,
        previous: &Alternative,
    ) -> VeritasResult<Alternative> {
        let prompt = format!(
            "{}\n\nThe previous candidate \"{}\" was rejected: {} ({}). Revise it to address the feedback: {}",
            render_prompt(request, evidence),
            previous.title,
            rejection.error.message,
            rejection.error.code,
            rejection.feedback.hint,
        );
        let completion = self.llm.complete(&prompt).await?;
        let plan = recover_plan(&request.query, &completion);
        let step = plan.steps.into_iter().next();

        let revised_step = match step {
            Some(step) => step,
            None => plan::PlanStep {
                id: format!("{}-revised", previous.id),
                title: format!("{} (revised)", previous.title),
                detail: previous.description.clone(),
                why: "revised after a safety gate rejection".to_string(),
                eta_hours: 1.0,
                risk: 0.2,
                dependencies: Vec::new(),
            },
        };

        let mut alternatives = debate::debate_steps(std::slice::from_ref(&revised_step), &self.weights, &self.banned_keywords);
        Ok(alternatives
            .pop()
            .unwrap_or_else(|| Alternative {
                id: revised_step.id,
                title: revised_step.title,
                description: revised_step.detail,
                score: 0.4,
                score_raw: Some(0.4),
                verdict: Verdict::NeedsReview,
                blocked: false,
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedCompletion(String);

    #[async_trait]
    impl LlmClient for FixedCompletion {
        async fn complete(&self, _prompt: &str) -> VeritasResult<String> {
            Ok(self.0.clone())
        }
    }

    fn request(query: &str) -> DecisionRequest {
        DecisionRequest {
            query: query.to_string(),
            context: HashMap::new(),
            options: None,
            evidence: None,
            user_id: None,
            fast_mode: false,
        }
    }

    #[tokio::test]
    async fn simple_qa_query_skips_the_llm_entirely() {
        let llm = Arc::new(FixedCompletion("should never be read".to_string()));
        let planner = DebatePlanner::new(llm);
        let outcome = planner.plan(&request("what time is it"), &[]).await.unwrap();
        assert_eq!(outcome.debate_rounds, 0);
        assert_eq!(outcome.alternatives[0].id, "simple-qa");
    }

    #[tokio::test]
    async fn plan_recovers_steps_and_scores_them() {
        let raw = r#"{"steps": [{"id": "1", "title": "take a walk", "detail": "d", "why": "reduces stress", "eta_hours": 1, "risk": 0.1}]}"#;
        let llm = Arc::new(FixedCompletion(raw.to_string()));
        let planner = DebatePlanner::new(llm);
        let outcome = planner.plan(&request("how should I destress"), &[]).await.unwrap();
        assert_eq!(outcome.debate_rounds, 1);
        assert!(!outcome.alternatives.is_empty());
        assert!(outcome.alternatives[0].score > 0.0);
    }

    #[tokio::test]
    async fn revise_produces_a_new_alternative_from_rejection_hint() {
        let raw = r#"{"steps": [{"id": "1", "title": "revised plan", "detail": "safer version", "why": "addresses the rejection", "eta_hours": 1, "risk": 0.1}]}"#;
        let llm = Arc::new(FixedCompletion(raw.to_string()));
        let planner = DebatePlanner::new(llm);
        let previous = Alternative {
            id: "orig".to_string(),
            title: "original plan".to_string(),
            description: "d".to_string(),
            score: 0.2,
            score_raw: Some(0.2),
            verdict: Verdict::Rejected,
            blocked: false,
        };
        let rejection = veritas_contracts::fuji_codes::build_rejection("F-2203", "tlid".to_string(), None, None);
        let revised = planner.revise(&request("q"), &[], &rejection, &previous).await.unwrap();
        assert_eq!(revised.title, "revised plan");
    }
}
