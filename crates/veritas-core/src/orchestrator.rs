//! The VERITAS orchestrator: the deterministic sequencing of the decision
//! pipeline's trusted stages.
//!
//!   Evidence → Plan/Debate/Score → FUJI Gate → (self-heal retry loop) → Trust Log
//!
//! Admission (C1) happens upstream of the orchestrator, at the HTTP edge, so
//! this crate never sees an unauthenticated request. The invariant here is
//! absolute: a candidate is never returned to the caller unless the FUJI
//! gate passed it, and every terminal outcome — pass or reject — is
//! written to the Trust Log before the response is built.

use std::sync::Arc;
use std::time::Instant;

use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use veritas_contracts::error::VeritasResult;
use veritas_contracts::evidence::Evidence;
use veritas_contracts::fuji::PolicyContext;
use veritas_contracts::healing::{HealingBudget, HealingState};
use veritas_contracts::request::DecisionRequest;
use veritas_contracts::response::{DecisionResponse, Extras, MemoryContext, MemoryMeta, Metrics, SelfHealingSummary};
use veritas_contracts::trust_log::TrustLogEntry;

use crate::healing::{check_guardrails, decide_healing_action, diff_summary, healing_input_signature, HealingInput};
use crate::traits::{EvidenceSource, Planner, SafetyGate, TrustLogWriter};

/// Wires the collaborator implementations together and drives one
/// `decide()` call per inbound request. Cheap to clone — every field is an
/// `Arc`, so a single orchestrator instance is shared across the gateway's
/// request handlers.
#[derive(Clone)]
pub struct Orchestrator {
    evidence_sources: Arc<Vec<Box<dyn EvidenceSource>>>,
    planner: Arc<dyn Planner>,
    gate: Arc<dyn SafetyGate>,
    trust_log: Arc<dyn TrustLogWriter>,
    healing_enabled: bool,
    healing_budget: HealingBudget,
}

impl Orchestrator {
    pub fn new(
        evidence_sources: Vec<Box<dyn EvidenceSource>>,
        planner: Arc<dyn Planner>,
        gate: Arc<dyn SafetyGate>,
        trust_log: Arc<dyn TrustLogWriter>,
        healing_enabled: bool,
        healing_budget: HealingBudget,
    ) -> Self {
        Orchestrator {
            evidence_sources: Arc::new(evidence_sources),
            planner,
            gate,
            trust_log,
            healing_enabled,
            healing_budget,
        }
    }

    /// Run the full pipeline for one request and return the decision
    /// returned to the caller.
    pub async fn decide(&self, request: DecisionRequest) -> VeritasResult<DecisionResponse> {
        let started = Instant::now();
        let request_id = Uuid::new_v4().to_string();

        let mut collection = self.collect_evidence(&request).await?;
        let mut evidence = std::mem::take(&mut collection.items);
        let memory_meta = MemoryMeta {
            hits: evidence.len(),
            skipped: request.has_pre_aggregated_evidence(),
            skip_reason: request
                .has_pre_aggregated_evidence()
                .then(|| "pre_aggregated_evidence_supplied".to_string()),
            context: MemoryContext { fast: request.fast_mode },
        };

        let plan = self.planner.plan(&request, &evidence).await?;
        let debate_rounds = plan.debate_rounds;

        let mut candidate = plan
            .alternatives
            .iter()
            .filter(|alt| !alt.blocked)
            .max_by(|a, b| a.score.partial_cmp(&b.score).unwrap_or(std::cmp::Ordering::Equal))
            .cloned();

        let healing_available = self.healing_enabled && !request.self_healing_disabled();
        let mut healing_state = HealingState::default();
        let mut healing_summary = SelfHealingSummary { enabled: healing_available, ..Default::default() };
        let mut prev_healing_input: Option<HealingInput> = None;

        let decision = loop {
            let Some(current) = candidate.clone() else {
                let rejection = veritas_contracts::fuji_codes::build_rejection(
                    "F-1002",
                    String::new(),
                    Some("the planner produced no viable, unblocked alternative".to_string()),
                    None,
                );
                break veritas_contracts::fuji::FujiDecision::rejected("C", rejection);
            };

            let text = format!("{}\n{}\n{}", request.query, current.title, current.description);
            let policy_context = PolicyContext {
                stakes: request.stakes(),
                telos_score: Some(current.score),
                safe_applied: request.safe_applied(),
                min_evidence: request.min_evidence(),
            };
            let gate_decision = self
                .gate
                .evaluate(&request_id, &text, &current, &evidence, &policy_context)
                .await?;

            if gate_decision.status.is_pass() {
                break gate_decision;
            }

            let rejection = gate_decision.rejection.clone().expect("non-pass decision carries a rejection");

            if !healing_available {
                break gate_decision;
            }

            let healing_decision = decide_healing_action(&rejection.error.code, rejection.feedback.action);
            if !healing_decision.allow {
                info!(code = %rejection.error.code, reason = healing_decision.reason, "self-healing declined retry");
                break gate_decision;
            }

            let healing_input = HealingInput {
                original_task: request.query.clone(),
                last_output: json!({"title": current.title, "description": current.description}),
                rejection: serde_json::to_value(&rejection).unwrap_or(json!(null)),
                attempt: healing_state.attempts + 1,
                policy_decision: healing_decision.reason.to_string(),
            };
            let signature = healing_input_signature(&healing_input);

            if let Some(stop) = check_guardrails(&healing_state, &self.healing_budget, &rejection.error.code, &signature) {
                warn!(stop, "self-healing guardrail tripped");
                break gate_decision;
            }

            healing_summary.diff_summary = Some(diff_summary(prev_healing_input.as_ref(), &healing_input));
            healing_state.record_attempt(&rejection.error.code, 1, 0.0);
            healing_state.last_input_signature = Some(signature);
            prev_healing_input = Some(healing_input);
            healing_summary.attempts = healing_state.attempts;
            healing_summary.triggered = true;

            // Re-enter evidence collection (C3) with the rejection folded
            // into the request context, so a retry can surface evidence a
            // source only returns once it knows what FUJI objected to —
            // not just re-run the planner against the same evidence.
            let mut augmented_request = request.clone();
            augmented_request.context.insert(
                "_healing_feedback".to_string(),
                json!({"code": rejection.error.code, "hint": rejection.feedback.hint}),
            );
            let retry_collection = self.collect_evidence(&augmented_request).await?;
            collection.mem_hits += retry_collection.mem_hits;
            collection.web_hits += retry_collection.web_hits;
            let mut seen: std::collections::HashSet<_> = evidence.iter().map(Evidence::dedupe_key).collect();
            for item in retry_collection.items {
                if seen.insert(item.dedupe_key()) {
                    evidence.push(item);
                }
            }

            let revised = self
                .planner
                .revise(&augmented_request, &evidence, &rejection, &current)
                .await?;
            candidate = Some(revised);
        };

        healing_summary.final_code = decision
            .rejection
            .as_ref()
            .map(|r| r.error.code.clone());

        let chosen = if decision.status.is_pass() { candidate } else { None };
        let decision_id = Uuid::new_v4().to_string();
        let alternatives_count = plan.alternatives.len();

        let payload = json!({
            "request_id": request_id,
            "decision_id": decision_id,
            "query": request.query,
            "fuji_status": decision.status.external(),
            "chosen": chosen,
            "alternatives_count": plan.alternatives.len(),
            "evidence_count": evidence.len(),
            "self_healing_attempts": healing_summary.attempts,
        });

        let entry = TrustLogEntry::new(
            0,
            Uuid::new_v4().to_string(),
            "decision",
            request_id.clone(),
            Some(decision_id.clone()),
            payload,
            veritas_contracts::trust_log::GENESIS_HASH.to_string(),
        );
        let trust_log_id = self.trust_log.append(entry).await?;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        let memory_evidence_count = evidence.iter().filter(|e| e.source == "memory").count();
        let web_evidence_count = evidence.iter().filter(|e| e.source == "web").count();
        let decision_status = decision.status.external();
        let gate = veritas_contracts::fuji::GateResult::from(&decision);
        Ok(DecisionResponse {
            request_id,
            decision_id,
            decision_status,
            chosen,
            alternatives: plan.alternatives,
            evidence,
            gate,
            fuji: decision,
            trust_log_id,
            extras: Extras {
                metrics: Metrics {
                    evidence_count: memory_meta.hits,
                    alternatives_count,
                    debate_rounds,
                    elapsed_ms,
                    mem_hits: collection.mem_hits,
                    memory_evidence_count,
                    web_hits: collection.web_hits,
                    web_evidence_count,
                    fast_mode: request.fast_mode,
                },
                memory_meta,
                self_healing: healing_summary,
            },
        })
    }

    async fn collect_evidence(&self, request: &DecisionRequest) -> VeritasResult<EvidenceCollection> {
        if let Some(pre_aggregated) = &request.evidence {
            let mem_hits = pre_aggregated.iter().filter(|e| e.source == "memory").count();
            let web_hits = pre_aggregated.iter().filter(|e| e.source == "web").count();
            return Ok(EvidenceCollection { items: pre_aggregated.clone(), mem_hits, web_hits });
        }

        let mut collected = Vec::new();
        for source in self.evidence_sources.iter() {
            match source.collect(request).await {
                Ok(mut items) => collected.append(&mut items),
                Err(err) => warn!(source = source.name(), error = %err, "evidence source failed, continuing"),
            }
        }

        let mem_hits = collected.iter().filter(|e| e.source == "memory").count();
        let web_hits = collected.iter().filter(|e| e.source == "web").count();

        let mut seen = std::collections::HashSet::new();
        collected.retain_mut(|item| {
            item.clamp_confidence();
            item.fill_defaults_from_kind();
            seen.insert(item.dedupe_key())
        });
        Ok(EvidenceCollection { items: collected, mem_hits, web_hits })
    }
}

/// Raw per-source evidence counts captured before dedupe, alongside the
/// deduped items that actually reach the planner.
struct EvidenceCollection {
    items: Vec<Evidence>,
    mem_hits: usize,
    web_hits: usize,
}

