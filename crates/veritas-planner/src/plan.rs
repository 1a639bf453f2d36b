//! Plan generation: turns an LLM completion into a structured [`Plan`],
//! tolerating whatever shape of almost-JSON the model actually returned.
//!
//! A five-rung recovery ladder: strip fenced code blocks, locate the
//! first balanced top-level `{`/`[`, scan for an embedded `"steps"`
//! array, and finally fall back to a single-step plan stamped
//! `stage_fallback` so the pipeline never stalls on a malformed
//! completion.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One step of a generated plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanStep {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub detail: String,
    #[serde(default)]
    pub why: String,
    #[serde(default)]
    pub eta_hours: f64,
    #[serde(default)]
    pub risk: f64,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

/// The Planner's output: a list of steps plus provenance (`source`) and a
/// free-form `meta` bag for anything the stage wants to carry forward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub steps: Vec<PlanStep>,
    pub source: String,
    #[serde(default)]
    pub meta: Value,
}

/// Short-circuit queries that need no LLM round trip at all.
pub fn simple_qa_plan(query: &str) -> Option<Plan> {
    let q = query.trim().to_lowercase();
    let answer = if q.contains("what time is it") {
        "Query the system clock; this gateway does not track wall-clock time itself."
    } else if q.contains("what day is it") {
        "Query the system calendar; this gateway does not track the calendar itself."
    } else {
        return None;
    };
    Some(Plan {
        steps: vec![PlanStep {
            id: "simple-qa".to_string(),
            title: "Answer directly".to_string(),
            detail: answer.to_string(),
            why: "query matched a simple question/answer pattern".to_string(),
            eta_hours: 0.0,
            risk: 0.0,
            dependencies: Vec::new(),
        }],
        source: "simple_qa".to_string(),
        meta: Value::Null,
    })
}

fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();
    if let Some(rest) = trimmed.strip_prefix("```json") {
        rest.strip_suffix("```").unwrap_or(rest).trim()
    } else if let Some(rest) = trimmed.strip_prefix("```") {
        rest.strip_suffix("```").unwrap_or(rest).trim()
    } else {
        trimmed
    }
}

/// Scan `text` for the first balanced top-level `{...}` or `[...]` span.
fn first_balanced_span(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let start = text.find(['{', '['])?;
    let open = bytes[start];
    let close = if open == b'{' { b'}' } else { b']' };
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escape = false;
    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escape {
                escape = false;
            } else if b == b'\\' {
                escape = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b if b == open => depth += 1,
            b if b == close => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_steps_from_value(value: &Value) -> Option<Vec<PlanStep>> {
    let steps_value = if value.get("steps").is_some() {
        value.get("steps")
    } else if value.is_array() {
        Some(value)
    } else {
        None
    }?;
    serde_json::from_value(steps_value.clone()).ok()
}

fn scan_for_embedded_steps(text: &str) -> Option<Vec<PlanStep>> {
    let marker = "\"steps\"";
    let idx = text.find(marker)?;
    let after_colon = text[idx + marker.len()..].find(':')? + idx + marker.len() + 1;
    let array_start = text[after_colon..].find('[')? + after_colon;
    let span = first_balanced_span(&text[array_start..])?;
    let value: Value = serde_json::from_str(span).ok()?;
    serde_json::from_value(value).ok()
}

fn stage_fallback(query: &str) -> Plan {
    Plan {
        steps: vec![PlanStep {
            id: "fallback-1".to_string(),
            title: format!("Investigate: {query}"),
            detail: "The planning model's output could not be parsed as structured steps; falling back to a single investigative step.".to_string(),
            why: "recovery ladder exhausted".to_string(),
            eta_hours: 1.0,
            risk: 0.3,
            dependencies: Vec::new(),
        }],
        source: "stage_fallback".to_string(),
        meta: Value::Null,
    }
}

/// Recover a [`Plan`] from a raw LLM completion, trying progressively
/// looser strategies before giving up and returning a fallback plan.
pub fn recover_plan(query: &str, raw_completion: &str) -> Plan {
    let stripped = strip_fences(raw_completion);

    if let Ok(value) = serde_json::from_str::<Value>(stripped) {
        if let Some(steps) = parse_steps_from_value(&value) {
            if !steps.is_empty() {
                return Plan { steps, source: "llm".to_string(), meta: value };
            }
        }
    }

    if let Some(span) = first_balanced_span(stripped) {
        if let Ok(value) = serde_json::from_str::<Value>(span) {
            if let Some(steps) = parse_steps_from_value(&value) {
                if !steps.is_empty() {
                    return Plan { steps, source: "llm_recovered".to_string(), meta: value };
                }
            }
        }
    }

    if let Some(steps) = scan_for_embedded_steps(stripped) {
        if !steps.is_empty() {
            return Plan { steps, source: "llm_scanned".to_string(), meta: Value::Null };
        }
    }

    stage_fallback(query)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_qa_short_circuits_time_question() {
        let plan = simple_qa_plan("what time is it right now?").unwrap();
        assert_eq!(plan.source, "simple_qa");
    }

    #[test]
    fn non_qa_query_has_no_short_circuit() {
        assert!(simple_qa_plan("should I change careers").is_none());
    }

    #[test]
    fn recovers_clean_json() {
        let raw = r#"{"steps": [{"id": "1", "title": "do it"}]}"#;
        let plan = recover_plan("q", raw);
        assert_eq!(plan.source, "llm");
        assert_eq!(plan.steps[0].title, "do it");
    }

    #[test]
    fn strips_fenced_code_block() {
        let raw = "```json\n{\"steps\": [{\"id\": \"1\", \"title\": \"do it\"}]}\n```";
        let plan = recover_plan("q", raw);
        assert_eq!(plan.source, "llm");
    }

    #[test]
    fn recovers_from_surrounding_prose() {
        let raw = "Sure, here is the plan: {\"steps\": [{\"id\": \"1\", \"title\": \"do it\"}]} hope that helps!";
        let plan = recover_plan("q", raw);
        assert_eq!(plan.source, "llm_recovered");
    }

    #[test]
    fn scans_for_embedded_steps_array_when_outer_json_is_broken() {
        let raw = "not valid json but has \"steps\": [{\"id\": \"1\", \"title\": \"x\"}] in it";
        let plan = recover_plan("q", raw);
        assert_eq!(plan.source, "llm_scanned");
    }

    #[test]
    fn falls_back_when_nothing_parses() {
        let plan = recover_plan("investigate the outage", "garbage output with no structure");
        assert_eq!(plan.source, "stage_fallback");
    }
}
