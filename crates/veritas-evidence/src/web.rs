//! Tolerant normalization of web search results into `Evidence`, plus the
//! topic filter that decides whether a query warrants a web call at all.
//!
//! Upstream search providers disagree on the wrapper shape for their
//! result list. `extract_results` walks a handful of common keys at the
//! top level and one level deeper, so a provider swap never breaks
//! evidence collection — at worst it degrades to an empty list.

use async_trait::async_trait;

use serde_json::Value;
use veritas_contracts::error::VeritasResult;
use veritas_contracts::evidence::Evidence;
use veritas_contracts::request::DecisionRequest;
use veritas_core::traits::{EvidenceSource, LlmClient};

const RESULT_KEYS: &[&str] = &["results", "items", "data", "hits", "organic", "organic_results"];

/// Keywords whose presence alone justifies a web call regardless of
/// query shape — topics where local/model knowledge is likely stale or
/// time-sensitive.
const TOPIC_TRIGGER_KEYWORDS: &[&str] =
    &["agi", "superintelligence", "breaking news", "latest", "current event", "weather", "today", "forecast", "stock price"];

/// Question stems that mark a query as a knowledge lookup rather than a
/// planning/decision question — the other trigger for a web call.
const KNOWLEDGE_QA_PREFIXES: &[&str] = &["what is", "who is", "who was", "when did", "define ", "explain "];

/// Decide whether `query` warrants a web search: either it trips the
/// topic filter, or it reads as a knowledge question rather than a
/// planning/decision one.
pub fn should_search_web(query: &str) -> bool {
    let q = query.to_lowercase();
    TOPIC_TRIGGER_KEYWORDS.iter().any(|kw| q.contains(kw)) || KNOWLEDGE_QA_PREFIXES.iter().any(|p| q.starts_with(p))
}

/// Pull a results array out of an arbitrary JSON value, trying the top
/// level first and then one level deeper under each known wrapper key.
pub fn extract_results(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(items) => return items.clone(),
        Value::Object(map) => {
            for key in RESULT_KEYS {
                if let Some(Value::Array(items)) = map.get(*key) {
                    return items.clone();
                }
            }
            for key in RESULT_KEYS {
                if let Some(Value::Object(inner)) = map.get(*key) {
                    for inner_key in RESULT_KEYS {
                        if let Some(Value::Array(items)) = inner.get(*inner_key) {
                            return items.clone();
                        }
                    }
                }
            }
            for (_, inner) in map {
                if let Value::Object(inner_map) = inner {
                    for inner_key in RESULT_KEYS {
                        if let Some(Value::Array(items)) = inner_map.get(*inner_key) {
                            return items.clone();
                        }
                    }
                }
            }
        }
        _ => {}
    }
    Vec::new()
}

/// Normalize a single raw result item into `Evidence`, tolerating missing
/// fields by falling back to empty strings and a mid-range confidence.
pub fn normalize_result(item: &Value) -> Option<Evidence> {
    let obj = item.as_object()?;
    let title = obj.get("title").and_then(Value::as_str).unwrap_or("").to_string();
    let snippet = obj
        .get("snippet")
        .or_else(|| obj.get("description"))
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();
    let uri = obj
        .get("url")
        .or_else(|| obj.get("uri"))
        .or_else(|| obj.get("link"))
        .and_then(Value::as_str)
        .map(str::to_string);
    let confidence = obj.get("confidence").and_then(Value::as_f64).unwrap_or(0.5);

    let mut ev = Evidence {
        source: "web".to_string(),
        uri,
        title,
        snippet,
        confidence,
        kind: "web_search".to_string(),
        tags: vec!["web".to_string()],
    };
    ev.clamp_confidence();
    ev.fill_defaults_from_kind();
    Some(ev)
}

/// A web search source backed by an LLM-driven query rewriter and a search
/// client. The search client itself is supplied by the caller, since it
/// needs real network access this crate deliberately avoids.
#[async_trait]
pub trait SearchClient: Send + Sync {
    async fn search(&self, query: &str) -> VeritasResult<Value>;
}

pub struct WebEvidenceSource<S: SearchClient> {
    client: S,
}

impl<S: SearchClient> WebEvidenceSource<S> {
    pub fn new(client: S) -> Self {
        WebEvidenceSource { client }
    }
}

#[async_trait]
impl<S: SearchClient + 'static> EvidenceSource for WebEvidenceSource<S> {
    fn name(&self) -> &str {
        "web-search"
    }

    async fn collect(&self, request: &DecisionRequest) -> VeritasResult<Vec<Evidence>> {
        if request.fast_mode || !should_search_web(&request.query) {
            return Ok(Vec::new());
        }
        let raw = self.client.search(&request.query).await?;
        let items = extract_results(&raw);
        Ok(items.iter().filter_map(normalize_result).collect())
    }
}

/// Unused directly by this crate's own sources, but re-exported so a
/// caller-supplied LLM-backed query rewriter can depend on
/// `veritas-evidence` for the same trait it already pulls in for evidence
/// normalization.
pub type QueryRewriter = dyn LlmClient;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_top_level_array() {
        let value = json!([{"title": "a"}]);
        assert_eq!(extract_results(&value).len(), 1);
    }

    #[test]
    fn extracts_results_key() {
        let value = json!({"results": [{"title": "a"}, {"title": "b"}]});
        assert_eq!(extract_results(&value).len(), 2);
    }

    #[test]
    fn extracts_nested_wrapper() {
        let value = json!({"response": {"data": [{"title": "a"}]}});
        assert_eq!(extract_results(&value).len(), 1);
    }

    #[test]
    fn unknown_shape_yields_empty() {
        let value = json!({"status": "ok"});
        assert!(extract_results(&value).is_empty());
    }

    #[test]
    fn normalize_fills_missing_fields() {
        let item = json!({"title": "Some Page"});
        let ev = normalize_result(&item).unwrap();
        assert_eq!(ev.title, "Some Page");
        assert_eq!(ev.confidence, 0.5);
        assert_eq!(ev.uri.as_deref(), Some("internal:evidence:web_search"));
    }
}
