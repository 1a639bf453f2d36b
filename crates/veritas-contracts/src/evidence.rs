//! Evidence types shared by the evidence collector and the planner.

use serde::{Deserialize, Serialize};

/// A single normalized piece of evidence gathered by the collector.
///
/// Deduplication uses the `(source, uri, title, snippet)` 4-tuple.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Evidence {
    pub source: String,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub snippet: String,
    pub confidence: f64,
    /// Free-form classifier, e.g. "fatigue", "stakes", "weather", "web".
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Evidence {
    /// The 4-tuple used for deduplication.
    pub fn dedupe_key(&self) -> (String, Option<String>, String, String) {
        (
            self.source.clone(),
            self.uri.clone(),
            self.title.clone(),
            self.snippet.clone(),
        )
    }

    /// Coerce `confidence` into `[0,1]`, clamping out-of-range values
    /// rather than rejecting them.
    pub fn clamp_confidence(&mut self) {
        self.confidence = self.confidence.clamp(0.0, 1.0);
    }

    /// Fill `title`/`uri` with the `local:<kind>` / `internal:evidence:<kind>`
    /// defaults when missing.
    pub fn fill_defaults_from_kind(&mut self) {
        if self.title.trim().is_empty() {
            self.title = format!("local:{}", self.kind);
        }
        if self.uri.as_deref().map(str::trim).unwrap_or("").is_empty() {
            self.uri = Some(format!("internal:evidence:{}", self.kind));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedupe_key_ignores_confidence_and_kind() {
        let a = Evidence {
            source: "web".into(),
            uri: Some("https://x".into()),
            title: "T".into(),
            snippet: "S".into(),
            confidence: 0.2,
            kind: "web".into(),
            tags: vec![],
        };
        let mut b = a.clone();
        b.confidence = 0.9;
        b.kind = "different".into();
        assert_eq!(a.dedupe_key(), b.dedupe_key());
    }

    #[test]
    fn fill_defaults_from_kind_only_fills_blank_fields() {
        let mut e = Evidence {
            source: "local".into(),
            uri: None,
            title: String::new(),
            snippet: String::new(),
            confidence: 0.5,
            kind: "fatigue".into(),
            tags: vec![],
        };
        e.fill_defaults_from_kind();
        assert_eq!(e.title, "local:fatigue");
        assert_eq!(e.uri.as_deref(), Some("internal:evidence:fatigue"));
    }

    #[test]
    fn clamp_confidence_bounds_to_unit_interval() {
        let mut e = Evidence {
            source: "x".into(),
            uri: None,
            title: "t".into(),
            snippet: "".into(),
            confidence: 1.7,
            kind: "x".into(),
            tags: vec![],
        };
        e.clamp_confidence();
        assert_eq!(e.confidence, 1.0);
    }
}
