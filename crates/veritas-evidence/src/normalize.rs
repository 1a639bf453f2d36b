//! Shared evidence normalization: weight-to-confidence coercion, default
//! title/uri synthesis from `kind`, and the four-tuple dedupe key.
//!
//! Accepts either a pipeline-contract evidence item or a legacy
//! `{source, kind, weight, snippet, tags}` shape and never fails to
//! produce something usable.

use std::collections::HashSet;

use veritas_contracts::evidence::Evidence;

/// Build an `Evidence` from legacy-shaped fields, clamping the weight
/// into a confidence and synthesizing `title`/`uri` from `kind` when
/// absent.
pub fn from_local_heuristic(source: &str, kind: &str, weight: f64, snippet: impl Into<String>, tags: Vec<String>) -> Evidence {
    let mut ev = Evidence {
        source: source.to_string(),
        uri: None,
        title: String::new(),
        snippet: snippet.into(),
        confidence: weight,
        kind: kind.to_string(),
        tags,
    };
    ev.clamp_confidence();
    ev.fill_defaults_from_kind();
    ev
}

/// Deduplicate a batch of evidence in place, preserving first-seen order.
pub fn dedupe(evidence: Vec<Evidence>) -> Vec<Evidence> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(evidence.len());
    for mut ev in evidence {
        ev.clamp_confidence();
        ev.fill_defaults_from_kind();
        if seen.insert(ev.dedupe_key()) {
            out.push(ev);
        }
    }
    out
}
