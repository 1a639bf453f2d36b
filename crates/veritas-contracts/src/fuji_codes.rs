//! The FUJI standard code registry (`F-1xxx` … `F-4xxx`).
//!
//! Four layers (Data & Evidence, Logic & Debate, Value & Policy, Safety &
//! Security), each code carrying a severity, a blocking flag, and a
//! feedback action. The registry is validated the first time it is
//! touched; an invalid registry panics, which aborts gateway startup.

use std::collections::HashMap;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

/// Which of the four FUJI layers a code belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FujiLayer {
    DataEvidence,
    LogicDebate,
    ValuePolicy,
    SafetySecurity,
}

impl FujiLayer {
    fn from_code_prefix(digit: char) -> Option<Self> {
        match digit {
            '1' => Some(FujiLayer::DataEvidence),
            '2' => Some(FujiLayer::LogicDebate),
            '3' => Some(FujiLayer::ValuePolicy),
            '4' => Some(FujiLayer::SafetySecurity),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FujiLayer::DataEvidence => "Data & Evidence",
            FujiLayer::LogicDebate => "Logic & Debate",
            FujiLayer::ValuePolicy => "Value & Policy",
            FujiLayer::SafetySecurity => "Safety & Security",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FujiSeverity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING-KEBAB-CASE")]
pub enum FujiAction {
    ReDebate,
    ReCritique,
    RequestEvidence,
    RewritePlan,
    HumanReview,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FujiError {
    pub code: &'static str,
    pub message: &'static str,
    pub detail: &'static str,
    pub layer: FujiLayer,
    pub severity: FujiSeverity,
    pub blocking: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FujiFeedback {
    pub action: FujiAction,
    pub hint: &'static str,
}

#[derive(Debug, Clone)]
pub struct FujiRegistryEntry {
    pub error: FujiError,
    pub feedback: FujiFeedback,
}

/// The standardized rejection payload returned by the FUJI safety gate.
#[derive(Debug, Clone, Serialize)]
pub struct FujiRejection {
    pub status: &'static str,
    pub gate: &'static str,
    pub error: FujiErrorPayload,
    pub feedback: FujiFeedbackPayload,
    pub trust_log_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FujiErrorPayload {
    pub code: String,
    pub message: String,
    pub detail: String,
    pub layer: String,
    pub severity: FujiSeverity,
    pub blocking: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FujiFeedbackPayload {
    pub action: FujiAction,
    pub hint: String,
}

fn entry(
    code: &'static str,
    message: &'static str,
    detail: &'static str,
    layer: FujiLayer,
    severity: FujiSeverity,
    blocking: bool,
    action: FujiAction,
    hint: &'static str,
) -> (&'static str, FujiRegistryEntry) {
    (
        code,
        FujiRegistryEntry {
            error: FujiError {
                code,
                message,
                detail,
                layer,
                severity,
                blocking,
            },
            feedback: FujiFeedback { action, hint },
        },
    )
}

/// The FUJI code registry, validated on first access.
pub static FUJI_REGISTRY: LazyLock<HashMap<&'static str, FujiRegistryEntry>> = LazyLock::new(|| {
    let entries = [
        entry(
            "F-1002",
            "Insufficient Evidence",
            "Evidence is insufficient to support the conclusion.",
            FujiLayer::DataEvidence,
            FujiSeverity::Medium,
            false,
            FujiAction::RequestEvidence,
            "Add primary evidence and make its provenance and validity explicit.",
        ),
        entry(
            "F-1005",
            "Inconsistent Data",
            "Evidence A and evidence B contain an unresolved contradiction.",
            FujiLayer::DataEvidence,
            FujiSeverity::High,
            true,
            FujiAction::ReCritique,
            "Re-evaluate the conflicting evidence's priority and replace it with consistent data.",
        ),
        entry(
            "F-2101",
            "Critique Unresolved",
            "A risk raised during critique was not reflected in the plan.",
            FujiLayer::LogicDebate,
            FujiSeverity::High,
            true,
            FujiAction::ReDebate,
            "Re-run the debate incorporating the raised risk and present a revised plan.",
        ),
        entry(
            "F-2203",
            "Logic Leap",
            "The inference from evidence to conclusion contains a gap.",
            FujiLayer::LogicDebate,
            FujiSeverity::Medium,
            false,
            FujiAction::ReCritique,
            "Make the inference's premises and logical links explicit; fill the missing steps.",
        ),
        entry(
            "F-3001",
            "ValueCore Mismatch",
            "A lower-priority value was favored over policy, violating the value ordering.",
            FujiLayer::ValuePolicy,
            FujiSeverity::High,
            true,
            FujiAction::RewritePlan,
            "Revise the plan to put the priority value (e.g. safety) first.",
        ),
        entry(
            "F-3008",
            "Ethical Boundary",
            "The action crosses an ethical or regulatory boundary.",
            FujiLayer::ValuePolicy,
            FujiSeverity::High,
            true,
            FujiAction::HumanReview,
            "Halt the proposed action and request human review against ethical standards.",
        ),
        entry(
            "F-4001",
            "Prompt Injection Suspected",
            "The request shows signs of prompt injection.",
            FujiLayer::SafetySecurity,
            FujiSeverity::High,
            true,
            FujiAction::HumanReview,
            "Re-evaluate the input safely and strip any policy-overriding instructions.",
        ),
        entry(
            "F-4003",
            "Sensitive Info Leak Risk",
            "There is a risk of leaking personal or confidential information.",
            FujiLayer::SafetySecurity,
            FujiSeverity::Medium,
            true,
            FujiAction::RewritePlan,
            "Remove or mask personal information and revise within a safe scope.",
        ),
    ];

    let map: HashMap<&'static str, FujiRegistryEntry> = entries.into_iter().collect();
    for (code, registry_entry) in &map {
        validate_registry_entry(code, registry_entry)
            .unwrap_or_else(|reason| panic!("invalid FUJI registry entry {code}: {reason}"));
    }
    map
});

fn validate_registry_entry(code: &str, registry_entry: &FujiRegistryEntry) -> Result<(), String> {
    if !is_well_formed_code(code) {
        return Err(format!("malformed code format: {code}"));
    }
    let prefix = code.as_bytes()[2] as char;
    let expected_layer =
        FujiLayer::from_code_prefix(prefix).ok_or_else(|| format!("unknown layer prefix in {code}"))?;
    if registry_entry.error.layer != expected_layer {
        return Err(format!(
            "layer mismatch for {code}: expected {:?}, got {:?}",
            expected_layer, registry_entry.error.layer
        ));
    }
    if registry_entry.error.severity == FujiSeverity::High && !registry_entry.error.blocking {
        return Err(format!("severity HIGH requires blocking=true for {code}"));
    }
    if matches!(expected_layer, FujiLayer::SafetySecurity) {
        if registry_entry.error.severity == FujiSeverity::Low {
            return Err(format!("{code} must be >= MEDIUM severity"));
        }
        if !registry_entry.error.blocking {
            return Err(format!("{code} must be blocking"));
        }
    }
    if code == "F-2101" && registry_entry.feedback.action != FujiAction::ReDebate {
        return Err("F-2101 feedback.action must be RE-DEBATE".to_string());
    }
    Ok(())
}

/// `F-Lxxx` where `L` is a digit in `1..=4` followed by exactly 3 digits.
pub fn is_well_formed_code(code: &str) -> bool {
    let bytes = code.as_bytes();
    bytes.len() == 6
        && &bytes[0..2] == b"F-"
        && (b'1'..=b'4').contains(&bytes[2])
        && bytes[3..6].iter().all(u8::is_ascii_digit)
}

/// Look up a code's layer from its prefix digit, independent of whether the
/// code is registered — used by admission-time sanity checks.
pub fn layer_for_code(code: &str) -> Option<FujiLayer> {
    if !is_well_formed_code(code) {
        return None;
    }
    FujiLayer::from_code_prefix(code.as_bytes()[2] as char)
}

/// Build the standardized `REJECTED` response payload for `code`.
///
/// Panics if `code` is not registered — callers must only pass codes
/// selected from [`FUJI_REGISTRY`].
pub fn build_rejection(
    code: &str,
    trust_log_id: impl Into<String>,
    detail_override: Option<String>,
    hint_override: Option<String>,
) -> FujiRejection {
    let registry_entry = FUJI_REGISTRY
        .get(code)
        .unwrap_or_else(|| panic!("unknown FUJI code: {code}"));

    FujiRejection {
        status: "REJECTED",
        gate: "FUJI_SAFETY_GATE_v2",
        error: FujiErrorPayload {
            code: registry_entry.error.code.to_string(),
            message: registry_entry.error.message.to_string(),
            detail: detail_override.unwrap_or_else(|| registry_entry.error.detail.to_string()),
            layer: registry_entry.error.layer.label().to_string(),
            severity: registry_entry.error.severity,
            blocking: registry_entry.error.blocking,
        },
        feedback: FujiFeedbackPayload {
            action: registry_entry.feedback.action,
            hint: hint_override.unwrap_or_else(|| registry_entry.feedback.hint.to_string()),
        },
        trust_log_id: trust_log_id.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_validates_without_panicking() {
        assert!(FUJI_REGISTRY.contains_key("F-2101"));
    }

    #[test]
    fn every_code_prefix_determines_its_layer() {
        for (code, registry_entry) in FUJI_REGISTRY.iter() {
            let expected = layer_for_code(code).unwrap();
            assert_eq!(registry_entry.error.layer, expected, "mismatch for {code}");
        }
    }

    #[test]
    fn high_severity_codes_are_always_blocking() {
        for registry_entry in FUJI_REGISTRY.values() {
            if registry_entry.error.severity == FujiSeverity::High {
                assert!(registry_entry.error.blocking);
            }
        }
    }

    #[test]
    fn safety_layer_codes_are_blocking_and_at_least_medium() {
        for registry_entry in FUJI_REGISTRY.values() {
            if registry_entry.error.layer == FujiLayer::SafetySecurity {
                assert!(registry_entry.error.blocking);
                assert!(registry_entry.error.severity >= FujiSeverity::Medium);
            }
        }
    }

    #[test]
    fn f_2101_feedback_action_is_redebate() {
        let registry_entry = &FUJI_REGISTRY["F-2101"];
        assert_eq!(registry_entry.feedback.action, FujiAction::ReDebate);
    }

    #[test]
    fn build_rejection_has_standard_envelope() {
        let rejection = build_rejection("F-4001", "tl-123", None, None);
        assert_eq!(rejection.status, "REJECTED");
        assert_eq!(rejection.gate, "FUJI_SAFETY_GATE_v2");
        assert_eq!(rejection.error.code, "F-4001");
        assert_eq!(rejection.trust_log_id, "tl-123");
    }

    #[test]
    fn well_formed_code_parser_rejects_malformed_input() {
        assert!(is_well_formed_code("F-1002"));
        assert!(!is_well_formed_code("F-9002"));
        assert!(!is_well_formed_code("X-1002"));
        assert!(!is_well_formed_code("F-100"));
    }
}
