//! Candidate alternative types and title integrity checks.

use serde::{Deserialize, Serialize};

use crate::error::{VeritasError, VeritasResult};

/// Maximum allowed length, in characters, of an `Alternative::title`.
pub const MAX_TITLE_LENGTH: usize = 1000;

/// Debate verdict bands, expressed in the registry's own vocabulary rather
/// than translated — these are external-facing enum values, not prose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "採用推奨")]
    Recommended,
    #[serde(rename = "要検討")]
    NeedsReview,
    #[serde(rename = "却下")]
    Rejected,
}

impl Verdict {
    /// Derive a verdict from a normalized `[0,1]` score per the debate
    /// banding rule: `>=0.6` recommended, `0.3..0.6` needs review, `<0.3`
    /// rejected.
    pub fn from_score(score: f64) -> Self {
        if score >= 0.6 {
            Verdict::Recommended
        } else if score >= 0.3 {
            Verdict::NeedsReview
        } else {
            Verdict::Rejected
        }
    }
}

/// A candidate alternative produced by the planner and scored by the
/// debate/value-scoring stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alternative {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Value-adjusted score in `[0,1]`, visible to callers.
    pub score: f64,
    /// The score before the `ValueCore` multiplicative adjustment was
    /// applied. Preserved for audit even though callers only see `score`.
    #[serde(default)]
    pub score_raw: Option<f64>,
    pub verdict: Verdict,
    #[serde(default)]
    pub blocked: bool,
}

impl Alternative {
    /// Run the title integrity checks from the data model invariants:
    /// non-empty, `<=MAX_TITLE_LENGTH` chars, no control characters, no
    /// banned keywords. Titles that fail are rejected before scoring.
    pub fn check_title_integrity(title: &str, banned_keywords: &[String]) -> VeritasResult<()> {
        if title.trim().is_empty() {
            return Err(VeritasError::IntegrityCheckFailed {
                reason: "title must not be empty".to_string(),
            });
        }
        let char_count = title.chars().count();
        if char_count > MAX_TITLE_LENGTH {
            return Err(VeritasError::IntegrityCheckFailed {
                reason: format!(
                    "title length {char_count} exceeds MAX_TITLE_LENGTH ({MAX_TITLE_LENGTH})"
                ),
            });
        }
        if title.chars().any(|c| c.is_control() && c != '\n' && c != '\t') {
            return Err(VeritasError::IntegrityCheckFailed {
                reason: "title contains control characters".to_string(),
            });
        }
        let lower = title.to_lowercase();
        for banned in banned_keywords {
            if lower.contains(&banned.to_lowercase()) {
                return Err(VeritasError::IntegrityCheckFailed {
                    reason: format!("title contains banned keyword '{banned}'"),
                });
            }
        }
        Ok(())
    }

    /// `true` when the title passes integrity checks under an empty banned
    /// keyword list (length + emptiness + control characters only).
    pub fn integrity_ok(&self) -> bool {
        Self::check_title_integrity(&self.title, &[]).is_ok()
    }
}
