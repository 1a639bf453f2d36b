//! Title integrity checks for generated alternatives, ahead of scoring.
//!
//! Deliberately collects every failure rather than short-circuiting on
//! the first one, so a caller (or a test) can see the full picture of
//! what's wrong with a title in one pass.

use veritas_contracts::option::MAX_TITLE_LENGTH;

/// A single integrity failure, named rather than formatted, so a caller
/// can decide how to present it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityFailure {
    Empty,
    TooLong { length: usize },
    ControlCharacter,
    BannedKeyword { keyword: String },
}

/// Run every integrity check over `title`, returning all failures found.
/// An empty vec means the title is clean.
pub fn check_all(title: &str, banned_keywords: &[String]) -> Vec<IntegrityFailure> {
    let mut failures = Vec::new();

    if title.trim().is_empty() {
        failures.push(IntegrityFailure::Empty);
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        failures.push(IntegrityFailure::TooLong { length: title.chars().count() });
    }
    if title.chars().any(|c| c.is_control()) {
        failures.push(IntegrityFailure::ControlCharacter);
    }
    let lower = title.to_lowercase();
    for keyword in banned_keywords {
        if lower.contains(&keyword.to_lowercase()) {
            failures.push(IntegrityFailure::BannedKeyword { keyword: keyword.clone() });
        }
    }

    failures
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_title_has_no_failures() {
        assert!(check_all("Plan a weekend trip", &[]).is_empty());
    }

    #[test]
    fn collects_every_failure_in_one_pass() {
        let title = format!("{}\u{0007}", "a".repeat(MAX_TITLE_LENGTH + 1));
        let failures = check_all(&title, &["a".to_string()]);
        assert!(failures.contains(&IntegrityFailure::TooLong { length: title.chars().count() }));
        assert!(failures.contains(&IntegrityFailure::ControlCharacter));
        assert!(failures.iter().any(|f| matches!(f, IntegrityFailure::BannedKeyword { .. })));
    }

    #[test]
    fn empty_title_fails() {
        assert_eq!(check_all("   ", &[]), vec![IntegrityFailure::Empty]);
    }
}
