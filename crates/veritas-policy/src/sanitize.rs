//! PII detection and masking.
//!
//! Six regex categories, applied in a fixed order — email, phone,
//! government ID, credit card, postal address, honorific name — so that a
//! broader pattern never double-masks a substring an earlier, narrower
//! pattern already claimed. Detection is intentionally permissive (prefers
//! false positives over false negatives) since the cost of an over-eager
//! `F-4003` is a retry, not a silent leak.
//!
//! `name_like` is the weakest signal of the six (a capitalized word before
//! a title suffix is common in ordinary prose) and is treated as a
//! fallback category by Stage A/C rather than a hard PII hit on its own —
//! see `rules::screen_detailed`.

use std::sync::LazyLock;

use regex::Regex;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap());
static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\+?\d{1,3}[-.\s]?)?\(?\d{2,4}\)?[-.\s]?\d{3,4}[-.\s]?\d{3,4}\b").unwrap());
static GOV_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").unwrap());
static CREDIT_CARD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:\d[ -]?){13,16}\b").unwrap());
/// US-style ZIP (`12345` or `12345-6789`) or a street-address line
/// (house number + street name + suffix).
static ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b\d{5}(?:-\d{4})?\b|\b\d{1,6}\s+[A-Za-z][A-Za-z.'\s]*\s(?:street|st|avenue|ave|road|rd|boulevard|blvd|lane|ln|drive|dr|court|ct|way|place|pl)\b",
    )
    .unwrap()
});
/// A capitalized given+family name immediately followed by an honorific
/// suffix (`Mr.`, `Ms.`, `Dr.`, `Mrs.`) or preceded by a title.
static NAME_LIKE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:Mr|Mrs|Ms|Dr|Prof)\.?\s+[A-Z][a-z]+(?:\s[A-Z][a-z]+)?\b").unwrap()
});

/// Scan `text` for PII-shaped substrings, returning the category labels
/// found (not the matched text itself), in detection-priority order.
pub fn detect_categories(text: &str) -> Vec<&'static str> {
    let mut found = Vec::new();
    if EMAIL.is_match(text) {
        found.push("email");
    }
    if PHONE.is_match(text) {
        found.push("phone");
    }
    if GOV_ID.is_match(text) {
        found.push("government_id");
    }
    if CREDIT_CARD.is_match(text) {
        found.push("credit_card");
    }
    if ADDRESS.is_match(text) {
        found.push("address");
    }
    // Checked last so it never shadows a narrower match already claimed by
    // address/government-id style digit runs.
    if NAME_LIKE.is_match(text) {
        found.push("name_like");
    }
    found
}

/// `true` if any PII category matched.
pub fn contains_pii(text: &str) -> bool {
    !detect_categories(text).is_empty()
}

/// `true` if `text` matches a PII category other than the weak
/// `name_like` fallback.
pub fn contains_hard_pii(text: &str) -> bool {
    detect_categories(text).into_iter().any(|c| c != "name_like")
}

/// Replace every match of every category with `[REDACTED:<category>]`, in
/// the same order `detect_categories` checks them.
pub fn mask(text: &str) -> String {
    let mut masked = EMAIL.replace_all(text, "[REDACTED:email]").into_owned();
    masked = PHONE.replace_all(&masked, "[REDACTED:phone]").into_owned();
    masked = GOV_ID.replace_all(&masked, "[REDACTED:government_id]").into_owned();
    masked = CREDIT_CARD.replace_all(&masked, "[REDACTED:credit_card]").into_owned();
    masked = ADDRESS.replace_all(&masked, "[REDACTED:address]").into_owned();
    masked = NAME_LIKE.replace_all(&masked, "[REDACTED:name_like]").into_owned();
    masked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_email_addresses() {
        assert!(contains_pii("contact me at jane.doe@example.com"));
    }

    #[test]
    fn detects_government_id_pattern() {
        assert!(contains_pii("ssn 123-45-6789 on file"));
    }

    #[test]
    fn detects_postal_code() {
        let categories = detect_categories("ship it to 94107-1234 please");
        assert!(categories.contains(&"address"));
    }

    #[test]
    fn detects_honorific_name() {
        let categories = detect_categories("please forward this to Dr. Alice Chen");
        assert!(categories.contains(&"name_like"));
    }

    #[test]
    fn name_like_alone_is_not_hard_pii() {
        assert!(!contains_hard_pii("please forward this to Dr. Alice Chen"));
        assert!(contains_pii("please forward this to Dr. Alice Chen"));
    }

    #[test]
    fn plain_sentence_has_no_pii() {
        assert!(!contains_pii("the weather today is sunny and mild"));
    }

    #[test]
    fn mask_redacts_email_but_keeps_surrounding_text() {
        let masked = mask("email jane@example.com please");
        assert!(masked.contains("[REDACTED:email]"));
        assert!(masked.contains("email"));
        assert!(masked.contains("please"));
        assert!(!masked.contains("jane@example.com"));
    }

    #[test]
    fn mask_redacts_address_and_name() {
        let masked = mask("Dr. Alice Chen lives at 94107-1234");
        assert!(masked.contains("[REDACTED:name_like]"));
        assert!(masked.contains("[REDACTED:address]"));
    }
}
