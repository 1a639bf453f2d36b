//! Explicit CORS allow-list. A bare `*` entry is ignored for safety
//! rather than treated as "allow everything" — wildcard origins must
//! never be honored.

#[derive(Debug, Clone, Default)]
pub struct CorsAllowList {
    origins: Vec<String>,
}

impl CorsAllowList {
    /// Build the list from a comma-separated origins string (as read from
    /// `VERITAS_CORS_ALLOW_ORIGINS`), dropping any bare `*` entry.
    pub fn from_env_value(value: &str) -> Self {
        let origins = value
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty() && *o != "*")
            .map(str::to_string)
            .collect();
        CorsAllowList { origins }
    }

    pub fn is_allowed(&self, origin: &str) -> bool {
        self.origins.iter().any(|o| o == origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_entry_is_dropped() {
        let list = CorsAllowList::from_env_value("https://a.example, *, https://b.example");
        assert!(!list.is_allowed("https://random.example"));
        assert!(list.is_allowed("https://a.example"));
        assert!(list.is_allowed("https://b.example"));
    }

    #[test]
    fn empty_value_allows_nothing() {
        let list = CorsAllowList::from_env_value("");
        assert!(!list.is_allowed("https://a.example"));
    }
}
