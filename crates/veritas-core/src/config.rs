//! Runtime configuration, sourced from environment variables, read once at
//! startup into a typed value and passed by reference from there on.

use veritas_contracts::healing::HealingBudget;

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(v) => !matches!(v.trim().to_lowercase().as_str(), "0" | "false" | "no" | "off"),
        Err(_) => default,
    }
}

/// Orchestrator-wide configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub self_healing_enabled: bool,
    pub healing_budget: HealingBudget,
    pub fast_mode_default: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            self_healing_enabled: env_bool("VERITAS_SELF_HEALING_ENABLED", true),
            healing_budget: HealingBudget {
                max_attempts: env_u32("VERITAS_MAX_HEALING_ATTEMPTS", 3),
                max_steps: env_u32("VERITAS_HEALING_MAX_STEPS", 6),
                max_seconds: env_f64("VERITAS_HEALING_MAX_SECONDS", 20.0),
                max_same_error: env_u32("VERITAS_HEALING_MAX_SAME_ERROR", 2),
            },
            fast_mode_default: env_bool("VERITAS_FAST_MODE_DEFAULT", false),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_constants() {
        let config = Config {
            self_healing_enabled: true,
            healing_budget: HealingBudget {
                max_attempts: 3,
                max_steps: 6,
                max_seconds: 20.0,
                max_same_error: 2,
            },
            fast_mode_default: false,
        };
        assert_eq!(config.healing_budget.max_attempts, 3);
        assert_eq!(config.healing_budget.max_seconds, 20.0);
    }
}
