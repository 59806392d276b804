use std::time::Duration;

use crate::coordinator::DEFAULT_SAVE_TIMEOUT;

pub const SAVE_TIMEOUT_VAR: &str = "AUTOSHOP_SAVE_TIMEOUT_MS";

/// Wizard session settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardConfig {
    /// How long `next()` waits for the mounted step to answer a save.
    pub save_timeout: Duration,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            save_timeout: DEFAULT_SAVE_TIMEOUT,
        }
    }
}

impl WizardConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Unset or malformed values fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let save_timeout = match lookup(SAVE_TIMEOUT_VAR) {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => Duration::from_millis(ms),
                _ => {
                    tracing::warn!(value = %raw, "invalid {SAVE_TIMEOUT_VAR}; using default");
                    DEFAULT_SAVE_TIMEOUT
                }
            },
            None => DEFAULT_SAVE_TIMEOUT,
        };
        Self { save_timeout }
    }
}
