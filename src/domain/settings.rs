//! User preference record stored under the `settings` key.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PATTERN_SUGGESTIONS: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default = "Settings::default_currency")]
    pub currency_symbol: String,
    #[serde(default = "Settings::default_account")]
    pub default_account: String,
    #[serde(default = "Settings::default_suggestions")]
    pub pattern_suggestions: usize,
}

impl Settings {
    fn default_currency() -> String {
        "€".to_string()
    }

    fn default_account() -> String {
        "bank".to_string()
    }

    fn default_suggestions() -> usize {
        DEFAULT_PATTERN_SUGGESTIONS
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            currency_symbol: Self::default_currency(),
            default_account: Self::default_account(),
            pattern_suggestions: Self::default_suggestions(),
        }
    }
}
