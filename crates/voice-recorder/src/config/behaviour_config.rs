use crate::config::{default_disabled, default_max_duration_secs};

use serde::{Deserialize, Serialize};

/// Recorder behavior configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehaviourConfig {
    /// Stop automatically after this many recorded seconds (0 = unlimited).
    #[serde(default = "default_max_duration_secs")]
    pub max_duration_secs: u64,

    /// Ignore every recording command.
    #[serde(default = "default_disabled")]
    pub disabled: bool,
}

impl Default for BehaviourConfig {
    fn default() -> Self {
        Self {
            max_duration_secs: default_max_duration_secs(),
            disabled: default_disabled(),
        }
    }
}
