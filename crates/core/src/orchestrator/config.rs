//! Orchestrator configuration.

use serde::{Deserialize, Serialize};

use super::state::TransitionLimits;

/// Configuration for the transfer orchestrator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Maximum continuation cycles per transfer.
    /// Unset means the worker may ask to continue indefinitely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_resumptions: Option<u32>,
}

impl OrchestratorConfig {
    pub fn limits(&self) -> TransitionLimits {
        TransitionLimits {
            max_resumptions: self.max_resumptions,
        }
    }
}
