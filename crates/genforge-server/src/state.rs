//! Shared application state.

use genforge_core::ForgeConfig;
use genforge_runtime::Orchestrator;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: ForgeConfig,
    pub orchestrator: Orchestrator,
}

impl AppState {
    pub fn new(config: ForgeConfig, orchestrator: Orchestrator) -> Self {
        Self {
            config,
            orchestrator,
        }
    }
}
