//! Engine configuration options.

use crate::pricing::PricingParams;

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Market maker quote parameters.
    pub pricing: PricingParams,
    /// Maximum number of audit events to retain in memory.
    pub max_events: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pricing: PricingParams::default(),
            max_events: 100_000,
        }
    }
}
