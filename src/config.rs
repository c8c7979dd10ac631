// Engine Configuration - execution limits for chained automation and workflows

use std::env;

/// Tunable limits for both engines.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Ceiling on automation-triggered-automation cascades per call chain.
    pub max_chain_depth: u32,
    /// Safety cap on synchronously chained workflow steps per `advance` call,
    /// so a malformed cyclic definition cannot spin forever.
    pub max_chained_steps: u32,
}

impl EngineConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(EngineConfig {
            max_chain_depth: env::var("TRELLIS_MAX_CHAIN_DEPTH")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap_or(5),
            max_chained_steps: env::var("TRELLIS_MAX_CHAINED_STEPS")
                .unwrap_or_else(|_| "25".to_string())
                .parse()
                .unwrap_or(25),
        })
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_chain_depth: 5,
            max_chained_steps: 25,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_chain_depth, 5);
        assert_eq!(config.max_chained_steps, 25);
    }
}
