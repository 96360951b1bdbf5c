use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Configuration for the mask policy
///
/// All structural knobs are fixed at policy construction; the config is
/// read-only afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaskPolicyConfig {
    /// Widths of the hidden layers, in order
    pub hidden_sizes: Vec<usize>,

    /// Number of observation features fed to the network
    pub obs_features: usize,

    /// Round the sigmoid output to a hard {0, 1} mask
    pub round_output: bool,

    /// Seed for the throwaway shape-template initialization
    ///
    /// Only used once at construction to discover the parameter layout;
    /// never used for inference weights.
    pub template_seed: u64,

    /// Number of rayon worker threads for the batched forward pass
    ///
    /// `None` uses the global rayon pool.
    pub parallel_threads: Option<usize>,
}

impl Default for MaskPolicyConfig {
    fn default() -> Self {
        Self {
            hidden_sizes: vec![10, 100],
            obs_features: 1,
            round_output: true,
            template_seed: 0,
            parallel_threads: None,
        }
    }
}

impl MaskPolicyConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.hidden_sizes.is_empty() {
            return Err(Error::config("hidden_sizes must not be empty"));
        }
        if let Some(width) = self.hidden_sizes.iter().find(|&&w| w == 0) {
            return Err(Error::config(format!(
                "hidden layer width must be positive, got {}",
                width
            )));
        }
        if self.obs_features == 0 {
            return Err(Error::config("obs_features must be positive"));
        }
        if self.parallel_threads == Some(0) {
            return Err(Error::config("parallel_threads must be positive when set"));
        }
        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: MaskPolicyConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn to_file(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
