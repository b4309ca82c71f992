use crate::error::{Result, TipError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub log_level: String,
    pub currency: String,
    pub preset_tips: Vec<u64>,
    pub default_tip: u64,
    /// Upper bound on a single gateway call before the session gives up.
    pub request_timeout_secs: u64,
    pub simulator: SimulatorConfig,
    pub backend: BackendConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SimulatorConfig {
    pub delay_ms: u64,
    pub success_rate: f64,
    /// Fixed RNG seed; random when absent.
    pub seed: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct BackendConfig {
    pub listen_addr: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            currency: "KES".to_string(),
            preset_tips: vec![50, 100, 200, 500],
            default_tip: 100,
            request_timeout_secs: 30,
            simulator: SimulatorConfig::default(),
            backend: BackendConfig::default(),
        }
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            delay_ms: 2500,
            success_rate: 0.8,
            seed: None,
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from a YAML file, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let content = fs::read_to_string(path)?;
                serde_yaml::from_str(&content)?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.simulator.success_rate) {
            return Err(TipError::Config(format!(
                "simulator.success_rate must be within [0, 1], got {}",
                self.simulator.success_rate
            )));
        }
        if self.preset_tips.iter().any(|tip| *tip < 1) || self.default_tip < 1 {
            return Err(TipError::Config(
                "tip amounts must be at least 1".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(TipError::Config(
                "request_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Payment provider credentials, read from the environment by the backend.
#[derive(Clone)]
pub struct ProviderCredentials {
    pub consumer_key: String,
    pub consumer_secret: String,
}

impl fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderCredentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .finish()
    }
}
