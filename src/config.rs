use crate::types::SurfaceParams;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Driver configuration - surface defaults and activation retry policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Attributes used when a canvas gets its first context
    pub surface: SurfaceParams,
    /// Extra attempts for activations that fail with a not-yet-realized surface
    pub activation_retries: u32,
    /// Pause between those attempts
    pub retry_backoff_ms: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            surface: SurfaceParams::default(),
            activation_retries: 0,
            retry_backoff_ms: 5,
        }
    }
}

impl DriverConfig {
    /// Load configuration from a JSON file; missing fields fall back to defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_json_str(&text)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}
