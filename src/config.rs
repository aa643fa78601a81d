use anyhow::Result;
use serde::Deserialize;

use crate::capture::CaptureConstraints;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub channel: ChannelConfig,
    #[serde(default)]
    pub backend: BackendConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "signstream".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CaptureConfig {
    pub sample_rate: u32,
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            echo_cancellation: true,
            noise_suppression: true,
        }
    }
}

impl From<&CaptureConfig> for CaptureConstraints {
    fn from(cfg: &CaptureConfig) -> Self {
        Self {
            echo_cancellation: cfg.echo_cancellation,
            noise_suppression: cfg.noise_suppression,
            sample_rate: cfg.sample_rate,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChannelConfig {
    pub nats_url: String,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            nats_url: "nats://localhost:4222".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BackendConfig {
    pub base_url: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a named file; a missing file yields the
    /// defaults.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

/// Fresh session identifier for callers that do not supply one.
pub fn default_session_id() -> String {
    format!("session-{}", uuid::Uuid::new_v4())
}
