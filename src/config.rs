/// Detector configuration
///
/// Loaded from `KD_*` environment variables or a JSON file. Missing fields
/// fall back to the defaults below.

use crate::endpoint::Endpoint;
use crate::error::DetectorError;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Default capture rate of the voice endpoint
pub const DEFAULT_SAMPLE_RATE: u32 = 16000;

/// Audio format hint handed to `initialize`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamFormat {
    pub sample_rate: u32,
    pub channels: u8,
}

impl Default for StreamFormat {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: 1,
        }
    }
}

impl StreamFormat {
    pub fn validate(&self) -> Result<(), DetectorError> {
        if self.sample_rate == 0 {
            return Err(DetectorError::InvalidConfig(
                "sample_rate must be greater than 0".to_string()
            ));
        }

        if self.channels == 0 {
            return Err(DetectorError::InvalidConfig(
                "channels must be greater than 0".to_string()
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Sound card index
    pub card: i32,

    /// Device index on the card
    pub device: i32,

    /// Capture sample rate (Hz)
    pub sample_rate: u32,

    /// Capture channel count
    pub channels: u8,

    /// How long one detection attempt waits for a keyword (seconds)
    pub timeout_secs: u64,

    /// Pause between polls (milliseconds, 0 = yield only)
    pub poll_interval_ms: u64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            card: 0,
            device: 0,
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: 1,
            timeout_secs: 5,
            poll_interval_ms: 0,
        }
    }
}

impl DetectorConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), DetectorError> {
        if self.card < 0 || self.device < 0 {
            return Err(DetectorError::InvalidConfig(format!(
                "card and device must be non-negative, got {}/{}",
                self.card, self.device
            )));
        }

        self.format().validate()
    }

    /// Build from `KD_*` environment variables on top of the defaults
    pub fn from_env() -> Result<Self, DetectorError> {
        let mut config = Self::default();

        if let Some(card) = env_var("KD_CARD")? {
            config.card = card;
        }
        if let Some(device) = env_var("KD_DEVICE")? {
            config.device = device;
        }
        if let Some(rate) = env_var("KD_SAMPLE_RATE")? {
            config.sample_rate = rate;
        }
        if let Some(channels) = env_var("KD_CHANNELS")? {
            config.channels = channels;
        }
        if let Some(timeout) = env_var("KD_TIMEOUT_SECS")? {
            config.timeout_secs = timeout;
        }
        if let Some(interval) = env_var("KD_POLL_INTERVAL_MS")? {
            config.poll_interval_ms = interval;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, DetectorError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| {
            DetectorError::InvalidConfig(format!("cannot read {}: {}", path.display(), e))
        })?;

        let config: Self = serde_json::from_str(&raw).map_err(|e| {
            DetectorError::InvalidConfig(format!("cannot parse {}: {}", path.display(), e))
        })?;

        config.validate()?;
        Ok(config)
    }

    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.card, self.device)
    }

    pub fn format(&self) -> StreamFormat {
        StreamFormat {
            sample_rate: self.sample_rate,
            channels: self.channels,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn env_var<T: FromStr>(name: &str) -> Result<Option<T>, DetectorError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| DetectorError::InvalidConfig(format!("{}={:?}: {}", name, raw, e))),
        Err(_) => Ok(None),
    }
}
