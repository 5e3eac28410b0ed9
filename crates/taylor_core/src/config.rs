use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::derivatives::RigidityScaling;
use crate::error::TrackError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepMethod {
    /// Six-term Taylor expansion from the field partials.
    #[default]
    Taylor,
    /// Classic RK4 on the order-0 field, for cross-checking.
    Rk4,
}

/// Settings for a [`Tracker`](crate::tracker::Tracker).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerSettings {
    pub max_steps: usize,
    /// Arc-length step in metres.
    pub step_size: f64,
    pub method: StepMethod,
    pub rigidity_scaling: RigidityScaling,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            max_steps: 1000,
            step_size: 1e-3,
            method: StepMethod::Taylor,
            rigidity_scaling: RigidityScaling::Full,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse tracker settings: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize tracker settings: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid tracker settings: {0}")]
    Invalid(#[from] TrackError),
}

impl TrackerSettings {
    pub fn validate(&self) -> Result<(), TrackError> {
        if !self.step_size.is_finite() {
            return Err(TrackError::InvalidStepSize {
                step_size: self.step_size,
            });
        }
        Ok(())
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let settings: Self = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Loads settings from `path`, falling back to defaults if the file is
    /// missing or invalid.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(settings) => settings,
            Err(ConfigError::Io { .. }) => {
                info!("Tracker settings {} not found. Using defaults.", path.display());
                Self::default()
            }
            Err(e) => {
                warn!("{} in {}. Using defaults.", e, path.display());
                Self::default()
            }
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}
