//! Gate configuration with environment overrides.

use std::num::NonZeroUsize;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use crate::error::ConfigError;
use crate::gate::Gate;

pub const LIMIT_ENV: &str = "ADMIT_LIMIT";
pub const PROGRESS_INTERVAL_ENV: &str = "ADMIT_PROGRESS_INTERVAL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Maximum number of concurrently admitted operations.
    pub limit: usize,
    /// How often [`ProgressReporter`](crate::ProgressReporter) logs the live count.
    #[serde(with = "duration_secs")]
    pub progress_interval: Duration,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            limit: 20,
            progress_interval: Duration::from_secs(5),
        }
    }
}

impl GateConfig {
    /// Defaults overridden by `ADMIT_LIMIT` and `ADMIT_PROGRESS_INTERVAL` (seconds).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup(LIMIT_ENV) {
            config.limit = value.trim().parse().map_err(|_| ConfigError::Parse {
                var: LIMIT_ENV,
                value: value.clone(),
            })?;
        }

        if let Some(value) = lookup(PROGRESS_INTERVAL_ENV) {
            config.progress_interval = value
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
                .ok_or_else(|| ConfigError::Parse {
                    var: PROGRESS_INTERVAL_ENV,
                    value: value.clone(),
                })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check `limit` is within `1..=Semaphore::MAX_PERMITS`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.limit == 0 {
            return Err(ConfigError::InvalidLimit);
        }
        if self.limit > Semaphore::MAX_PERMITS {
            return Err(ConfigError::LimitTooLarge {
                max: Semaphore::MAX_PERMITS,
            });
        }
        Ok(())
    }

    /// Validate, then construct a gate with `limit` slots.
    pub fn build(&self) -> Result<Gate, ConfigError> {
        self.validate()?;
        let capacity = NonZeroUsize::new(self.limit).ok_or(ConfigError::InvalidLimit)?;
        Ok(Gate::new(capacity))
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
