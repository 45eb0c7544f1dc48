//! Bakery configuration.
//!
//! All fields have defaults, so an empty JSON object is a valid document.

use crate::core::StageName;
use crate::durations::StageTiming;
use crate::errors::ConfigError;
use crate::pipeline::RestartPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Environment variable overriding [`BakeryConfig::time_unit_ms`].
pub const ENV_TIME_UNIT_MS: &str = "BAKEFLOW_TIME_UNIT_MS";
/// Environment variable overriding [`BakeryConfig::burnt_threshold`].
pub const ENV_BURNT_THRESHOLD: &str = "BAKEFLOW_BURNT_THRESHOLD";
/// Environment variable overriding [`RestartPolicy::max_restarts`].
pub const ENV_MAX_RESTARTS: &str = "BAKEFLOW_MAX_RESTARTS";
/// Environment variable overriding [`BakeryConfig::seed`].
pub const ENV_SEED: &str = "BAKEFLOW_SEED";

/// Configuration for a [`Bakery`](crate::pipeline::Bakery).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BakeryConfig {
    /// Wall-clock length of one duration unit, in milliseconds.
    #[serde(default = "default_time_unit_ms")]
    pub time_unit_ms: u64,
    /// Make stage range.
    #[serde(default = "default_make")]
    pub make: StageTiming,
    /// Bake stage range.
    #[serde(default = "default_bake")]
    pub bake: StageTiming,
    /// Pack stage range.
    #[serde(default = "default_pack")]
    pub pack: StageTiming,
    /// Bake durations at or above this burn the item.
    #[serde(default = "default_burnt_threshold")]
    pub burnt_threshold: u64,
    /// What to do after a burnt bake.
    #[serde(default)]
    pub restart: RestartPolicy,
    /// Seed for the random duration source.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_time_unit_ms() -> u64 {
    1000
}

fn default_make() -> StageTiming {
    StageTiming::new(1, 2)
}

fn default_bake() -> StageTiming {
    StageTiming::new(3, 8)
}

fn default_pack() -> StageTiming {
    StageTiming::fixed(1)
}

fn default_burnt_threshold() -> u64 {
    8
}

impl Default for BakeryConfig {
    fn default() -> Self {
        Self {
            time_unit_ms: default_time_unit_ms(),
            make: default_make(),
            bake: default_bake(),
            pack: default_pack(),
            burnt_threshold: default_burnt_threshold(),
            restart: RestartPolicy::default(),
            seed: None,
        }
    }
}

impl BakeryConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the time unit.
    #[must_use]
    pub fn with_time_unit(mut self, unit: Duration) -> Self {
        self.time_unit_ms = u64::try_from(unit.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Sets the range of one stage.
    #[must_use]
    pub fn with_timing(mut self, stage: StageName, timing: StageTiming) -> Self {
        match stage {
            StageName::Make => self.make = timing,
            StageName::Bake => self.bake = timing,
            StageName::Pack => self.pack = timing,
        }
        self
    }

    /// Sets the burnt threshold.
    #[must_use]
    pub fn with_burnt_threshold(mut self, threshold: u64) -> Self {
        self.burnt_threshold = threshold;
        self
    }

    /// Sets the restart policy.
    #[must_use]
    pub fn with_restart(mut self, restart: RestartPolicy) -> Self {
        self.restart = restart;
        self
    }

    /// Sets the random seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// The wall-clock length of one time unit.
    #[must_use]
    pub fn time_unit(&self) -> Duration {
        Duration::from_millis(self.time_unit_ms)
    }

    /// The range configured for `stage`.
    #[must_use]
    pub fn timing(&self, stage: StageName) -> StageTiming {
        match stage {
            StageName::Make => self.make,
            StageName::Bake => self.bake,
            StageName::Pack => self.pack,
        }
    }

    /// Returns true if a bake of `units` burns the item.
    #[must_use]
    pub fn is_burnt(&self, units: u64) -> bool {
        units >= self.burnt_threshold
    }

    /// Checks ranges and the threshold.
    ///
    /// With unbounded restarts at least one bake duration must stay below
    /// the threshold.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for stage in StageName::ORDER {
            let timing = self.timing(stage);
            if !timing.is_valid() {
                return Err(ConfigError::InvertedRange {
                    stage,
                    min: timing.min,
                    max: timing.max,
                });
            }
        }
        if self.burnt_threshold == 0 {
            return Err(ConfigError::ZeroThreshold);
        }
        if self.restart.max_restarts.is_none() && self.burnt_threshold <= self.bake.min {
            return Err(ConfigError::AlwaysBurnt {
                threshold: self.burnt_threshold,
                bake_min: self.bake.min,
            });
        }
        Ok(())
    }

    /// Parses and validates a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Applies `BAKEFLOW_*` environment overrides and re-validates.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|var| std::env::var(var).ok())
    }

    /// Applies overrides from an arbitrary variable lookup.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = parse_var(&lookup, ENV_TIME_UNIT_MS)? {
            self.time_unit_ms = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_BURNT_THRESHOLD)? {
            self.burnt_threshold = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_MAX_RESTARTS)? {
            self.restart.max_restarts = Some(v);
        }
        if let Some(v) = parse_var(&lookup, ENV_SEED)? {
            self.seed = Some(v);
        }
        self.validate()?;
        Ok(self)
    }
}

fn parse_var<T, F>(lookup: &F, var: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(var) else {
        return Ok(None);
    };
    raw.trim()
        .parse()
        .map(Some)
        .map_err(|_| ConfigError::InvalidEnv {
            var: var.to_string(),
            value: raw,
        })
}
