//! Simulation configuration.
//!
//! Configuration-driven network construction, loadable from JSON.

use crate::core::{Error, Result};
use crate::federated::PredictorConfig;
use crate::sensor::PatternClass;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Names and classes of the standard three-sensor network.
const STANDARD_SENSORS: [(&str, &str); 3] = [
    ("Factory Floor", "factory"),
    ("Office Building", "office"),
    ("Outdoor Area", "outdoor"),
];

/// Noise sources of the signal generator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    /// Std-dev of per-reading measurement noise
    pub reading_std: f64,
    /// Whether base temperatures are drawn around the class mean
    pub base_jitter: bool,
    /// Std-dev of the generic event bump
    pub event_std: f64,
}

impl NoiseConfig {
    /// Zero-variance mode: every noise source collapses to its mean.
    pub fn disabled() -> Self {
        Self {
            reading_std: 0.0,
            base_jitter: false,
            event_std: 0.0,
        }
    }
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            reading_std: 0.5,
            base_jitter: true,
            event_std: 0.2,
        }
    }
}

/// One sensor to place in the network.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SensorSpec {
    /// Display name, also the pattern library key
    pub name: String,
    /// Grid position
    pub location: (f64, f64),
    /// Pattern class name (factory, office, outdoor, custom)
    pub class: String,
    /// Fixed base temperature, overriding the class draw
    #[serde(default)]
    pub base_temperature: Option<f64>,
}

impl SensorSpec {
    /// Create a spec with a class-drawn base temperature.
    pub fn new(name: &str, location: (f64, f64), class: &str) -> Self {
        Self {
            name: name.to_string(),
            location,
            class: class.to_string(),
            base_temperature: None,
        }
    }

    /// Pin the base temperature.
    pub fn with_base_temperature(mut self, base_temperature: f64) -> Self {
        self.base_temperature = Some(base_temperature);
        self
    }

    /// Parse the class name.
    pub fn pattern_class(&self) -> Result<PatternClass> {
        self.class.parse()
    }
}

/// Full simulation configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seed for all sensor random sources; entropy when absent
    pub seed: Option<u64>,
    /// Noise sources
    pub noise: NoiseConfig,
    /// Per-sensor predictor
    pub predictor: PredictorConfig,
    /// Trailing window for pattern learning (hours)
    pub pattern_window: usize,
    /// Hours between health reports
    pub report_interval: u32,
    /// Forecast the next reading after every tick
    pub forecast_each_tick: bool,
    /// Sensors, in update order
    pub sensors: Vec<SensorSpec>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: None,
            noise: NoiseConfig::default(),
            predictor: PredictorConfig::default(),
            pattern_window: 24,
            report_interval: 10,
            forecast_each_tick: false,
            sensors: Self::standard_sensors(STANDARD_SENSORS.len()),
        }
    }
}

impl SimulationConfig {
    /// Load and validate a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Replace the sensor list with `count` standard sensors.
    pub fn with_sensor_count(mut self, count: usize) -> Self {
        self.sensors = Self::standard_sensors(count);
        self
    }

    /// Set the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the noise sources.
    pub fn with_noise(mut self, noise: NoiseConfig) -> Self {
        self.noise = noise;
        self
    }

    /// Cycle through the standard classes; repeats get an ordinal suffix.
    fn standard_sensors(count: usize) -> Vec<SensorSpec> {
        (0..count)
            .map(|i| {
                let (name, class) = STANDARD_SENSORS[i % STANDARD_SENSORS.len()];
                let round = i / STANDARD_SENSORS.len();
                let name = if round == 0 {
                    name.to_string()
                } else {
                    format!("{} {}", name, round + 1)
                };
                SensorSpec::new(&name, (i as f64, 0.0), class)
            })
            .collect()
    }

    /// Check the configuration for structural errors.
    pub fn validate(&self) -> Result<()> {
        if self.sensors.is_empty() {
            return Err(Error::InvalidConfiguration(
                "at least one sensor is required".to_string(),
            ));
        }
        if self.pattern_window == 0 || self.predictor.window == 0 {
            return Err(Error::InvalidConfiguration(
                "windows must be positive".to_string(),
            ));
        }
        if self.report_interval == 0 {
            return Err(Error::InvalidConfiguration(
                "report interval must be positive".to_string(),
            ));
        }
        if !(self.predictor.learning_rate.is_finite() && self.predictor.learning_rate > 0.0) {
            return Err(Error::InvalidConfiguration(format!(
                "learning rate must be positive, got {}",
                self.predictor.learning_rate
            )));
        }
        for std in [self.noise.reading_std, self.noise.event_std] {
            if !(std.is_finite() && std >= 0.0) {
                return Err(Error::InvalidConfiguration(format!(
                    "noise std-dev must be non-negative, got {}",
                    std
                )));
            }
        }

        let mut names = std::collections::HashSet::new();
        for spec in &self.sensors {
            spec.pattern_class()?;
            if let Some(base) = spec.base_temperature {
                if !base.is_finite() {
                    return Err(Error::InvalidConfiguration(format!(
                        "sensor {} has non-finite base temperature",
                        spec.name
                    )));
                }
            }
            if !names.insert(spec.name.as_str()) {
                return Err(Error::InvalidConfiguration(format!(
                    "duplicate sensor name: {}",
                    spec.name
                )));
            }
        }

        Ok(())
    }
}
