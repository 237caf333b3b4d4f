//! Simulated temperature sensor with local pattern learning.

use crate::core::{Error, NoiseConfig, Result, SensorSpec};
use crate::federated::{PredictorConfig, PredictorMetrics, SequencePredictor};
use crate::sensor::pattern::{EventPattern, PatternClass};
use crate::sensor::privacy::{PrivacySnapshot, PrivacyTracker};
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Default trailing window for pattern learning.
pub const DEFAULT_PATTERN_WINDOW: usize = 24;

/// Accuracy before any forecast has been scored.
const INITIAL_ACCURACY: f64 = 0.5;

/// Amplitude of the daily temperature cycle.
const DAILY_AMPLITUDE: f64 = 3.0;

/// Statistics learned over the trailing window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LearnedPatterns {
    /// (min, max) over the window
    pub daily_range: (f64, f64),
    /// Population variance
    pub variance: f64,
    /// Least-squares slope per hour
    pub trend: f64,
    /// Window indices more than one std-dev above the mean
    pub peak_hours: Vec<usize>,
}

impl LearnedPatterns {
    /// Derive statistics from a non-empty window.
    fn from_window(data: &[f64]) -> Self {
        let n = data.len() as f64;
        let mean = data.iter().sum::<f64>() / n;
        let variance = data.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let std = variance.sqrt();

        let min = data.iter().copied().fold(f64::INFINITY, f64::min);
        let max = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let peak_hours = data
            .iter()
            .enumerate()
            .filter(|(_, v)| **v > mean + std)
            .map(|(i, _)| i)
            .collect();

        Self {
            daily_range: (min, max),
            variance,
            trend: linear_slope(data, mean),
            peak_hours,
        }
    }
}

/// Slope of the degree-1 least-squares fit of value against index.
fn linear_slope(data: &[f64], mean: f64) -> f64 {
    let x_mean = (data.len() as f64 - 1.0) / 2.0;
    let (mut num, mut den) = (0.0, 0.0);
    for (i, v) in data.iter().enumerate() {
        let dx = i as f64 - x_mean;
        num += dx * (v - mean);
        den += dx * dx;
    }
    if den > 0.0 {
        num / den
    } else {
        0.0
    }
}

/// Everything a sensor reports upstream.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SensorMetrics {
    pub privacy: PrivacySnapshot,
    /// Latest smoothed accuracy
    pub accuracy: f64,
    pub training: PredictorMetrics,
    pub patterns: Option<LearnedPatterns>,
}

/// A simulated sensor.
///
/// Owns its event table, privacy tracker, predictor and random source.
#[derive(Debug)]
pub struct Sensor {
    name: String,
    location: (f64, f64),
    base_temperature: f64,
    pattern: EventPattern,
    privacy: PrivacyTracker,
    predictor: SequencePredictor,
    temperature_history: Vec<f64>,
    prediction_history: Vec<f64>,
    accuracy_history: Vec<f64>,
    learned_patterns: Option<LearnedPatterns>,
    /// Index of the reading the latest unscored forecast targets
    pending_forecast: Option<usize>,
    reading_noise: Normal<f64>,
    rng: StdRng,
}

impl Sensor {
    /// Create a sensor with default noise and predictor settings.
    pub fn new(name: &str, location: (f64, f64), pattern_class: PatternClass, rng: StdRng) -> Result<Self> {
        let spec = SensorSpec::new(name, location, &pattern_class.to_string());
        Self::from_spec(&spec, &NoiseConfig::default(), PredictorConfig::default(), rng)
    }

    /// Create a sensor from its configuration.
    ///
    /// Fails on an unknown pattern class or invalid noise settings.
    pub fn from_spec(
        spec: &SensorSpec,
        noise: &NoiseConfig,
        predictor: PredictorConfig,
        mut rng: StdRng,
    ) -> Result<Self> {
        let pattern_class = spec.pattern_class()?;
        let pattern = EventPattern::new(pattern_class, noise.event_std)?;
        let reading_noise = Normal::new(0.0, noise.reading_std).map_err(|e| {
            Error::InvalidConfiguration(format!("reading noise {}: {}", noise.reading_std, e))
        })?;

        let base_temperature = match spec.base_temperature {
            Some(base) => base,
            None => {
                let (mean, std) = pattern_class.base_temperature();
                if noise.base_jitter {
                    Normal::new(mean, std)
                        .map_err(|e| Error::Internal(e.to_string()))?
                        .sample(&mut rng)
                } else {
                    mean
                }
            }
        };

        tracing::debug!(sensor = %spec.name, class = %pattern_class, base_temperature, "sensor created");

        Ok(Self {
            name: spec.name.clone(),
            location: spec.location,
            base_temperature,
            pattern,
            privacy: PrivacyTracker::new(),
            predictor: SequencePredictor::new(predictor),
            temperature_history: Vec::new(),
            prediction_history: Vec::new(),
            accuracy_history: vec![INITIAL_ACCURACY],
            learned_patterns: None,
            pending_forecast: None,
            reading_noise,
            rng,
        })
    }

    /// Generate, record and learn from the reading for `hour`.
    pub fn generate_temperature(&mut self, hour: u32) -> f64 {
        let daily = DAILY_AMPLITUDE * (2.0 * PI * hour as f64 / 24.0).sin();
        let events = self.pattern.get_event_impact(hour as i64, &mut self.rng);
        let noise = self.reading_noise.sample(&mut self.rng);

        let temperature = self.base_temperature + daily + events + noise;
        self.record_temperature(temperature);
        temperature
    }

    /// Append an observed reading and retrain the predictor on the full history.
    pub fn record_temperature(&mut self, temperature: f64) {
        self.temperature_history.push(temperature);
        self.predictor.train(&self.temperature_history);
    }

    /// Learn statistics over the trailing `window` readings.
    ///
    /// Returns `None` without touching any state when fewer than `window`
    /// readings exist. A pending forecast is scored once, against the reading
    /// that followed it.
    pub fn learn_patterns(&mut self, window: usize) -> Option<LearnedPatterns> {
        if window == 0 || self.temperature_history.len() < window {
            return None;
        }

        let recent = &self.temperature_history[self.temperature_history.len() - window..];
        let patterns = LearnedPatterns::from_window(recent);

        if let Some(target) = self.pending_forecast {
            if let (Some(actual), Some(predicted)) =
                (self.temperature_history.get(target), self.prediction_history.last())
            {
                let mean = recent.iter().sum::<f64>() / recent.len() as f64;
                let accuracy = if mean.abs() > f64::EPSILON {
                    (1.0 - (predicted - actual).abs() / mean.abs()).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let previous = self.accuracy();
                self.accuracy_history.push(0.9 * previous + 0.1 * accuracy);
                self.pending_forecast = None;
            }
        }

        self.learned_patterns = Some(patterns.clone());
        Some(patterns)
    }

    /// Forecast the next reading.
    ///
    /// Falls back to the latest reading (or the base temperature before any
    /// reading) while the predictor lacks history.
    pub fn predict_next_temperature(&mut self) -> f64 {
        match self.predictor.predict(&self.temperature_history) {
            Some(prediction) => {
                self.prediction_history.push(prediction);
                self.pending_forecast = Some(self.temperature_history.len());
                prediction
            }
            None => self
                .temperature_history
                .last()
                .copied()
                .unwrap_or(self.base_temperature),
        }
    }

    /// Record one observation with the privacy tracker.
    pub fn update_privacy(&mut self, value: f64, pattern_derived: bool) {
        self.privacy.update(value, pattern_derived);
    }

    /// Add or overwrite an event in this sensor's pattern.
    pub fn add_custom_event(&mut self, name: &str, start_hour: u32, duration: u32) -> Result<()> {
        self.pattern.add_custom_event(name, start_hour, duration)
    }

    /// Bundle privacy, accuracy, training and pattern metrics.
    pub fn get_metrics(&self) -> SensorMetrics {
        SensorMetrics {
            privacy: self.privacy.snapshot(),
            accuracy: self.accuracy(),
            training: self.predictor.metrics(),
            patterns: self.learned_patterns.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> (f64, f64) {
        self.location
    }

    pub fn pattern_class(&self) -> PatternClass {
        self.pattern.pattern_class
    }

    pub fn base_temperature(&self) -> f64 {
        self.base_temperature
    }

    pub fn pattern(&self) -> &EventPattern {
        &self.pattern
    }

    pub fn privacy(&self) -> &PrivacyTracker {
        &self.privacy
    }

    pub fn predictor(&self) -> &SequencePredictor {
        &self.predictor
    }

    pub fn temperature_history(&self) -> &[f64] {
        &self.temperature_history
    }

    pub fn prediction_history(&self) -> &[f64] {
        &self.prediction_history
    }

    pub fn accuracy_history(&self) -> &[f64] {
        &self.accuracy_history
    }

    /// Latest smoothed accuracy.
    pub fn accuracy(&self) -> f64 {
        self.accuracy_history.last().copied().unwrap_or(INITIAL_ACCURACY)
    }

    pub fn learned_patterns(&self) -> Option<&LearnedPatterns> {
        self.learned_patterns.as_ref()
    }
}
