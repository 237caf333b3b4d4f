//! Sensor network coordinator.
//!
//! Drives one simulated hour per step across every sensor, collects the
//! patterns sensors choose to share and aggregates network health.

use crate::core::{now, Error, Result, SimulationConfig, StopSignal, Timestamp};
use crate::sensor::{LearnedPatterns, Sensor, SensorMetrics, DEFAULT_PATTERN_WINDOW};
use crate::visualization::VisualizationSink;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use uuid::Uuid;

/// Network-wide health summary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NetworkHealth {
    pub average_accuracy: f64,
    pub average_privacy: f64,
    pub active_sensors: usize,
    /// Fraction of sensors with an entry in the pattern library
    pub pattern_coverage: f64,
}

/// Everything the reporting layer consumes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NetworkMetrics {
    pub sensors: BTreeMap<String, SensorMetrics>,
    pub global_patterns: BTreeMap<String, LearnedPatterns>,
    pub network_health: NetworkHealth,
}

impl NetworkMetrics {
    /// Format as JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Health recorded at a report checkpoint.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HealthCheckpoint {
    pub hour: u32,
    pub health: NetworkHealth,
    pub recorded_at: Timestamp,
}

/// How a run ended.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    Completed,
    /// Stopped on request before `at_hour` was simulated
    Interrupted { at_hour: u32 },
}

/// Result of `run_simulation`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimulationReport {
    pub run_id: Uuid,
    pub hours_requested: u32,
    pub hours_completed: u32,
    pub checkpoints: Vec<HealthCheckpoint>,
    pub outcome: RunOutcome,
}

fn hour_overflow(from: u32, hours: u32) -> Error {
    Error::InvalidConfiguration(format!(
        "cannot advance {} hours past hour {}: hour counter exhausted",
        hours, from
    ))
}

/// Fixed collection of sensors advanced in lockstep.
pub struct Network<S: VisualizationSink> {
    run_id: Uuid,
    sensors: Vec<Sensor>,
    current_hour: Option<u32>,
    pattern_library: BTreeMap<String, LearnedPatterns>,
    pattern_window: usize,
    report_interval: u32,
    forecast_each_tick: bool,
    tick_interval: Duration,
    sink: S,
    stop: StopSignal,
}

impl<S: VisualizationSink> Network<S> {
    /// Create a network over pre-built sensors.
    pub fn new(sensors: Vec<Sensor>, sink: S) -> Result<Self> {
        if sensors.is_empty() {
            return Err(Error::InvalidConfiguration(
                "a network needs at least one sensor".to_string(),
            ));
        }

        Ok(Self {
            run_id: Uuid::new_v4(),
            sensors,
            current_hour: None,
            pattern_library: BTreeMap::new(),
            pattern_window: DEFAULT_PATTERN_WINDOW,
            report_interval: 10,
            forecast_each_tick: false,
            tick_interval: Duration::ZERO,
            sink,
            stop: StopSignal::new(),
        })
    }

    /// Build every configured sensor and the network around them.
    pub fn from_config(config: &SimulationConfig, sink: S) -> Result<Self> {
        config.validate()?;

        let sensors = config
            .sensors
            .iter()
            .enumerate()
            .map(|(i, spec)| {
                Sensor::from_spec(
                    spec,
                    &config.noise,
                    config.predictor.clone(),
                    crate::core::sensor_rng(config.seed, i),
                )
            })
            .collect::<Result<Vec<_>>>()?;

        let mut network = Self::new(sensors, sink)?;
        network.pattern_window = config.pattern_window;
        network.report_interval = config.report_interval;
        network.forecast_each_tick = config.forecast_each_tick;
        Ok(network)
    }

    /// Pause between simulated hours.
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Use an externally owned stop signal.
    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    /// Handle for requesting an early stop.
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn sensors(&self) -> &[Sensor] {
        &self.sensors
    }

    /// Mutable access to a sensor by name, e.g. to add custom events.
    pub fn sensor_mut(&mut self, name: &str) -> Option<&mut Sensor> {
        self.sensors.iter_mut().find(|s| s.name() == name)
    }

    /// Last simulated hour.
    pub fn current_hour(&self) -> Option<u32> {
        self.current_hour
    }

    /// Hour the next `update` must simulate.
    ///
    /// Fails once the hour counter is exhausted.
    pub fn next_hour(&self) -> Result<u32> {
        match self.current_hour {
            None => Ok(0),
            Some(current) => current.checked_add(1).ok_or_else(|| hour_overflow(current, 1)),
        }
    }

    pub fn pattern_library(&self) -> &BTreeMap<String, LearnedPatterns> {
        &self.pattern_library
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Simulate `hour` on every sensor, in order, then render.
    ///
    /// After the first update, `hour` must be exactly one past the last one.
    pub fn update(&mut self, hour: u32) -> Result<()> {
        if self.current_hour.is_some() {
            let expected = self.next_hour()?;
            if hour != expected {
                return Err(Error::HourOutOfSequence {
                    expected,
                    got: hour,
                });
            }
        }
        self.current_hour = Some(hour);

        for sensor in &mut self.sensors {
            let temperature = sensor.generate_temperature(hour);
            let patterns = sensor.learn_patterns(self.pattern_window);
            // Having a learned pattern is what counts as sharing
            let pattern_derived = patterns.is_some();
            sensor.update_privacy(temperature, pattern_derived);

            if self.forecast_each_tick {
                sensor.predict_next_temperature();
            }

            tracing::debug!(
                sensor = sensor.name(),
                hour,
                temperature,
                pattern_derived,
                "sensor updated"
            );

            if let Some(patterns) = patterns {
                self.pattern_library.insert(sensor.name().to_string(), patterns);
            }
        }

        self.sink.render(&self.sensors, hour)
    }

    /// Aggregate health across sensors.
    pub fn network_health(&self) -> NetworkHealth {
        let count = self.sensors.len();
        let n = count.max(1) as f64;

        NetworkHealth {
            average_accuracy: self.sensors.iter().map(|s| s.accuracy()).sum::<f64>() / n,
            average_privacy: self.sensors.iter().map(|s| s.privacy().score()).sum::<f64>() / n,
            active_sensors: count,
            pattern_coverage: self.pattern_library.len() as f64 / n,
        }
    }

    /// Per-sensor metrics, shared patterns and health.
    pub fn get_network_metrics(&self) -> NetworkMetrics {
        NetworkMetrics {
            sensors: self
                .sensors
                .iter()
                .map(|s| (s.name().to_string(), s.get_metrics()))
                .collect(),
            global_patterns: self.pattern_library.clone(),
            network_health: self.network_health(),
        }
    }

    /// Run `hours` consecutive updates starting at the next hour (0 for a
    /// fresh network).
    ///
    /// A stop request is honoured between hours; the sink is finalized either
    /// way. A failing tick is logged and returned without finalizing.
    pub fn run_simulation(&mut self, hours: u32) -> Result<SimulationReport> {
        let start = self.next_hour()?;
        let end = start
            .checked_add(hours)
            .ok_or_else(|| hour_overflow(start, hours))?;
        let mut report = SimulationReport {
            run_id: self.run_id,
            hours_requested: hours,
            hours_completed: 0,
            checkpoints: Vec::new(),
            outcome: RunOutcome::Completed,
        };

        tracing::info!(
            run_id = %self.run_id,
            hours,
            sensors = self.sensors.len(),
            sink = self.sink.name(),
            "simulation started"
        );

        for hour in start..end {
            if self.stop.is_requested() {
                tracing::warn!(run_id = %self.run_id, hour, "simulation interrupted by user");
                report.outcome = RunOutcome::Interrupted { at_hour: hour };
                break;
            }

            if let Err(err) = self.update(hour) {
                tracing::error!(run_id = %self.run_id, hour, error = %err, "simulation tick failed");
                return Err(err);
            }
            report.hours_completed += 1;

            if hour % self.report_interval == 0 {
                let health = self.network_health();
                tracing::info!(
                    hour,
                    accuracy = health.average_accuracy,
                    privacy = health.average_privacy,
                    coverage = health.pattern_coverage,
                    "network health"
                );
                report.checkpoints.push(HealthCheckpoint {
                    hour,
                    health,
                    recorded_at: now(),
                });
            }

            if !self.tick_interval.is_zero() {
                std::thread::sleep(self.tick_interval);
            }
        }

        self.sink.finalize(&self.sensors)?;
        tracing::info!(
            run_id = %self.run_id,
            hours_completed = report.hours_completed,
            outcome = ?report.outcome,
            "simulation complete"
        );

        Ok(report)
    }
}
