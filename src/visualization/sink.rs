//! Visualization sink capability.
//!
//! The network pushes the full sensor collection to a sink once per simulated
//! hour and once more when the run ends. Sinks only read public sensor state.

use crate::core::{Error, Result};
use crate::sensor::Sensor;
use std::path::Path;

/// Consumer of per-tick sensor state.
pub trait VisualizationSink {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Render the state of every sensor after `hour` was simulated.
    fn render(&mut self, sensors: &[Sensor], hour: u32) -> Result<()>;

    /// Final rendering at the end of a run, completed or interrupted.
    fn finalize(&mut self, sensors: &[Sensor]) -> Result<()>;

    /// Persist the rendered summary.
    fn save(&self, path: &Path) -> Result<()> {
        Err(Error::Sink(format!(
            "{} sink cannot save to {}",
            self.name(),
            path.display()
        )))
    }
}

/// Headless sink that discards everything.
#[derive(Clone, Debug, Default)]
pub struct NullSink;

impl VisualizationSink for NullSink {
    fn name(&self) -> &str {
        "null"
    }

    fn render(&mut self, _sensors: &[Sensor], _hour: u32) -> Result<()> {
        Ok(())
    }

    fn finalize(&mut self, _sensors: &[Sensor]) -> Result<()> {
        Ok(())
    }
}

/// One observed render call.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderCall {
    pub hour: u32,
    pub sensor_names: Vec<String>,
    /// Temperature history length per sensor
    pub history_lengths: Vec<usize>,
}

/// Sink that records every call, for tests and dry runs.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    pub renders: Vec<RenderCall>,
    pub finalize_count: usize,
    /// Fail the render of this hour
    fail_at_hour: Option<u32>,
}

impl RecordingSink {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the render for `hour` fail.
    pub fn failing_at(hour: u32) -> Self {
        Self {
            fail_at_hour: Some(hour),
            ..Self::default()
        }
    }

    /// Hours rendered, in call order.
    pub fn hours(&self) -> Vec<u32> {
        self.renders.iter().map(|r| r.hour).collect()
    }
}

impl VisualizationSink for RecordingSink {
    fn name(&self) -> &str {
        "recording"
    }

    fn render(&mut self, sensors: &[Sensor], hour: u32) -> Result<()> {
        if self.fail_at_hour == Some(hour) {
            return Err(Error::Sink(format!("render failed at hour {}", hour)));
        }

        self.renders.push(RenderCall {
            hour,
            sensor_names: sensors.iter().map(|s| s.name().to_string()).collect(),
            history_lengths: sensors.iter().map(|s| s.temperature_history().len()).collect(),
        });
        Ok(())
    }

    fn finalize(&mut self, _sensors: &[Sensor]) -> Result<()> {
        self.finalize_count += 1;
        Ok(())
    }
}
