//! Chart exporter.
//!
//! Keeps the latest frame of the dashboard panels as plain data and writes it
//! out as JSON. Pixel rendering is left to whatever consumes the file.

use crate::core::{now, Error, Result, Timestamp};
use crate::sensor::Sensor;
use crate::visualization::sink::VisualizationSink;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Trailing points shown in the temperature and accuracy panels.
const DISPLAY_WINDOW: usize = 48;
/// Trailing points shown in the pattern panel.
const PATTERN_WINDOW: usize = 24;

/// One named line in a panel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub label: String,
    pub values: Vec<f64>,
}

/// One bar in the privacy panel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub label: String,
    pub value: f64,
}

/// Snapshot of every panel after one tick.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChartFrame {
    pub hour: u32,
    /// Temperature readings with pattern detection
    pub temperatures: Vec<Series>,
    /// Per-sensor accuracy trend
    pub accuracy: Vec<Series>,
    /// Last day of readings for sensors with a full day
    pub pattern_analysis: Vec<Series>,
    /// Privacy preservation scores
    pub privacy_scores: Vec<Bar>,
    /// Set by the final rendering of a run
    pub is_final: bool,
    pub rendered_at: Timestamp,
}

fn tail(values: &[f64], len: usize) -> Vec<f64> {
    values[values.len().saturating_sub(len)..].to_vec()
}

impl ChartFrame {
    /// Build a frame from the current sensor state.
    pub fn capture(sensors: &[Sensor], hour: u32) -> Self {
        // All panels share the first sensor's window, as sensors tick in lockstep
        let window = sensors
            .first()
            .map(|s| s.temperature_history().len().min(DISPLAY_WINDOW))
            .unwrap_or(0);

        let temperatures = sensors
            .iter()
            .map(|s| Series {
                label: s.name().to_string(),
                values: tail(s.temperature_history(), window),
            })
            .collect();

        let accuracy = sensors
            .iter()
            .map(|s| Series {
                label: format!("{} accuracy", s.name()),
                values: tail(s.accuracy_history(), window.max(1)),
            })
            .collect();

        let pattern_analysis = sensors
            .iter()
            .filter(|s| s.temperature_history().len() >= PATTERN_WINDOW)
            .map(|s| Series {
                label: s.name().to_string(),
                values: tail(s.temperature_history(), PATTERN_WINDOW),
            })
            .collect();

        let privacy_scores = sensors
            .iter()
            .map(|s| Bar {
                label: s.name().to_string(),
                value: s.privacy().score(),
            })
            .collect();

        Self {
            hour,
            temperatures,
            accuracy,
            pattern_analysis,
            privacy_scores,
            is_final: false,
            rendered_at: now(),
        }
    }
}

/// Sink that exports the dashboard as JSON.
#[derive(Debug, Default)]
pub struct ChartExporter {
    frame: Option<ChartFrame>,
    frames_rendered: u64,
}

impl ChartExporter {
    /// Create an exporter with nothing rendered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest frame.
    pub fn frame(&self) -> Option<&ChartFrame> {
        self.frame.as_ref()
    }

    /// Number of render calls seen.
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }
}

impl VisualizationSink for ChartExporter {
    fn name(&self) -> &str {
        "chart"
    }

    fn render(&mut self, sensors: &[Sensor], hour: u32) -> Result<()> {
        self.frame = Some(ChartFrame::capture(sensors, hour));
        self.frames_rendered += 1;
        Ok(())
    }

    fn finalize(&mut self, sensors: &[Sensor]) -> Result<()> {
        let hour = self.frame.as_ref().map(|f| f.hour).unwrap_or(0);
        let mut frame = ChartFrame::capture(sensors, hour);
        frame.is_final = true;
        self.frame = Some(frame);
        Ok(())
    }

    fn save(&self, path: &Path) -> Result<()> {
        let frame = self
            .frame
            .as_ref()
            .ok_or_else(|| Error::Sink("no frame has been rendered".to_string()))?;

        std::fs::write(path, serde_json::to_string_pretty(frame)?)?;
        tracing::info!(path = %path.display(), hour = frame.hour, "chart saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::PatternClass;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn ticked_sensors(hours: u32) -> Vec<Sensor> {
        let mut sensors = vec![
            Sensor::new("Factory Floor", (0.0, 0.0), PatternClass::Factory, StdRng::seed_from_u64(1)).unwrap(),
            Sensor::new("Outdoor Area", (2.0, 0.0), PatternClass::Outdoor, StdRng::seed_from_u64(2)).unwrap(),
        ];
        for hour in 0..hours {
            for sensor in &mut sensors {
                let t = sensor.generate_temperature(hour);
                sensor.update_privacy(t, false);
            }
        }
        sensors
    }

    #[test]
    fn test_frame_windows() {
        let early = ChartFrame::capture(&ticked_sensors(10), 9);
        assert_eq!(early.temperatures[0].values.len(), 10);
        assert!(early.pattern_analysis.is_empty());
        assert_eq!(early.privacy_scores[1].value, 100.0);

        let late = ChartFrame::capture(&ticked_sensors(60), 59);
        assert_eq!(late.temperatures[1].values.len(), 48);
        assert_eq!(late.pattern_analysis.len(), 2);
        assert_eq!(late.pattern_analysis[0].values.len(), 24);
        // Accuracy history holds only the seed value
        assert_eq!(late.accuracy[0].values, vec![0.5]);
    }

    #[test]
    fn test_save_requires_render() {
        let exporter = ChartExporter::new();
        let dir = tempfile::tempdir().unwrap();
        assert!(exporter.save(&dir.path().join("chart.json")).is_err());
    }

    #[test]
    fn test_render_finalize_save() {
        let sensors = ticked_sensors(30);
        let mut exporter = ChartExporter::new();
        exporter.render(&sensors, 29).unwrap();
        exporter.finalize(&sensors).unwrap();
        assert_eq!(exporter.frames_rendered(), 1);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("simulation_final.json");
        exporter.save(&path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let frame: ChartFrame = serde_json::from_str(&raw).unwrap();
        assert!(frame.is_final);
        assert_eq!(frame.hour, 29);
        assert_eq!(frame.temperatures.len(), 2);
    }
}
