//! Visualization Module
//!
//! Push-consumers of sensor state:
//! - Sink capability with headless and recording implementations
//! - JSON chart exporter
//! - Plain-text console reports

pub mod chart;
pub mod console;
pub mod sink;

pub use chart::{ChartExporter, ChartFrame};
pub use sink::{NullSink, RecordingSink, RenderCall, VisualizationSink};
