//! Sensor Module
//!
//! Synthetic temperature sensors:
//! - Class-specific recurring event patterns
//! - Privacy score tracking
//! - Sliding-window pattern learning

pub mod device;
pub mod pattern;
pub mod privacy;

pub use device::{LearnedPatterns, Sensor, SensorMetrics, DEFAULT_PATTERN_WINDOW};
pub use pattern::{EventKind, EventPattern, EventWindow, PatternClass};
pub use privacy::{PrivacyRecord, PrivacySnapshot, PrivacyTracker, SharingAnalysis};
