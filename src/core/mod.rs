//! Core utilities and common types for FedSense.

pub mod config;
pub mod error;
pub mod types;

pub use config::{NoiseConfig, SensorSpec, SimulationConfig};
pub use error::{Error, Result};
pub use types::*;
