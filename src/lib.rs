//! # FedSense - Federated Sensor Network
//!
//! A simulation of synthetic temperature sensors that learn locally and share
//! only derived statistics:
//! - **Sensor**: event-driven signal generation, pattern learning, privacy scoring
//! - **Federated**: on-sensor sequence prediction and network health aggregation
//! - **Visualization**: pluggable sinks fed once per simulated hour
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fedsense::core::SimulationConfig;
//! use fedsense::federated::Network;
//! use fedsense::visualization::NullSink;
//!
//! let config = SimulationConfig::default().with_seed(7);
//! let mut network = Network::from_config(&config, NullSink).unwrap();
//! let report = network.run_simulation(48).unwrap();
//! println!("Completed {} hours", report.hours_completed);
//! ```

pub mod core;
pub mod federated;
pub mod monitoring;
pub mod sensor;
pub mod visualization;

pub use core::error::{Error, Result};
