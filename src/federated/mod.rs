//! Federated Learning Module
//!
//! Local learning with network-level aggregation:
//! - On-sensor sequence prediction, trained on local history only
//! - Pattern library of shared statistics
//! - Network health aggregation and the simulation run loop

pub mod learner;
pub mod network;

pub use learner::{LinearModel, PredictorConfig, PredictorMetrics, SequencePredictor};
pub use network::{
    HealthCheckpoint, Network, NetworkHealth, NetworkMetrics, RunOutcome, SimulationReport,
};
