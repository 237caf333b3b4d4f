//! Privacy score accumulator.
//!
//! Counts raw observations kept on the sensor against observations for which
//! a learned pattern was shared. The score is a heuristic, not a guarantee.

use crate::core::{now, Timestamp};
use serde::{Deserialize, Serialize};

/// Lowest reachable privacy score.
pub const MIN_PRIVACY_SCORE: f64 = 50.0;
/// Score before anything has been shared.
pub const MAX_PRIVACY_SCORE: f64 = 100.0;

/// One recorded observation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PrivacyRecord {
    /// Observed value
    pub value: f64,
    /// Whether a pattern was shared for this observation
    pub shared: bool,
    /// Score after this observation
    pub score: f64,
    /// Recording time
    pub recorded_at: Timestamp,
}

/// Point-in-time privacy metrics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrivacySnapshot {
    pub score: f64,
    pub observations: u64,
    pub shared_count: u64,
    /// shared_count / max(1, observations)
    pub ratio: f64,
}

/// Aggregate view over the full history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SharingAnalysis {
    pub total_observations: u64,
    pub total_shared: u64,
    /// Mean score over history, 100 when empty
    pub average_score: f64,
}

/// Running privacy counters for one sensor.
#[derive(Clone, Debug)]
pub struct PrivacyTracker {
    observations: u64,
    shared_count: u64,
    score: f64,
    history: Vec<PrivacyRecord>,
}

impl PrivacyTracker {
    /// Create a tracker with a perfect score.
    pub fn new() -> Self {
        Self {
            observations: 0,
            shared_count: 0,
            score: MAX_PRIVACY_SCORE,
            history: Vec::new(),
        }
    }

    /// Record one observation.
    ///
    /// `pattern_derived` is the sharing heuristic: true when the sensor had a
    /// non-empty learned pattern for this reading.
    pub fn update(&mut self, value: f64, pattern_derived: bool) {
        self.observations += 1;
        if pattern_derived {
            self.shared_count += 1;
        }

        self.score = Self::score_for(self.shared_count, self.observations);

        self.history.push(PrivacyRecord {
            value,
            shared: pattern_derived,
            score: self.score,
            recorded_at: now(),
        });
    }

    /// Score for the given counters: max(50, 100 * (1 - ratio / 2)).
    pub fn score_for(shared_count: u64, observations: u64) -> f64 {
        let ratio = shared_count as f64 / observations.max(1) as f64;
        (MAX_PRIVACY_SCORE * (1.0 - ratio / 2.0)).max(MIN_PRIVACY_SCORE)
    }

    /// Current metrics.
    pub fn snapshot(&self) -> PrivacySnapshot {
        PrivacySnapshot {
            score: self.score,
            observations: self.observations,
            shared_count: self.shared_count,
            ratio: self.shared_count as f64 / self.observations.max(1) as f64,
        }
    }

    /// Aggregate statistics over the recorded history.
    pub fn analyze(&self) -> SharingAnalysis {
        let average_score = if self.history.is_empty() {
            MAX_PRIVACY_SCORE
        } else {
            self.history.iter().map(|r| r.score).sum::<f64>() / self.history.len() as f64
        };

        SharingAnalysis {
            total_observations: self.observations,
            total_shared: self.shared_count,
            average_score,
        }
    }

    /// Current score.
    pub fn score(&self) -> f64 {
        self.score
    }

    /// Recorded observations, oldest first.
    pub fn history(&self) -> &[PrivacyRecord] {
        &self.history
    }
}

impl Default for PrivacyTracker {
    fn default() -> Self {
        Self::new()
    }
}
