//! Local sequence learner for on-sensor training.
//!
//! Trains a fixed-window autoregressive model on the sensor's own history.
//! Raw readings never leave the sensor; only derived statistics do.

use serde::{Deserialize, Serialize};

/// Below this spread a window is treated as flat.
const MIN_WINDOW_SCALE: f64 = 1e-9;

/// Predictor configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictorConfig {
    /// Input window length (hours)
    pub window: usize,
    /// Gradient descent step size
    pub learning_rate: f64,
    /// Train on at most this many trailing pairs per call
    pub max_training_pairs: Option<usize>,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            window: 24,
            learning_rate: 0.01,
            max_training_pairs: Some(168),
        }
    }
}

/// Linear model with parameters and gradients.
///
/// Layout: one weight per window position, bias last.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LinearModel {
    /// Model parameters
    pub parameters: Vec<f64>,
    /// Accumulated gradients
    pub gradients: Vec<f64>,
    /// Incremented on every applied update
    pub model_version: u32,
}

impl LinearModel {
    /// Create a zero-initialized model for `inputs` features.
    pub fn new(inputs: usize) -> Self {
        Self {
            parameters: vec![0.0; inputs + 1],
            gradients: vec![0.0; inputs + 1],
            model_version: 1,
        }
    }

    /// Reset gradients to zero.
    pub fn zero_gradients(&mut self) {
        self.gradients.fill(0.0);
    }

    /// Apply gradients with learning rate.
    pub fn apply_gradients(&mut self, learning_rate: f64) {
        for (param, grad) in self.parameters.iter_mut().zip(self.gradients.iter()) {
            *param -= learning_rate * grad;
        }
        self.model_version += 1;
    }

    fn bias(&self) -> f64 {
        self.parameters.last().copied().unwrap_or(0.0)
    }

    /// Forward pass.
    pub fn forward(&self, input: &[f64]) -> f64 {
        self.parameters
            .iter()
            .zip(input.iter())
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.bias()
    }

    /// Accumulate squared-error gradients for one sample and return its loss.
    pub fn backward(&mut self, input: &[f64], target: f64) -> f64 {
        let error = self.forward(input) - target;
        let bias_index = self.gradients.len() - 1;

        for (i, grad) in self.gradients.iter_mut().enumerate() {
            if i < bias_index {
                *grad += 2.0 * error * input[i];
            } else {
                *grad += 2.0 * error;
            }
        }

        error * error
    }
}

/// A window rescaled to zero mean and unit spread.
struct Standardized {
    features: Vec<f64>,
    mean: f64,
    scale: f64,
}

impl Standardized {
    fn new(window: &[f64]) -> Self {
        let n = window.len() as f64;
        let mean = window.iter().sum::<f64>() / n;
        let std = (window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n).sqrt();
        let scale = if std < MIN_WINDOW_SCALE { 1.0 } else { std };

        Self {
            features: window.iter().map(|x| (x - mean) / scale).collect(),
            mean,
            scale,
        }
    }

    fn normalize(&self, value: f64) -> f64 {
        (value - self.mean) / self.scale
    }

    fn denormalize(&self, value: f64) -> f64 {
        value * self.scale + self.mean
    }
}

/// Summary of training progress.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictorMetrics {
    /// Mean loss over all training calls
    pub average_loss: Option<f64>,
    /// Last loss minus first loss
    pub loss_trend: Option<f64>,
}

/// Fixed-window next-value predictor, retrained incrementally.
#[derive(Clone, Debug)]
pub struct SequencePredictor {
    config: PredictorConfig,
    model: LinearModel,
    loss_history: Vec<f64>,
}

impl SequencePredictor {
    /// Create an untrained predictor.
    pub fn new(config: PredictorConfig) -> Self {
        let model = LinearModel::new(config.window);
        Self {
            config,
            model,
            loss_history: Vec::new(),
        }
    }

    /// Input window length.
    pub fn window(&self) -> usize {
        self.config.window
    }

    /// Whether at least one training step has run.
    pub fn is_trained(&self) -> bool {
        !self.loss_history.is_empty()
    }

    /// Normalized MSE of each training call, oldest first.
    pub fn loss_history(&self) -> &[f64] {
        &self.loss_history
    }

    /// Current model.
    pub fn model(&self) -> &LinearModel {
        &self.model
    }

    /// Run one full-batch gradient step over the (window -> next) pairs in `series`.
    ///
    /// Declines with `None`, leaving all state untouched, when `series` holds
    /// fewer than `window + 1` points. Otherwise returns the pre-update loss.
    pub fn train(&mut self, series: &[f64]) -> Option<f64> {
        let window = self.config.window;
        if window == 0 || series.len() < window + 1 {
            return None;
        }

        let total_pairs = series.len() - window;
        let first = match self.config.max_training_pairs {
            Some(cap) if cap > 0 && total_pairs > cap => total_pairs - cap,
            _ => 0,
        };

        self.model.zero_gradients();
        let mut total_loss = 0.0;

        for i in first..total_pairs {
            let input = Standardized::new(&series[i..i + window]);
            let target = input.normalize(series[i + window]);
            total_loss += self.model.backward(&input.features, target);
        }

        let sample_count = (total_pairs - first) as f64;
        for grad in &mut self.model.gradients {
            *grad /= sample_count;
        }
        self.model.apply_gradients(self.config.learning_rate);

        let loss = total_loss / sample_count;
        self.loss_history.push(loss);
        tracing::trace!(pairs = total_pairs - first, loss, "predictor step");
        Some(loss)
    }

    /// Predict the value following the last `window` points of `series`.
    ///
    /// Returns `None` when fewer than `window` points exist.
    pub fn predict(&self, series: &[f64]) -> Option<f64> {
        let window = self.config.window;
        if window == 0 || series.len() < window {
            return None;
        }

        let input = Standardized::new(&series[series.len() - window..]);
        Some(input.denormalize(self.model.forward(&input.features)))
    }

    /// Average loss and trend, `None` until two training calls have run.
    pub fn metrics(&self) -> PredictorMetrics {
        if self.loss_history.len() < 2 {
            return PredictorMetrics::default();
        }

        let first = self.loss_history[0];
        let last = self.loss_history[self.loss_history.len() - 1];

        PredictorMetrics {
            average_loss: Some(self.loss_history.iter().sum::<f64>() / self.loss_history.len() as f64),
            loss_trend: Some(last - first),
        }
    }
}

impl Default for SequencePredictor {
    fn default() -> Self {
        Self::new(PredictorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn sinusoid(len: usize, period: f64) -> Vec<f64> {
        (0..len)
            .map(|t| 20.0 + 3.0 * (2.0 * PI * t as f64 / period).sin())
            .collect()
    }

    #[test]
    fn test_model_forward() {
        let model = LinearModel {
            parameters: vec![1.0, 2.0, 0.5],
            gradients: vec![0.0; 3],
            model_version: 1,
        };
        // 1.0*1.0 + 2.0*1.0 + 0.5 (bias) = 3.5
        assert!((model.forward(&[1.0, 1.0]) - 3.5).abs() < 1e-12);
    }

    #[test]
    fn test_model_backward() {
        let mut model = LinearModel {
            parameters: vec![1.0, 1.0, 0.0],
            gradients: vec![0.0; 3],
            model_version: 1,
        };
        let loss = model.backward(&[1.0, 1.0], 3.0);
        // error = 2 - 3 = -1
        assert!((loss - 1.0).abs() < 1e-12);
        assert_eq!(model.gradients, vec![-2.0, -2.0, -2.0]);

        model.apply_gradients(0.5);
        assert_eq!(model.parameters, vec![2.0, 2.0, 1.0]);
        assert_eq!(model.model_version, 2);
    }

    #[test]
    fn test_train_declines_short_series() {
        let mut predictor = SequencePredictor::default();
        let series = sinusoid(24, 24.0);

        assert_eq!(predictor.train(&series), None);
        assert!(predictor.loss_history().is_empty());
        assert!(!predictor.is_trained());
        assert_eq!(predictor.model().model_version, 1);
    }

    #[test]
    fn test_train_records_loss() {
        let mut predictor = SequencePredictor::default();
        let series = sinusoid(25, 24.0);

        let loss = predictor.train(&series).unwrap();
        assert!(loss.is_finite());
        assert_eq!(predictor.loss_history(), &[loss]);
        assert!(predictor.is_trained());
    }

    #[test]
    fn test_predict_requires_window() {
        let predictor = SequencePredictor::default();
        assert_eq!(predictor.predict(&sinusoid(23, 24.0)), None);
        assert!(predictor.predict(&sinusoid(24, 24.0)).is_some());
    }

    #[test]
    fn test_untrained_predicts_window_mean() {
        let predictor = SequencePredictor::default();
        let series = vec![21.0; 30];
        assert!((predictor.predict(&series).unwrap() - 21.0).abs() < 1e-12);
    }

    #[test]
    fn test_predict_does_not_mutate() {
        let mut predictor = SequencePredictor::default();
        let series = sinusoid(40, 10.0);
        predictor.train(&series);

        let params = predictor.model().parameters.clone();
        let losses = predictor.loss_history().to_vec();
        let first = predictor.predict(&series);
        let second = predictor.predict(&series);

        assert_eq!(first, second);
        assert_eq!(predictor.model().parameters, params);
        assert_eq!(predictor.loss_history(), &losses[..]);
    }

    #[test]
    fn test_loss_decreases_with_training() {
        let mut predictor = SequencePredictor::default();
        let series = sinusoid(48, 10.0);

        for _ in 0..50 {
            predictor.train(&series);
        }

        let history = predictor.loss_history();
        assert!(history[history.len() - 1] < history[0]);
        assert!(predictor.metrics().loss_trend.unwrap() < 0.0);
    }

    #[test]
    fn test_beats_same_hour_yesterday() {
        let full = sinusoid(49, 10.0);
        let (history, truth) = (&full[..48], full[48]);

        let mut predictor = SequencePredictor::default();
        for _ in 0..200 {
            predictor.train(history);
        }

        let predicted = predictor.predict(history).unwrap();
        let model_error = (predicted - truth).abs();
        let baseline_error = (history[48 - 24] - truth).abs();

        assert!(model_error < baseline_error);
        assert!(model_error < 1.0);
    }

    #[test]
    fn test_training_pair_cap() {
        let config = PredictorConfig {
            window: 4,
            learning_rate: 0.01,
            max_training_pairs: Some(3),
        };
        let mut capped = SequencePredictor::new(config.clone());
        let mut uncapped = SequencePredictor::new(PredictorConfig {
            max_training_pairs: None,
            ..config
        });

        // The five leading pairs fall outside the cap
        let mut series = vec![5.0, 9.0, 1.0, 7.0, 3.0, 8.0];
        series.extend(sinusoid(6, 4.0));
        let tail = series[series.len() - 7..].to_vec();

        let capped_loss = capped.train(&series).unwrap();
        let tail_loss = SequencePredictor::new(capped.config.clone()).train(&tail).unwrap();
        let uncapped_loss = uncapped.train(&series).unwrap();

        assert!((capped_loss - tail_loss).abs() < 1e-12);
        assert!((capped_loss - uncapped_loss).abs() > 1e-12);
    }

    #[test]
    fn test_metrics_need_two_losses() {
        let mut predictor = SequencePredictor::default();
        assert_eq!(predictor.metrics(), PredictorMetrics::default());

        let series = sinusoid(30, 10.0);
        predictor.train(&series);
        assert_eq!(predictor.metrics().average_loss, None);

        predictor.train(&series);
        let metrics = predictor.metrics();
        let losses = predictor.loss_history();
        assert!((metrics.average_loss.unwrap() - (losses[0] + losses[1]) / 2.0).abs() < 1e-12);
        assert!((metrics.loss_trend.unwrap() - (losses[1] - losses[0])).abs() < 1e-12);
    }
}
