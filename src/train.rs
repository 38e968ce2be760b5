//! The training driver.
//!
//! One epoch is one full pass over the training set in data order. Weights
//! are updated after every individual example (online gradient descent), so
//! within an epoch later examples see the updates of earlier ones.
//!
//! The per-example step is the textbook three-phase computation: forward
//! pass, error backpropagation, weight update. The weight update at stage
//! `l` reads only the source activations of layer `l` and the deltas of
//! layer `l + 1`, both snapshotted by the two previous phases, so the fixed
//! stage order cannot observe its own partial updates.

use crate::activation::sigmoid_grad_from_output;
use crate::{Dataset, Error, Network, Result};

/// Hyperparameters for [`Network::train`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainConfig {
    /// Step size for every weight update. Must be finite and > 0.
    pub learning_rate: f64,
    /// Convergence threshold: training stops once the epoch error drops to
    /// this value or below. Must be finite and > 0.
    pub max_error: f64,
    /// Epoch budget. With [`MaxEpochs::Unbounded`] only the error threshold
    /// can end the run; an unreachable threshold then trains forever, which
    /// is the caller's contract to avoid (or to interrupt via the observer).
    pub max_epochs: MaxEpochs,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            max_error: 0.01,
            max_epochs: MaxEpochs::Unbounded,
        }
    }
}

impl TrainConfig {
    /// Validate the hyperparameters.
    pub fn validate(&self) -> Result<()> {
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(Error::InvalidConfig(
                "learning rate must be finite and > 0".to_owned(),
            ));
        }
        if !(self.max_error.is_finite() && self.max_error > 0.0) {
            return Err(Error::InvalidConfig(
                "max error must be finite and > 0".to_owned(),
            ));
        }
        if self.max_epochs == MaxEpochs::Bounded(0) {
            return Err(Error::InvalidConfig(
                "bounded epoch budget must be > 0".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Epoch budget for a training run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaxEpochs {
    /// No budget; only the error threshold terminates the run.
    #[default]
    Unbounded,
    /// Stop after at most this many epochs.
    Bounded(usize),
}

/// Per-epoch progress handed to the observer.
#[derive(Debug, Clone, Copy)]
pub struct EpochStats {
    /// Zero-based epoch index.
    pub epoch: usize,
    /// The epoch's error: half the sum of squared output differences over
    /// all examples of the epoch.
    pub error: f64,
}

/// Observer verdict after each epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainControl {
    Continue,
    /// End the run after the current epoch. This is the cooperative
    /// cancellation point for otherwise unbounded training.
    Stop,
}

/// Outcome of a completed training run.
#[derive(Debug, Clone, Copy)]
pub struct TrainReport {
    /// Number of epochs executed (at least 1).
    pub epochs: usize,
    /// The last epoch's error; also retained on the network, see
    /// [`Network::final_error`].
    pub final_error: f64,
    /// True if the run ended because the error threshold was met.
    /// Non-convergence is an outcome, not an error.
    pub converged: bool,
}

impl Network {
    /// Train until the epoch error drops to `cfg.max_error` or the epoch
    /// budget runs out, whichever comes first. Runs at least one epoch.
    ///
    /// Fails fast, with no weight mutation, if the config is invalid, the
    /// weights were never initialized, or the dataset's widths do not match
    /// the network.
    pub fn train(&mut self, data: &Dataset, cfg: &TrainConfig) -> Result<TrainReport> {
        self.train_observed(data, cfg, |_| TrainControl::Continue)
    }

    /// [`Network::train`] with a per-epoch observer.
    ///
    /// The observer sees every completed epoch, including the final one, and
    /// can end the run early by returning [`TrainControl::Stop`].
    pub fn train_observed<F>(
        &mut self,
        data: &Dataset,
        cfg: &TrainConfig,
        mut observer: F,
    ) -> Result<TrainReport>
    where
        F: FnMut(EpochStats) -> TrainControl,
    {
        cfg.validate()?;
        self.check_ready()?;
        if data.is_empty() {
            return Err(Error::ShapeMismatch(
                "training set must not be empty".to_owned(),
            ));
        }
        if data.input_dim() != self.input_dim() {
            return Err(Error::ShapeMismatch(format!(
                "training input_dim {} does not match network input_dim {}",
                data.input_dim(),
                self.input_dim()
            )));
        }
        if data.target_dim() != self.output_dim() {
            return Err(Error::ShapeMismatch(format!(
                "training target_dim {} does not match network output_dim {}",
                data.target_dim(),
                self.output_dim()
            )));
        }

        let mut epochs = 0;
        loop {
            let mut error_sum = 0.0;
            for idx in 0..data.len() {
                error_sum +=
                    self.train_example(data.input(idx), data.target(idx), cfg.learning_rate);
            }

            let error = error_sum / 2.0;
            self.last_error = Some(error);
            let stats = EpochStats {
                epoch: epochs,
                error,
            };
            epochs += 1;

            if observer(stats) == TrainControl::Stop {
                return Ok(TrainReport {
                    epochs,
                    final_error: error,
                    converged: error <= cfg.max_error,
                });
            }
            if error <= cfg.max_error {
                return Ok(TrainReport {
                    epochs,
                    final_error: error,
                    converged: true,
                });
            }
            if let MaxEpochs::Bounded(max) = cfg.max_epochs {
                if epochs >= max {
                    return Ok(TrainReport {
                        epochs,
                        final_error: error,
                        converged: false,
                    });
                }
            }
        }
    }

    /// One gradient step on a single example. Returns the example's sum of
    /// squared output differences (pre-update).
    fn train_example(&mut self, input: &[f64], target: &[f64], learning_rate: f64) -> f64 {
        self.load_input(input);
        self.forward_pass();

        let last = self.neurons.len() - 1;

        // Output deltas; the squared error shares the diff term.
        let mut squared = 0.0;
        for node in 0..self.widths[last] {
            let y = self.neurons[last][node];
            let diff = target[node] - y;
            self.deltas[last][node] = diff * sigmoid_grad_from_output(y);
            squared += diff * diff;
        }

        // Hidden deltas, last hidden layer first. The input layer has none.
        for layer in (1..last).rev() {
            for node in 0..self.widths[layer] {
                let stage = &self.stages[layer];
                let mut sum = 0.0;
                for branch in 0..stage.cols {
                    sum += self.deltas[layer + 1][branch] * stage.get(node, branch);
                }
                let y = self.neurons[layer][node];
                self.deltas[layer][node] = sum * sigmoid_grad_from_output(y);
            }
        }

        // Weight update: w += lr * delta[l + 1][branch] * activation[l][node],
        // the bias source row included via its pinned 1.0 activation.
        for l in 0..self.stages.len() {
            let stage = &mut self.stages[l];
            let source = &self.neurons[l];
            let delta = &self.deltas[l + 1];
            for node in 0..stage.rows {
                let a = source[node];
                let row = node * stage.cols;
                for branch in 0..stage.cols {
                    stage.weights[row + branch] += learning_rate * delta[branch] * a;
                }
            }
        }

        squared
    }
}
