//! The network itself: topology, weights, and the forward pass.
//!
//! Layout follows the classic bias-as-extra-input convention:
//!
//! - Every non-output layer carries one trailing activation slot pinned to
//!   `1.0` (the bias unit). The output layer has no bias slot.
//! - The weights for the transition `l -> l+1` form a dense row-major block
//!   with `widths[l] + 1` source rows (the last row belongs to the bias unit)
//!   and `widths[l+1]` columns.
//!
//! Weights are the only learned state. Activations and error terms are
//! scratch buffers owned by the network and reused across calls, which is
//! why inference takes `&mut self`: the borrow checker enforces the
//! serialization that a shared-scratch design needs.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::activation::sigmoid;
use crate::{Error, Result};

/// Weights for one layer transition.
///
/// Row-major `(rows, cols)` block; `rows` includes the bias source row.
#[derive(Debug, Clone)]
pub(crate) struct Stage {
    pub(crate) rows: usize,
    pub(crate) cols: usize,
    pub(crate) weights: Vec<f64>,
}

impl Stage {
    fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            weights: vec![0.0; rows * cols],
        }
    }

    #[inline]
    pub(crate) fn get(&self, node: usize, branch: usize) -> f64 {
        self.weights[node * self.cols + branch]
    }
}

/// A fully-connected feed-forward network with sigmoid activations.
///
/// Construction allocates everything up front; training and inference are
/// allocation-free. Weights start at zero and count as *uninitialized* until
/// [`Network::randomize`], one of the weight setters, or a snapshot load has
/// run — `train`/`predict` refuse to operate before that.
#[derive(Debug, Clone)]
pub struct Network {
    pub(crate) widths: Vec<usize>,
    /// Per-layer activations; non-output layers have a trailing 1.0 bias slot.
    pub(crate) neurons: Vec<Vec<f64>>,
    /// Per-layer error terms; `deltas[0]` is empty (the input layer has none).
    pub(crate) deltas: Vec<Vec<f64>>,
    pub(crate) stages: Vec<Stage>,
    weights_set: bool,
    pub(crate) last_error: Option<f64>,
}

impl Network {
    /// Build a network from layer widths, input layer first.
    ///
    /// `&[3, 4, 5, 1]` builds a network with 3 inputs, two hidden layers of
    /// 4 and 5 neurons, and a single output.
    ///
    /// Returns an error if fewer than two layers are given or any width is
    /// zero.
    pub fn new(widths: &[usize]) -> Result<Self> {
        validate_topology(widths)?;

        let last = widths.len() - 1;
        let mut neurons = Vec::with_capacity(widths.len());
        let mut deltas = Vec::with_capacity(widths.len());
        for (layer, &width) in widths.iter().enumerate() {
            if layer == last {
                neurons.push(vec![0.0; width]);
            } else {
                // Trailing slot is the bias unit, fixed at 1.0 for the
                // lifetime of the network.
                let mut acts = vec![0.0; width + 1];
                acts[width] = 1.0;
                neurons.push(acts);
            }
            deltas.push(if layer == 0 {
                Vec::new()
            } else {
                vec![0.0; width]
            });
        }

        let mut stages = Vec::with_capacity(last);
        for transition in widths.windows(2) {
            stages.push(Stage::new(transition[0] + 1, transition[1]));
        }

        Ok(Self {
            widths: widths.to_vec(),
            neurons,
            deltas,
            stages,
            weights_set: false,
            last_error: None,
        })
    }

    /// Rebuild with a new topology, discarding all prior state.
    ///
    /// Equivalent to replacing the network with `Network::new(widths)`;
    /// weights become uninitialized again.
    pub fn rebuild(&mut self, widths: &[usize]) -> Result<()> {
        *self = Self::new(widths)?;
        Ok(())
    }

    #[inline]
    /// Returns the layer widths, input layer first (bias units excluded).
    pub fn widths(&self) -> &[usize] {
        &self.widths
    }

    #[inline]
    /// Returns the input layer width.
    pub fn input_dim(&self) -> usize {
        self.widths[0]
    }

    #[inline]
    /// Returns the output layer width.
    pub fn output_dim(&self) -> usize {
        self.widths[self.widths.len() - 1]
    }

    #[inline]
    /// Returns the number of layer transitions (`widths().len() - 1`).
    pub fn num_stages(&self) -> usize {
        self.stages.len()
    }

    #[inline]
    /// Returns the total number of weights across all stages.
    pub fn total_weights(&self) -> usize {
        self.stages.iter().map(|s| s.weights.len()).sum()
    }

    #[inline]
    /// Returns the shape `(source rows, destination columns)` of stage
    /// `stage`. The row count includes the bias source row.
    ///
    /// Panics if `stage >= num_stages()`.
    pub fn stage_shape(&self, stage: usize) -> (usize, usize) {
        let s = &self.stages[stage];
        (s.rows, s.cols)
    }

    #[inline]
    /// Returns stage `stage`'s weights as a row-major slice.
    ///
    /// Panics if `stage >= num_stages()`.
    pub fn stage_weights(&self, stage: usize) -> &[f64] {
        &self.stages[stage].weights
    }

    #[inline]
    /// Returns the weight from source `node` (bias row last) to destination
    /// `branch` at stage `stage`.
    ///
    /// Panics on any out-of-range index.
    pub fn weight(&self, stage: usize, node: usize, branch: usize) -> f64 {
        let s = &self.stages[stage];
        assert!(node < s.rows, "node {node} out of range for {} rows", s.rows);
        assert!(
            branch < s.cols,
            "branch {branch} out of range for {} cols",
            s.cols
        );
        s.get(node, branch)
    }

    #[inline]
    /// Returns layer `layer`'s activation slice, bias slot included for
    /// non-output layers.
    ///
    /// Panics if `layer >= widths().len()`.
    pub fn activations(&self, layer: usize) -> &[f64] {
        &self.neurons[layer]
    }

    #[inline]
    /// Returns the output layer's activations from the most recent forward
    /// pass (zeros before the first).
    pub fn output(&self) -> &[f64] {
        &self.neurons[self.neurons.len() - 1]
    }

    #[inline]
    /// Returns the epoch error recorded at the end of the most recent
    /// training run, or `None` if the network has never been trained.
    pub fn final_error(&self) -> Option<f64> {
        self.last_error
    }

    /// Draws every weight independently from the uniform range `[-1, 1)`
    /// using the thread RNG.
    pub fn randomize(&mut self) {
        let mut rng = rand::thread_rng();
        self.randomize_with_rng(&mut rng);
    }

    /// Deterministic [`Network::randomize`] from a seed.
    pub fn randomize_with_seed(&mut self, seed: u64) {
        let mut rng = StdRng::seed_from_u64(seed);
        self.randomize_with_rng(&mut rng);
    }

    /// Draws every weight independently from the uniform range `[-1, 1)`
    /// using the provided RNG.
    pub fn randomize_with_rng<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for stage in &mut self.stages {
            for w in &mut stage.weights {
                *w = rng.gen_range(-1.0..1.0);
            }
        }
        self.weights_set = true;
    }

    /// Set all weights from a flat buffer.
    ///
    /// Fill order is stage-major, source-row-major, destination-column-minor,
    /// i.e. the concatenation of every stage's row-major block. The buffer
    /// length must equal [`Network::total_weights`].
    pub fn set_weights(&mut self, weights: &[f64]) -> Result<()> {
        let total = self.total_weights();
        if weights.len() != total {
            return Err(Error::ShapeMismatch(format!(
                "weight buffer has {} values, network needs {total}",
                weights.len()
            )));
        }

        let mut offset = 0;
        for stage in &mut self.stages {
            let n = stage.weights.len();
            stage.weights.copy_from_slice(&weights[offset..offset + n]);
            offset += n;
        }
        self.weights_set = true;
        Ok(())
    }

    /// Set all weights from a structure shaped like the weight tensor:
    /// `weights[stage][node][branch]`, bias source row last.
    ///
    /// The whole shape is validated before any weight is written.
    pub fn set_weights_nested(&mut self, weights: &[Vec<Vec<f64>>]) -> Result<()> {
        if weights.len() != self.stages.len() {
            return Err(Error::ShapeMismatch(format!(
                "weight tensor has {} stages, network has {}",
                weights.len(),
                self.stages.len()
            )));
        }
        for (l, (stage, block)) in self.stages.iter().zip(weights).enumerate() {
            if block.len() != stage.rows {
                return Err(Error::ShapeMismatch(format!(
                    "stage {l} has {} source rows, expected {}",
                    block.len(),
                    stage.rows
                )));
            }
            for (node, row) in block.iter().enumerate() {
                if row.len() != stage.cols {
                    return Err(Error::ShapeMismatch(format!(
                        "stage {l} row {node} has {} weights, expected {}",
                        row.len(),
                        stage.cols
                    )));
                }
            }
        }

        for (stage, block) in self.stages.iter_mut().zip(weights) {
            for (node, row) in block.iter().enumerate() {
                let start = node * stage.cols;
                stage.weights[start..start + stage.cols].copy_from_slice(row);
            }
        }
        self.weights_set = true;
        Ok(())
    }

    /// Forward pass for a single input; the low-level hot path.
    ///
    /// Writes intermediate activations into the network's own buffers and
    /// returns the output layer slice. Does not check weight initialization.
    ///
    /// Shape contract:
    /// - `input.len() == self.input_dim()`
    pub fn forward(&mut self, input: &[f64]) -> &[f64] {
        assert_eq!(
            input.len(),
            self.input_dim(),
            "input len {} does not match network input_dim {}",
            input.len(),
            self.input_dim()
        );

        self.load_input(input);
        self.forward_pass();
        self.output()
    }

    /// Shape-checked inference.
    ///
    /// Runs the forward pass only; weights are left untouched. The returned
    /// slice borrows the network's scratch buffers, so copy it out before the
    /// next `predict`/`train` call if it needs to outlive them.
    pub fn predict(&mut self, input: &[f64]) -> Result<&[f64]> {
        self.check_ready()?;
        if input.len() != self.input_dim() {
            return Err(Error::ShapeMismatch(format!(
                "input len {} does not match network input_dim {}",
                input.len(),
                self.input_dim()
            )));
        }
        Ok(self.forward(input))
    }

    /// Shape-checked inference into a caller-owned buffer.
    pub fn predict_into(&mut self, input: &[f64], out: &mut [f64]) -> Result<()> {
        if out.len() != self.output_dim() {
            return Err(Error::ShapeMismatch(format!(
                "output buffer len {} does not match network output_dim {}",
                out.len(),
                self.output_dim()
            )));
        }
        let y = self.predict(input)?;
        out.copy_from_slice(y);
        Ok(())
    }

    #[inline]
    pub(crate) fn load_input(&mut self, input: &[f64]) {
        let n = self.widths[0];
        self.neurons[0][..n].copy_from_slice(input);
    }

    /// Propagates activations from the input layer to the output layer.
    ///
    /// For each non-bias neuron: weighted sum over the full source layer
    /// (bias slot included), then sigmoid. Bias slots are never written.
    pub(crate) fn forward_pass(&mut self) {
        for layer in 1..self.neurons.len() {
            let (prev_layers, rest) = self.neurons.split_at_mut(layer);
            let prev = &prev_layers[layer - 1];
            let cur = &mut rest[0];
            let stage = &self.stages[layer - 1];

            for node in 0..self.widths[layer] {
                let mut sum = 0.0;
                for (src, &a) in prev.iter().enumerate() {
                    sum += a * stage.weights[src * stage.cols + node];
                }
                cur[node] = sigmoid(sum);
            }
        }
    }

    #[inline]
    pub(crate) fn check_ready(&self) -> Result<()> {
        if !self.weights_set {
            return Err(Error::Uninitialized(
                "weights were never randomized or set".to_owned(),
            ));
        }
        Ok(())
    }

    #[cfg(feature = "serde")]
    #[inline]
    pub(crate) fn mark_initialized(&mut self) {
        self.weights_set = true;
    }
}

fn validate_topology(widths: &[usize]) -> Result<()> {
    if widths.len() < 2 {
        return Err(Error::InvalidConfig(
            "topology must include input and output layers".to_owned(),
        ));
    }
    if widths.contains(&0) {
        return Err(Error::InvalidConfig(
            "all layer widths must be > 0".to_owned(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_degenerate_topologies() {
        assert!(Network::new(&[]).is_err());
        assert!(Network::new(&[3]).is_err());
        assert!(Network::new(&[3, 0, 2]).is_err());
        assert!(Network::new(&[2, 1]).is_ok());
    }

    #[test]
    fn build_allocates_bias_augmented_layers_and_ragged_stages() {
        let net = Network::new(&[3, 4, 5, 1]).unwrap();

        // Non-output layers carry a bias slot, the output layer does not.
        assert_eq!(net.activations(0).len(), 4);
        assert_eq!(net.activations(1).len(), 5);
        assert_eq!(net.activations(2).len(), 6);
        assert_eq!(net.activations(3).len(), 1);

        // Stage l is (widths[l] + 1) x widths[l + 1].
        assert_eq!(net.num_stages(), 3);
        assert_eq!(net.stage_shape(0), (4, 4));
        assert_eq!(net.stage_shape(1), (5, 5));
        assert_eq!(net.stage_shape(2), (6, 1));
        assert_eq!(net.total_weights(), 16 + 25 + 6);
    }

    #[test]
    fn bias_slots_are_pinned_to_one() {
        let mut net = Network::new(&[2, 3, 1]).unwrap();
        assert_eq!(net.activations(0)[2], 1.0);
        assert_eq!(net.activations(1)[3], 1.0);

        net.randomize_with_seed(7);
        net.forward(&[0.4, -0.9]);
        assert_eq!(net.activations(0)[2], 1.0);
        assert_eq!(net.activations(1)[3], 1.0);
    }

    #[test]
    fn rebuild_discards_weights() {
        let mut net = Network::new(&[2, 2, 1]).unwrap();
        net.randomize_with_seed(1);
        assert!(net.predict(&[0.0, 0.0]).is_ok());

        net.rebuild(&[4, 3, 2]).unwrap();
        assert_eq!(net.input_dim(), 4);
        assert_eq!(net.output_dim(), 2);
        // Weights are uninitialized again.
        assert!(net.predict(&[0.0, 0.0, 0.0, 0.0]).is_err());
    }

    #[test]
    fn randomized_weights_lie_in_unit_range() {
        let mut net = Network::new(&[8, 16, 4]).unwrap();
        net.randomize();
        for stage in 0..net.num_stages() {
            for &w in net.stage_weights(stage) {
                assert!((-1.0..1.0).contains(&w), "weight {w} out of [-1, 1)");
            }
        }
    }

    #[test]
    fn unseeded_randomization_differs_across_calls() {
        let mut a = Network::new(&[4, 8, 2]).unwrap();
        let mut b = Network::new(&[4, 8, 2]).unwrap();
        a.randomize();
        b.randomize();
        // 48 independent uniform draws colliding exactly is not a thing.
        assert_ne!(a.stage_weights(0), b.stage_weights(0));
    }

    #[test]
    fn set_weights_flat_fills_in_stage_row_column_order() {
        let mut net = Network::new(&[2, 2, 1]).unwrap();
        let flat: Vec<f64> = (0..net.total_weights()).map(|i| i as f64).collect();
        net.set_weights(&flat).unwrap();

        assert_eq!(net.weight(0, 0, 0), 0.0);
        assert_eq!(net.weight(0, 0, 1), 1.0);
        assert_eq!(net.weight(0, 1, 0), 2.0);
        assert_eq!(net.weight(0, 2, 1), 5.0);
        // Stage 1 starts after the 6 weights of stage 0.
        assert_eq!(net.weight(1, 0, 0), 6.0);
        assert_eq!(net.weight(1, 2, 0), 8.0);
    }

    #[test]
    fn set_weights_rejects_wrong_lengths() {
        let mut net = Network::new(&[2, 2, 1]).unwrap();
        assert!(net.set_weights(&[0.0; 5]).is_err());
        assert!(net.set_weights(&[0.0; 10]).is_err());
        // A failed set leaves the network uninitialized.
        assert!(net.predict(&[0.0, 0.0]).is_err());
    }

    #[test]
    fn set_weights_nested_validates_every_row() {
        let mut net = Network::new(&[2, 2, 1]).unwrap();

        let good = vec![
            vec![vec![0.1, 0.2], vec![0.3, 0.4], vec![0.5, 0.6]],
            vec![vec![0.7], vec![0.8], vec![0.9]],
        ];
        net.set_weights_nested(&good).unwrap();
        assert_eq!(net.weight(0, 1, 1), 0.4);
        assert_eq!(net.weight(1, 2, 0), 0.9);

        let missing_bias_row = vec![
            vec![vec![0.1, 0.2], vec![0.3, 0.4]],
            vec![vec![0.7], vec![0.8], vec![0.9]],
        ];
        assert!(net.set_weights_nested(&missing_bias_row).is_err());

        let ragged_row = vec![
            vec![vec![0.1, 0.2], vec![0.3], vec![0.5, 0.6]],
            vec![vec![0.7], vec![0.8], vec![0.9]],
        ];
        assert!(net.set_weights_nested(&ragged_row).is_err());
    }

    #[test]
    fn predict_requires_initialized_weights_and_matching_input() {
        let mut net = Network::new(&[2, 2, 1]).unwrap();
        assert!(matches!(
            net.predict(&[0.1, 0.2]),
            Err(Error::Uninitialized(_))
        ));

        net.randomize_with_seed(3);
        assert!(matches!(
            net.predict(&[0.1, 0.2, 0.3]),
            Err(Error::ShapeMismatch(_))
        ));
        assert!(net.predict(&[0.1, 0.2]).is_ok());
    }

    #[test]
    fn forward_is_deterministic_for_fixed_weights() {
        let mut net = Network::new(&[3, 5, 2]).unwrap();
        net.randomize_with_seed(42);

        let input = [0.25, -0.5, 0.75];
        let first = net.predict(&input).unwrap().to_vec();
        for _ in 0..10 {
            let again = net.predict(&input).unwrap();
            assert_eq!(first.as_slice(), again);
        }
    }

    #[test]
    fn predict_never_mutates_weights() {
        let mut net = Network::new(&[2, 3, 1]).unwrap();
        net.randomize_with_seed(9);
        let before: Vec<Vec<f64>> = (0..net.num_stages())
            .map(|s| net.stage_weights(s).to_vec())
            .collect();

        for _ in 0..5 {
            net.predict(&[0.3, 0.6]).unwrap();
        }

        for s in 0..net.num_stages() {
            assert_eq!(before[s].as_slice(), net.stage_weights(s));
        }
    }

    #[test]
    fn predict_into_checks_the_output_buffer() {
        let mut net = Network::new(&[2, 3, 2]).unwrap();
        net.randomize_with_seed(11);

        let mut short = [0.0; 1];
        assert!(net.predict_into(&[0.1, 0.2], &mut short).is_err());

        let mut out = [0.0; 2];
        net.predict_into(&[0.1, 0.2], &mut out).unwrap();
        assert_eq!(out.as_slice(), net.output());
    }
}
