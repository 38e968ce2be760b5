//! A small backpropagation crate.
//!
//! `backprop` is a small-core, from-scratch implementation of a fully
//! connected feed-forward network with per-layer bias units and sigmoid
//! activations, trained by plain per-example gradient descent. It is
//! designed to be easy to read while keeping the training hot path
//! allocation-free.
//!
//! # Design goals
//!
//! - Predictable performance: activations and error terms are buffers owned
//!   by the network and reused across steps.
//! - Clear contracts: shapes are explicit and validated at the API boundary.
//! - A faithful training loop: one epoch is one in-order pass over the
//!   training set, updating weights after every example, until the epoch
//!   error reaches the configured threshold or the epoch budget runs out.
//!
//! # Panics vs `Result`
//!
//! This crate intentionally exposes two layers of API:
//!
//! - Low-level hot path (panics on misuse): [`Network::forward`]. Shape
//!   mismatches are treated as programmer error and will panic via
//!   `assert!`.
//! - High-level APIs (shape-checked): [`Network::train`],
//!   [`Network::predict`], [`Network::predict_into`], the weight setters.
//!   These validate inputs and return [`Result`].
//!
//! # Data layout and shapes
//!
//! - Scalars are `f64`.
//! - [`Dataset`] stores examples contiguously in row-major layout.
//! - Every non-output layer carries one trailing bias activation pinned to
//!   `1.0`; the weights for the transition `l -> l+1` form a row-major
//!   `(widths[l] + 1, widths[l + 1])` block whose last source row belongs to
//!   the bias unit.
//!
//! # Quick start
//!
//! ```rust
//! use backprop::{Dataset, MaxEpochs, Network, TrainConfig};
//!
//! # fn main() -> backprop::Result<()> {
//! let xs = vec![
//!     vec![0.0, 0.0],
//!     vec![0.0, 1.0],
//!     vec![1.0, 0.0],
//!     vec![1.0, 1.0],
//! ];
//! let ys = vec![vec![0.0], vec![1.0], vec![1.0], vec![0.0]];
//! let train = Dataset::from_rows(&xs, &ys)?;
//!
//! let mut net = Network::new(&[2, 2, 1])?;
//! net.randomize_with_seed(0);
//!
//! let report = net.train(
//!     &train,
//!     &TrainConfig {
//!         learning_rate: 0.5,
//!         max_error: 0.01,
//!         max_epochs: MaxEpochs::Bounded(2_000),
//!     },
//! )?;
//!
//! let prediction = net.predict(&[1.0, 0.0])?;
//! # let _ = (report, prediction);
//! # Ok(())
//! # }
//! ```

pub mod activation;
pub mod dataset;
pub mod error;
pub mod network;
pub mod train;

#[cfg(feature = "serde")]
pub mod serde_model;

pub use dataset::Dataset;
pub use error::{Error, Result};
pub use network::Network;
pub use train::{EpochStats, MaxEpochs, TrainConfig, TrainControl, TrainReport};
