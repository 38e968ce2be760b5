//! Weight snapshots (feature: `serde`).
//!
//! This module defines a versioned, stable on-disk format for trained
//! networks.
//!
//! Design notes:
//! - We do NOT directly serialize the internal `Network` struct, to keep the
//!   file format stable even if the internal representation changes.
//! - All deserialization validates the topology, stage shapes, and that
//!   every weight is finite.

use serde::{Deserialize, Serialize};

use std::path::Path;

use crate::{Error, Network, Result};

pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedNetwork {
    pub format_version: u32,
    /// Layer widths, input layer first (bias units excluded).
    pub layers: Vec<usize>,
    pub stages: Vec<SerializedStage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedStage {
    /// Source rows, the bias row included.
    pub rows: usize,
    pub cols: usize,
    /// Row-major `(rows, cols)`.
    pub weights: Vec<f64>,
}

impl SerializedNetwork {
    pub fn validate(&self) -> Result<()> {
        if self.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(Error::InvalidConfig(format!(
                "unsupported snapshot format_version {}; expected {}",
                self.format_version, SNAPSHOT_FORMAT_VERSION
            )));
        }
        if self.layers.len() < 2 {
            return Err(Error::InvalidConfig(
                "snapshot must include input and output layers".to_owned(),
            ));
        }
        if self.layers.contains(&0) {
            return Err(Error::InvalidConfig(
                "all snapshot layer widths must be > 0".to_owned(),
            ));
        }
        if self.stages.len() != self.layers.len() - 1 {
            return Err(Error::ShapeMismatch(format!(
                "snapshot has {} stages for {} layers",
                self.stages.len(),
                self.layers.len()
            )));
        }

        for (l, stage) in self.stages.iter().enumerate() {
            let rows = self.layers[l] + 1;
            let cols = self.layers[l + 1];
            if stage.rows != rows || stage.cols != cols {
                return Err(Error::ShapeMismatch(format!(
                    "stage {l} is {}x{}, topology requires {rows}x{cols}",
                    stage.rows, stage.cols
                )));
            }
            if stage.weights.len() != rows * cols {
                return Err(Error::ShapeMismatch(format!(
                    "stage {l} has {} weights, expected {rows} * {cols}",
                    stage.weights.len()
                )));
            }
            if stage.weights.iter().any(|w| !w.is_finite()) {
                return Err(Error::InvalidConfig(format!(
                    "stage {l} contains non-finite weights"
                )));
            }
        }

        Ok(())
    }
}

impl From<&Network> for SerializedNetwork {
    fn from(net: &Network) -> Self {
        let mut stages = Vec::with_capacity(net.num_stages());
        for s in 0..net.num_stages() {
            let (rows, cols) = net.stage_shape(s);
            stages.push(SerializedStage {
                rows,
                cols,
                weights: net.stage_weights(s).to_vec(),
            });
        }
        Self {
            format_version: SNAPSHOT_FORMAT_VERSION,
            layers: net.widths().to_vec(),
            stages,
        }
    }
}

impl TryFrom<SerializedNetwork> for Network {
    type Error = Error;

    fn try_from(value: SerializedNetwork) -> std::result::Result<Self, Self::Error> {
        value.validate()?;

        let mut net = Network::new(&value.layers)?;
        for (stage, ser) in net.stages.iter_mut().zip(&value.stages) {
            stage.weights.copy_from_slice(&ser.weights);
        }
        net.mark_initialized();
        Ok(net)
    }
}

impl Network {
    /// Serialize the network to a pretty-printed JSON string.
    pub fn to_json_string_pretty(&self) -> Result<String> {
        let ser = SerializedNetwork::from(self);
        serde_json::to_string_pretty(&ser)
            .map_err(|e| Error::InvalidConfig(format!("failed to serialize network: {e}")))
    }

    /// Serialize the network to a compact JSON string.
    pub fn to_json_string(&self) -> Result<String> {
        let ser = SerializedNetwork::from(self);
        serde_json::to_string(&ser)
            .map_err(|e| Error::InvalidConfig(format!("failed to serialize network: {e}")))
    }

    /// Parse a network from a JSON snapshot string.
    ///
    /// The loaded network counts as weight-initialized.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let ser: SerializedNetwork = serde_json::from_str(s)
            .map_err(|e| Error::InvalidConfig(format!("failed to parse snapshot json: {e}")))?;
        ser.try_into()
    }

    /// Save the network to a JSON file (pretty-printed).
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let s = self.to_json_string_pretty()?;
        let p = path.as_ref();
        std::fs::write(p, s)
            .map_err(|e| Error::InvalidConfig(format!("failed to write {}: {e}", p.display())))?;
        Ok(())
    }

    /// Load a network from a JSON snapshot file.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let p = path.as_ref();
        let s = std::fs::read_to_string(p)
            .map_err(|e| Error::InvalidConfig(format!("failed to read {}: {e}", p.display())))?;
        Self::from_json_str(&s)
    }
}
