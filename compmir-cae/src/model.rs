//! Complex autoencoder inference
//!
//! The encoder is a single bias-free linear layer producing `2 * n_bases`
//! outputs per window, read as the real and imaginary parts of `n_bases`
//! complex coefficients.

use crate::error::{CaeError, Result};
use ndarray::{s, Array2, ArrayView2, Zip};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// Key of the encoder weight in a saved state map
pub const WEIGHT_KEY: &str = "layer.weight";

/// Per-window amplitude and phase, one row per window
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    pub amplitude: Array2<f32>,
    pub phase: Array2<f32>,
}

impl Embedding {
    /// Embedding of zero windows
    pub fn empty(n_bases: usize) -> Self {
        Self {
            amplitude: Array2::zeros((0, n_bases)),
            phase: Array2::zeros((0, n_bases)),
        }
    }

    pub fn n_windows(&self) -> usize {
        self.amplitude.nrows()
    }
}

/// Maps a batch of flattened windows to amplitude and phase
pub trait EmbeddingModel: Send + Sync {
    /// Expected columns of an input batch
    fn input_size(&self) -> usize;

    /// Output columns of amplitude and phase
    fn n_bases(&self) -> usize;

    /// Inference on a batch, one window per row
    fn infer(&self, batch: ArrayView2<'_, f32>) -> Result<Embedding>;
}

/// Trained complex autoencoder, inference only
#[derive(Debug, Clone)]
pub struct ComplexAutoencoder {
    /// Shape `(2 * n_bases, input_size)`
    weight: Array2<f32>,
    n_bases: usize,
}

impl ComplexAutoencoder {
    pub fn new(weight: Array2<f32>, n_bases: usize) -> Result<Self> {
        if n_bases == 0 || weight.nrows() != 2 * n_bases {
            return Err(CaeError::Model(format!(
                "weight has {} rows, expected {} for {} bases",
                weight.nrows(),
                2 * n_bases,
                n_bases
            )));
        }
        Ok(Self { weight, n_bases })
    }

    /// Load trained weights from a JSON state map
    ///
    /// Only `layer.weight` is read; other entries are ignored. The weight
    /// must have shape `(2 * n_bases, in_size)`.
    pub fn load(path: &Path, in_size: usize, n_bases: usize) -> Result<Self> {
        let contents = std::fs::read(path)?;
        let model = Self::from_state_json(&contents, in_size, n_bases)?;

        info!(
            path = %path.display(),
            in_size,
            n_bases,
            "Loaded complex autoencoder weights"
        );
        Ok(model)
    }

    /// Build from the bytes of a JSON state map
    pub fn from_state_json(bytes: &[u8], in_size: usize, n_bases: usize) -> Result<Self> {
        let mut state: HashMap<String, Value> = serde_json::from_slice(bytes)
            .map_err(|e| CaeError::Model(format!("Invalid model state: {}", e)))?;

        let ignored = state.len().saturating_sub(1);
        let weight = state
            .remove(WEIGHT_KEY)
            .ok_or_else(|| CaeError::Model(format!("{} missing from model state", WEIGHT_KEY)))?;
        debug!(ignored_entries = ignored, "Reading model state");

        let rows: Vec<Vec<f32>> = serde_json::from_value(weight)
            .map_err(|e| CaeError::Model(format!("{} is not a matrix: {}", WEIGHT_KEY, e)))?;

        let expected = (2 * n_bases, in_size);
        let actual = (rows.len(), rows.first().map_or(0, Vec::len));
        if actual != expected || rows.iter().any(|row| row.len() != in_size) {
            return Err(CaeError::Model(format!(
                "{} has shape {:?}, expected {:?}",
                WEIGHT_KEY, actual, expected
            )));
        }

        let weight = Array2::from_shape_vec(expected, rows.into_iter().flatten().collect())
            .map_err(|e| CaeError::Model(e.to_string()))?;

        Self::new(weight, n_bases)
    }
}

impl EmbeddingModel for ComplexAutoencoder {
    fn input_size(&self) -> usize {
        self.weight.ncols()
    }

    fn n_bases(&self) -> usize {
        self.n_bases
    }

    fn infer(&self, batch: ArrayView2<'_, f32>) -> Result<Embedding> {
        if batch.ncols() != self.input_size() {
            return Err(CaeError::Model(format!(
                "batch has {} columns, model expects {}",
                batch.ncols(),
                self.input_size()
            )));
        }

        let out = batch.dot(&self.weight.t());
        let real = out.slice(s![.., ..self.n_bases]);
        let imag = out.slice(s![.., self.n_bases..]);

        let amplitude = Zip::from(&real)
            .and(&imag)
            .map_collect(|&re, &im| (re * re + im * im).sqrt());
        let phase = Zip::from(&real)
            .and(&imag)
            .map_collect(|&re, &im| re.atan2(im));

        Ok(Embedding { amplitude, phase })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use serde_json::json;

    #[test]
    fn test_amplitude_and_phase() {
        // One basis: real = x0, imag = x1
        let model = ComplexAutoencoder::new(array![[1.0, 0.0], [0.0, 1.0]], 1).unwrap();
        let batch = array![[3.0f32, 4.0], [0.0, 2.0]];

        let embedding = model.infer(batch.view()).unwrap();

        assert_eq!(embedding.amplitude.dim(), (2, 1));
        assert!((embedding.amplitude[(0, 0)] - 5.0).abs() < 1e-6);
        assert!((embedding.amplitude[(1, 0)] - 2.0).abs() < 1e-6);
        // atan2(real, imag)
        assert!((embedding.phase[(0, 0)] - 3.0f32.atan2(4.0)).abs() < 1e-6);
        assert!(embedding.phase[(1, 0)].abs() < 1e-6);
    }

    #[test]
    fn test_wrong_batch_width() {
        let model = ComplexAutoencoder::new(Array2::zeros((4, 6)), 2).unwrap();
        let result = model.infer(Array2::<f32>::zeros((3, 5)).view());
        assert!(matches!(result, Err(CaeError::Model(_))));
    }

    #[test]
    fn test_state_json_ignores_extra_keys() {
        let state = json!({
            "layer.weight": [[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]],
            "layer.bias": [0.0, 0.0],
            "optimizer.step": 12
        });
        let model =
            ComplexAutoencoder::from_state_json(state.to_string().as_bytes(), 3, 1).unwrap();
        assert_eq!(model.input_size(), 3);
        assert_eq!(model.n_bases(), 1);
    }

    #[test]
    fn test_state_json_shape_mismatch() {
        let state = json!({"layer.weight": [[1.0, 2.0], [3.0, 4.0]]});
        let result = ComplexAutoencoder::from_state_json(state.to_string().as_bytes(), 3, 1);
        assert!(matches!(result, Err(CaeError::Model(_))));
    }

    #[test]
    fn test_state_json_missing_weight() {
        let state = json!({"other.weight": [[1.0]]});
        let result = ComplexAutoencoder::from_state_json(state.to_string().as_bytes(), 1, 1);
        match result {
            Err(CaeError::Model(message)) => assert!(message.contains(WEIGHT_KEY)),
            other => panic!("expected model error, got {:?}", other),
        }
    }
}
