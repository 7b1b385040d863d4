//! CAE feature extractor
//!
//! **Pipeline:**
//! 1. Audio → standardized time-frequency matrix (frames × bins)
//! 2. Stride-1 windows of `length_ngram` frames, each flattened and standardized
//! 3. One batched model call → amplitude and phase per window

use crate::error::{CaeError, Result};
use crate::model::{ComplexAutoencoder, Embedding, EmbeddingModel};
use crate::params::FeatureParameters;
use crate::transform::{CqtTransform, Transform};
use crate::window::{ngram_windows, window_count};
use ndarray::{Array2, ArrayView2};
use std::path::Path;
use tracing::{debug, info};

/// Compute device of the ndarray backend
const DEVICE: &str = "cpu";

/// Windowed feature extractor
///
/// Immutable after construction; safe to share between threads.
pub struct CaeFeatureExtractor<T = CqtTransform, M = ComplexAutoencoder> {
    params: FeatureParameters,
    transform: T,
    model: M,
}

impl CaeFeatureExtractor {
    /// Load the configuration at `conf_path` and the trained weights at
    /// `model_path`
    ///
    /// Fails on an invalid configuration before the weights are touched.
    pub fn new(model_path: &Path, conf_path: &Path) -> Result<Self> {
        let params = FeatureParameters::from_path(conf_path)?;
        let model = ComplexAutoencoder::load(model_path, params.input_size(), params.n_bases)?;
        Self::with_parts(params, CqtTransform, model)
    }
}

impl<T: Transform, M: EmbeddingModel> CaeFeatureExtractor<T, M> {
    /// Assemble an extractor from its collaborators
    ///
    /// The model's dimensions must match the parameters.
    pub fn with_parts(params: FeatureParameters, transform: T, model: M) -> Result<Self> {
        if model.input_size() != params.input_size() {
            return Err(CaeError::Model(format!(
                "model input size {} does not match n_bins * length_ngram = {}",
                model.input_size(),
                params.input_size()
            )));
        }
        if model.n_bases() != params.n_bases {
            return Err(CaeError::Model(format!(
                "model has {} bases, configuration expects {}",
                model.n_bases(),
                params.n_bases
            )));
        }

        info!(
            device = DEVICE,
            n_bins = params.n_bins,
            length_ngram = params.length_ngram,
            n_bases = params.n_bases,
            sr = params.sr,
            "CAE feature extractor ready"
        );

        Ok(Self {
            params,
            transform,
            model,
        })
    }

    pub fn params(&self) -> &FeatureParameters {
        &self.params
    }

    /// Amplitude and phase features of `audio_path`, one row per window
    pub fn extract_features(&self, audio_path: &Path) -> Result<Embedding> {
        let representation = self.time_frequency(audio_path)?;
        let embedding = self.to_amp_phase(representation.view())?;

        info!(
            path = %audio_path.display(),
            frames = representation.nrows(),
            windows = embedding.n_windows(),
            "Extracted CAE features"
        );
        Ok(embedding)
    }

    /// Standardized time-frequency matrix of `audio_path`, frames × bins
    pub fn time_frequency(&self, audio_path: &Path) -> Result<Array2<f32>> {
        let representation = self.transform.time_frequency(audio_path, &self.params)?;

        if representation.ncols() != self.params.n_bins {
            return Err(CaeError::Transform(format!(
                "representation has {} bins, expected {}",
                representation.ncols(),
                self.params.n_bins
            )));
        }
        Ok(representation)
    }

    /// Window `representation` and run the model over all windows at once
    ///
    /// With fewer frames than `length_ngram` the model is not called and
    /// both matrices have zero rows.
    pub fn to_amp_phase(&self, representation: ArrayView2<'_, f32>) -> Result<Embedding> {
        let frames = representation.nrows();
        let windows = window_count(frames, self.params.length_ngram);

        if windows == 0 {
            debug!(
                frames,
                length_ngram = self.params.length_ngram,
                "Too few frames for a single window"
            );
            return Ok(Embedding::empty(self.params.n_bases));
        }

        let batch = ngram_windows(representation, self.params.length_ngram);
        debug!(windows, width = batch.ncols(), "Running model inference");

        self.model.infer(batch.view())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedTransform(Array2<f32>);

    impl Transform for FixedTransform {
        fn time_frequency(&self, _: &Path, _: &FeatureParameters) -> Result<Array2<f32>> {
            Ok(self.0.clone())
        }
    }

    /// Counts calls and echoes the first `n_bases` columns
    struct CountingModel {
        input_size: usize,
        n_bases: usize,
        calls: AtomicUsize,
    }

    impl EmbeddingModel for CountingModel {
        fn input_size(&self) -> usize {
            self.input_size
        }

        fn n_bases(&self) -> usize {
            self.n_bases
        }

        fn infer(&self, batch: ArrayView2<'_, f32>) -> Result<Embedding> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let cols = batch.slice(ndarray::s![.., ..self.n_bases]).to_owned();
            Ok(Embedding {
                amplitude: cols.mapv(f32::abs),
                phase: cols,
            })
        }
    }

    fn params(n_bins: usize, length_ngram: usize, n_bases: usize) -> FeatureParameters {
        FeatureParameters {
            n_bins,
            length_ngram,
            n_bases,
            dropout: 0.5,
            sr: 22050,
            bins_per_oct: 12,
            fmin: 32.7,
            hop_length: 512,
        }
    }

    fn extractor(
        frames: usize,
        p: FeatureParameters,
    ) -> CaeFeatureExtractor<FixedTransform, CountingModel> {
        let tf = Array2::from_shape_fn((frames, p.n_bins), |(t, b)| ((t * 31 + b * 7) % 13) as f32);
        let model = CountingModel {
            input_size: p.input_size(),
            n_bases: p.n_bases,
            calls: AtomicUsize::new(0),
        };
        CaeFeatureExtractor::with_parts(p, FixedTransform(tf), model).unwrap()
    }

    #[test]
    fn test_one_row_per_window() {
        let extractor = extractor(50, params(6, 8, 3));
        let embedding = extractor.extract_features(Path::new("unused.wav")).unwrap();

        assert_eq!(embedding.amplitude.dim(), (43, 3));
        assert_eq!(embedding.phase.dim(), (43, 3));
        assert_eq!(extractor.model.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_short_input_skips_model() {
        let extractor = extractor(5, params(6, 8, 3));
        let embedding = extractor.extract_features(Path::new("unused.wav")).unwrap();

        assert_eq!(embedding.amplitude.dim(), (0, 3));
        assert_eq!(embedding.phase.dim(), (0, 3));
        assert_eq!(extractor.model.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_mismatched_model_rejected() {
        let p = params(6, 8, 3);
        let model = CountingModel {
            input_size: 47,
            n_bases: 3,
            calls: AtomicUsize::new(0),
        };
        let result =
            CaeFeatureExtractor::with_parts(p, FixedTransform(Array2::zeros((1, 6))), model);
        assert!(matches!(result, Err(CaeError::Model(_))));
    }

    #[test]
    fn test_wrong_bin_count_from_transform() {
        let p = params(6, 2, 1);
        let model = CountingModel {
            input_size: 12,
            n_bases: 1,
            calls: AtomicUsize::new(0),
        };
        let extractor =
            CaeFeatureExtractor::with_parts(p, FixedTransform(Array2::zeros((10, 5))), model)
                .unwrap();
        let result = extractor.extract_features(Path::new("unused.wav"));
        assert!(matches!(result, Err(CaeError::Transform(_))));
    }

    #[test]
    fn test_extractor_is_send_and_sync() {
        fn assert_send_sync<S: Send + Sync>() {}
        assert_send_sync::<CaeFeatureExtractor>();
    }
}
