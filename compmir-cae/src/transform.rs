//! Time-frequency representations
//!
//! [`CqtTransform`] computes a pseudo constant-Q magnitude spectrogram: one
//! Hann-windowed FFT per hop, each CQT bin read off the FFT by linear
//! interpolation and scaled by its filter length. The magnitudes are log
//! compressed, standardized over the whole matrix and returned frames × bins.

use crate::audio;
use crate::error::{CaeError, Result};
use crate::params::FeatureParameters;
use crate::window::standardize;
use ndarray::Array2;
use num_complex::Complex32;
use rustfft::{Fft, FftPlanner};
use std::f32::consts::PI;
use std::path::Path;
use tracing::debug;

/// Smallest FFT used regardless of filter lengths
const MIN_FFT_SIZE: usize = 512;

/// Longest filter, in samples, a bin layout may ask for
pub const MAX_FILTER_LENGTH: usize = 1 << 22;

/// Produces the time-frequency matrix windows are cut from
pub trait Transform: Send + Sync {
    /// Standardized matrix of `audio_path`, one row per frame and
    /// `params.n_bins` columns
    fn time_frequency(&self, audio_path: &Path, params: &FeatureParameters) -> Result<Array2<f32>>;
}

/// Pseudo-CQT over decoded, resampled audio
#[derive(Debug, Clone, Copy, Default)]
pub struct CqtTransform;

impl Transform for CqtTransform {
    fn time_frequency(&self, audio_path: &Path, params: &FeatureParameters) -> Result<Array2<f32>> {
        // Reject impossible bin layouts before decoding anything
        let frequencies = cqt_frequencies(params)?;

        let samples = audio::load_mono(audio_path, params.sr)?;
        if samples.is_empty() {
            return Err(CaeError::Audio(format!(
                "Empty signal after resampling: {}",
                audio_path.display()
            )));
        }

        let mut magnitudes = pseudo_cqt_magnitude(&samples, params, &frequencies);
        magnitudes.mapv_inplace(f32::ln_1p);
        standardize(&mut magnitudes);

        let representation = magnitudes.t().as_standard_layout().into_owned();

        debug!(
            path = %audio_path.display(),
            frames = representation.nrows(),
            bins = representation.ncols(),
            "Computed CQT representation"
        );

        Ok(representation)
    }
}

/// Constant-Q quality factor for `bins_per_oct`
fn quality_factor(bins_per_oct: usize) -> f64 {
    1.0 / (2f64.powf(1.0 / bins_per_oct as f64) - 1.0)
}

/// Centre frequency of every bin
///
/// Fails when a bin lies at or above the Nyquist frequency, or when the
/// lowest bin would need a filter longer than [`MAX_FILTER_LENGTH`].
pub fn cqt_frequencies(params: &FeatureParameters) -> Result<Vec<f32>> {
    let nyquist = params.sr as f64 / 2.0;

    let longest = params.sr as f64 * quality_factor(params.bins_per_oct) / params.fmin;
    if longest > MAX_FILTER_LENGTH as f64 {
        return Err(CaeError::Transform(format!(
            "fmin {} Hz needs a {:.0} sample filter at {} Hz (limit {})",
            params.fmin, longest, params.sr, MAX_FILTER_LENGTH
        )));
    }

    (0..params.n_bins)
        .map(|k| {
            let freq = params.fmin * 2f64.powf(k as f64 / params.bins_per_oct as f64);
            if freq >= nyquist {
                Err(CaeError::Transform(format!(
                    "CQT bin {} ({:.1} Hz) is above the Nyquist frequency {:.1} Hz",
                    k, freq, nyquist
                )))
            } else {
                Ok(freq as f32)
            }
        })
        .collect()
}

/// Pseudo-CQT magnitudes, bins × frames
///
/// Frames are centred on multiples of the hop length, with the signal
/// zero-padded at both ends, giving `1 + len / hop_length` frames.
/// `frequencies` are expected to come from [`cqt_frequencies`].
pub fn pseudo_cqt_magnitude(
    samples: &[f32],
    params: &FeatureParameters,
    frequencies: &[f32],
) -> Array2<f32> {
    let sr = params.sr as f32;
    let hop_length = params.hop_length;

    // Filter length per bin for a constant Q
    let q = quality_factor(params.bins_per_oct) as f32;
    let lengths: Vec<f32> = frequencies
        .iter()
        .map(|&f| (sr * q / f).ceil().max(1.0))
        .collect();

    let max_len = lengths.iter().copied().fold(1.0f32, f32::max) as usize;
    let n_fft = max_len.next_power_of_two().max(MIN_FFT_SIZE);
    let half = n_fft / 2;
    let n_frames = 1 + samples.len() / hop_length;

    let hann: Vec<f32> = (0..n_fft)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / (n_fft - 1) as f32).cos()))
        .collect();

    let fft = FftPlanner::<f32>::new().plan_fft_forward(n_fft);
    let mut buffer = vec![Complex32::new(0.0, 0.0); n_fft];
    let mut result = Array2::<f32>::zeros((frequencies.len(), n_frames));

    debug!(n_fft, n_frames, bins = frequencies.len(), "Pseudo-CQT");

    for frame_idx in 0..n_frames {
        let start = (frame_idx * hop_length) as isize - half as isize;

        for (i, value) in buffer.iter_mut().enumerate() {
            let sample_idx = start + i as isize;
            let sample = if sample_idx >= 0 && (sample_idx as usize) < samples.len() {
                samples[sample_idx as usize]
            } else {
                0.0
            };
            *value = Complex32::new(sample * hann[i], 0.0);
        }

        fft.process(&mut buffer);

        for (bin_idx, &freq) in frequencies.iter().enumerate() {
            let fft_bin = freq * n_fft as f32 / sr;
            let bin_low = fft_bin.floor() as usize;
            if bin_low >= half {
                continue;
            }
            let bin_high = (bin_low + 1).min(half);
            let frac = fft_bin - bin_low as f32;

            let value = buffer[bin_low] * (1.0 - frac) + buffer[bin_high] * frac;
            let scale = (n_fft as f32 / lengths[bin_idx]).sqrt();
            result[(bin_idx, frame_idx)] = value.norm() * scale;
        }
    }

    result
}
