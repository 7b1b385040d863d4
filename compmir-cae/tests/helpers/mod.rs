//! Test fixtures for compmir-cae
//!
//! Synthesized WAV files and model state files.

#![allow(dead_code)]

use serde_json::json;
use std::path::{Path, PathBuf};

/// Configuration for generated audio
#[derive(Debug, Clone)]
pub struct ToneConfig {
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub frequency: f32,
    /// Peak amplitude in [0, 1]
    pub amplitude: f32,
}

impl Default for ToneConfig {
    fn default() -> Self {
        Self {
            duration_seconds: 1.0,
            sample_rate: 22050,
            channels: 1,
            frequency: 440.0,
            amplitude: 0.3,
        }
    }
}

/// Write a 16-bit PCM sine tone
pub fn generate_tone_wav(path: &Path, config: &ToneConfig) -> hound::Result<PathBuf> {
    let spec = hound::WavSpec {
        channels: config.channels,
        sample_rate: config.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    let total_samples = (config.duration_seconds * config.sample_rate as f64) as usize;

    for i in 0..total_samples {
        let t = i as f32 / config.sample_rate as f32;
        let sample = (config.amplitude
            * (2.0 * std::f32::consts::PI * config.frequency * t).sin()
            * i16::MAX as f32) as i16;

        for _ in 0..config.channels {
            writer.write_sample(sample)?;
        }
    }

    writer.finalize()?;
    Ok(path.to_path_buf())
}

/// Write a model state map with a deterministic weight of the given shape
pub fn write_model_state(path: &Path, n_bases: usize, in_size: usize) -> std::io::Result<()> {
    let weight: Vec<Vec<f32>> = (0..2 * n_bases)
        .map(|r| {
            (0..in_size)
                .map(|c| (((r * 17 + c * 5) % 23) as f32 - 11.0) / 100.0)
                .collect()
        })
        .collect();

    let state = json!({
        "layer.weight": weight,
        "layer.bias": vec![0.0; 2 * n_bases],
    });
    std::fs::write(path, state.to_string())
}

/// TOML configuration with the eight extractor keys
pub fn config_toml(n_bins: usize, length_ngram: usize, n_bases: usize, sr: u32) -> String {
    format!(
        "n_bins = {n_bins}\n\
         length_ngram = {length_ngram}\n\
         n_bases = {n_bases}\n\
         dropout = 0.5\n\
         sr = {sr}\n\
         bins_per_oct = 12\n\
         fmin = 55\n\
         hop_length = 512\n"
    )
}
