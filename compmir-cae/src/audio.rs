//! Audio decoding and resampling
//!
//! Uses symphonia for format-agnostic decoding (MP3, FLAC, WAV, OGG, ...) and
//! rubato for sample rate conversion. Everything downstream works on mono f32.

use crate::error::{CaeError, Result};
use rubato::{FastFixedIn, PolynomialDegree, Resampler};
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// Decoded mono audio
#[derive(Debug)]
pub struct DecodedAudio {
    /// Mono samples in [-1.0, 1.0]
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    /// Channel count of the source before downmixing
    pub channels: usize,
}

impl DecodedAudio {
    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Decode an audio file to mono f32 samples
///
/// Channels are averaged. Corrupt packets are skipped with a warning; an
/// unreadable container or a file without audio is an error.
pub fn decode_audio_file(file_path: &Path) -> Result<DecodedAudio> {
    debug!(path = %file_path.display(), "Decoding audio file");

    let file = std::fs::File::open(file_path).map_err(|e| {
        CaeError::Audio(format!(
            "Failed to open audio file {}: {}",
            file_path.display(),
            e
        ))
    })?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = file_path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| {
            CaeError::Audio(format!(
                "Failed to probe audio file {}: {}",
                file_path.display(),
                e
            ))
        })?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| CaeError::Audio("No audio track found in file".to_string()))?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| CaeError::Audio("Sample rate unknown".to_string()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| {
            CaeError::Audio(format!(
                "Failed to create decoder for {}: {}",
                file_path.display(),
                e
            ))
        })?;

    let mut samples: Vec<f32> = Vec::new();
    let mut channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(0);

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(CaeError::Audio(format!("Error reading packet: {}", e))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                warn!(path = %file_path.display(), error = %e, "Skipping corrupt packet");
                continue;
            }
            Err(e) => {
                return Err(CaeError::Audio(format!(
                    "Failed to decode packet in {}: {}",
                    file_path.display(),
                    e
                )))
            }
        };

        let spec = *decoded.spec();
        let channel_count = spec.channels.count().max(1);
        channels = channel_count;

        let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buffer.copy_interleaved_ref(decoded);
        samples.extend(
            buffer
                .samples()
                .chunks(channel_count)
                .map(|frame| frame.iter().sum::<f32>() / channel_count as f32),
        );
    }

    if samples.is_empty() {
        return Err(CaeError::Audio(format!(
            "No samples decoded from {}",
            file_path.display()
        )));
    }

    let audio = DecodedAudio {
        samples,
        sample_rate,
        channels,
    };

    debug!(
        path = %file_path.display(),
        sample_rate,
        channels = audio.channels,
        total_samples = audio.samples.len(),
        duration_seconds = format!("{:.2}", audio.duration_seconds()),
        "Audio decoding complete"
    );

    Ok(audio)
}

/// Resample mono audio from `input_rate` to `output_rate`
///
/// Returns a copy when the rates already match.
pub fn resample(input: &[f32], input_rate: u32, output_rate: u32) -> Result<Vec<f32>> {
    if input_rate == output_rate {
        debug!(rate = output_rate, "Sample rate already matches, skipping resample");
        return Ok(input.to_vec());
    }

    if input.is_empty() {
        return Ok(Vec::new());
    }

    debug!(from = input_rate, to = output_rate, frames = input.len(), "Resampling");

    // One chunk spanning the whole signal
    let mut resampler = FastFixedIn::<f32>::new(
        output_rate as f64 / input_rate as f64,
        1.0,
        PolynomialDegree::Septic,
        input.len(),
        1,
    )
    .map_err(|e| CaeError::Transform(format!("Failed to create resampler: {}", e)))?;

    let mut output = resampler
        .process(&[input], None)
        .map_err(|e| CaeError::Transform(format!("Resampling failed: {}", e)))?;

    let resampled = output.pop().unwrap_or_default();

    debug!(
        input_frames = input.len(),
        output_frames = resampled.len(),
        "Resampling complete"
    );

    Ok(resampled)
}

/// Decode `file_path` and bring it to `target_rate`
pub fn load_mono(file_path: &Path, target_rate: u32) -> Result<Vec<f32>> {
    let audio = decode_audio_file(file_path)?;
    resample(&audio.samples, audio.sample_rate, target_rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_audio_file_not_found() {
        let result = decode_audio_file(Path::new("/nonexistent/file.mp3"));
        match result {
            Err(CaeError::Audio(message)) => assert!(message.contains("Failed to open audio file")),
            other => panic!("expected audio error, got {:?}", other),
        }
    }

    #[test]
    fn test_resample_same_rate() {
        let input = vec![0.1, 0.2, 0.3];
        assert_eq!(resample(&input, 22050, 22050).unwrap(), input);
    }

    #[test]
    fn test_resample_halves_length() {
        let input: Vec<f32> = (0..44100).map(|i| (i as f32 * 0.01).sin()).collect();
        let output = resample(&input, 44100, 22050).unwrap();

        let expected = 22050usize;
        assert!(
            output.len().abs_diff(expected) < 64,
            "unexpected output length {}",
            output.len()
        );
    }
}
