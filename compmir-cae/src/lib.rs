//! compmir-cae - windowed feature extraction with a complex autoencoder
//!
//! Audio is turned into a standardized time-frequency matrix (pseudo-CQT),
//! cut into overlapping n-gram windows and projected by a trained complex
//! autoencoder into per-window amplitude and phase features.
//!
//! The two collaborators are traits so the pipeline can be driven by any
//! representation or model:
//! - [`Transform`]: audio file → frames × bins matrix
//! - [`EmbeddingModel`]: window batch → amplitude / phase

pub mod audio;
pub mod error;
pub mod extractor;
pub mod model;
pub mod params;
pub mod transform;
pub mod window;

pub use error::{CaeError, ConfigError, Result};
pub use extractor::CaeFeatureExtractor;
pub use model::{ComplexAutoencoder, Embedding, EmbeddingModel};
pub use params::FeatureParameters;
pub use transform::{CqtTransform, Transform};
