//! compmir-dunya - client for the Dunya musicological database
//!
//! Provides:
//! - [`DunyaClient`]: token-authenticated REST transport
//! - [`RemoteQuery`]: the query seam the rest of the crate is written against
//! - [`MetadataAggregator`]: collection-wide metadata aggregation with per-recording error isolation
//! - [`Corpora`]: tradition-scoped access to recordings, entities, annotations and audio

pub mod aggregate;
pub mod annotation;
pub mod client;
pub mod corpora;
mod download;
pub mod error;
pub mod query;
pub mod types;
pub mod writers;

pub use aggregate::{AggregationResult, MetadataAggregator};
pub use annotation::{AnnotationSpec, ArtifactKind};
pub use client::DunyaClient;
pub use corpora::Corpora;
pub use error::{DunyaError, Result};
pub use query::RemoteQuery;
pub use types::{EntityKind, EntityRecord, Tradition};
