//! Remote query seam
//!
//! Everything above the transport talks to Dunya through [`RemoteQuery`].
//! Implementors supply the two raw operations; the typed queries used by the
//! aggregator are provided on top of them.

use crate::error::{DunyaError, Result};
use crate::types::{CollectionDocument, CollectionListing, RecordingDetail, Tradition};
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

/// Query parameters appended to a request path
pub type QueryParams<'a> = &'a [(&'a str, String)];

#[async_trait]
pub trait RemoteQuery: Send + Sync {
    /// GET `path` and decode the body as JSON
    async fn query_json(&self, path: &str, params: QueryParams<'_>) -> Result<Value>;

    /// GET `path` and return the raw body
    async fn query_bytes(&self, path: &str, params: QueryParams<'_>) -> Result<Vec<u8>>;

    /// List the documents (recordings) of a collection
    async fn list_collection(&self, collection: &str) -> Result<Vec<CollectionDocument>> {
        let response = self
            .query_json(&format!("document/{}", collection), &[])
            .await?;
        let listing: CollectionListing = serde_json::from_value(response)
            .map_err(|e| DunyaError::Parse(format!("collection {}: {}", collection, e)))?;

        debug!(
            collection = %collection,
            documents = listing.documents.len(),
            "Listed collection"
        );
        Ok(listing.documents)
    }

    /// Fetch the linked metadata of one recording
    async fn get_recording_detail(
        &self,
        tradition: Tradition,
        mbid: &str,
    ) -> Result<RecordingDetail> {
        let response = self
            .query_json(&format!("api/{}/recording/{}", tradition, mbid), &[])
            .await?;
        serde_json::from_value(response)
            .map_err(|e| DunyaError::Parse(format!("recording {}: {}", mbid, e)))
    }
}
