//! Tradition-scoped access to a Dunya corpus
//!
//! A [`Corpora`] is bound to one tradition and one collection (the full one
//! or its Creative Commons subset). Entity listings come from the metadata
//! loaded by [`Corpora::get_metadata`]; detail queries go to the server.

use crate::aggregate::{AggregationResult, MetadataAggregator};
use crate::annotation::{AnnotationSpec, ArtifactKind};
use crate::client::DunyaClient;
use crate::error::{DunyaError, Result};
use crate::query::RemoteQuery;
use crate::types::{CollectionDocument, EntityRecord, Tradition};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

/// Dunya corpora for one tradition
pub struct Corpora<Q = DunyaClient> {
    query: Q,
    tradition: Tradition,
    collection: String,
    metadata: Option<AggregationResult>,
}

impl Corpora<DunyaClient> {
    /// Open the corpora of `tradition` on the public Dunya server
    ///
    /// # Arguments
    /// * `creative_commons` - use the Creative Commons subset of the collection
    /// * `token` - Dunya personal access token
    pub fn new(tradition: Tradition, creative_commons: bool, token: &str) -> Result<Self> {
        let client = DunyaClient::new(token)?;
        Ok(Self::with_query(client, tradition, creative_commons))
    }
}

impl<Q: RemoteQuery> Corpora<Q> {
    /// Open the corpora over an arbitrary query backend
    pub fn with_query(query: Q, tradition: Tradition, creative_commons: bool) -> Self {
        let collection = tradition.collection(creative_commons);
        warn!(
            collection = %collection,
            "To load the full metadata of the initialized corpora, run get_metadata(). \
             Please note that it might take a while..."
        );

        Self {
            query,
            tradition,
            collection,
            metadata: None,
        }
    }

    pub fn tradition(&self) -> Tradition {
        self.tradition
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub(crate) fn query(&self) -> &Q {
        &self.query
    }

    /// Documents (recordings) of the collection
    pub async fn get_collection(&self) -> Result<Vec<CollectionDocument>> {
        self.query.list_collection(&self.collection).await
    }

    /// Load the full, deduplicated metadata of the collection
    ///
    /// Lists the collection, then aggregates every recording. Per-recording
    /// failures are skipped; a failure to list the collection or a rejected
    /// token fails the whole load and leaves previously loaded metadata
    /// untouched.
    pub async fn get_metadata(&mut self) -> Result<&AggregationResult> {
        let result = self.load_metadata().await.map_err(|e| DunyaError::Metadata {
            message: "Error accessing metadata. Have you entered the right token? \
                      If you are confident about that, consider loading the Corpora instance again."
                .to_string(),
            source: Box::new(e),
        })?;

        info!(
            collection = %self.collection,
            recordings = result.recording_list.len(),
            "Corpora metadata loaded"
        );

        Ok(self.metadata.insert(result))
    }

    async fn load_metadata(&self) -> Result<AggregationResult> {
        let recording_ids: Vec<String> = self
            .get_collection()
            .await?
            .into_iter()
            .map(|doc| doc.mbid)
            .collect();

        MetadataAggregator::new(&self.query, self.tradition)
            .aggregate(&recording_ids)
            .await
    }

    /// Metadata loaded by [`Corpora::get_metadata`]
    pub fn metadata(&self) -> Result<&AggregationResult> {
        self.metadata.as_ref().ok_or(DunyaError::MetadataNotLoaded)
    }

    pub fn list_recordings(&self) -> Result<&[String]> {
        Ok(&self.metadata()?.recording_list)
    }

    pub fn list_artists(&self) -> Result<&[EntityRecord]> {
        Ok(&self.metadata()?.artist_list)
    }

    pub fn list_concerts(&self) -> Result<&[EntityRecord]> {
        Ok(&self.metadata()?.concert_list)
    }

    pub fn list_works(&self) -> Result<&[EntityRecord]> {
        Ok(&self.metadata()?.work_list)
    }

    pub fn list_ragas(&self) -> Result<&[EntityRecord]> {
        Ok(&self.metadata()?.raga_list)
    }

    pub fn list_talas(&self) -> Result<&[EntityRecord]> {
        Ok(&self.metadata()?.tala_list)
    }

    pub fn list_instruments(&self) -> Result<&[EntityRecord]> {
        Ok(&self.metadata()?.instrument_list)
    }

    async fn get_entity(&self, endpoint: &str, id: &str) -> Result<Value> {
        self.query
            .query_json(&format!("api/{}/{}/{}", self.tradition, endpoint, id), &[])
            .await
    }

    /// Recording detail: mbid, title, artists, raga, tala, work
    pub async fn get_recording(&self, mbid: &str) -> Result<Value> {
        self.get_entity("recording", mbid).await
    }

    /// Artist detail: mbid, name, concerts, instruments, recordings
    pub async fn get_artist(&self, mbid: &str) -> Result<Value> {
        self.get_entity("artist", mbid).await
    }

    /// Concert detail: mbid, title, artists, tracks
    pub async fn get_concert(&self, mbid: &str) -> Result<Value> {
        self.get_entity("concert", mbid).await
    }

    /// Work detail: mbid, title, composers, ragas, talas, recordings
    pub async fn get_work(&self, mbid: &str) -> Result<Value> {
        self.get_entity("work", mbid).await
    }

    /// Raga detail by id or uuid
    pub async fn get_raga(&self, raga_id: &str) -> Result<Value> {
        self.get_entity("raaga", raga_id).await
    }

    /// Tala detail by id or uuid
    pub async fn get_tala(&self, tala_id: &str) -> Result<Value> {
        self.get_entity("taala", tala_id).await
    }

    /// Instrument detail by id
    pub async fn get_instrument(&self, instrument_id: &str) -> Result<Value> {
        self.get_entity("instrument", instrument_id).await
    }

    /// Derived file types available for a recording, with their subtypes
    pub async fn list_available_types(
        &self,
        recording_id: &str,
    ) -> Result<BTreeMap<String, Vec<String>>> {
        let document = self
            .query
            .query_json(&format!("document/by-id/{}", recording_id), &[])
            .await?;

        let derived = document
            .get("derivedfiles")
            .and_then(Value::as_object)
            .ok_or_else(|| DunyaError::missing_field("document", "derivedfiles"))?;

        Ok(derived
            .iter()
            .map(|(thetype, subtypes)| {
                let names = subtypes
                    .as_object()
                    .map(|s| s.keys().cloned().collect())
                    .unwrap_or_default();
                (thetype.clone(), names)
            })
            .collect())
    }

    /// Contents of a derived file, decoded as JSON
    ///
    /// Bodies that are not JSON are returned as a string.
    pub async fn get_annotation(&self, spec: &AnnotationSpec<'_>) -> Result<Value> {
        let body = self.query.query_bytes(&spec.path(), &spec.params()).await?;

        match serde_json::from_slice(&body) {
            Ok(value) => Ok(value),
            Err(_) => String::from_utf8(body)
                .map(|text| Value::String(text.trim().to_string()))
                .map_err(|e| DunyaError::Parse(format!("{}: {}", spec.path(), e))),
        }
    }

    /// Fetch a derived file and write it to `location`
    ///
    /// The writer is chosen from the subtype before anything is fetched.
    pub async fn save_annotation(
        &self,
        spec: &AnnotationSpec<'_>,
        location: &Path,
    ) -> Result<ArtifactKind> {
        let kind = ArtifactKind::from_subtype(spec.thetype, spec.subtype)?;
        let data = self.get_annotation(spec).await?;
        kind.write(&data, location)?;

        info!(
            recording = %spec.recording_id,
            thetype = %spec.thetype,
            kind = ?kind,
            path = %location.display(),
            "Saved annotation"
        );
        Ok(kind)
    }
}
