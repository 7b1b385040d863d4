//! Collection-wide metadata aggregation
//!
//! Walks a list of recordings, fetches each recording's detail once and folds
//! the linked artists, concerts, works, ragas, talas and instruments into
//! identifier-keyed lists.
//!
//! Per-recording error isolation: a recording whose detail cannot be fetched
//! or parsed contributes nothing (not even to `recording_list`) and the walk
//! continues. Only errors that are not item-local abort the aggregation.

use crate::error::{DunyaError, Result};
use crate::query::RemoteQuery;
use crate::types::{EntityKind, EntityRecord, RecordingDetail, Tradition};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Progress is logged every this many recordings
const PROGRESS_INTERVAL: usize = 50;

/// Deduplicated metadata of a collection
#[derive(Debug, Clone, Default, Serialize)]
pub struct AggregationResult {
    /// Recordings whose metadata was processed successfully
    pub recording_list: Vec<String>,
    pub artist_list: Vec<EntityRecord>,
    pub concert_list: Vec<EntityRecord>,
    pub work_list: Vec<EntityRecord>,
    pub raga_list: Vec<EntityRecord>,
    pub tala_list: Vec<EntityRecord>,
    pub instrument_list: Vec<EntityRecord>,
}

/// Deduplicate records by identifier
///
/// The last record seen with a given identifier wins. Output order is the
/// map's iteration order and carries no meaning.
pub fn dedup_by_id(records: Vec<EntityRecord>) -> Vec<EntityRecord> {
    let mut by_id: HashMap<String, EntityRecord> = HashMap::with_capacity(records.len());
    for record in records {
        by_id.insert(record.id.clone(), record);
    }
    by_id.into_values().collect()
}

/// Flat, duplicate-carrying entity lists
#[derive(Debug, Default)]
struct Accumulators {
    artists: Vec<EntityRecord>,
    concerts: Vec<EntityRecord>,
    works: Vec<EntityRecord>,
    ragas: Vec<EntityRecord>,
    talas: Vec<EntityRecord>,
    instruments: Vec<EntityRecord>,
}

impl Accumulators {
    /// Stage one recording's linked entities
    ///
    /// Fails without side effects on the caller's accumulators: the staged
    /// lists are only merged once the whole recording converted.
    fn from_detail(detail: RecordingDetail) -> Result<Self> {
        let mut staged = Accumulators::default();

        for performance in detail.artists {
            if performance.lead {
                let artist = performance
                    .artist
                    .ok_or_else(|| DunyaError::missing_field("lead performance", "artist"))?;
                staged.artists.push(EntityRecord::from_map(
                    EntityKind::Artist,
                    entity_object("artist", artist)?,
                )?);
            }
            match performance.instrument {
                Value::Null => {}
                instrument => staged.instruments.push(EntityRecord::from_map(
                    EntityKind::Instrument,
                    entity_object("instrument", instrument)?,
                )?),
            }
        }

        staged.concerts = convert_all(EntityKind::Concert, detail.concert)?;
        staged.works = convert_all(EntityKind::Work, detail.work)?;
        staged.ragas = convert_all(EntityKind::Raga, detail.raaga)?;
        staged.talas = convert_all(EntityKind::Tala, detail.taala)?;

        Ok(staged)
    }

    fn merge(&mut self, other: Accumulators) {
        self.artists.extend(other.artists);
        self.concerts.extend(other.concerts);
        self.works.extend(other.works);
        self.ragas.extend(other.ragas);
        self.talas.extend(other.talas);
        self.instruments.extend(other.instruments);
    }

    fn into_result(self, recording_list: Vec<String>) -> AggregationResult {
        AggregationResult {
            recording_list,
            artist_list: dedup_by_id(self.artists),
            concert_list: dedup_by_id(self.concerts),
            work_list: dedup_by_id(self.works),
            raga_list: dedup_by_id(self.ragas),
            tala_list: dedup_by_id(self.talas),
            instrument_list: dedup_by_id(self.instruments),
        }
    }
}

fn entity_object(context: &str, value: Value) -> Result<Map<String, Value>> {
    match value {
        Value::Object(fields) => Ok(fields),
        other => Err(DunyaError::Parse(format!("{} is not an object: {}", context, other))),
    }
}

fn convert_all(kind: EntityKind, records: Vec<Map<String, Value>>) -> Result<Vec<EntityRecord>> {
    records
        .into_iter()
        .map(|fields| EntityRecord::from_map(kind, fields))
        .collect()
}

/// Sequential metadata aggregator
pub struct MetadataAggregator<'a, Q: RemoteQuery + ?Sized> {
    query: &'a Q,
    tradition: Tradition,
}

impl<'a, Q: RemoteQuery + ?Sized> MetadataAggregator<'a, Q> {
    pub fn new(query: &'a Q, tradition: Tradition) -> Self {
        Self { query, tradition }
    }

    /// Aggregate the metadata of `recording_ids`
    ///
    /// Recordings are fetched one at a time, in the given order. Item-local
    /// failures are logged and skipped; any other failure is returned.
    pub async fn aggregate(&self, recording_ids: &[String]) -> Result<AggregationResult> {
        let total = recording_ids.len();
        let mut accumulators = Accumulators::default();
        let mut recording_list = Vec::with_capacity(total);
        let mut skipped = 0usize;

        info!(
            tradition = %self.tradition,
            recordings = total,
            "Parsing metadata from database"
        );

        for (index, mbid) in recording_ids.iter().enumerate() {
            match self.collect_recording(mbid).await {
                Ok(staged) => {
                    accumulators.merge(staged);
                    recording_list.push(mbid.clone());
                }
                Err(e) if e.is_item_local() => {
                    warn!(recording = %mbid, error = %e, "Skipping recording");
                    skipped += 1;
                }
                Err(e) => return Err(e),
            }

            if (index + 1) % PROGRESS_INTERVAL == 0 {
                info!(processed = index + 1, total, "Metadata progress");
            }
        }

        let result = accumulators.into_result(recording_list);

        info!(
            processed = result.recording_list.len(),
            skipped,
            artists = result.artist_list.len(),
            concerts = result.concert_list.len(),
            works = result.work_list.len(),
            ragas = result.raga_list.len(),
            talas = result.tala_list.len(),
            instruments = result.instrument_list.len(),
            "Metadata aggregation complete"
        );

        Ok(result)
    }

    async fn collect_recording(&self, mbid: &str) -> Result<Accumulators> {
        let detail = self.query.get_recording_detail(self.tradition, mbid).await?;
        let staged = Accumulators::from_detail(detail)?;

        debug!(
            recording = %mbid,
            artists = staged.artists.len(),
            concerts = staged.concerts.len(),
            works = staged.works.len(),
            "Collected recording metadata"
        );

        Ok(staged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(kind: EntityKind, value: serde_json::Value) -> EntityRecord {
        EntityRecord::from_map(kind, value.as_object().cloned().unwrap()).unwrap()
    }

    #[test]
    fn test_dedup_last_write_wins() {
        let records = vec![
            record(EntityKind::Artist, json!({"mbid": "a", "name": "first"})),
            record(EntityKind::Artist, json!({"mbid": "b", "name": "other"})),
            record(EntityKind::Artist, json!({"mbid": "a", "name": "last"})),
        ];

        let deduped = dedup_by_id(records);
        assert_eq!(deduped.len(), 2);

        let a = deduped.iter().find(|r| r.id == "a").unwrap();
        assert_eq!(a.name(), Some("last"));
    }

    #[test]
    fn test_dedup_is_idempotent() {
        let records = vec![
            record(EntityKind::Raga, json!({"uuid": "r1"})),
            record(EntityKind::Raga, json!({"uuid": "r2"})),
            record(EntityKind::Raga, json!({"uuid": "r1"})),
        ];

        let once = dedup_by_id(records);
        let mut twice = dedup_by_id(once.clone());
        let mut once_sorted = once;
        once_sorted.sort_by(|a, b| a.id.cmp(&b.id));
        twice.sort_by(|a, b| a.id.cmp(&b.id));

        assert_eq!(once_sorted, twice);
    }

    #[test]
    fn test_staging_only_takes_lead_artists() {
        let detail: RecordingDetail = serde_json::from_value(json!({
            "artists": [
                {"lead": true, "artist": {"mbid": "lead"}, "instrument": {"mbid": "vocal"}},
                {"lead": false, "artist": {"mbid": "accompanist"}, "instrument": {"mbid": "violin"}}
            ],
            "concert": [], "work": [], "raaga": [], "taala": []
        }))
        .unwrap();

        let staged = Accumulators::from_detail(detail).unwrap();
        assert_eq!(staged.artists.len(), 1);
        assert_eq!(staged.artists[0].id, "lead");
        assert_eq!(staged.instruments.len(), 2);
    }

    #[test]
    fn test_non_lead_performer_needs_no_artist() {
        let detail: RecordingDetail = serde_json::from_value(json!({
            "artists": [
                {"lead": true, "artist": {"mbid": "lead"}, "instrument": {"mbid": "vocal"}},
                {"lead": false, "instrument": {"mbid": "violin"}}
            ],
            "concert": [], "work": [], "raaga": [], "taala": []
        }))
        .unwrap();

        let staged = Accumulators::from_detail(detail).unwrap();
        assert_eq!(staged.artists.len(), 1);
        assert_eq!(staged.instruments.len(), 2);
    }

    #[test]
    fn test_lead_performer_without_artist_fails() {
        let detail: RecordingDetail = serde_json::from_value(json!({
            "artists": [{"lead": true, "instrument": {"mbid": "vocal"}}],
            "concert": [], "work": [], "raaga": [], "taala": []
        }))
        .unwrap();

        assert!(matches!(
            Accumulators::from_detail(detail),
            Err(DunyaError::MissingField { .. })
        ));
    }

    #[test]
    fn test_instrument_must_be_object_or_null() {
        let detail: RecordingDetail = serde_json::from_value(json!({
            "artists": [{"lead": false, "instrument": "violin"}],
            "concert": [], "work": [], "raaga": [], "taala": []
        }))
        .unwrap();

        assert!(matches!(
            Accumulators::from_detail(detail),
            Err(DunyaError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_instrument_key_is_rejected() {
        let detail = serde_json::from_value::<RecordingDetail>(json!({
            "artists": [{"lead": true, "artist": {"mbid": "a1"}}],
            "concert": [], "work": [], "raaga": [], "taala": []
        }));
        assert!(detail.is_err());
    }

    #[test]
    fn test_staging_fails_on_entity_without_identifier() {
        let detail: RecordingDetail = serde_json::from_value(json!({
            "artists": [],
            "concert": [{"mbid": "c"}],
            "work": [{"title": "no id"}],
            "raaga": [], "taala": []
        }))
        .unwrap();

        assert!(Accumulators::from_detail(detail).is_err());
    }
}
