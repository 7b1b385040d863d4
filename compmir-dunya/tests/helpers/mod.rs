//! Test helpers for compmir-dunya
//!
//! `MockQuery` serves canned responses keyed by request path.

#![allow(dead_code)]

use async_trait::async_trait;
use compmir_dunya::query::{QueryParams, RemoteQuery};
use compmir_dunya::{DunyaError, Result};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory Dunya server
#[derive(Default)]
pub struct MockQuery {
    json: HashMap<String, Value>,
    bytes: HashMap<String, Vec<u8>>,
    unauthorized: Vec<String>,
    requests: Mutex<Vec<String>>,
}

impl MockQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_json(mut self, path: &str, value: Value) -> Self {
        self.json.insert(path.to_string(), value);
        self
    }

    pub fn with_bytes(mut self, path: &str, body: &[u8]) -> Self {
        self.bytes.insert(path.to_string(), body.to_vec());
        self
    }

    /// Answer `path` with a rejected-token error
    pub fn with_unauthorized(mut self, path: &str) -> Self {
        self.unauthorized.push(path.to_string());
        self
    }

    /// Paths requested so far, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    fn record(&self, path: &str) -> Result<()> {
        self.requests.lock().unwrap().push(path.to_string());
        if self.unauthorized.iter().any(|p| p == path) {
            return Err(DunyaError::Unauthorized);
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteQuery for MockQuery {
    async fn query_json(&self, path: &str, _params: QueryParams<'_>) -> Result<Value> {
        self.record(path)?;
        self.json
            .get(path)
            .cloned()
            .ok_or_else(|| DunyaError::NotFound(path.to_string()))
    }

    async fn query_bytes(&self, path: &str, _params: QueryParams<'_>) -> Result<Vec<u8>> {
        self.record(path)?;
        if let Some(body) = self.bytes.get(path) {
            return Ok(body.clone());
        }
        self.json
            .get(path)
            .map(|value| value.to_string().into_bytes())
            .ok_or_else(|| DunyaError::NotFound(path.to_string()))
    }
}

/// Carnatic recording detail with one lead artist and the given linked ids
pub fn recording_detail(
    artist: &str,
    concert: &str,
    work: &str,
    raga: &str,
    tala: &str,
) -> Value {
    json!({
        "mbid": "ignored",
        "title": "Recording",
        "artists": [
            {"lead": true, "artist": {"mbid": artist, "name": artist}, "instrument": {"mbid": "voice", "name": "Voice"}},
            {"lead": false, "artist": {"mbid": "violinist", "name": "Violinist"}, "instrument": {"mbid": "violin", "name": "Violin"}}
        ],
        "concert": [{"mbid": concert, "title": concert}],
        "work": [{"mbid": work, "title": work}],
        "raaga": [{"uuid": raga, "name": raga}],
        "taala": [{"uuid": tala, "name": tala}]
    })
}

/// Collection listing of the given recording ids
pub fn collection_listing(ids: &[&str]) -> Value {
    let documents: Vec<Value> = ids
        .iter()
        .map(|id| json!({"external_identifier": id, "title": format!("Title {}", id)}))
        .collect();
    json!({ "documents": documents })
}
