//! Dunya data types
//!
//! Entity records keep the server's JSON object intact: only the identifier is
//! lifted out, the descriptive attributes vary per entity and per tradition.

use crate::error::{DunyaError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Music tradition served by Dunya
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tradition {
    Carnatic,
    Hindustani,
}

impl Tradition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tradition::Carnatic => "carnatic",
            Tradition::Hindustani => "hindustani",
        }
    }

    /// Name of the Dunya collection holding this tradition's recordings
    pub fn collection(&self, creative_commons: bool) -> String {
        if creative_commons {
            format!("dunya-{}-cc", self.as_str())
        } else {
            format!("dunya-{}", self.as_str())
        }
    }
}

impl fmt::Display for Tradition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tradition {
    type Err = DunyaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "carnatic" => Ok(Tradition::Carnatic),
            "hindustani" => Ok(Tradition::Hindustani),
            other => Err(DunyaError::Parse(format!("Unknown tradition: {}", other))),
        }
    }
}

/// Kinds of entity linked from a recording
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Artist,
    Concert,
    Work,
    Raga,
    Tala,
    Instrument,
}

impl EntityKind {
    /// Field holding the entity's unique identifier
    pub fn id_field(&self) -> &'static str {
        match self {
            EntityKind::Raga | EntityKind::Tala => "uuid",
            EntityKind::Artist
            | EntityKind::Concert
            | EntityKind::Work
            | EntityKind::Instrument => "mbid",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Artist => "artist",
            EntityKind::Concert => "concert",
            EntityKind::Work => "work",
            EntityKind::Raga => "raga",
            EntityKind::Tala => "tala",
            EntityKind::Instrument => "instrument",
        }
    }
}

/// An entity record keyed by its identifier
///
/// Serializes as the JSON object it was read from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EntityRecord {
    #[serde(skip)]
    pub id: String,
    pub fields: Map<String, Value>,
}

impl EntityRecord {
    /// Lift the identifier out of a raw record
    ///
    /// String and numeric identifiers are accepted; anything else is a
    /// missing-field error.
    pub fn from_map(kind: EntityKind, fields: Map<String, Value>) -> Result<Self> {
        let id = match fields.get(kind.id_field()) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => return Err(DunyaError::missing_field(kind.as_str(), kind.id_field())),
        };
        Ok(Self { id, fields })
    }

    /// Convenience accessor for the `name` attribute most entities carry
    pub fn name(&self) -> Option<&str> {
        self.fields.get("name").and_then(Value::as_str)
    }
}

/// One entry of a collection listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionDocument {
    /// Recording MBID (`external_identifier` on the wire)
    #[serde(alias = "external_identifier")]
    pub mbid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `document/{collection}` response
#[derive(Debug, Deserialize)]
pub(crate) struct CollectionListing {
    pub documents: Vec<CollectionDocument>,
}

/// Recording detail as returned by `api/{tradition}/recording/{mbid}`
///
/// The hindustani API names the linked lists `release`, `raags` and `taals`;
/// they are accepted as aliases.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordingDetail {
    #[serde(default)]
    pub mbid: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    pub artists: Vec<ArtistPerformance>,
    #[serde(alias = "release")]
    pub concert: Vec<Map<String, Value>>,
    #[serde(alias = "works")]
    pub work: Vec<Map<String, Value>>,
    #[serde(alias = "raags")]
    pub raaga: Vec<Map<String, Value>>,
    #[serde(alias = "taals")]
    pub taala: Vec<Map<String, Value>>,
}

/// Performance relationship between an artist and a recording
///
/// `artist` is only read for lead performers. `instrument` must be present;
/// `null` means no instrument is recorded.
#[derive(Debug, Clone, Deserialize)]
pub struct ArtistPerformance {
    pub lead: bool,
    #[serde(default)]
    pub artist: Option<Value>,
    pub instrument: Value,
}

/// Text form of a JSON scalar (strings unquoted, null empty)
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        Value::Array(_) | Value::Object(_) => None,
    }
}
