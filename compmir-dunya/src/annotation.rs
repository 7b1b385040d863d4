//! Annotation artifact kinds
//!
//! Derived files ("annotations") are routed to a writer by their declared
//! subtype. The routing table keeps Dunya's naming convention: the subtype is
//! matched by substring, first matching row wins.

use crate::error::{DunyaError, Result};
use crate::writers;
use serde_json::Value;
use std::path::Path;

/// On-disk format an annotation is written in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// A single value as plain text
    ScalarText,
    /// Structured data as JSON
    Json,
    /// Time series as comma-separated rows
    Csv,
}

/// Subtype substring → artifact kind
const SUBTYPE_TABLE: &[(&str, ArtifactKind)] = &[
    ("tonic", ArtifactKind::ScalarText),
    ("aksharaPeriod", ArtifactKind::ScalarText),
    ("section", ArtifactKind::Json),
    ("APcurve", ArtifactKind::Csv),
    ("pitch", ArtifactKind::Csv),
    ("aksharaTicks", ArtifactKind::Csv),
];

impl ArtifactKind {
    /// Classify an annotation by its subtype
    pub fn from_subtype(thetype: &str, subtype: Option<&str>) -> Result<Self> {
        let unsupported = || DunyaError::UnsupportedArtifactType {
            thetype: thetype.to_string(),
            subtype: subtype.unwrap_or("None").to_string(),
        };

        let subtype = subtype.ok_or_else(unsupported)?;
        SUBTYPE_TABLE
            .iter()
            .find(|(pattern, _)| subtype.contains(pattern))
            .map(|(_, kind)| *kind)
            .ok_or_else(unsupported)
    }

    /// Write `data` to `location` in this kind's format
    pub fn write(&self, data: &Value, location: &Path) -> Result<()> {
        match self {
            ArtifactKind::ScalarText => writers::write_scalar_txt(data, location),
            ArtifactKind::Json => writers::write_json(data, location),
            ArtifactKind::Csv => writers::write_csv(data, location),
        }
    }
}

/// Identifies one derived file of a recording
#[derive(Debug, Clone)]
pub struct AnnotationSpec<'a> {
    pub recording_id: &'a str,
    pub thetype: &'a str,
    pub subtype: Option<&'a str>,
    pub part: Option<u32>,
    /// Specific version; the most recent one when `None`
    pub version: Option<&'a str>,
}

impl<'a> AnnotationSpec<'a> {
    pub fn new(recording_id: &'a str, thetype: &'a str) -> Self {
        Self {
            recording_id,
            thetype,
            subtype: None,
            part: None,
            version: None,
        }
    }

    pub fn with_subtype(mut self, subtype: &'a str) -> Self {
        self.subtype = Some(subtype);
        self
    }

    pub fn with_part(mut self, part: u32) -> Self {
        self.part = Some(part);
        self
    }

    pub fn with_version(mut self, version: &'a str) -> Self {
        self.version = Some(version);
        self
    }

    /// Request path of the derived file
    pub(crate) fn path(&self) -> String {
        match self.subtype {
            Some(subtype) => format!(
                "document/by-id/{}/{}/{}",
                self.recording_id, self.thetype, subtype
            ),
            None => format!("document/by-id/{}/{}", self.recording_id, self.thetype),
        }
    }

    /// Query parameters of the derived file request
    pub(crate) fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(part) = self.part {
            params.push(("part", part.to_string()));
        }
        if let Some(version) = self.version {
            params.push(("v", version.to_string()));
        }
        params
    }
}
