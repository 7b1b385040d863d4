//! Audio downloads
//!
//! Recordings are saved under human-readable names built from the concert
//! artists and titles.

use crate::corpora::Corpora;
use crate::error::{DunyaError, Result};
use crate::query::RemoteQuery;
use crate::types::scalar_text;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

fn ensure_output_dir(output_dir: &Path) -> Result<()> {
    if output_dir.is_dir() {
        Ok(())
    } else {
        Err(DunyaError::MissingOutputDirectory(output_dir.to_path_buf()))
    }
}

fn required_text(value: &Value, context: &str, field: &str) -> Result<String> {
    value
        .get(field)
        .and_then(scalar_text)
        .ok_or_else(|| DunyaError::missing_field(context, field))
}

/// Concert artists joined with " and "
fn concert_artists(concert: &Value) -> Result<String> {
    let artists = concert
        .get("concert_artists")
        .and_then(Value::as_array)
        .ok_or_else(|| DunyaError::missing_field("concert", "concert_artists"))?;

    let names = artists
        .iter()
        .map(|artist| required_text(artist, "concert artist", "name"))
        .collect::<Result<Vec<_>>>()?;

    Ok(names.join(" and "))
}

/// Path separators are not allowed in file names
fn sanitize_file_name(name: &str) -> String {
    name.replace('/', "-")
}

impl<Q: RemoteQuery> Corpora<Q> {
    async fn fetch_mp3(&self, recording_id: &str) -> Result<Vec<u8>> {
        self.query()
            .query_bytes(&format!("document/by-id/{}/mp3", recording_id), &[])
            .await
    }

    /// Download the mp3 of a recording into `output_dir`
    ///
    /// Returns the name of the written file. The directory must exist.
    pub async fn download_mp3(&self, recording_id: &str, output_dir: &Path) -> Result<String> {
        ensure_output_dir(output_dir)?;

        let recording = self.get_recording(recording_id).await?;
        let concert_id = recording
            .get("concert")
            .and_then(Value::as_array)
            .and_then(|concerts| concerts.first())
            .map(|concert| required_text(concert, "concert", "mbid"))
            .transpose()?;

        let name = match concert_id {
            Some(concert_id) => {
                let concert = self.get_concert(&concert_id).await?;
                let artists = concert_artists(&concert)?;
                let title = required_text(&recording, "recording", "title")?;
                sanitize_file_name(&format!("{} - {}.mp3", artists, title))
            }
            None => format!("{}.mp3", recording_id),
        };

        let contents = self.fetch_mp3(recording_id).await?;
        let path = output_dir.join(&name);
        fs::write(&path, &contents)?;

        info!(
            recording = %recording_id,
            path = %path.display(),
            bytes = contents.len(),
            "Downloaded mp3"
        );
        Ok(name)
    }

    /// Download every recording of a concert
    ///
    /// Files go to `"{artists} - {title}"` inside `output_dir`, which must
    /// exist. Returns the concert directory.
    pub async fn download_concert(&self, concert_id: &str, output_dir: &Path) -> Result<PathBuf> {
        ensure_output_dir(output_dir)?;

        let concert = self.get_concert(concert_id).await?;
        let artists = concert_artists(&concert)?;
        let title = required_text(&concert, "concert", "title")?;

        let concert_dir = output_dir.join(sanitize_file_name(&format!("{} - {}", artists, title)));
        fs::create_dir_all(&concert_dir)?;

        let recordings = concert
            .get("recordings")
            .and_then(Value::as_array)
            .ok_or_else(|| DunyaError::missing_field("concert", "recordings"))?;

        for recording in recordings {
            let mbid = required_text(recording, "concert recording", "mbid")?;
            let title = required_text(recording, "concert recording", "title")?;
            let disc = required_text(recording, "concert recording", "disc")?;
            let disctrack = required_text(recording, "concert recording", "disctrack")?;

            let contents = self.fetch_mp3(&mbid).await?;
            let name = sanitize_file_name(&format!(
                "{} - {} - {} - {}.mp3",
                disc, disctrack, artists, title
            ));
            fs::write(concert_dir.join(&name), &contents)?;

            debug!(recording = %mbid, file = %name, "Downloaded concert track");
        }

        info!(
            concert = %concert_id,
            tracks = recordings.len(),
            path = %concert_dir.display(),
            "Downloaded concert"
        );
        Ok(concert_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_concert_artists_joined() {
        let concert = json!({
            "concert_artists": [{"name": "T. M. Krishna"}, {"name": "R. K. Shriramkumar"}]
        });
        assert_eq!(
            concert_artists(&concert).unwrap(),
            "T. M. Krishna and R. K. Shriramkumar"
        );
    }

    #[test]
    fn test_sanitize_replaces_slashes() {
        assert_eq!(sanitize_file_name("AC/DC - Live.mp3"), "AC-DC - Live.mp3");
    }

    #[test]
    fn test_missing_output_dir() {
        let result = ensure_output_dir(Path::new("/nonexistent/compmir/output"));
        assert!(matches!(result, Err(DunyaError::MissingOutputDirectory(_))));
    }
}
