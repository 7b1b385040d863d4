//! Subcommand handlers

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use compmir_cae::{CaeFeatureExtractor, Embedding};
use compmir_common::config::{resolve_dunya_token, TomlConfig};
use compmir_common::tools::{list_tools, Task};
use compmir_dunya::{AnnotationSpec, Corpora, Tradition};
use ndarray::Array2;
use serde::Serialize;
use tracing::info;

use crate::EntityArg;

/// Settings shared by the corpora commands
pub struct Session {
    pub toml_config: TomlConfig,
    pub token: Option<String>,
    pub tradition: Tradition,
    pub creative_commons: bool,
}

impl Session {
    fn corpora(&self) -> Result<Corpora> {
        let token = resolve_dunya_token(self.token.as_deref(), &self.toml_config)?;
        Corpora::new(self.tradition, self.creative_commons, &token)
            .context("Failed to create Dunya client")
    }
}

/// Write `value` as pretty JSON to `output`, or stdout when `None`
fn emit_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, value)?;
            writer.flush()?;
            info!(path = %path.display(), "Wrote output");
        }
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            serde_json::to_writer_pretty(&mut handle, value)?;
            writeln!(handle)?;
        }
    }
    Ok(())
}

pub fn tools(task: Option<Task>) -> Result<()> {
    for name in list_tools(task) {
        println!("{}", name);
    }
    Ok(())
}

pub async fn collection(session: &Session) -> Result<()> {
    let corpora = session.corpora()?;
    let documents = corpora
        .get_collection()
        .await
        .with_context(|| format!("Failed to list collection {}", corpora.collection()))?;

    for doc in &documents {
        println!("{}\t{}", doc.mbid, doc.title.as_deref().unwrap_or(""));
    }
    info!(collection = %corpora.collection(), documents = documents.len(), "Listed collection");
    Ok(())
}

pub async fn metadata(session: &Session, output: Option<&Path>) -> Result<()> {
    let mut corpora = session.corpora()?;
    let result = corpora.get_metadata().await?;
    emit_json(result, output)
}

pub async fn entity(session: &Session, kind: EntityArg, id: &str) -> Result<()> {
    let corpora = session.corpora()?;
    let detail = match kind {
        EntityArg::Recording => corpora.get_recording(id).await,
        EntityArg::Artist => corpora.get_artist(id).await,
        EntityArg::Concert => corpora.get_concert(id).await,
        EntityArg::Work => corpora.get_work(id).await,
        EntityArg::Raga => corpora.get_raga(id).await,
        EntityArg::Tala => corpora.get_tala(id).await,
        EntityArg::Instrument => corpora.get_instrument(id).await,
    }
    .with_context(|| format!("Failed to fetch {:?} {}", kind, id))?;

    emit_json(&detail, None)
}

pub async fn types(session: &Session, recording_id: &str) -> Result<()> {
    let corpora = session.corpora()?;
    let types = corpora.list_available_types(recording_id).await?;
    emit_json(&types, None)
}

pub async fn annotation(session: &Session, spec: &AnnotationSpec<'_>, output: &Path) -> Result<()> {
    let corpora = session.corpora()?;
    let kind = corpora.save_annotation(spec, output).await?;
    println!("{} ({:?})", output.display(), kind);
    Ok(())
}

pub async fn download_mp3(session: &Session, recording_id: &str, output_dir: &Path) -> Result<()> {
    let corpora = session.corpora()?;
    let name = corpora.download_mp3(recording_id, output_dir).await?;
    println!("{}", output_dir.join(name).display());
    Ok(())
}

pub async fn download_concert(session: &Session, concert_id: &str, output_dir: &Path) -> Result<()> {
    let corpora = session.corpora()?;
    let concert_dir = corpora.download_concert(concert_id, output_dir).await?;
    println!("{}", concert_dir.display());
    Ok(())
}

#[derive(Serialize)]
struct FeatureOutput<'a> {
    params: &'a compmir_cae::FeatureParameters,
    amplitude: Vec<Vec<f32>>,
    phase: Vec<Vec<f32>>,
}

pub async fn features(
    audio: PathBuf,
    model: PathBuf,
    conf: PathBuf,
    output: Option<PathBuf>,
) -> Result<()> {
    // Decoding and inference are CPU bound
    let (extractor, embedding) = tokio::task::spawn_blocking(
        move || -> Result<(CaeFeatureExtractor, Embedding)> {
            let extractor = CaeFeatureExtractor::new(&model, &conf)
                .context("Failed to initialize CAE feature extractor")?;
            let embedding = extractor
                .extract_features(&audio)
                .with_context(|| format!("Failed to extract features from {}", audio.display()))?;
            Ok((extractor, embedding))
        },
    )
    .await
    .context("Feature extraction task failed")??;

    match output {
        Some(path) => {
            let features = FeatureOutput {
                params: extractor.params(),
                amplitude: rows(&embedding.amplitude),
                phase: rows(&embedding.phase),
            };
            emit_json(&features, Some(&path))
        }
        None => {
            println!(
                "windows: {}\tbases: {}",
                embedding.amplitude.nrows(),
                embedding.amplitude.ncols()
            );
            Ok(())
        }
    }
}

fn rows(matrix: &Array2<f32>) -> Vec<Vec<f32>> {
    matrix.outer_iter().map(|row| row.to_vec()).collect()
}
