//! compmir - command-line access to Dunya corpora and CAE features

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use compmir_common::config::{config_file_path, load_toml_config, TomlConfig};
use compmir_common::tools::Task;
use compmir_dunya::Tradition;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

/// Command-line arguments for compmir
#[derive(Parser, Debug)]
#[command(name = "compmir")]
#[command(about = "Dunya corpora access and melodic feature extraction")]
#[command(version)]
struct Args {
    /// Configuration file (default: $COMPMIR_CONFIG, then the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Dunya access token (overrides DUNYA_TOKEN and the config file)
    #[arg(long, global = true)]
    token: Option<String>,

    /// Music tradition (default: config file, then carnatic)
    #[arg(long, global = true)]
    tradition: Option<Tradition>,

    /// Use the Creative Commons subset of the collection
    #[arg(long, global = true)]
    cc: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the available tools
    Tools {
        /// Only tools of this task (dunya, melody)
        #[arg(long)]
        task: Option<Task>,
    },

    /// List the recordings of the collection
    Collection,

    /// Aggregate the metadata of the whole collection
    Metadata {
        /// Write the result as JSON to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the detail of one entity
    Entity {
        #[arg(value_enum)]
        kind: EntityArg,
        id: String,
    },

    /// List the derived file types of a recording
    Types { recording_id: String },

    /// Download a derived file of a recording
    Annotation {
        recording_id: String,
        thetype: String,
        #[arg(long)]
        subtype: Option<String>,
        #[arg(long)]
        part: Option<u32>,
        /// Derived file version (default: latest)
        #[arg(long)]
        file_version: Option<String>,
        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Download the mp3 of a recording
    DownloadMp3 {
        recording_id: String,
        /// Existing directory to save into
        #[arg(short, long)]
        output_dir: PathBuf,
    },

    /// Download every recording of a concert
    DownloadConcert {
        concert_id: String,
        /// Existing directory to save into
        #[arg(short, long)]
        output_dir: PathBuf,
    },

    /// Extract CAE amplitude and phase features from an audio file
    Features {
        audio: PathBuf,
        /// Trained weights (JSON state map)
        #[arg(long, env = "COMPMIR_CAE_MODEL")]
        model: PathBuf,
        /// Extractor configuration (TOML)
        #[arg(long, env = "COMPMIR_CAE_CONFIG")]
        conf: PathBuf,
        /// Write features as JSON to this file instead of printing a summary
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum EntityArg {
    Recording,
    Artist,
    Concert,
    Work,
    Raga,
    Tala,
    Instrument,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = config_file_path(args.config.as_deref());
    let toml_config = match &config_path {
        Some(path) => load_toml_config(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => TomlConfig::default(),
    };

    // RUST_LOG wins over the config file
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&toml_config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("compmir=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Some(path) = &config_path {
        info!(path = %path.display(), "Using configuration file");
    }

    let tradition = match args.tradition {
        Some(tradition) => tradition,
        None => match &toml_config.tradition {
            Some(name) => name
                .parse()
                .with_context(|| format!("Invalid tradition in configuration: {}", name))?,
            None => Tradition::Carnatic,
        },
    };

    let session = commands::Session {
        toml_config,
        token: args.token,
        tradition,
        creative_commons: args.cc,
    };

    match args.command {
        Command::Tools { task } => commands::tools(task),
        Command::Collection => commands::collection(&session).await,
        Command::Metadata { output } => commands::metadata(&session, output.as_deref()).await,
        Command::Entity { kind, id } => commands::entity(&session, kind, &id).await,
        Command::Types { recording_id } => commands::types(&session, &recording_id).await,
        Command::Annotation {
            recording_id,
            thetype,
            subtype,
            part,
            file_version,
            output,
        } => {
            let mut spec = compmir_dunya::AnnotationSpec::new(&recording_id, &thetype);
            spec.subtype = subtype.as_deref();
            spec.part = part;
            spec.version = file_version.as_deref();
            commands::annotation(&session, &spec, &output).await
        }
        Command::DownloadMp3 {
            recording_id,
            output_dir,
        } => commands::download_mp3(&session, &recording_id, &output_dir).await,
        Command::DownloadConcert {
            concert_id,
            output_dir,
        } => commands::download_concert(&session, &concert_id, &output_dir).await,
        Command::Features {
            audio,
            model,
            conf,
            output,
        } => commands::features(audio, model, conf, output).await,
    }
}
