use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;

use signstream::config::default_session_id;
use signstream::playback::PlaybackEvent;
use signstream::{AslTranslation, BackendClient, Config, PlaybackSpeed, Player};

#[derive(Parser)]
#[command(name = "signstream", about = "Session tools for the sign-language learning assistant")]
struct Cli {
    /// Configuration file (without extension)
    #[arg(long, default_value = "config/signstream")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Play a saved translation, printing each sign as it is shown
    Play {
        /// Translation JSON file, as returned by the backend
        translation: PathBuf,

        /// Playback rate (0.5, 1, 1.5 or 2)
        #[arg(long, default_value_t = 1.0)]
        speed: f64,
    },

    /// Upload an audio file for transcription
    Transcribe {
        /// Audio file to submit
        audio: PathBuf,

        /// Session identifier (generated when omitted)
        #[arg(long)]
        session_id: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;
    info!("signstream v0.1.0 ({})", cfg.service.name);

    match cli.command {
        Command::Play { translation, speed } => play(&translation, speed).await,
        Command::Transcribe { audio, session_id } => transcribe(&cfg, &audio, session_id).await,
    }
}

async fn play(path: &Path, speed: f64) -> Result<()> {
    let data = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let translation: AslTranslation =
        serde_json::from_str(&data).context("failed to parse translation JSON")?;

    let speed = PlaybackSpeed::try_from(speed)?;
    info!(
        signs = translation.signs.len(),
        factor = speed.factor(),
        "playing translation"
    );

    if let Some(first) = translation.signs.get(0) {
        print_sign(0, first);
    }

    let (handle, mut events) = Player::spawn(translation.signs, speed);
    handle.play();

    while let Some(event) = events.recv().await {
        match event {
            PlaybackEvent::Sign { index, sign } => print_sign(index, &sign),
            PlaybackEvent::Finished => break,
        }
    }

    handle.shutdown().await;
    Ok(())
}

async fn transcribe(cfg: &Config, path: &Path, session_id: Option<String>) -> Result<()> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;

    let content_type = content_type_for(path);
    let artifact = signstream::Artifact::from_upload(bytes, content_type)?;

    let session_id = session_id.unwrap_or_else(default_session_id);
    let client = BackendClient::new(cfg.backend.base_url.clone());
    let response = client.transcribe(&artifact, Some(&session_id)).await?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn print_sign(index: usize, sign: &signstream::Sign) {
    println!(
        "sign {}: {} [{:?}] {}",
        index + 1,
        sign.word,
        sign.gesture,
        sign.description
    );
}

fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("wav") => "audio/wav",
        Some("mp3") => "audio/mpeg",
        Some("ogg") => "audio/ogg",
        Some("m4a") => "audio/mp4",
        _ => "audio/webm",
    }
}
