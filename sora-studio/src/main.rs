//! sora-studio — simulated text-to-video generation from the terminal
//!
//! # Subcommands
//! - `generate <prompt...>`      — run one generation, show progress, save it
//! - `studio`                    — interactive: every stdin line is a prompt
//! - `list [--json]`             — list the gallery, newest first
//! - `show <id>`                 — card details for one video
//! - `delete <id>`               — remove a video from the gallery
//! - `download <id> [--out DIR]` — save a video as `sora-<id>.<ext>`

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use sora_core::{
    FileStore, GalleryStore, GenerationSimulator, RngSource, SoraConfig, SoraError, SystemClock,
};
use sora_studio::download;
use sora_studio::render::{gallery_headline, progress_bar, VideoCard};
use sora_studio::session::forward_lines;
use sora_studio::studio::{Studio, StudioCommand, StudioEvent};
use tokio::sync::{broadcast, mpsc};
use tracing_subscriber::{fmt, EnvFilter};

const PROGRESS_WIDTH: usize = 30;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (TOML); missing file means built-in defaults
    #[arg(short, long, env = "SORA_CONFIG", default_value = "sora.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Generate one video from a prompt
    Generate {
        /// Prompt text (words are joined with spaces)
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,
    },

    /// Interactive session: each line is a prompt, `:delete <id>` and `:quit` also work
    Studio,

    /// List generated videos, newest first
    List {
        /// Print the stored records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one video's card
    Show { id: String },

    /// Delete a video from the gallery
    Delete { id: String },

    /// Save a video to disk
    Download {
        id: String,

        /// Target directory (defaults to download.dir from config)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let config = match SoraConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    // Init logging (stderr, so stdout stays machine-readable)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.service.log_level));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let store = FileStore::new(config.storage.resolved_dir());
    let gallery = GalleryStore::load_with_key(store, &config.storage.key);

    match args.command {
        Commands::Generate { prompt } => generate(&config, gallery, prompt.join(" ")).await,
        Commands::Studio => interactive(&config, gallery).await,
        Commands::List { json } => list(&gallery, json),
        Commands::Show { id } => show(&gallery, &id),
        Commands::Delete { id } => delete(gallery, &id),
        Commands::Download { id, out } => {
            let dir = out.unwrap_or_else(|| config.download.resolved_dir());
            save(&gallery, &id, &dir)
        }
    }
}

// ============================================================================
// Studio-backed commands
// ============================================================================

struct StudioHandle {
    commands: mpsc::Sender<StudioCommand>,
    events: mpsc::UnboundedReceiver<StudioEvent>,
    shutdown: broadcast::Receiver<()>,
    task: tokio::task::JoinHandle<GalleryStore<FileStore>>,
}

fn spawn_studio(config: &SoraConfig, gallery: GalleryStore<FileStore>) -> StudioHandle {
    let (cmd_tx, cmd_rx) = mpsc::channel(16);
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let session_shutdown = shutdown_tx.subscribe();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
            let _ = shutdown_tx.send(());
        }
    });

    let simulator = GenerationSimulator::new(
        config.generation.clone(),
        SystemClock,
        RngSource::from_entropy(),
    );
    let studio = Studio::new(simulator, gallery, event_tx);
    let task = tokio::spawn(studio.run(cmd_rx, shutdown_rx));

    StudioHandle {
        commands: cmd_tx,
        events: event_rx,
        shutdown: session_shutdown,
        task,
    }
}

async fn generate(
    config: &SoraConfig,
    gallery: GalleryStore<FileStore>,
    prompt: String,
) -> anyhow::Result<()> {
    let StudioHandle {
        commands,
        mut events,
        task,
        ..
    } = spawn_studio(config, gallery);

    commands
        .send(StudioCommand::Generate { prompt })
        .await
        .context("studio stopped before accepting the prompt")?;
    drop(commands);

    let mut produced = None;
    let mut failure = None;
    while let Some(event) = events.recv().await {
        match event {
            StudioEvent::Rejected { reason, .. } => failure = Some(reason.to_string()),
            StudioEvent::StorageFailed { error } => failure = Some(error),
            StudioEvent::Completed { record } => produced = Some(record),
            other => print_event(&other),
        }
    }
    let gallery = task.await.context("studio task panicked")?;

    if let Some(reason) = failure {
        bail!("generation failed: {}", reason);
    }
    match produced {
        Some(record) => {
            eprintln!();
            println!("{}", VideoCard::from_record(&record).detail());
            eprintln!("{}", gallery_headline(gallery.len()));
            Ok(())
        }
        None => bail!("generation interrupted"),
    }
}

async fn interactive(config: &SoraConfig, gallery: GalleryStore<FileStore>) -> anyhow::Result<()> {
    eprintln!("{}", gallery_headline(gallery.len()));
    eprintln!("Describe your video and press Enter (:delete <id>, :quit)");

    let StudioHandle {
        commands,
        mut events,
        shutdown,
        task,
    } = spawn_studio(config, gallery);

    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            print_event(&event);
        }
    });

    let end = forward_lines(spawn_stdin_reader(), &commands, shutdown).await;
    tracing::debug!("Session ended: {:?}", end);
    drop(commands);

    let gallery = task.await.context("studio task panicked")?;
    printer.await.context("event printer panicked")?;
    eprintln!("{}", gallery_headline(gallery.len()));
    Ok(())
}

/// Stdin lines on a plain thread; a blocked read there never holds up
/// runtime shutdown.
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn print_event(event: &StudioEvent) {
    match event {
        StudioEvent::Started { duration, .. } => {
            eprintln!("Generating your video... (~{:.1}s)", duration.as_secs_f64());
        }
        StudioEvent::Progress { percent } => {
            eprint!("\r{}", progress_bar(*percent, PROGRESS_WIDTH));
            let _ = std::io::stderr().flush();
        }
        StudioEvent::Completed { record } => {
            eprintln!();
            println!("{}", VideoCard::from_record(record).summary());
        }
        StudioEvent::Settled => tracing::debug!("Ready for the next prompt"),
        StudioEvent::Rejected { reason, .. } => eprintln!("Rejected: {}", reason),
        StudioEvent::Deleted { id, removed: true } => eprintln!("Deleted {}", id),
        StudioEvent::Deleted { id, removed: false } => eprintln!("No video with id {}", id),
        StudioEvent::StorageFailed { error } => eprintln!("Storage error: {}", error),
    }
}

// ============================================================================
// Gallery-only commands
// ============================================================================

fn list(gallery: &GalleryStore<FileStore>, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(gallery.records())?);
        return Ok(());
    }

    eprintln!("{}", gallery_headline(gallery.len()));
    if gallery.is_empty() {
        eprintln!("No videos yet. Start creating!");
    }
    for record in gallery.records() {
        println!("{}", VideoCard::from_record(record).summary());
    }
    Ok(())
}

fn show(gallery: &GalleryStore<FileStore>, id: &str) -> anyhow::Result<()> {
    let record = gallery
        .get(id)
        .ok_or_else(|| SoraError::NotFound(id.to_string()))?;
    println!("{}", VideoCard::from_record(record).detail());
    Ok(())
}

fn delete(mut gallery: GalleryStore<FileStore>, id: &str) -> anyhow::Result<()> {
    if gallery.remove(id)? {
        eprintln!("Deleted {} ({})", id, gallery_headline(gallery.len()));
    } else {
        eprintln!("No video with id {}", id);
    }
    Ok(())
}

fn save(gallery: &GalleryStore<FileStore>, id: &str, dir: &std::path::Path) -> anyhow::Result<()> {
    let record = gallery
        .get(id)
        .ok_or_else(|| SoraError::NotFound(id.to_string()))?;
    let path = download::save_record(record, dir)?;
    println!("{}", path.display());
    Ok(())
}
