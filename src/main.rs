mod capture;
mod classify;
mod config;
mod playback;
mod session;
mod ui;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use capture::CommandFrameSource;
use classify::CommandClassifier;
use config::Config;
use playback::{AudioTrigger, PlayerHandle, TrackLibrary};
use session::{run_session, SessionConfig, SessionMessage, SessionRecord};
use ui::TerminalUi;

/// Headless CLI that matches music playback to facial emotion
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the config file (default: ~/.moodtrack/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Capture device: an index like "0" or a device path
    #[arg(short, long)]
    device: Option<String>,

    /// Directory containing the emotion track files
    #[arg(short, long)]
    music_dir: Option<PathBuf>,

    /// Grabber command (whitespace-separated, {device}/{output} placeholders)
    #[arg(long)]
    grabber: Option<String>,

    /// Classifier command (whitespace-separated, {frame} placeholder)
    #[arg(long)]
    classifier: Option<String>,

    /// Minimum time (ms) between accepted emotion changes
    #[arg(long)]
    debounce_ms: Option<u64>,

    /// Pause (ms) between frame grabs
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Write the session record as JSON to this path on exit
    #[arg(long)]
    session_log: Option<PathBuf>,

    /// List the resolved track library and exit
    #[arg(long)]
    list_tracks: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr; stdout belongs to the status line.
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => Config::default_config_path()?,
    };
    let mut config = Config::load(&config_path)?;
    apply_overrides(&mut config, &args);

    info!("moodtrack starting...");
    info!("Device: {}", config.device);
    info!("Music dir: {:?}", config.music_dir());
    info!("Debounce: {}ms", config.min_emotion_duration_ms);

    let library = TrackLibrary::new(&config.music_dir(), &config.tracks);

    if args.list_tracks {
        return list_tracks_and_exit(&library);
    }

    if library.is_empty() {
        warn!("No tracks configured; emotion changes will not start playback");
    }

    let classifier = CommandClassifier::new(config.classifier_command.clone())?;
    let mut source = CommandFrameSource::new(config.grabber_command.clone(), &config.device)
        .context("Failed to set up frame capture")?;

    let mut trigger = AudioTrigger::new(library, config.min_emotion_duration());
    let player = PlayerHandle::spawn();

    let (tx, mut rx) = mpsc::channel::<SessionMessage>(32);
    let stop_flag = Arc::new(AtomicBool::new(false));

    // Signal fallback for non-tty runs; in raw mode Ctrl+C arrives as a key.
    let stop_flag_ctrlc = stop_flag.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received Ctrl+C, stopping...");
        stop_flag_ctrlc.store(true, Ordering::SeqCst);
    });

    let session_config = SessionConfig {
        frame_interval: config.frame_interval(),
    };
    let stop_flag_session = stop_flag.clone();
    let session_handle = std::thread::spawn(move || {
        let record = run_session(
            &mut source,
            &classifier,
            &mut trigger,
            &player,
            session_config,
            &tx,
            stop_flag_session,
        );
        player.shutdown();
        record
    });

    println!("Watching... press 'q' to quit.\n");
    let mut terminal = TerminalUi::new();
    let mut poll_interval = tokio::time::interval(Duration::from_millis(100));

    loop {
        tokio::select! {
            message = rx.recv() => {
                match message {
                    Some(SessionMessage::Observation { frame_index, label, playing }) => {
                        let line = ui::format_status(label, playing.as_deref(), frame_index + 1);
                        if let Err(e) = terminal.render(&line) {
                            warn!("Failed to render status line: {}", e);
                        }
                    }
                    Some(SessionMessage::Error(e)) => {
                        error!("Session error: {}", e);
                    }
                    Some(SessionMessage::Stopped) | None => break,
                }
            }
            _ = poll_interval.tick() => {
                if terminal.poll_quit() {
                    info!("Quit key pressed, stopping...");
                    stop_flag.store(true, Ordering::SeqCst);
                }
            }
        }
    }

    // Restore the terminal before the summary prints.
    drop(terminal);

    let record = session_handle
        .join()
        .map_err(|_| anyhow::anyhow!("Session thread panicked"))?;

    print_summary(&record);

    if let Some(path) = &args.session_log {
        let json = serde_json::to_string_pretty(&record)
            .context("Failed to serialize session record")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write session log {:?}", path))?;
        info!("Session log written to {:?}", path);
    }

    info!("Session complete");
    Ok(())
}

fn apply_overrides(config: &mut Config, args: &Args) {
    if let Some(device) = &args.device {
        config.device = device.clone();
    }
    if let Some(music_dir) = &args.music_dir {
        config.music_dir = Some(music_dir.clone());
    }
    if let Some(grabber) = &args.grabber {
        config.grabber_command = grabber.split_whitespace().map(String::from).collect();
    }
    if let Some(classifier) = &args.classifier {
        config.classifier_command = classifier.split_whitespace().map(String::from).collect();
    }
    if let Some(debounce_ms) = args.debounce_ms {
        config.min_emotion_duration_ms = debounce_ms;
    }
    if let Some(interval_ms) = args.interval_ms {
        config.frame_interval_ms = interval_ms;
    }
}

fn list_tracks_and_exit(library: &TrackLibrary) -> Result<()> {
    println!("Configured tracks:\n");

    if library.is_empty() {
        println!("  No tracks configured.");
        return Ok(());
    }

    for (label, tracks) in library.entries() {
        println!("  {}:", label.as_str());
        for track in tracks {
            let marker = if track.exists() { "" } else { " (missing)" };
            println!("    - {}{}", track.display(), marker);
        }
    }

    let unmapped: Vec<&str> = classify::EmotionLabel::all()
        .iter()
        .filter(|label| library.tracks_for(**label).is_empty())
        .map(|label| label.as_str())
        .collect();
    if !unmapped.is_empty() {
        println!("\n  No tracks (neutral fallback unavailable): {}", unmapped.join(", "));
    }

    Ok(())
}

fn print_summary(record: &SessionRecord) {
    println!("\n--- Session Summary ---");
    println!("Duration: {:.1}s", record.duration_secs());
    println!("Frames: {}", record.frames_captured);
    println!("Emotion changes: {}", record.triggers.len());

    for trigger in &record.triggers {
        println!(
            "  {} {} -> {}",
            trigger.at.format("%H:%M:%S"),
            trigger.emotion,
            trigger.track.display()
        );
    }

    if record.capture_failures > 0 {
        println!("Capture failures: {}", record.capture_failures);
    }
    if record.classify_failures > 0 {
        println!("Classification failures: {}", record.classify_failures);
    }
    if record.playback_failures > 0 {
        println!("Playback failures: {}", record.playback_failures);
    }
}
