use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::record::SessionRecord;
use crate::capture::{CaptureError, FrameSource};
use crate::classify::{EmotionClassifier, EmotionLabel};
use crate::playback::{AudioTrigger, PlaybackEvent, PlayerHandle};

/// Message from the session thread to the UI task.
#[derive(Debug)]
pub enum SessionMessage {
    /// One processed frame: the label shown on the overlay (`None` while the
    /// classifier is failing) and the track currently believed playing.
    Observation {
        frame_index: u64,
        label: Option<EmotionLabel>,
        playing: Option<PathBuf>,
    },
    Error(String),
    Stopped,
}

pub struct SessionConfig {
    /// Pause between frame grabs.
    pub frame_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            frame_interval: Duration::from_millis(250),
        }
    }
}

/// Run the session loop until the stop flag is set or capture fails fatally.
///
/// This function should be spawned on a dedicated thread. Per iteration it
/// drains playback events, grabs one frame (retrying a transient failure
/// once), classifies it, feeds the label to the trigger, dispatches any
/// accepted change to the playback worker, and reports an observation.
/// Classification and playback failures never end the loop.
pub fn run_session<S, C>(
    source: &mut S,
    classifier: &C,
    trigger: &mut AudioTrigger,
    player: &PlayerHandle,
    config: SessionConfig,
    tx: &mpsc::Sender<SessionMessage>,
    stop_flag: Arc<AtomicBool>,
) -> SessionRecord
where
    S: FrameSource,
    C: EmotionClassifier,
{
    let mut record = SessionRecord::new(source.describe());
    let mut current_track: Option<PathBuf> = None;

    info!("Session loop started on device {}", record.device);

    loop {
        if stop_flag.load(Ordering::Relaxed) {
            info!("Stop flag received, ending session");
            break;
        }

        // Playback outcomes arrive asynchronously from the worker.
        for event in player.poll_events() {
            match event {
                PlaybackEvent::Started { track, .. } => {
                    trigger.note_playback_started();
                    current_track = Some(track);
                }
                PlaybackEvent::Failed { track, error, .. } => {
                    warn!("Playback of {:?} failed: {}", track, error);
                    trigger.note_playback_failed();
                    record.playback_failures += 1;
                    if current_track.as_ref() == Some(&track) {
                        current_track = None;
                    }
                }
            }
        }

        let frame = match grab_with_retry(source, &mut record) {
            GrabOutcome::Frame(frame) => frame,
            GrabOutcome::Skip => {
                std::thread::sleep(config.frame_interval);
                continue;
            }
            GrabOutcome::Fatal(e) => {
                error!("Capture failed fatally: {}", e);
                let _ = tx.blocking_send(SessionMessage::Error(e));
                break;
            }
        };
        record.frames_captured += 1;

        let (label, shown) = match classifier.classify(&frame) {
            Ok(label) => {
                debug!(
                    "Frame {} -> {} in {:?}",
                    frame.index,
                    label,
                    frame.captured_at.elapsed()
                );
                (label, Some(label))
            }
            Err(e) => {
                debug!("Classification failed on frame {}: {:#}", frame.index, e);
                record.classify_failures += 1;
                // The trigger still sees a label; the overlay shows
                // "Detecting..." instead.
                (EmotionLabel::Unknown, None)
            }
        };

        if let Some(action) = trigger.observe(label, Instant::now(), &mut rand::thread_rng()) {
            info!("Emotion changed to {}, starting {:?}", action.emotion, action.track);
            record.add_trigger(action.emotion, action.track.clone());
            player.play(action.emotion, action.track);
        } else if !trigger.state().is_playing && current_track.is_some() {
            // An accepted change with no pickable track still stops the old
            // track; keep the worker in line with the policy state.
            player.stop();
            current_track = None;
        }

        let message = SessionMessage::Observation {
            frame_index: frame.index,
            label: shown,
            playing: current_track.clone(),
        };
        if tx.blocking_send(message).is_err() {
            warn!("UI receiver dropped, ending session");
            break;
        }

        std::thread::sleep(config.frame_interval);
    }

    record.finalize();
    let _ = tx.blocking_send(SessionMessage::Stopped);
    record
}

enum GrabOutcome {
    Frame(crate::capture::Frame),
    /// Two transient failures in a row: log and move to the next iteration.
    Skip,
    Fatal(String),
}

fn grab_with_retry<S: FrameSource>(source: &mut S, record: &mut SessionRecord) -> GrabOutcome {
    for attempt in 0..2 {
        match source.next_frame() {
            Ok(frame) => return GrabOutcome::Frame(frame),
            Err(CaptureError::Fatal(e)) => return GrabOutcome::Fatal(e),
            Err(CaptureError::Transient(e)) => {
                warn!("Frame grab attempt {} failed: {}", attempt + 1, e);
            }
        }
    }
    record.capture_failures += 1;
    GrabOutcome::Skip
}
