use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::thread::JoinHandle;

use rodio::{Decoder, OutputStream, Sink};
use tracing::{debug, info, warn};

use crate::classify::EmotionLabel;

/// Command for the playback worker.
#[derive(Debug)]
pub enum PlaybackCommand {
    /// Stop whatever is playing and start this track.
    Play {
        emotion: EmotionLabel,
        track: PathBuf,
    },
    Stop,
    Shutdown,
}

/// Event reported back by the playback worker.
#[derive(Debug)]
pub enum PlaybackEvent {
    Started {
        emotion: EmotionLabel,
        track: PathBuf,
    },
    Failed {
        emotion: EmotionLabel,
        track: PathBuf,
        error: String,
    },
}

/// Handle to the persistent playback worker thread.
///
/// One worker lives for the whole session and owns the audio output; the
/// session loop sends commands and drains events, and joins the worker at
/// shutdown. Failures are events, never panics.
pub struct PlayerHandle {
    cmd_tx: Sender<PlaybackCommand>,
    event_rx: Receiver<PlaybackEvent>,
    worker: Option<JoinHandle<()>>,
}

impl PlayerHandle {
    /// Spawn the playback worker. The audio output device is opened inside
    /// the worker (rodio's output types are not `Send`); if it cannot be
    /// opened, every `Play` is answered with a `Failed` event.
    pub fn spawn() -> Self {
        let (cmd_tx, cmd_rx) = std::sync::mpsc::channel();
        let (event_tx, event_rx) = std::sync::mpsc::channel();

        let worker = std::thread::Builder::new()
            .name("playback".to_string())
            .spawn(move || run_worker(cmd_rx, event_tx))
            .ok();

        Self {
            cmd_tx,
            event_rx,
            worker,
        }
    }

    /// Build a handle around raw channels, without a worker thread. Used by
    /// tests to observe commands and inject events.
    pub fn from_channels(
        cmd_tx: Sender<PlaybackCommand>,
        event_rx: Receiver<PlaybackEvent>,
    ) -> Self {
        Self {
            cmd_tx,
            event_rx,
            worker: None,
        }
    }

    pub fn play(&self, emotion: EmotionLabel, track: PathBuf) {
        if self
            .cmd_tx
            .send(PlaybackCommand::Play { emotion, track })
            .is_err()
        {
            warn!("Playback worker is gone, dropping play command");
        }
    }

    pub fn stop(&self) {
        let _ = self.cmd_tx.send(PlaybackCommand::Stop);
    }

    /// Drain all pending playback events without blocking.
    pub fn poll_events(&self) -> Vec<PlaybackEvent> {
        let mut events = Vec::new();
        loop {
            match self.event_rx.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        events
    }

    /// Stop playback and join the worker.
    pub fn shutdown(mut self) {
        let _ = self.cmd_tx.send(PlaybackCommand::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn run_worker(cmd_rx: Receiver<PlaybackCommand>, event_tx: Sender<PlaybackEvent>) {
    // The stream must outlive every sink; both stay on this thread.
    let output = OutputStream::try_default();
    let (stream, handle) = match output {
        Ok(pair) => pair,
        Err(e) => {
            warn!("Audio output unavailable: {}", e);
            fail_all_plays(cmd_rx, event_tx, e.to_string());
            return;
        }
    };
    let _stream = stream;

    info!("Playback worker started");
    let mut current_sink: Option<Sink> = None;

    while let Ok(command) = cmd_rx.recv() {
        match command {
            PlaybackCommand::Play { emotion, track } => {
                // Stop-then-start: the previous track must not overlap.
                if let Some(sink) = current_sink.take() {
                    sink.stop();
                }

                match start_track(&handle, &track) {
                    Ok(sink) => {
                        debug!("Playing {:?} for {}", track, emotion);
                        current_sink = Some(sink);
                        let _ = event_tx.send(PlaybackEvent::Started { emotion, track });
                    }
                    Err(error) => {
                        warn!("Failed to play {:?}: {}", track, error);
                        let _ = event_tx.send(PlaybackEvent::Failed {
                            emotion,
                            track,
                            error,
                        });
                    }
                }
            }
            PlaybackCommand::Stop => {
                if let Some(sink) = current_sink.take() {
                    sink.stop();
                }
            }
            PlaybackCommand::Shutdown => break,
        }
    }

    if let Some(sink) = current_sink.take() {
        sink.stop();
    }
    info!("Playback worker stopped");
}

fn start_track(handle: &rodio::OutputStreamHandle, track: &PathBuf) -> Result<Sink, String> {
    let file = File::open(track).map_err(|e| format!("open failed: {}", e))?;
    let source = Decoder::new(BufReader::new(file)).map_err(|e| format!("decode failed: {}", e))?;
    let sink = Sink::try_new(handle).map_err(|e| format!("sink failed: {}", e))?;
    sink.append(source);
    Ok(sink)
}

/// Fallback loop used when no output device exists: answer every play with a
/// failure so the session keeps running silently.
fn fail_all_plays(
    cmd_rx: Receiver<PlaybackCommand>,
    event_tx: Sender<PlaybackEvent>,
    error: String,
) {
    while let Ok(command) = cmd_rx.recv() {
        match command {
            PlaybackCommand::Play { emotion, track } => {
                let _ = event_tx.send(PlaybackEvent::Failed {
                    emotion,
                    track,
                    error: error.clone(),
                });
            }
            PlaybackCommand::Stop => {}
            PlaybackCommand::Shutdown => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_events_drains_injected_events() {
        let (cmd_tx, _cmd_rx) = std::sync::mpsc::channel();
        let (event_tx, event_rx) = std::sync::mpsc::channel();
        let handle = PlayerHandle::from_channels(cmd_tx, event_rx);

        event_tx
            .send(PlaybackEvent::Started {
                emotion: EmotionLabel::Happy,
                track: PathBuf::from("happy1.mp3"),
            })
            .unwrap();
        event_tx
            .send(PlaybackEvent::Failed {
                emotion: EmotionLabel::Sad,
                track: PathBuf::from("sad1.mp3"),
                error: "open failed".to_string(),
            })
            .unwrap();

        let events = handle.poll_events();
        assert_eq!(events.len(), 2);
        assert!(handle.poll_events().is_empty());
    }

    #[test]
    fn test_play_forwards_command() {
        let (cmd_tx, cmd_rx) = std::sync::mpsc::channel();
        let (_event_tx, event_rx) = std::sync::mpsc::channel::<PlaybackEvent>();
        let handle = PlayerHandle::from_channels(cmd_tx, event_rx);

        handle.play(EmotionLabel::Angry, PathBuf::from("angry1.mp3"));
        match cmd_rx.try_recv().unwrap() {
            PlaybackCommand::Play { emotion, track } => {
                assert_eq!(emotion, EmotionLabel::Angry);
                assert_eq!(track, PathBuf::from("angry1.mp3"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_fail_all_plays_reports_every_play() {
        let (cmd_tx, cmd_rx) = std::sync::mpsc::channel();
        let (event_tx, event_rx) = std::sync::mpsc::channel();

        cmd_tx
            .send(PlaybackCommand::Play {
                emotion: EmotionLabel::Happy,
                track: PathBuf::from("happy1.mp3"),
            })
            .unwrap();
        cmd_tx.send(PlaybackCommand::Shutdown).unwrap();
        fail_all_plays(cmd_rx, event_tx, "no output device".to_string());

        match event_rx.try_recv().unwrap() {
            PlaybackEvent::Failed { error, .. } => assert_eq!(error, "no output device"),
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
