use std::path::PathBuf;
use std::time::{Duration, Instant};

use rand::Rng;
use tracing::debug;

use super::library::TrackLibrary;
use crate::classify::EmotionLabel;

/// Current playback state, owned by the trigger.
///
/// Invariant: `is_playing == true` implies `current_emotion.is_some()`.
#[derive(Debug, Clone, Default)]
pub struct PlaybackState {
    pub current_emotion: Option<EmotionLabel>,
    pub is_playing: bool,
    /// Time of the last accepted emotion change; `None` until the first
    /// trigger, so the first observed label always fires immediately.
    pub last_change: Option<Instant>,
}

/// An accepted emotion change: stop whatever is playing, start this track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerAction {
    pub emotion: EmotionLabel,
    pub track: PathBuf,
}

/// Debounced emotion-change state machine.
///
/// A new label is accepted only when it differs from the current emotion and
/// the debounce window has elapsed since the last accepted change. Debounce
/// state advances only on accepted changes, never on suppressed ones.
pub struct AudioTrigger {
    state: PlaybackState,
    library: TrackLibrary,
    min_emotion_duration: Duration,
}

impl AudioTrigger {
    pub fn new(library: TrackLibrary, min_emotion_duration: Duration) -> Self {
        Self {
            state: PlaybackState::default(),
            library,
            min_emotion_duration,
        }
    }

    /// Feed one observed label; returns the playback action if the change is
    /// accepted, `None` when debounced or when no track could be picked.
    pub fn observe<R: Rng>(
        &mut self,
        label: EmotionLabel,
        now: Instant,
        rng: &mut R,
    ) -> Option<TriggerAction> {
        if self.state.current_emotion == Some(label) {
            return None;
        }

        if let Some(last_change) = self.state.last_change {
            if now.duration_since(last_change) <= self.min_emotion_duration {
                debug!("Debounced {} (window still open)", label);
                return None;
            }
        }

        let Some(track) = self.library.pick(label, rng) else {
            // Track selection failed: playback stays off, debounce state
            // untouched so a later observation may retry.
            self.state.is_playing = false;
            return None;
        };

        self.state.current_emotion = Some(label);
        self.state.is_playing = true;
        self.state.last_change = Some(now);
        debug!("Accepted emotion change to {} -> {:?}", label, track);

        Some(TriggerAction {
            emotion: label,
            track,
        })
    }

    /// Playback worker confirmed the track started.
    pub fn note_playback_started(&mut self) {
        if self.state.current_emotion.is_some() {
            self.state.is_playing = true;
        }
    }

    /// Playback worker reported a load/start failure: not playing, but the
    /// current emotion is kept so an unchanged label stays debounced.
    pub fn note_playback_failed(&mut self) {
        self.state.is_playing = false;
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }
}
