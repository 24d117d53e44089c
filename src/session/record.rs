use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::classify::EmotionLabel;

/// One accepted emotion change and the track it started.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerRecord {
    pub id: Uuid,
    pub at: DateTime<Utc>,
    pub emotion: EmotionLabel,
    pub track: PathBuf,
}

impl TriggerRecord {
    pub fn new(emotion: EmotionLabel, track: PathBuf) -> Self {
        Self {
            id: Uuid::new_v4(),
            at: Utc::now(),
            emotion,
            track,
        }
    }
}

/// A complete session record: counters plus every accepted trigger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: Uuid,
    pub device: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,

    // Stats
    pub frames_captured: u64,
    pub capture_failures: u64,
    pub classify_failures: u64,
    pub playback_failures: u64,

    pub triggers: Vec<TriggerRecord>,
}

impl SessionRecord {
    pub fn new(device: String) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            device,
            started_at: Utc::now(),
            ended_at: None,
            frames_captured: 0,
            capture_failures: 0,
            classify_failures: 0,
            playback_failures: 0,
            triggers: Vec::new(),
        }
    }

    pub fn add_trigger(&mut self, emotion: EmotionLabel, track: PathBuf) {
        self.triggers.push(TriggerRecord::new(emotion, track));
    }

    pub fn finalize(&mut self) {
        self.ended_at = Some(Utc::now());
    }

    pub fn duration_secs(&self) -> f64 {
        let end = self.ended_at.unwrap_or_else(Utc::now);
        (end - self.started_at).num_milliseconds() as f64 / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_counts_triggers() {
        let mut record = SessionRecord::new("/dev/video0".to_string());
        record.add_trigger(EmotionLabel::Happy, PathBuf::from("happy1.mp3"));
        record.add_trigger(EmotionLabel::Sad, PathBuf::from("sad2.mp3"));

        assert_eq!(record.triggers.len(), 2);
        assert_eq!(record.triggers[0].emotion, EmotionLabel::Happy);
        assert!(record.ended_at.is_none());

        record.finalize();
        assert!(record.ended_at.is_some());
    }

    #[test]
    fn test_record_serializes_to_json() {
        let mut record = SessionRecord::new("/dev/video0".to_string());
        record.add_trigger(EmotionLabel::Neutral, PathBuf::from("neutral1.mp3"));
        record.finalize();

        let json = serde_json::to_string_pretty(&record).unwrap();
        assert!(json.contains("\"neutral\""));
        let back: SessionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.triggers.len(), 1);
    }
}
