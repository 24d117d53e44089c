use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::classify::EmotionLabel;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub schema_version: u32,

    /// Capture device: a bare index ("0") or a device path/name.
    pub device: String,

    /// Directory the track lists resolve against; working directory if unset.
    pub music_dir: Option<PathBuf>,

    /// Grabber command with `{device}` and `{output}` placeholders.
    pub grabber_command: Vec<String>,

    /// Classifier command with a `{frame}` placeholder.
    pub classifier_command: Vec<String>,

    // Loop tuning
    pub frame_interval_ms: u64,
    pub min_emotion_duration_ms: u64,

    /// Per-emotion track file lists.
    pub tracks: BTreeMap<EmotionLabel, Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: 1,
            device: "0".to_string(),
            music_dir: None,
            grabber_command: vec![
                "ffmpeg".to_string(),
                "-loglevel".to_string(),
                "error".to_string(),
                "-f".to_string(),
                "v4l2".to_string(),
                "-i".to_string(),
                "{device}".to_string(),
                "-frames:v".to_string(),
                "1".to_string(),
                "-y".to_string(),
                "{output}".to_string(),
            ],
            classifier_command: vec![
                "python3".to_string(),
                "scripts/classify_emotion.py".to_string(),
                "{frame}".to_string(),
            ],
            frame_interval_ms: 250,
            min_emotion_duration_ms: 5000,
            tracks: default_tracks(),
        }
    }
}

fn default_tracks() -> BTreeMap<EmotionLabel, Vec<String>> {
    let mut tracks = BTreeMap::new();
    tracks.insert(
        EmotionLabel::Happy,
        vec!["happy1.mp3".to_string(), "happy2.mp3".to_string()],
    );
    tracks.insert(
        EmotionLabel::Sad,
        vec!["sad1.mp3".to_string(), "sad2.mp3".to_string()],
    );
    tracks.insert(
        EmotionLabel::Angry,
        vec!["angry1.mp3".to_string(), "angry2.mp3".to_string()],
    );
    tracks.insert(
        EmotionLabel::Neutral,
        vec!["neutral1.mp3".to_string(), "neutral2.mp3".to_string()],
    );
    tracks
}

impl Config {
    /// Load config from file, or create default
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content =
                std::fs::read_to_string(path).context("Failed to read config file")?;
            serde_json::from_str(&content).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context("Failed to write config file")
    }

    /// Get the default config directory
    pub fn default_config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Failed to get home directory")?;
        Ok(home.join(".moodtrack"))
    }

    /// Get the default config file path
    pub fn default_config_path() -> Result<PathBuf> {
        Ok(Self::default_config_dir()?.join("config.json"))
    }

    /// Directory the track lists resolve against
    pub fn music_dir(&self) -> PathBuf {
        self.music_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn min_emotion_duration(&self) -> Duration {
        Duration::from_millis(self.min_emotion_duration_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.schema_version, 1);
        assert_eq!(config.device, "0");
        assert_eq!(config.min_emotion_duration_ms, 5000);
        assert_eq!(config.tracks[&EmotionLabel::Happy].len(), 2);
        assert_eq!(config.music_dir(), PathBuf::from("."));
    }

    #[test]
    fn test_load_missing_file_gives_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("config.json")).unwrap();
        assert_eq!(config.schema_version, 1);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = Config::default();
        config.device = "/dev/video2".to_string();
        config.min_emotion_duration_ms = 8000;
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.device, "/dev/video2");
        assert_eq!(loaded.min_emotion_duration(), Duration::from_secs(8));
        assert_eq!(loaded.tracks, config.tracks);
    }

    #[test]
    fn test_track_map_uses_lowercase_keys() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert!(json.contains("\"happy\""));
        assert!(json.contains("happy1.mp3"));
    }
}
