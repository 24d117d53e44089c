use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::warn;

use crate::classify::EmotionLabel;

/// Emotion-to-track mapping, resolved against the music directory.
///
/// Tracks are kept as paths only; existence is checked by the player when a
/// track is actually loaded, so a missing file is a per-event playback error
/// rather than a startup failure.
#[derive(Debug, Clone)]
pub struct TrackLibrary {
    tracks: BTreeMap<EmotionLabel, Vec<PathBuf>>,
}

impl TrackLibrary {
    pub fn new(music_dir: &Path, tracks: &BTreeMap<EmotionLabel, Vec<String>>) -> Self {
        let tracks = tracks
            .iter()
            .map(|(label, files)| {
                let paths = files.iter().map(|f| music_dir.join(f)).collect();
                (*label, paths)
            })
            .collect();
        Self { tracks }
    }

    /// Track set for a label, falling back to the neutral set when the label
    /// is unmapped or mapped to an empty list.
    pub fn tracks_for(&self, label: EmotionLabel) -> &[PathBuf] {
        match self.tracks.get(&label) {
            Some(paths) if !paths.is_empty() => paths,
            _ => self
                .tracks
                .get(&EmotionLabel::Neutral)
                .map(|p| p.as_slice())
                .unwrap_or(&[]),
        }
    }

    /// Pick one track at random for the label, with neutral fallback.
    pub fn pick<R: Rng>(&self, label: EmotionLabel, rng: &mut R) -> Option<PathBuf> {
        let candidates = self.tracks_for(label);
        if candidates.is_empty() {
            warn!("No tracks mapped for {} and no neutral fallback", label);
            return None;
        }
        candidates.choose(rng).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.values().all(|v| v.is_empty())
    }

    /// Mapped labels and their resolved paths, for `--list-tracks`.
    pub fn entries(&self) -> impl Iterator<Item = (EmotionLabel, &[PathBuf])> {
        self.tracks.iter().map(|(label, paths)| (*label, paths.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn library() -> TrackLibrary {
        let mut tracks = BTreeMap::new();
        tracks.insert(
            EmotionLabel::Happy,
            vec!["happy1.mp3".to_string(), "happy2.mp3".to_string()],
        );
        tracks.insert(EmotionLabel::Neutral, vec!["neutral1.mp3".to_string()]);
        tracks.insert(EmotionLabel::Sad, vec![]);
        TrackLibrary::new(Path::new("/music"), &tracks)
    }

    #[test]
    fn test_pick_from_mapped_set() {
        let lib = library();
        let mut rng = StdRng::seed_from_u64(7);
        let track = lib.pick(EmotionLabel::Happy, &mut rng).unwrap();
        assert!(track.starts_with("/music"));
        assert!(track
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("happy"));
    }

    #[test]
    fn test_unmapped_label_falls_back_to_neutral() {
        let lib = library();
        let mut rng = StdRng::seed_from_u64(7);
        let track = lib.pick(EmotionLabel::Surprise, &mut rng).unwrap();
        assert_eq!(track, PathBuf::from("/music/neutral1.mp3"));
    }

    #[test]
    fn test_empty_set_falls_back_to_neutral() {
        let lib = library();
        let mut rng = StdRng::seed_from_u64(7);
        let track = lib.pick(EmotionLabel::Sad, &mut rng).unwrap();
        assert_eq!(track, PathBuf::from("/music/neutral1.mp3"));
    }

    #[test]
    fn test_no_tracks_anywhere() {
        let lib = TrackLibrary::new(Path::new("/music"), &BTreeMap::new());
        let mut rng = StdRng::seed_from_u64(7);
        assert!(lib.is_empty());
        assert!(lib.pick(EmotionLabel::Happy, &mut rng).is_none());
    }
}
