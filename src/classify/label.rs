use serde::{Deserialize, Serialize};

/// Emotion label produced by the classifier, one per frame.
///
/// Matches the DeepFace label set plus an `Unknown` sentinel used when
/// classification fails or returns something unrecognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionLabel {
    Happy,
    Sad,
    Angry,
    Fear,
    Surprise,
    Disgust,
    Neutral,
    Unknown,
}

impl EmotionLabel {
    /// All labels the classifier can produce (excluding the sentinel).
    pub fn all() -> &'static [EmotionLabel] {
        &[
            Self::Happy,
            Self::Sad,
            Self::Angry,
            Self::Fear,
            Self::Surprise,
            Self::Disgust,
            Self::Neutral,
        ]
    }

    /// Lowercase name, as used in config keys and classifier output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Happy => "happy",
            Self::Sad => "sad",
            Self::Angry => "angry",
            Self::Fear => "fear",
            Self::Surprise => "surprise",
            Self::Disgust => "disgust",
            Self::Neutral => "neutral",
            Self::Unknown => "unknown",
        }
    }

    /// Capitalized name for the on-screen overlay.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Happy => "Happy",
            Self::Sad => "Sad",
            Self::Angry => "Angry",
            Self::Fear => "Fear",
            Self::Surprise => "Surprise",
            Self::Disgust => "Disgust",
            Self::Neutral => "Neutral",
            Self::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

impl std::str::FromStr for EmotionLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "happy" => Ok(Self::Happy),
            "sad" => Ok(Self::Sad),
            "angry" => Ok(Self::Angry),
            "fear" => Ok(Self::Fear),
            "surprise" => Ok(Self::Surprise),
            "disgust" => Ok(Self::Disgust),
            "neutral" => Ok(Self::Neutral),
            "unknown" => Ok(Self::Unknown),
            _ => Err(format!("Unknown emotion label: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_parse() {
        assert_eq!("happy".parse::<EmotionLabel>().unwrap(), EmotionLabel::Happy);
        assert_eq!("NEUTRAL".parse::<EmotionLabel>().unwrap(), EmotionLabel::Neutral);
        assert_eq!(" sad \n".parse::<EmotionLabel>().unwrap(), EmotionLabel::Sad);
        assert!("joyful".parse::<EmotionLabel>().is_err());
    }

    #[test]
    fn test_label_display() {
        assert_eq!(EmotionLabel::Happy.to_string(), "Happy");
        assert_eq!(EmotionLabel::Unknown.to_string(), "Unknown");
    }

    #[test]
    fn test_label_serde_lowercase() {
        let json = serde_json::to_string(&EmotionLabel::Surprise).unwrap();
        assert_eq!(json, "\"surprise\"");
        let back: EmotionLabel = serde_json::from_str(&json).unwrap();
        assert_eq!(back, EmotionLabel::Surprise);
    }

    #[test]
    fn test_all_excludes_sentinel() {
        assert!(!EmotionLabel::all().contains(&EmotionLabel::Unknown));
        assert_eq!(EmotionLabel::all().len(), 7);
    }
}
