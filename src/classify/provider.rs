use std::process::Command;

use anyhow::{Context, Result};
use tracing::debug;

use super::label::EmotionLabel;
use crate::capture::Frame;

/// Opaque classifier seam: one frame in, one dominant emotion out.
pub trait EmotionClassifier {
    fn classify(&self, frame: &Frame) -> Result<EmotionLabel>;
}

/// Classifier that shells out to an external command.
///
/// The command receives a `{frame}` placeholder pointing at the frame image
/// and must print the dominant emotion on its first stdout line, either as a
/// bare label ("happy") or as DeepFace-style JSON
/// (`{"dominant_emotion": "happy"}`).
pub struct CommandClassifier {
    command: Vec<String>,
}

impl CommandClassifier {
    pub fn new(command: Vec<String>) -> Result<Self> {
        anyhow::ensure!(!command.is_empty(), "empty classifier command");
        Ok(Self { command })
    }

    fn parse_output(line: &str) -> Result<EmotionLabel> {
        let line = line.trim();
        anyhow::ensure!(!line.is_empty(), "classifier produced no output");

        if line.starts_with('{') {
            let value: serde_json::Value =
                serde_json::from_str(line).context("classifier output is not valid JSON")?;
            let label = value
                .get("dominant_emotion")
                .and_then(|v| v.as_str())
                .context("classifier JSON has no dominant_emotion field")?;
            return label
                .parse::<EmotionLabel>()
                .map_err(|e| anyhow::anyhow!(e));
        }

        line.parse::<EmotionLabel>().map_err(|e| anyhow::anyhow!(e))
    }
}

impl EmotionClassifier for CommandClassifier {
    fn classify(&self, frame: &Frame) -> Result<EmotionLabel> {
        let frame_path = frame.path.to_string_lossy();
        let program = self.command[0].replace("{frame}", &frame_path);
        let args: Vec<String> = self.command[1..]
            .iter()
            .map(|a| a.replace("{frame}", &frame_path))
            .collect();

        let output = Command::new(&program)
            .args(&args)
            .output()
            .with_context(|| format!("failed to run classifier {}", program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "classifier exited with {}: {}",
                output.status,
                stderr.trim()
            );
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let first_line = stdout.lines().next().unwrap_or("");
        let label = Self::parse_output(first_line)?;
        debug!("Frame {} classified as {}", frame.index, label);
        Ok(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn dummy_frame() -> Frame {
        Frame::new(PathBuf::from("/tmp/frame-0.jpg"), 640, 480, 0)
    }

    #[test]
    fn test_parse_bare_label() {
        assert_eq!(
            CommandClassifier::parse_output("happy").unwrap(),
            EmotionLabel::Happy
        );
        assert_eq!(
            CommandClassifier::parse_output("  Neutral \n").unwrap(),
            EmotionLabel::Neutral
        );
    }

    #[test]
    fn test_parse_deepface_json() {
        let line = r#"{"dominant_emotion": "sad", "face_confidence": 0.93}"#;
        assert_eq!(
            CommandClassifier::parse_output(line).unwrap(),
            EmotionLabel::Sad
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(CommandClassifier::parse_output("").is_err());
        assert!(CommandClassifier::parse_output("no face found").is_err());
        assert!(CommandClassifier::parse_output(r#"{"emotion": "sad"}"#).is_err());
    }

    #[test]
    fn test_empty_command_rejected() {
        assert!(CommandClassifier::new(vec![]).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_classify_via_echo() {
        let classifier = CommandClassifier::new(vec![
            "sh".to_string(),
            "-c".to_string(),
            "echo angry".to_string(),
        ])
        .unwrap();
        assert_eq!(
            classifier.classify(&dummy_frame()).unwrap(),
            EmotionLabel::Angry
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_classify_failure_is_error() {
        let classifier = CommandClassifier::new(vec!["false".to_string()]).unwrap();
        assert!(classifier.classify(&dummy_frame()).is_err());
    }
}
