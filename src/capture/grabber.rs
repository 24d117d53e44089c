use std::path::PathBuf;
use std::process::Command;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::frame::Frame;

/// Capture failure, split by whether the session loop may retry.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// A single grab attempt failed; the next attempt may succeed.
    #[error("frame grab failed: {0}")]
    Transient(String),
    /// The device or grabber is gone; the session loop must stop.
    #[error("capture device unavailable: {0}")]
    Fatal(String),
}

/// Source of frames for the session loop.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Frame, CaptureError>;

    /// Human-readable description of the device, for logs and the session record.
    fn describe(&self) -> String;
}

/// Resolve a device argument for the grabber command.
///
/// A bare index like "0" maps to the v4l2 device node; anything else is
/// passed through as-is (named devices, avfoundation indices, test files).
pub fn resolve_device(device: &str) -> String {
    match device.parse::<u32>() {
        Ok(index) => format!("/dev/video{}", index),
        Err(_) => device.to_string(),
    }
}

/// Frame source that shells out to an external grabber command.
///
/// The command receives `{device}` and `{output}` placeholders and must write
/// one still image per invocation. Frames land in a per-session temp
/// directory which is removed on drop.
pub struct CommandFrameSource {
    command: Vec<String>,
    device: String,
    frame_dir: PathBuf,
    next_index: u64,
    last_frame_path: Option<PathBuf>,
}

impl CommandFrameSource {
    pub fn new(command: Vec<String>, device: &str) -> Result<Self, CaptureError> {
        if command.is_empty() {
            return Err(CaptureError::Fatal("empty grabber command".to_string()));
        }

        let device = resolve_device(device);

        let frame_dir = std::env::temp_dir().join(format!(
            "moodtrack-frames-{}-{}",
            chrono::Utc::now().format("%Y%m%d-%H%M%S"),
            uuid::Uuid::new_v4().simple()
        ));
        std::fs::create_dir_all(&frame_dir)
            .map_err(|e| CaptureError::Fatal(format!("failed to create frame dir: {}", e)))?;

        info!("Capturing from {} into {:?}", device, frame_dir);

        Ok(Self {
            command,
            device,
            frame_dir,
            next_index: 0,
            last_frame_path: None,
        })
    }

    fn expand(&self, arg: &str, output: &PathBuf) -> String {
        arg.replace("{device}", &self.device)
            .replace("{output}", &output.to_string_lossy())
    }

    fn retire_last_frame(&mut self) {
        if let Some(path) = self.last_frame_path.take() {
            if let Err(e) = std::fs::remove_file(&path) {
                debug!("Failed to remove stale frame {:?}: {}", path, e);
            }
        }
    }
}

impl FrameSource for CommandFrameSource {
    fn next_frame(&mut self) -> Result<Frame, CaptureError> {
        let index = self.next_index;
        let output = self.frame_dir.join(format!("frame-{}.jpg", index));

        let program = self.expand(&self.command[0], &output);
        let args: Vec<String> = self.command[1..]
            .iter()
            .map(|a| self.expand(a, &output))
            .collect();

        debug!("Grabbing frame {} via {} {:?}", index, program, args);

        let status = Command::new(&program)
            .args(&args)
            .output()
            // Spawn failure means the grabber binary itself is unusable.
            .map_err(|e| CaptureError::Fatal(format!("failed to run grabber {}: {}", program, e)))?;

        if !status.status.success() {
            let stderr = String::from_utf8_lossy(&status.stderr);
            return Err(CaptureError::Transient(format!(
                "grabber exited with {}: {}",
                status.status,
                stderr.trim()
            )));
        }

        // Validate that the grabber actually produced a decodable image.
        let (width, height) = image::image_dimensions(&output).map_err(|e| {
            CaptureError::Transient(format!("grabber output unreadable {:?}: {}", output, e))
        })?;

        self.retire_last_frame();
        self.last_frame_path = Some(output.clone());
        self.next_index += 1;

        debug!("Frame {} captured ({}x{})", index, width, height);
        Ok(Frame::new(output, width, height, index))
    }

    fn describe(&self) -> String {
        self.device.clone()
    }
}

impl Drop for CommandFrameSource {
    fn drop(&mut self) {
        self.retire_last_frame();
        if let Err(e) = std::fs::remove_dir_all(&self.frame_dir) {
            warn!("Failed to clean up frame dir {:?}: {}", self.frame_dir, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_device_index() {
        assert_eq!(resolve_device("0"), "/dev/video0");
        assert_eq!(resolve_device("2"), "/dev/video2");
    }

    #[test]
    fn test_resolve_device_passthrough() {
        assert_eq!(resolve_device("/dev/video7"), "/dev/video7");
        assert_eq!(resolve_device("FaceTime HD Camera"), "FaceTime HD Camera");
    }

    #[test]
    fn test_empty_command_is_fatal() {
        let err = CommandFrameSource::new(vec![], "0").err().unwrap();
        assert!(matches!(err, CaptureError::Fatal(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_missing_grabber_is_fatal() {
        let mut source = CommandFrameSource::new(
            vec!["/nonexistent/grabber-binary".to_string(), "{output}".to_string()],
            "0",
        )
        .unwrap();
        let err = source.next_frame().err().unwrap();
        assert!(matches!(err, CaptureError::Fatal(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_grabber_is_transient() {
        let mut source =
            CommandFrameSource::new(vec!["false".to_string()], "0").unwrap();
        let err = source.next_frame().err().unwrap();
        assert!(matches!(err, CaptureError::Transient(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_output_is_transient() {
        // "true" succeeds but writes nothing, so image validation fails.
        let mut source =
            CommandFrameSource::new(vec!["true".to_string(), "{output}".to_string()], "0").unwrap();
        let err = source.next_frame().err().unwrap();
        assert!(matches!(err, CaptureError::Transient(_)));
    }
}
