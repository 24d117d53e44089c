use std::path::PathBuf;
use std::time::Instant;

/// A single captured frame, written to disk by the grabber.
///
/// Ephemeral: the file is retired when the next frame is grabbed, so anything
/// that needs the image (the classifier) must use it before the next capture.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Path to the frame image on disk.
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    /// Monotonic sequence number within the session.
    pub index: u64,
    pub captured_at: Instant,
}

impl Frame {
    pub fn new(path: PathBuf, width: u32, height: u32, index: u64) -> Self {
        Self {
            path,
            width,
            height,
            index,
            captured_at: Instant::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_fields() {
        let frame = Frame::new(PathBuf::from("/tmp/frame-0.jpg"), 640, 480, 0);
        assert_eq!(frame.width, 640);
        assert_eq!(frame.height, 480);
        assert_eq!(frame.index, 0);
    }
}
