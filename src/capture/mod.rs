pub mod frame;
pub mod grabber;

pub use frame::Frame;
pub use grabber::{resolve_device, CaptureError, CommandFrameSource, FrameSource};
