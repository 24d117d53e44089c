pub mod library;
pub mod player;
pub mod trigger;

pub use library::TrackLibrary;
pub use player::{PlaybackCommand, PlaybackEvent, PlayerHandle};
pub use trigger::{AudioTrigger, PlaybackState, TriggerAction};
