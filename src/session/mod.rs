pub mod record;
pub mod runner;

pub use record::{SessionRecord, TriggerRecord};
pub use runner::{run_session, SessionConfig, SessionMessage};
