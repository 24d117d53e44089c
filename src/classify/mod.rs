pub mod label;
pub mod provider;

pub use label::EmotionLabel;
pub use provider::{CommandClassifier, EmotionClassifier};
