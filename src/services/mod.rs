//! Clients for the network APIs and the OS speech engine.
pub mod images;
pub mod speech;
pub mod translate;

pub use images::{ImageClient, ImageHit};
pub use speech::{SpeechSynthesizer, from_config as speech_from_config};
pub use translate::TranslationClient;
