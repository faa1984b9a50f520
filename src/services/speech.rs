//! Reading words aloud through the operating system's speech engine.
use crate::config::SpeechConfig;
use crate::models::Language;
use std::process::{Child, Command, Stdio};

/// Fire-and-forget speech output.
pub trait SpeechSynthesizer {
    fn speak(&mut self, text: &str, language: Language);

    fn cancel(&mut self);
}

/// Runs an espeak-style program: `<program> -v <voice> <text>`.
pub struct CommandSpeech {
    program: String,
    child: Option<Child>,
}

impl CommandSpeech {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            child: None,
        }
    }

    fn args(text: &str, language: Language) -> Vec<String> {
        vec![
            "-v".to_string(),
            language.voice_tag().to_string(),
            text.to_string(),
        ]
    }
}

impl SpeechSynthesizer for CommandSpeech {
    fn speak(&mut self, text: &str, language: Language) {
        self.cancel();
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        match Command::new(&self.program)
            .args(Self::args(text, language))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => self.child = Some(child),
            Err(e) => log::warn!("Could not start speech engine '{}': {e}", self.program),
        }
    }

    fn cancel(&mut self) {
        if let Some(mut child) = self.child.take() {
            // Already finished is fine.
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

impl Drop for CommandSpeech {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Used when speech is turned off in the config.
#[derive(Default)]
pub struct SilentSpeech;

impl SpeechSynthesizer for SilentSpeech {
    fn speak(&mut self, _text: &str, _language: Language) {}

    fn cancel(&mut self) {}
}

pub fn from_config(config: &SpeechConfig) -> Box<dyn SpeechSynthesizer> {
    if config.enabled && !config.command.trim().is_empty() {
        Box::new(CommandSpeech::new(config.command.trim()))
    } else {
        Box::new(SilentSpeech)
    }
}
