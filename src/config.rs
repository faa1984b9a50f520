//! Application configuration read from `config.toml`.
use crate::error::Result;
use crate::models::Language;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "lingocards";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// SQLite file holding accounts and flashcards
    pub database_path: PathBuf,
    pub translation: TranslationConfig,
    pub images: ImagesConfig,
    pub speech: SpeechConfig,
    pub ui: UiConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: default_data_dir().join("lingocards.sqlite3"),
            translation: TranslationConfig::default(),
            images: ImagesConfig::default(),
            speech: SpeechConfig::default(),
            ui: UiConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TranslationConfig {
    /// MyMemory-compatible `GET` endpoint
    pub endpoint: String,
    /// Contact address sent with requests for a higher daily quota
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub timeout_secs: u64,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.mymemory.translated.net/get".to_string(),
            email: None,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ImagesConfig {
    /// Pixabay-compatible search endpoint
    pub endpoint: String,
    /// Image lookup is disabled without a key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub per_page: u32,
    pub timeout_secs: u64,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://pixabay.com/api/".to_string(),
            api_key: None,
            per_page: 6,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpeechConfig {
    pub enabled: bool,
    /// Program invoked as `<command> -v <voice> <text>`
    pub command: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: "espeak-ng".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UiConfig {
    /// Interface language used before anyone signs in
    pub language: Language,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            language: Language::English,
        }
    }
}

impl AppConfig {
    /// Loads the config file at the default location, falling back to defaults
    /// when it doesn't exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&default_config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&text)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("config.toml")
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::fs;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
database_path = "/tmp/cards.sqlite3"

[images]
api_key = "abc"

[ui]
language = "polish"
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.database_path, PathBuf::from("/tmp/cards.sqlite3"));
        assert_eq!(config.images.api_key.as_deref(), Some("abc"));
        assert_eq!(config.images.per_page, 6);
        assert_eq!(config.ui.language, Language::Polish);
        assert_eq!(config.translation, TranslationConfig::default());
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "database_path = [").unwrap();

        assert!(matches!(AppConfig::load_from(&path), Err(Error::Config(_))));
    }
}
