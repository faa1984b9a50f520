//! UI message catalogs.
//!
//! Catalogs are flat JSON objects compiled into the binary. Lookups fall back
//! to English, then to the key itself.

use crate::error::Result;
use crate::models::Language;
use std::collections::HashMap;

const EN: &str = include_str!("en.json");
const PL: &str = include_str!("pl.json");

type Catalog = HashMap<String, String>;

pub struct I18n {
    language: Language,
    messages: Catalog,
    fallback: Catalog,
}

impl I18n {
    pub fn new(language: Language) -> Result<Self> {
        let fallback: Catalog = serde_json::from_str(EN)?;
        let messages = match catalog_source(language) {
            Some(source) => serde_json::from_str(source)?,
            None => {
                log::debug!("No catalog for {language:?}, using English");
                Catalog::new()
            }
        };
        Ok(Self {
            language,
            messages,
            fallback,
        })
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Switches catalogs; keeps the current one when loading fails.
    pub fn set_language(&mut self, language: Language) {
        if language == self.language {
            return;
        }
        match I18n::new(language) {
            Ok(next) => *self = next,
            Err(e) => log::warn!("Could not load catalog for {language:?}: {e}"),
        }
    }

    pub fn t<'a>(&'a self, key: &'a str) -> &'a str {
        self.messages
            .get(key)
            .or_else(|| self.fallback.get(key))
            .map(String::as_str)
            .unwrap_or(key)
    }

    /// Looks up `key` and replaces `{name}` placeholders.
    pub fn tf(&self, key: &str, args: &[(&str, &dyn std::fmt::Display)]) -> String {
        let mut text = self.t(key).to_string();
        for (name, value) in args {
            text = text.replace(&format!("{{{name}}}"), &value.to_string());
        }
        text
    }
}

/// Languages with a bundled catalog.
pub fn supported_languages() -> [Language; 2] {
    [Language::English, Language::Polish]
}

fn catalog_source(language: Language) -> Option<&'static str> {
    match language {
        Language::English => Some(EN),
        Language::Polish => Some(PL),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogs_parse_with_same_keys() {
        let en: Catalog = serde_json::from_str(EN).unwrap();
        let pl: Catalog = serde_json::from_str(PL).unwrap();
        let mut missing: Vec<&String> = en.keys().filter(|k| !pl.contains_key(*k)).collect();
        missing.sort();
        assert!(missing.is_empty(), "missing in pl: {missing:?}");
    }

    #[test]
    fn test_lookup_and_fallback() {
        let pl = I18n::new(Language::Polish).unwrap();
        assert_eq!(pl.t("auth.login"), "Zaloguj się");
        assert_eq!(pl.t("no.such.key"), "no.such.key");

        let de = I18n::new(Language::German).unwrap();
        assert_eq!(de.t("auth.login"), "Sign in");
    }

    #[test]
    fn test_placeholders() {
        let en = I18n::new(Language::English).unwrap();
        assert_eq!(
            en.tf("study.round", &[("round", &2), ("count", &5)]),
            "Round 2: 5 cards"
        );
    }

    #[test]
    fn test_set_language() {
        let mut i18n = I18n::new(Language::English).unwrap();
        i18n.set_language(Language::Polish);
        assert_eq!(i18n.language(), Language::Polish);
        assert_eq!(i18n.t("auth.logout"), "Wyloguj");
    }
}
