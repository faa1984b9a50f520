//! Languages a card side or the interface can be in.
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    English,
    Polish,
    Spanish,
    German,
    French,
    Italian,
    Portuguese,
    Ukrainian,
}

impl Language {
    pub const ALL: [Language; 8] = [
        Language::English,
        Language::Polish,
        Language::Spanish,
        Language::German,
        Language::French,
        Language::Italian,
        Language::Portuguese,
        Language::Ukrainian,
    ];

    pub fn iso_639_1(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Polish => "pl",
            Language::Spanish => "es",
            Language::German => "de",
            Language::French => "fr",
            Language::Italian => "it",
            Language::Portuguese => "pt",
            Language::Ukrainian => "uk",
        }
    }

    /// Voice name passed to the speech engine.
    pub fn voice_tag(self) -> &'static str {
        match self {
            Language::English => "en-US",
            Language::Polish => "pl",
            Language::Spanish => "es",
            Language::German => "de",
            Language::French => "fr-FR",
            Language::Italian => "it",
            Language::Portuguese => "pt-PT",
            Language::Ukrainian => "uk",
        }
    }

    /// Name of the language in that language.
    pub fn native_name(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Polish => "Polski",
            Language::Spanish => "Español",
            Language::German => "Deutsch",
            Language::French => "Français",
            Language::Italian => "Italiano",
            Language::Portuguese => "Português",
            Language::Ukrainian => "Українська",
        }
    }

    pub fn from_iso_639_1(code: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|lang| lang.iso_639_1().eq_ignore_ascii_case(code.trim()))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.native_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso_codes_roundtrip() {
        for lang in Language::ALL {
            assert_eq!(Language::from_iso_639_1(lang.iso_639_1()), Some(lang));
        }
    }
}
