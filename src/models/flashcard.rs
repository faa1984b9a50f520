//! Flashcard is a pair <original word, translation> owned by one user,
//! together with its review state.
use super::{Language, ReviewState, UserId};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MAX_WORD_LEN: usize = 200;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flashcard {
    pub id: i64,
    pub owner_id: UserId,
    pub original_word: String,
    pub translation: String,
    pub source_language: Language,
    pub target_language: Language,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub review: ReviewState,
}

/// Fields a user fills in when authoring or editing a card.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFlashcard {
    pub original_word: String,
    pub translation: String,
    pub source_language: Language,
    pub target_language: Language,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewFlashcard {
    pub fn new(
        original_word: impl Into<String>,
        translation: impl Into<String>,
        source_language: Language,
        target_language: Language,
    ) -> Self {
        Self {
            original_word: original_word.into(),
            translation: translation.into(),
            source_language,
            target_language,
            image_url: None,
            notes: None,
        }
    }

    /// Trims the text fields and checks them. Empty optional fields become `None`.
    pub fn validated(mut self) -> Result<Self> {
        self.original_word = self.original_word.trim().to_string();
        self.translation = self.translation.trim().to_string();
        self.image_url = non_empty(self.image_url);
        self.notes = non_empty(self.notes);

        if self.original_word.is_empty() {
            return Err(Error::Validation("original word must not be empty".into()));
        }
        if self.translation.is_empty() {
            return Err(Error::Validation("translation must not be empty".into()));
        }
        if self.original_word.chars().count() > MAX_WORD_LEN
            || self.translation.chars().count() > MAX_WORD_LEN
        {
            return Err(Error::Validation(format!(
                "words are limited to {MAX_WORD_LEN} characters"
            )));
        }
        if self.source_language == self.target_language {
            return Err(Error::Validation(
                "source and target language must differ".into(),
            ));
        }
        Ok(self)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Card list filters shown above the flashcard list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KnowledgeFilter {
    #[default]
    All,
    New,
    Learning,
    Known,
    Due,
}

impl KnowledgeFilter {
    pub const ALL: [KnowledgeFilter; 5] = [
        KnowledgeFilter::All,
        KnowledgeFilter::New,
        KnowledgeFilter::Learning,
        KnowledgeFilter::Known,
        KnowledgeFilter::Due,
    ];

    pub fn matches(self, card: &Flashcard, now: DateTime<Utc>) -> bool {
        match self {
            KnowledgeFilter::All => true,
            KnowledgeFilter::New => card.review.is_new(),
            KnowledgeFilter::Learning => card.review.knowledge_level == 2,
            KnowledgeFilter::Known => card.review.knowledge_level >= 3,
            KnowledgeFilter::Due => card.review.is_due(now),
        }
    }

    /// Message key used by the UI catalog.
    pub fn label_key(self) -> &'static str {
        match self {
            KnowledgeFilter::All => "filter.all",
            KnowledgeFilter::New => "filter.new",
            KnowledgeFilter::Learning => "filter.learning",
            KnowledgeFilter::Known => "filter.known",
            KnowledgeFilter::Due => "filter.due",
        }
    }
}
