//! JSON import/export of a user's flashcards.
//! Provides functionality to save cards, review state included, to a JSON file
//! and to load them back for the signed-in user.

use crate::database::db;
use crate::error::{Error, Result};
use crate::models::{Flashcard, NewFlashcard, ReviewState, UserId};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportFile {
    pub version: u32,
    pub cards: Vec<ExportedCard>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedCard {
    #[serde(flatten)]
    pub card: NewFlashcard,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub review: Option<ReviewState>,
}

impl From<&Flashcard> for ExportedCard {
    fn from(card: &Flashcard) -> Self {
        Self {
            card: NewFlashcard {
                original_word: card.original_word.clone(),
                translation: card.translation.clone(),
                source_language: card.source_language,
                target_language: card.target_language,
                image_url: card.image_url.clone(),
                notes: card.notes.clone(),
            },
            created_at: Some(card.created_at),
            review: Some(card.review.clone()),
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

/// Exports cards to a pretty-printed JSON file at the specified path.
pub fn export_json_to_path(cards: &[Flashcard], path: &Path) -> Result<()> {
    let file = ExportFile {
        version: FORMAT_VERSION,
        cards: cards.iter().map(ExportedCard::from).collect(),
    };
    fs::write(path, serde_json::to_string_pretty(&file)?)?;
    log::info!("Exported {} cards to {}", cards.len(), path.display());
    Ok(())
}

/// Exports every card of `owner`. Returns how many were written.
pub fn export_owner(owner: &UserId, path: &Path, conn: &Connection) -> Result<usize> {
    let cards = db::list_flashcards(owner, conn)?;
    export_json_to_path(&cards, path)?;
    Ok(cards.len())
}

/// Reads an export file. Fails on invalid JSON or an unknown format version.
pub fn import_json(path: &Path) -> Result<ExportFile> {
    let contents = fs::read_to_string(path)?;
    let file: ExportFile = serde_json::from_str(&contents)?;
    if file.version != FORMAT_VERSION {
        return Err(Error::Validation(format!(
            "unsupported export version {}",
            file.version
        )));
    }
    Ok(file)
}

/// Stores imported cards for `owner`. Duplicates and invalid cards are skipped;
/// review state is kept only when it is valid.
pub fn import_into(
    owner: &UserId,
    file: ExportFile,
    now: DateTime<Utc>,
    conn: &Connection,
) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();
    for exported in file.cards {
        let created_at = exported.created_at.unwrap_or(now);
        let review = exported
            .review
            .filter(ReviewState::is_valid)
            .unwrap_or_else(|| ReviewState::new(now));

        match db::insert_flashcard(owner, &exported.card, created_at, &review, conn) {
            Ok(_) => summary.imported += 1,
            Err(Error::Duplicate(word)) => {
                log::debug!("Skipping duplicate '{word}'");
                summary.skipped += 1;
            }
            Err(Error::Validation(reason)) => {
                log::warn!("Skipping invalid card '{}': {reason}", exported.card.original_word);
                summary.skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }
    log::info!(
        "Imported {} cards for {owner} ({} skipped)",
        summary.imported,
        summary.skipped
    );
    Ok(summary)
}
