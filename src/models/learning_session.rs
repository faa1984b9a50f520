//! Study session management for spaced repetition practice.
//! Handles multi-round flashcard review with SM-2 algorithm integration.

use super::sm2::compute_next_review_state;
use super::{Flashcard, LearningCard, Quality, UserId};
use crate::database::{SharedConnection, db, lock};
use crate::error::Result;
use chrono::{DateTime, Utc};

/// Manages a study session with multiple review rounds.
/// Cards that aren't mastered (grade < 3) are repeated in subsequent rounds.
pub struct StudySession {
    pub owner: UserId,
    pub all_cards: Vec<LearningCard>,
    pub current_round_cards: Vec<usize>,
    pub current_index: usize,
    pub show_translation: bool,
    pub conn: SharedConnection,
    pub round_number: usize,
    pub graded_count: usize,
}

impl StudySession {
    /// Starts a session over the owner's due cards, at most `limit` of them.
    /// Returns `None` when nothing is due.
    pub fn start(
        owner: UserId,
        limit: usize,
        now: DateTime<Utc>,
        conn: SharedConnection,
    ) -> Result<Option<Self>> {
        let due = {
            let guard = lock(&conn)?;
            db::due_flashcards(&owner, now, limit, &guard)?
        };
        log::info!("Starting study session for {owner} with {} due cards", due.len());

        if due.is_empty() {
            return Ok(None);
        }
        Ok(Some(Self::new_from_due_cards(owner, due, conn)))
    }

    pub fn new_from_due_cards(
        owner: UserId,
        cards: Vec<Flashcard>,
        conn: SharedConnection,
    ) -> Self {
        let all_cards: Vec<_> = cards.into_iter().map(LearningCard::new).collect();
        let indices: Vec<usize> = (0..all_cards.len()).collect();

        Self {
            owner,
            all_cards,
            current_round_cards: indices,
            current_index: 0,
            show_translation: false,
            conn,
            round_number: 1,
            graded_count: 0,
        }
    }

    pub fn current_card(&self) -> Option<&LearningCard> {
        self.current_round_cards
            .get(self.current_index)
            .and_then(|&idx| self.all_cards.get(idx))
    }

    pub fn toggle_translation(&mut self) {
        self.show_translation = !self.show_translation;
    }

    pub fn next_card(&mut self) {
        if self.current_index + 1 < self.current_round_cards.len() {
            self.current_index += 1;
            self.show_translation = false;
        } else {
            self.start_next_round();
        }
    }

    /// Starts a new round with the cards that weren't mastered (grade < 3).
    /// If none remain, the session is complete.
    fn start_next_round(&mut self) {
        let failed: Vec<usize> = self
            .current_round_cards
            .iter()
            .copied()
            .filter(|&idx| self.all_cards.get(idx).is_some_and(|card| !card.is_learned))
            .collect();

        if !failed.is_empty() {
            log::debug!("Round {} done, {} cards to retry", self.round_number, failed.len());
            self.current_round_cards = failed;
            self.current_index = 0;
            self.show_translation = false;
            self.round_number += 1;
        }
    }

    /// Grades the current card, runs the scheduler and stores its result.
    ///
    /// When the write fails the error is returned and the in-memory card is left
    /// as it was, so the same grade can be submitted again.
    pub fn grade_current_card(&mut self, quality: Quality, now: DateTime<Utc>) -> Result<()> {
        let Some(&idx) = self.current_round_cards.get(self.current_index) else {
            return Ok(());
        };
        let Some(card) = self.all_cards.get_mut(idx) else {
            return Ok(());
        };

        let next = compute_next_review_state(&card.flashcard.review, quality, now);
        {
            let conn = lock(&self.conn)?;
            db::update_review_state(&self.owner, card.flashcard.id, &next, &conn)?;
        }

        card.flashcard.review = next;
        if quality.is_success() {
            card.mark_as_learned();
        } else {
            card.mark_for_retry();
        }
        self.graded_count += 1;
        Ok(())
    }

    pub fn learned_count(&self) -> usize {
        self.current_round_cards
            .iter()
            .filter(|&&idx| self.all_cards.get(idx).is_some_and(|card| card.is_learned))
            .count()
    }

    pub fn total_count(&self) -> usize {
        self.current_round_cards.len()
    }

    pub fn remaining_count(&self) -> usize {
        self.total_count() - self.learned_count()
    }

    /// True when every card in the current round has been mastered.
    pub fn is_completed(&self) -> bool {
        self.current_round_cards.is_empty() || self.learned_count() == self.total_count()
    }

    pub fn is_retry_round(&self) -> bool {
        self.round_number > 1
    }
}
