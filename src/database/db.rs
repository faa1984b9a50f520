//! Database operations for the flashcard application
//!
//! Handles SQLite connection setup, schema migrations and the flashcard
//! document store. Every flashcard query is scoped by its owner's id.

use crate::error::{Error, Result};
use crate::models::review_state::{from_iso, to_iso};
use crate::models::{Flashcard, Language, NewFlashcard, ReviewState, UserId};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, params};
use std::path::Path;

const SCHEMA_VERSION: i32 = 1;

/// Opens (or creates) the database file and brings the schema up to date.
pub fn open_database(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let conn = Connection::open(path)?;
    init_database(&conn)?;
    log::info!("Opened database at {}", path.display());
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    init_database(&conn)?;
    Ok(conn)
}

/// Creates tables for users, profiles and flashcards with their review state.
fn init_database(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "foreign_keys", 1)?;

    let user_version: i32 = conn.pragma_query_value(None, "user_version", |r| r.get(0))?;
    if user_version < 1 {
        log::debug!("Migrating schema from version {user_version} to {SCHEMA_VERSION}");
        conn.execute_batch(
            "
BEGIN;
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY NOT NULL,
    email TEXT NOT NULL UNIQUE,
    display_name TEXT NOT NULL,
    password_hash TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS profiles (
    user_id TEXT PRIMARY KEY NOT NULL,
    native_language TEXT NOT NULL,
    learning_language TEXT NOT NULL,
    proficiency TEXT NOT NULL,
    daily_goal INTEGER NOT NULL,
    interface_language TEXT NOT NULL,
    onboarding_completed INTEGER NOT NULL DEFAULT 0,
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);
CREATE TABLE IF NOT EXISTS flashcards (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_id TEXT NOT NULL,
    original_word TEXT NOT NULL,
    translation TEXT NOT NULL,
    source_language TEXT NOT NULL,
    target_language TEXT NOT NULL,
    image_url TEXT,
    notes TEXT,
    created_at TEXT NOT NULL,
    easiness REAL NOT NULL DEFAULT 2.5,
    interval INTEGER NOT NULL DEFAULT 0,
    review_count INTEGER NOT NULL DEFAULT 0,
    knowledge_level INTEGER NOT NULL DEFAULT 1,
    next_review TEXT NOT NULL,
    FOREIGN KEY (owner_id) REFERENCES users(id) ON DELETE CASCADE,
    UNIQUE(owner_id, original_word, source_language, target_language)
);
CREATE INDEX IF NOT EXISTS flashcards_due ON flashcards(owner_id, next_review);
PRAGMA user_version = 1;
COMMIT;
",
        )?;
    }
    Ok(())
}

const CARD_COLUMNS: &str = "id, owner_id, original_word, translation, source_language, target_language,
     image_url, notes, created_at, easiness, interval, review_count, knowledge_level, next_review";

/// Adds a flashcard for `owner` with a fresh review state due at `now`.
///
/// Returns the stored card. A second card with the same word and language pair
/// is rejected with `Error::Duplicate`.
pub fn add_flashcard(
    owner: &UserId,
    card: &NewFlashcard,
    now: DateTime<Utc>,
    conn: &Connection,
) -> Result<Flashcard> {
    insert_flashcard(owner, card, now, &ReviewState::new(now), conn)
}

/// Inserts a card with an explicit review state (used by import).
pub fn insert_flashcard(
    owner: &UserId,
    card: &NewFlashcard,
    created_at: DateTime<Utc>,
    review: &ReviewState,
    conn: &Connection,
) -> Result<Flashcard> {
    let card = card.clone().validated()?;
    conn.execute(
        "INSERT INTO flashcards (owner_id, original_word, translation, source_language, target_language,
             image_url, notes, created_at, easiness, interval, review_count, knowledge_level, next_review)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            owner.as_str(),
            card.original_word,
            card.translation,
            card.source_language.iso_639_1(),
            card.target_language.iso_639_1(),
            card.image_url,
            card.notes,
            to_iso(&created_at),
            review.easiness,
            review.interval,
            review.review_count,
            review.knowledge_level,
            to_iso(&review.next_review),
        ],
    )
    .map_err(|e| duplicate_or(e, &card.original_word))?;

    let id = conn.last_insert_rowid();
    log::debug!("Added flashcard {id} '{}' for {owner}", card.original_word);
    get_flashcard(owner, id, conn)
}

pub fn get_flashcard(owner: &UserId, id: i64, conn: &Connection) -> Result<Flashcard> {
    conn.query_row(
        &format!("SELECT {CARD_COLUMNS} FROM flashcards WHERE id = ?1 AND owner_id = ?2"),
        params![id, owner.as_str()],
        card_from_row,
    )
    .optional()?
    .ok_or(Error::NotFound)
}

/// Retrieves all flashcards of an owner, newest first.
pub fn list_flashcards(owner: &UserId, conn: &Connection) -> Result<Vec<Flashcard>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CARD_COLUMNS} FROM flashcards WHERE owner_id = ?1 ORDER BY created_at DESC, id DESC"
    ))?;
    let cards = stmt
        .query_map(params![owner.as_str()], card_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(cards)
}

/// Retrieves flashcards due for review (`next_review <= now`), oldest first.
pub fn due_flashcards(
    owner: &UserId,
    now: DateTime<Utc>,
    limit: usize,
    conn: &Connection,
) -> Result<Vec<Flashcard>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CARD_COLUMNS} FROM flashcards
         WHERE owner_id = ?1 AND next_review <= ?2
         ORDER BY next_review ASC, id ASC
         LIMIT ?3"
    ))?;
    let cards = stmt
        .query_map(
            params![owner.as_str(), to_iso(&now), limit as i64],
            card_from_row,
        )?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(cards)
}

/// Replaces the editable fields of a card; its review state is untouched.
pub fn update_flashcard_content(
    owner: &UserId,
    id: i64,
    card: &NewFlashcard,
    conn: &Connection,
) -> Result<Flashcard> {
    let card = card.clone().validated()?;
    let changed = conn
        .execute(
            "UPDATE flashcards
             SET original_word = ?1, translation = ?2, source_language = ?3, target_language = ?4,
                 image_url = ?5, notes = ?6
             WHERE id = ?7 AND owner_id = ?8",
            params![
                card.original_word,
                card.translation,
                card.source_language.iso_639_1(),
                card.target_language.iso_639_1(),
                card.image_url,
                card.notes,
                id,
                owner.as_str(),
            ],
        )
        .map_err(|e| duplicate_or(e, &card.original_word))?;
    if changed == 0 {
        return Err(Error::NotFound);
    }
    get_flashcard(owner, id, conn)
}

/// Writes the scheduler's output back into the card it was computed for.
pub fn update_review_state(
    owner: &UserId,
    id: i64,
    review: &ReviewState,
    conn: &Connection,
) -> Result<()> {
    let changed = conn.execute(
        "UPDATE flashcards
         SET easiness = ?1, interval = ?2, review_count = ?3, knowledge_level = ?4, next_review = ?5
         WHERE id = ?6 AND owner_id = ?7",
        params![
            review.easiness,
            review.interval,
            review.review_count,
            review.knowledge_level,
            to_iso(&review.next_review),
            id,
            owner.as_str(),
        ],
    )?;
    if changed == 0 {
        return Err(Error::NotFound);
    }
    log::debug!(
        "Card {id}: interval {} days, next review {}",
        review.interval,
        to_iso(&review.next_review)
    );
    Ok(())
}

pub fn delete_flashcard(owner: &UserId, id: i64, conn: &Connection) -> Result<()> {
    let changed = conn.execute(
        "DELETE FROM flashcards WHERE id = ?1 AND owner_id = ?2",
        params![id, owner.as_str()],
    )?;
    if changed == 0 {
        return Err(Error::NotFound);
    }
    log::debug!("Deleted flashcard {id} of {owner}");
    Ok(())
}

fn duplicate_or(err: rusqlite::Error, what: &str) -> Error {
    match err.sqlite_error_code() {
        Some(ErrorCode::ConstraintViolation) => Error::Duplicate(what.to_string()),
        _ => Error::Database(err),
    }
}

pub(crate) fn conversion_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}

pub(crate) fn language_at(row: &Row, idx: usize) -> rusqlite::Result<Language> {
    let code: String = row.get(idx)?;
    Language::from_iso_639_1(&code)
        .ok_or_else(|| conversion_error(idx, format!("unknown language '{code}'")))
}

pub(crate) fn timestamp_at(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    from_iso(&text).map_err(|e| conversion_error(idx, e.to_string()))
}

fn card_from_row(row: &Row) -> rusqlite::Result<Flashcard> {
    Ok(Flashcard {
        id: row.get(0)?,
        owner_id: UserId::from(row.get::<_, String>(1)?),
        original_word: row.get(2)?,
        translation: row.get(3)?,
        source_language: language_at(row, 4)?,
        target_language: language_at(row, 5)?,
        image_url: row.get(6)?,
        notes: row.get(7)?,
        created_at: timestamp_at(row, 8)?,
        review: ReviewState {
            easiness: row.get(9)?,
            interval: row.get(10)?,
            review_count: row.get(11)?,
            knowledge_level: row.get(12)?,
            next_review: timestamp_at(row, 13)?,
        },
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::sm2::compute_next_review_state;
    use crate::models::{Quality, User};
    use chrono::{Duration, TimeZone};

    pub(crate) fn test_conn_with_user(id: &str) -> (Connection, UserId) {
        let conn = open_in_memory().unwrap();
        let user = User {
            id: UserId::from(id),
            email: format!("{id}@example.com"),
            display_name: id.to_string(),
            created_at: Utc::now(),
        };
        crate::database::users::insert_user(&user, "hash", &conn).unwrap();
        (conn, user.id)
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap()
    }

    fn hello() -> NewFlashcard {
        NewFlashcard::new("hello", "cześć", Language::English, Language::Polish)
    }

    #[test]
    fn test_add_and_get_flashcard() {
        let (conn, owner) = test_conn_with_user("alice");
        let card = add_flashcard(&owner, &hello(), now(), &conn).unwrap();

        assert_eq!(card.original_word, "hello");
        assert_eq!(card.review, ReviewState::new(now()));
        assert_eq!(get_flashcard(&owner, card.id, &conn).unwrap(), card);
    }

    #[test]
    fn test_duplicate_rejected() {
        let (conn, owner) = test_conn_with_user("alice");
        add_flashcard(&owner, &hello(), now(), &conn).unwrap();

        let result = add_flashcard(&owner, &hello(), now(), &conn);
        assert!(matches!(result, Err(Error::Duplicate(_))));
    }

    #[test]
    fn test_owner_isolation() {
        let (conn, alice) = test_conn_with_user("alice");
        let bob = User {
            id: UserId::from("bob"),
            email: "bob@example.com".to_string(),
            display_name: "Bob".to_string(),
            created_at: now(),
        };
        crate::database::users::insert_user(&bob, "hash", &conn).unwrap();

        let card = add_flashcard(&alice, &hello(), now(), &conn).unwrap();
        assert!(matches!(
            get_flashcard(&bob.id, card.id, &conn),
            Err(Error::NotFound)
        ));
        assert!(matches!(
            delete_flashcard(&bob.id, card.id, &conn),
            Err(Error::NotFound)
        ));
        assert!(list_flashcards(&bob.id, &conn).unwrap().is_empty());
        assert_eq!(list_flashcards(&alice, &conn).unwrap().len(), 1);
    }

    #[test]
    fn test_review_state_persisted_verbatim() {
        let (conn, owner) = test_conn_with_user("alice");
        let card = add_flashcard(&owner, &hello(), now(), &conn).unwrap();

        let next = compute_next_review_state(&card.review, Quality::try_from(5).unwrap(), now());
        update_review_state(&owner, card.id, &next, &conn).unwrap();

        let stored = get_flashcard(&owner, card.id, &conn).unwrap();
        assert_eq!(stored.review, next);
        assert_eq!(to_iso(&stored.review.next_review), "2025-01-02T10:00:00Z");
    }

    #[test]
    fn test_due_flashcards_ordered_and_limited() {
        let (conn, owner) = test_conn_with_user("alice");
        let a = add_flashcard(&owner, &hello(), now(), &conn).unwrap();
        let b = add_flashcard(
            &owner,
            &NewFlashcard::new("dog", "pies", Language::English, Language::Polish),
            now() - Duration::hours(1),
            &conn,
        )
        .unwrap();
        let c = add_flashcard(
            &owner,
            &NewFlashcard::new("cat", "kot", Language::English, Language::Polish),
            now(),
            &conn,
        )
        .unwrap();
        let later = compute_next_review_state(&c.review, Quality::try_from(4).unwrap(), now());
        update_review_state(&owner, c.id, &later, &conn).unwrap();

        let due = due_flashcards(&owner, now(), 10, &conn).unwrap();
        let ids: Vec<i64> = due.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![b.id, a.id]);

        assert_eq!(due_flashcards(&owner, now(), 1, &conn).unwrap().len(), 1);
        assert_eq!(
            due_flashcards(&owner, now() + Duration::days(1), 10, &conn)
                .unwrap()
                .len(),
            3
        );
    }

    #[test]
    fn test_update_content_keeps_review() {
        let (conn, owner) = test_conn_with_user("alice");
        let card = add_flashcard(&owner, &hello(), now(), &conn).unwrap();
        let next = compute_next_review_state(&card.review, Quality::try_from(3).unwrap(), now());
        update_review_state(&owner, card.id, &next, &conn).unwrap();

        let mut edit = hello();
        edit.translation = "witaj".to_string();
        edit.notes = Some("greeting".to_string());
        let updated = update_flashcard_content(&owner, card.id, &edit, &conn).unwrap();

        assert_eq!(updated.translation, "witaj");
        assert_eq!(updated.notes.as_deref(), Some("greeting"));
        assert_eq!(updated.review, next);
    }

    #[test]
    fn test_delete_flashcard() {
        let (conn, owner) = test_conn_with_user("alice");
        let card = add_flashcard(&owner, &hello(), now(), &conn).unwrap();

        delete_flashcard(&owner, card.id, &conn).unwrap();
        assert!(list_flashcards(&owner, &conn).unwrap().is_empty());
        assert!(matches!(
            update_review_state(&owner, card.id, &card.review, &conn),
            Err(Error::NotFound)
        ));
    }

    #[test]
    fn test_open_database_on_disk_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cards.sqlite3");
        drop(open_database(&path).unwrap());
        let conn = open_database(&path).unwrap();
        let version: i32 = conn
            .pragma_query_value(None, "user_version", |r| r.get(0))
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }
}
