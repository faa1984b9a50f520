//! Persistence for accounts and onboarding profiles.
use super::db::{conversion_error, language_at, timestamp_at};
use crate::error::{Error, Result};
use crate::models::review_state::to_iso;
use crate::models::{Proficiency, User, UserId, UserProfile};
use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, params};

/// Stores a new account together with its password hash.
pub fn insert_user(user: &User, password_hash: &str, conn: &Connection) -> Result<()> {
    conn.execute(
        "INSERT INTO users (id, email, display_name, password_hash, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            user.id.as_str(),
            user.email,
            user.display_name,
            password_hash,
            to_iso(&user.created_at),
        ],
    )
    .map_err(|e| match e.sqlite_error_code() {
        Some(ErrorCode::ConstraintViolation) => Error::Duplicate(user.email.clone()),
        _ => Error::Database(e),
    })?;
    Ok(())
}

/// Looks up an account by email, returning it with its password hash.
pub fn find_user_by_email(email: &str, conn: &Connection) -> Result<Option<(User, String)>> {
    let found = conn
        .query_row(
            "SELECT id, email, display_name, created_at, password_hash FROM users WHERE email = ?1",
            params![email],
            |row| Ok((user_from_row(row)?, row.get::<_, String>(4)?)),
        )
        .optional()?;
    Ok(found)
}

/// Returns the stored profile, or `None` before onboarding saved one.
pub fn load_profile(user: &UserId, conn: &Connection) -> Result<Option<UserProfile>> {
    let profile = conn
        .query_row(
            "SELECT native_language, learning_language, proficiency, daily_goal,
                    interface_language, onboarding_completed
             FROM profiles WHERE user_id = ?1",
            params![user.as_str()],
            |row| {
                Ok(UserProfile {
                    native_language: language_at(row, 0)?,
                    learning_language: language_at(row, 1)?,
                    proficiency: proficiency_at(row, 2)?,
                    daily_goal: row.get(3)?,
                    interface_language: language_at(row, 4)?,
                    onboarding_completed: row.get(5)?,
                })
            },
        )
        .optional()?;
    Ok(profile)
}

pub fn save_profile(user: &UserId, profile: &UserProfile, conn: &Connection) -> Result<()> {
    profile.validate()?;
    conn.execute(
        "INSERT INTO profiles (user_id, native_language, learning_language, proficiency, daily_goal,
                               interface_language, onboarding_completed)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(user_id) DO UPDATE SET
             native_language = excluded.native_language,
             learning_language = excluded.learning_language,
             proficiency = excluded.proficiency,
             daily_goal = excluded.daily_goal,
             interface_language = excluded.interface_language,
             onboarding_completed = excluded.onboarding_completed",
        params![
            user.as_str(),
            profile.native_language.iso_639_1(),
            profile.learning_language.iso_639_1(),
            proficiency_code(profile.proficiency),
            profile.daily_goal,
            profile.interface_language.iso_639_1(),
            profile.onboarding_completed,
        ],
    )?;
    log::debug!("Saved profile for {user}");
    Ok(())
}

fn user_from_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: UserId::from(row.get::<_, String>(0)?),
        email: row.get(1)?,
        display_name: row.get(2)?,
        created_at: timestamp_at(row, 3)?,
    })
}

fn proficiency_code(level: Proficiency) -> &'static str {
    match level {
        Proficiency::Beginner => "beginner",
        Proficiency::Elementary => "elementary",
        Proficiency::Intermediate => "intermediate",
        Proficiency::UpperIntermediate => "upper_intermediate",
        Proficiency::Advanced => "advanced",
    }
}

fn proficiency_at(row: &Row, idx: usize) -> rusqlite::Result<Proficiency> {
    let code: String = row.get(idx)?;
    Proficiency::ALL
        .into_iter()
        .find(|level| proficiency_code(*level) == code)
        .ok_or_else(|| conversion_error(idx, format!("unknown proficiency '{code}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::db::open_in_memory;
    use crate::models::Language;
    use chrono::Utc;

    fn user(id: &str, email: &str) -> User {
        User {
            id: UserId::from(id),
            email: email.to_string(),
            display_name: "Ola".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_insert_and_find_user() {
        let conn = open_in_memory().unwrap();
        let ola = user("u1", "ola@example.com");
        insert_user(&ola, "argon-hash", &conn).unwrap();

        let (found, hash) = find_user_by_email("ola@example.com", &conn)
            .unwrap()
            .unwrap();
        assert_eq!(found.id, ola.id);
        assert_eq!(hash, "argon-hash");
        assert_eq!(found.email, "ola@example.com");
        assert!(find_user_by_email("nobody@example.com", &conn).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_email() {
        let conn = open_in_memory().unwrap();
        insert_user(&user("u1", "ola@example.com"), "h", &conn).unwrap();
        let result = insert_user(&user("u2", "ola@example.com"), "h", &conn);
        assert!(matches!(result, Err(Error::Duplicate(_))));
    }

    #[test]
    fn test_profile_upsert() {
        let conn = open_in_memory().unwrap();
        let ola = user("u1", "ola@example.com");
        insert_user(&ola, "h", &conn).unwrap();
        assert!(load_profile(&ola.id, &conn).unwrap().is_none());

        let mut profile = UserProfile {
            learning_language: Language::Spanish,
            proficiency: Proficiency::UpperIntermediate,
            ..UserProfile::default()
        };
        save_profile(&ola.id, &profile, &conn).unwrap();
        assert_eq!(load_profile(&ola.id, &conn).unwrap(), Some(profile.clone()));

        profile.daily_goal = 50;
        profile.onboarding_completed = true;
        save_profile(&ola.id, &profile, &conn).unwrap();
        assert_eq!(load_profile(&ola.id, &conn).unwrap(), Some(profile));
    }

    #[test]
    fn test_invalid_profile_not_saved() {
        let conn = open_in_memory().unwrap();
        let ola = user("u1", "ola@example.com");
        insert_user(&ola, "h", &conn).unwrap();

        let profile = UserProfile {
            native_language: Language::English,
            learning_language: Language::English,
            ..UserProfile::default()
        };
        assert!(save_profile(&ola.id, &profile, &conn).is_err());
    }
}
