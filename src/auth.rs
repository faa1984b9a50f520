//! Account registration and sign-in.
//!
//! The rest of the application only sees the [`IdentityProvider`] trait; the
//! local implementation keeps Argon2id password hashes next to the flashcards.

use crate::database::{SharedConnection, lock, users};
use crate::error::{Error, Result};
use crate::models::{Session, User, UserId};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use chrono::Utc;
use crossbeam_channel::{Receiver, Sender, unbounded};
use thiserror::Error;

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid email address")]
    InvalidEmail,

    #[error("password must have at least {MIN_PASSWORD_LEN} characters")]
    WeakPassword,

    #[error("an account with this email already exists")]
    EmailTaken,

    #[error("wrong email or password")]
    InvalidCredentials,

    #[error("password hashing failed: {0}")]
    Hashing(String),
}

/// Notification sent to every subscriber when the signed-in user changes.
#[derive(Clone, Debug, PartialEq)]
pub enum AuthEvent {
    SignedIn(User),
    SignedOut,
}

pub trait IdentityProvider {
    fn register(&mut self, email: &str, password: &str, display_name: &str) -> Result<User>;

    fn login(&mut self, email: &str, password: &str) -> Result<User>;

    fn logout(&mut self);

    fn current_user(&self) -> Option<&User>;

    fn subscribe(&mut self) -> Receiver<AuthEvent>;
}

/// Identity provider backed by the application database.
pub struct LocalIdentityProvider {
    conn: SharedConnection,
    hasher: Argon2<'static>,
    current: Option<User>,
    subscribers: Vec<Sender<AuthEvent>>,
}

impl LocalIdentityProvider {
    pub fn new(conn: SharedConnection) -> Self {
        Self {
            conn,
            hasher: Argon2::default(),
            current: None,
            subscribers: Vec::new(),
        }
    }

    fn notify(&mut self, event: AuthEvent) {
        // Receivers that were dropped are forgotten.
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn sign_in(&mut self, user: User) -> User {
        log::info!("User {} signed in", user.id);
        self.current = Some(user.clone());
        self.notify(AuthEvent::SignedIn(user.clone()));
        user
    }

    fn hash_password(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut rand::thread_rng());
        let hash = self
            .hasher
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::Hashing(e.to_string()))?;
        Ok(hash.to_string())
    }
}

impl IdentityProvider for LocalIdentityProvider {
    fn register(&mut self, email: &str, password: &str, display_name: &str) -> Result<User> {
        let email = normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword.into());
        }
        let display_name = match display_name.trim() {
            "" => email.split('@').next().unwrap_or_default().to_string(),
            name => name.to_string(),
        };

        let user = User {
            id: UserId::generate(),
            email,
            display_name,
            created_at: Utc::now(),
        };
        let hash = self.hash_password(password)?;
        {
            let conn = lock(&self.conn)?;
            users::insert_user(&user, &hash, &conn).map_err(|e| match e {
                Error::Duplicate(_) => Error::Auth(AuthError::EmailTaken),
                other => other,
            })?;
        }
        log::info!("Registered user {}", user.id);
        Ok(self.sign_in(user))
    }

    fn login(&mut self, email: &str, password: &str) -> Result<User> {
        let email = normalize_email(email).map_err(|_| AuthError::InvalidCredentials)?;
        let found = {
            let conn = lock(&self.conn)?;
            users::find_user_by_email(&email, &conn)?
        };
        let Some((user, stored_hash)) = found else {
            log::warn!("Sign-in attempt for unknown account");
            return Err(AuthError::InvalidCredentials.into());
        };

        let parsed =
            PasswordHash::new(&stored_hash).map_err(|e| AuthError::Hashing(e.to_string()))?;
        self.hasher
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| AuthError::InvalidCredentials)?;

        Ok(self.sign_in(user))
    }

    fn logout(&mut self) {
        if let Some(user) = self.current.take() {
            log::info!("User {} signed out", user.id);
            self.notify(AuthEvent::SignedOut);
        }
    }

    fn current_user(&self) -> Option<&User> {
        self.current.as_ref()
    }

    fn subscribe(&mut self) -> Receiver<AuthEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }
}

/// Builds the session for a freshly signed-in user.
pub fn open_session(user: User, conn: &SharedConnection) -> Result<Session> {
    let profile = {
        let conn = lock(conn)?;
        users::load_profile(&user.id, &conn)?
    };
    Ok(Session::new(user, profile.unwrap_or_default()))
}

fn normalize_email(email: &str) -> std::result::Result<String, AuthError> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(AuthError::InvalidEmail),
    }
}
