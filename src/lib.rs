pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod export;
pub mod i18n;
pub mod models;
pub mod services;

pub use error::{Error, Result};
pub use models::{Flashcard, Quality, ReviewState, Session, StudySession};
pub use models::sm2::compute_next_review_state;
