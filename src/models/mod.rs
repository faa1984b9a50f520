pub mod flashcard;
pub mod language;
pub mod learning_card;
pub mod learning_session;
pub mod review_state;
pub mod session;
pub mod sm2;
pub mod stats;
pub mod user;

pub use flashcard::{Flashcard, KnowledgeFilter, NewFlashcard};
pub use language::Language;
pub use learning_card::LearningCard;
pub use learning_session::StudySession;
pub use review_state::ReviewState;
pub use session::Session;
pub use sm2::Quality;
pub use stats::Stats;
pub use user::{Onboarding, OnboardingStep, Proficiency, User, UserId, UserProfile};
