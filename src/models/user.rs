//! User accounts and the profile collected during onboarding.
use super::Language;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque account identifier; every flashcard is partitioned by it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Proficiency {
    #[default]
    Beginner,
    Elementary,
    Intermediate,
    UpperIntermediate,
    Advanced,
}

impl Proficiency {
    pub const ALL: [Proficiency; 5] = [
        Proficiency::Beginner,
        Proficiency::Elementary,
        Proficiency::Intermediate,
        Proficiency::UpperIntermediate,
        Proficiency::Advanced,
    ];

    /// CEFR band shown next to the level name.
    pub fn cefr(self) -> &'static str {
        match self {
            Proficiency::Beginner => "A1",
            Proficiency::Elementary => "A2",
            Proficiency::Intermediate => "B1",
            Proficiency::UpperIntermediate => "B2",
            Proficiency::Advanced => "C1",
        }
    }

    pub fn label_key(self) -> &'static str {
        match self {
            Proficiency::Beginner => "level.beginner",
            Proficiency::Elementary => "level.elementary",
            Proficiency::Intermediate => "level.intermediate",
            Proficiency::UpperIntermediate => "level.upper_intermediate",
            Proficiency::Advanced => "level.advanced",
        }
    }
}

pub const DEFAULT_DAILY_GOAL: u32 = 20;
pub const MAX_DAILY_GOAL: u32 = 200;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub native_language: Language,
    pub learning_language: Language,
    pub proficiency: Proficiency,
    pub daily_goal: u32,
    pub interface_language: Language,
    pub onboarding_completed: bool,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            native_language: Language::Polish,
            learning_language: Language::English,
            proficiency: Proficiency::default(),
            daily_goal: DEFAULT_DAILY_GOAL,
            interface_language: Language::English,
            onboarding_completed: false,
        }
    }
}

impl UserProfile {
    pub fn validate(&self) -> Result<()> {
        if self.native_language == self.learning_language {
            return Err(Error::Validation(
                "native and learning language must differ".into(),
            ));
        }
        if !(1..=MAX_DAILY_GOAL).contains(&self.daily_goal) {
            return Err(Error::Validation(format!(
                "daily goal must be between 1 and {MAX_DAILY_GOAL}"
            )));
        }
        Ok(())
    }
}

/// Steps of the onboarding flow, in order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OnboardingStep {
    #[default]
    Languages,
    Level,
    DailyGoal,
    Done,
}

/// Collects a profile step by step before it is saved.
#[derive(Clone, Debug, Default)]
pub struct Onboarding {
    pub step: OnboardingStep,
    pub draft: UserProfile,
}

impl Onboarding {
    /// Validates the current step and moves to the next one.
    pub fn advance(&mut self) -> Result<OnboardingStep> {
        self.step = match self.step {
            OnboardingStep::Languages => {
                if self.draft.native_language == self.draft.learning_language {
                    return Err(Error::Validation(
                        "native and learning language must differ".into(),
                    ));
                }
                OnboardingStep::Level
            }
            OnboardingStep::Level => OnboardingStep::DailyGoal,
            OnboardingStep::DailyGoal => {
                self.draft.validate()?;
                OnboardingStep::Done
            }
            OnboardingStep::Done => OnboardingStep::Done,
        };
        Ok(self.step)
    }

    pub fn back(&mut self) {
        self.step = match self.step {
            OnboardingStep::Languages | OnboardingStep::Level => OnboardingStep::Languages,
            OnboardingStep::DailyGoal => OnboardingStep::Level,
            OnboardingStep::Done => OnboardingStep::DailyGoal,
        };
    }

    /// Returns the completed profile once every step passed.
    pub fn finish(&self) -> Option<UserProfile> {
        (self.step == OnboardingStep::Done).then(|| UserProfile {
            onboarding_completed: true,
            ..self.draft.clone()
        })
    }
}
