//! The signed-in user and their profile, handed to whatever needs them.
use super::{User, UserId, UserProfile};

#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    pub user: User,
    pub profile: UserProfile,
}

impl Session {
    pub fn new(user: User, profile: UserProfile) -> Self {
        Self { user, profile }
    }

    pub fn user_id(&self) -> &UserId {
        &self.user.id
    }

    pub fn needs_onboarding(&self) -> bool {
        !self.profile.onboarding_completed
    }
}
