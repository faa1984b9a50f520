//! Review metadata persisted with every flashcard.
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_EASINESS: f64 = 2.5;
pub const MIN_EASINESS: f64 = 1.3;

/// Knowledge level of a card nobody has reviewed yet.
pub const NEW_CARD_LEVEL: u8 = 1;
pub const MAX_KNOWLEDGE_LEVEL: u8 = 5;

/// Longest interval the scheduler hands out, roughly a century.
pub const MAX_INTERVAL_DAYS: u32 = 36_500;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewState {
    pub easiness: f64,
    pub interval: u32,
    pub review_count: u32,
    pub knowledge_level: u8,
    #[serde(with = "iso_timestamp")]
    pub next_review: DateTime<Utc>,
}

impl ReviewState {
    /// State of a freshly authored card: due right away.
    pub fn new(created_at: DateTime<Utc>) -> Self {
        Self {
            easiness: DEFAULT_EASINESS,
            interval: 0,
            review_count: 0,
            knowledge_level: NEW_CARD_LEVEL,
            next_review: created_at,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review <= now
    }

    /// A card counts as new until its first review has been recorded.
    pub fn is_new(&self) -> bool {
        self.interval == 0 && self.review_count == 0 && self.knowledge_level == NEW_CARD_LEVEL
    }

    /// Checks values coming from outside the scheduler (imports, old rows).
    pub fn is_valid(&self) -> bool {
        self.easiness.is_finite()
            && self.easiness >= MIN_EASINESS
            && (NEW_CARD_LEVEL..=MAX_KNOWLEDGE_LEVEL).contains(&self.knowledge_level)
            && self.interval <= MAX_INTERVAL_DAYS
    }
}

/// Formats a timestamp the way review dates are stored: `2025-01-02T10:00:00Z`.
pub fn to_iso(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn from_iso(text: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(text).map(|dt| dt.with_timezone(&Utc))
}

mod iso_timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::to_iso(time))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let text = String::deserialize(d)?;
        super::from_iso(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_new_state_defaults() {
        let created = Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap();
        let state = ReviewState::new(created);

        assert_eq!(state.easiness, 2.5);
        assert_eq!(state.interval, 0);
        assert_eq!(state.review_count, 0);
        assert_eq!(state.knowledge_level, 1);
        assert!(state.is_new());
        assert!(state.is_due(created));
    }

    #[test]
    fn test_serialized_field_names() {
        let created = Utc.with_ymd_and_hms(2025, 1, 2, 10, 0, 0).unwrap();
        let json = serde_json::to_value(ReviewState::new(created)).unwrap();

        assert_eq!(json["easiness"], 2.5);
        assert_eq!(json["interval"], 0);
        assert_eq!(json["reviewCount"], 0);
        assert_eq!(json["knowledgeLevel"], 1);
        assert_eq!(json["nextReview"], "2025-01-02T10:00:00Z");
    }

    #[test]
    fn test_invalid_state_detected() {
        let mut state = ReviewState::new(Utc::now());
        state.easiness = 1.1;
        assert!(!state.is_valid());

        state.easiness = 2.0;
        state.knowledge_level = 9;
        assert!(!state.is_valid());

        state.knowledge_level = 3;
        state.interval = MAX_INTERVAL_DAYS;
        assert!(state.is_valid());
        state.interval = MAX_INTERVAL_DAYS + 1;
        assert!(!state.is_valid());
    }
}
