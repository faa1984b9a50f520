//! SM-2 (SuperMemo 2) spaced repetition algorithm implementation.
//!
//! The SM-2 algorithm calculates review intervals based on recall quality:
//! - Each card has an easiness factor (EF) that adjusts based on performance
//! - Quality grades 0-2: Reset interval to one day and repetitions to zero
//! - Quality grades 3-5: Increase interval progressively (1 day → 6 days → EF multiplier)
//! - EF is adjusted after each review and has a minimum value of 1.3
//! - Intervals never exceed `MAX_INTERVAL_DAYS`
//! - The knowledge level shown on a card comes from a fixed quality lookup

use super::review_state::{MAX_INTERVAL_DAYS, MIN_EASINESS, ReviewState};
use crate::error::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use std::fmt;

/// Recall quality reported after a review, 0 (blackout) to 5 (perfect).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Quality(u8);

impl Quality {
    pub const MAX: u8 = 5;

    pub fn value(self) -> u8 {
        self.0
    }

    /// Grades 3 and up keep the repetition streak going.
    pub fn is_success(self) -> bool {
        self.0 >= 3
    }

    pub fn all() -> impl Iterator<Item = Quality> {
        (0..=Self::MAX).map(Quality)
    }
}

impl TryFrom<u8> for Quality {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        if value > Self::MAX {
            return Err(Error::InvalidQuality(value));
        }
        Ok(Quality(value))
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Display tier for a graded card. Independent of the interval branch:
/// a grade of 3 resets nothing but still shows as "learning".
pub fn knowledge_level_for(quality: Quality) -> u8 {
    match quality.value() {
        0..=3 => 2,
        _ => 3,
    }
}

/// Calculates the review state after one graded review.
///
/// `now` is the review instant; the function never reads the clock.
pub fn compute_next_review_state(
    previous: &ReviewState,
    quality: Quality,
    now: DateTime<Utc>,
) -> ReviewState {
    let q = quality.value() as f64;
    let new_easiness =
        (previous.easiness + (0.1 - (5.0 - q) * (0.08 + (5.0 - q) * 0.02))).max(MIN_EASINESS);

    let (interval, review_count) = if quality.is_success() {
        let review_count = previous.review_count.saturating_add(1);
        let interval = match review_count {
            1 => 1,
            2 => 6,
            _ => (previous.interval as f64 * new_easiness)
                .round()
                .min(MAX_INTERVAL_DAYS as f64) as u32,
        };
        (interval, review_count)
    } else {
        (1, 0)
    };

    ReviewState {
        easiness: new_easiness,
        interval,
        review_count,
        knowledge_level: knowledge_level_for(quality),
        next_review: now + Duration::days(interval as i64),
    }
}

/// Interval in days each grade would give, indexed by quality.
pub fn preview_intervals(state: &ReviewState, now: DateTime<Utc>) -> [u32; 6] {
    let mut intervals = [0; 6];
    for quality in Quality::all() {
        intervals[quality.value() as usize] = compute_next_review_state(state, quality, now).interval;
    }
    intervals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::review_state::to_iso;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap()
    }

    fn state(easiness: f64, interval: u32, review_count: u32) -> ReviewState {
        ReviewState {
            easiness,
            interval,
            review_count,
            knowledge_level: 1,
            next_review: now(),
        }
    }

    fn q(value: u8) -> Quality {
        Quality::try_from(value).unwrap()
    }

    #[test]
    fn test_first_review() {
        let next = compute_next_review_state(&state(2.5, 1, 0), q(5), now());
        assert_eq!(next.review_count, 1);
        assert!((next.easiness - 2.6).abs() < 1e-9);
        assert_eq!(next.interval, 1);
        assert_eq!(to_iso(&next.next_review), "2025-01-02T10:00:00Z");
    }

    #[test]
    fn test_second_review() {
        let next = compute_next_review_state(&state(2.6, 1, 1), q(5), now());
        assert_eq!(next.review_count, 2);
        assert!((next.easiness - 2.7).abs() < 1e-9);
        assert_eq!(next.interval, 6);
        assert_eq!(to_iso(&next.next_review), "2025-01-07T10:00:00Z");
    }

    #[test]
    fn test_third_review_multiplies_by_new_easiness() {
        let next = compute_next_review_state(&state(2.5, 6, 2), q(4), now());
        assert_eq!(next.review_count, 3);
        // q = 4 leaves EF unchanged: 6 * 2.5 = 15
        assert_eq!(next.interval, 15);

        let next = compute_next_review_state(&state(2.5, 6, 2), q(5), now());
        // 6 * 2.6 = 15.6
        assert_eq!(next.interval, 16);
    }

    #[test]
    fn test_quality_below_3_resets() {
        let next = compute_next_review_state(&state(2.5, 20, 5), q(0), now());
        assert_eq!(next.review_count, 0);
        assert_eq!(next.interval, 1);
        assert!((next.easiness - 1.7).abs() < 1e-9);
        assert_eq!(to_iso(&next.next_review), "2025-01-02T10:00:00Z");

        for value in 0..3 {
            let next = compute_next_review_state(&state(2.1, 40, 7), q(value), now());
            assert_eq!(next.review_count, 0);
            assert_eq!(next.interval, 1);
        }
    }

    #[test]
    fn test_ef_floor() {
        let next = compute_next_review_state(&state(1.3, 20, 5), q(0), now());
        assert_eq!(next.easiness, 1.3);

        let mut current = state(2.5, 10, 5);
        for _ in 0..20 {
            for value in 0..=5 {
                let next = compute_next_review_state(&current, q(value), now());
                assert!(next.easiness >= MIN_EASINESS);
            }
            current = compute_next_review_state(&current, q(1), now());
        }
        assert_eq!(current.easiness, MIN_EASINESS);
    }

    #[test]
    fn test_no_easiness_ceiling() {
        let mut current = state(2.5, 0, 0);
        for _ in 0..10 {
            current = compute_next_review_state(&current, q(5), now());
        }
        assert!((current.easiness - 3.5).abs() < 1e-9);
    }

    #[test]
    fn test_intervals_grow_across_successes() {
        let mut current = state(2.5, 0, 0);
        let mut last = 0;
        for _ in 0..6 {
            current = compute_next_review_state(&current, q(3), now());
            assert!(current.interval >= last);
            last = current.interval;
        }
        assert!(last > 6);
    }

    #[test]
    fn test_knowledge_level_lookup() {
        let levels: Vec<u8> = Quality::all().map(knowledge_level_for).collect();
        assert_eq!(levels, vec![2, 2, 2, 2, 3, 3]);

        // Same level for quality 3 on first and later reviews
        let first = compute_next_review_state(&state(2.5, 0, 0), q(3), now());
        let later = compute_next_review_state(&state(2.5, 6, 2), q(3), now());
        assert_eq!(first.knowledge_level, later.knowledge_level);
    }

    #[test]
    fn test_out_of_range_quality_rejected() {
        assert!(matches!(Quality::try_from(6), Err(Error::InvalidQuality(6))));
        assert!(Quality::try_from(5).is_ok());
    }

    #[test]
    fn test_huge_interval_is_capped() {
        let next = compute_next_review_state(&state(2.5, 200_000_000, 5), q(5), now());
        assert_eq!(next.interval, MAX_INTERVAL_DAYS);
        assert_eq!(next.next_review, now() + Duration::days(MAX_INTERVAL_DAYS as i64));

        let preview = preview_intervals(&state(2.5, u32::MAX, 4), now());
        assert_eq!(preview[4], MAX_INTERVAL_DAYS);
        assert_eq!(preview[0], 1);
    }

    #[test]
    fn test_review_count_saturates() {
        let next = compute_next_review_state(&state(2.5, 10, u32::MAX), q(5), now());
        assert_eq!(next.review_count, u32::MAX);
        assert_eq!(next.interval, 26);
    }

    #[test]
    fn test_preview_intervals() {
        let preview = preview_intervals(&state(2.5, 6, 2), now());
        assert_eq!(preview[0], 1);
        assert_eq!(preview[2], 1);
        assert_eq!(preview[4], 15);
    }
}
