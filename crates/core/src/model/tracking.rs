use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-question history supplied by the caller and updated by the engine.
///
/// Created on the first graded attempt and updated on every graded attempt
/// after that; skipped and timed-out questions never touch it. Deleting
/// entries is the caller's concern, the engine never removes one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingEntry {
    pub seen_count: u32,
    pub correct_count: u32,
    #[serde(rename = "lastSeenTimestamp")]
    pub last_seen: DateTime<Utc>,
}

impl TrackingEntry {
    /// Entry for a question's first graded attempt.
    #[must_use]
    pub fn first_attempt(correct: bool, now: DateTime<Utc>) -> Self {
        Self {
            seen_count: 1,
            correct_count: u32::from(correct),
            last_seen: now,
        }
    }

    /// Fold one more graded attempt into the entry.
    pub fn record_attempt(&mut self, correct: bool, now: DateTime<Utc>) {
        self.seen_count = self.seen_count.saturating_add(1);
        if correct {
            self.correct_count = self.correct_count.saturating_add(1);
        }
        self.last_seen = now;
    }

    /// Fraction of graded attempts answered correctly; 0 when never seen.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        if self.seen_count == 0 {
            return 0.0;
        }
        f64::from(self.correct_count) / f64::from(self.seen_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn first_attempt_counts_one_seen() {
        let entry = TrackingEntry::first_attempt(true, fixed_now());
        assert_eq!(entry.seen_count, 1);
        assert_eq!(entry.correct_count, 1);
        assert_eq!(entry.last_seen, fixed_now());
    }

    #[test]
    fn record_attempt_accumulates() {
        let mut entry = TrackingEntry::first_attempt(false, fixed_now());
        entry.record_attempt(true, fixed_now());
        entry.record_attempt(true, fixed_now());
        assert_eq!(entry.seen_count, 3);
        assert_eq!(entry.correct_count, 2);
        assert!((entry.accuracy() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn wire_format_uses_legacy_field_names() {
        let entry = TrackingEntry::first_attempt(true, fixed_now());
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("seenCount").is_some());
        assert!(json.get("correctCount").is_some());
        assert!(json.get("lastSeenTimestamp").is_some());
    }
}
