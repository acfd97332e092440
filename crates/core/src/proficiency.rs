//! Recency-decayed mastery model.
//!
//! A tracking entry's raw accuracy is blended toward the neutral midpoint
//! as time since the last attempt grows, so a correct answer from months
//! ago carries less signal than one from yesterday. The resulting score
//! drives the sampling weight fed back into session composition.

use chrono::{DateTime, Utc};

use crate::model::TrackingEntry;

/// Proficiency assigned when nothing is known about a question.
pub const NEUTRAL_PROFICIENCY: f64 = 0.5;

/// Sampling weight for a never-attempted question: favored over a mastered
/// one (weight 1) but not as much as a struggling one (weight 2).
pub const UNSEEN_WEIGHT: f64 = 1.5;

/// Exponential decay rate of recency confidence, per day since last seen.
const DECAY_RATE_PER_DAY: f64 = 0.1;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Recency-decayed mastery score in [0, 1] for a single question.
///
/// Absent or never-seen entries score the neutral 0.5. Otherwise the raw
/// accuracy is weighted by `e^(-0.1 x days_since_last_seen)` and blended
/// with the neutral midpoint. Days are clamped to be non-negative, so a
/// `last_seen` in the future behaves like "seen just now" rather than
/// producing negative confidence.
#[must_use]
pub fn proficiency(entry: Option<&TrackingEntry>, now: DateTime<Utc>) -> f64 {
    let Some(entry) = entry else {
        return NEUTRAL_PROFICIENCY;
    };
    if entry.seen_count == 0 {
        return NEUTRAL_PROFICIENCY;
    }

    let elapsed = now.signed_duration_since(entry.last_seen);
    #[allow(clippy::cast_precision_loss)]
    let days = (elapsed.num_seconds() as f64 / SECONDS_PER_DAY).max(0.0);
    let confidence = (-DECAY_RATE_PER_DAY * days).exp();

    let score = entry.accuracy() * confidence + NEUTRAL_PROFICIENCY * (1.0 - confidence);
    score.clamp(0.0, 1.0)
}

/// Maps a proficiency score to a sampling weight in [1, 2]: the weaker the
/// proficiency, the heavier the weight.
#[must_use]
pub fn weight_from_proficiency(proficiency: f64) -> f64 {
    (2.0 - proficiency).clamp(1.0, 2.0)
}

/// Sampling weight for a question given its (optional) tracking entry.
///
/// Never-attempted questions receive the fixed [`UNSEEN_WEIGHT`] instead
/// of the neutral-proficiency weight.
#[must_use]
pub fn sampling_weight(entry: Option<&TrackingEntry>, now: DateTime<Utc>) -> f64 {
    match entry {
        Some(tracked) if tracked.seen_count > 0 => {
            weight_from_proficiency(proficiency(entry, now))
        }
        _ => UNSEEN_WEIGHT,
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
