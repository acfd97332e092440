use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::ids::QuestionId;

/// Free-form provenance block attached to a session at load time
/// (chapter/unit labels and similar).
pub type SessionContext = BTreeMap<String, Value>;

//
// ─── SCORE & BREAKDOWNS ────────────────────────────────────────────────────────
//

/// Aggregate score for one session.
///
/// `total` counts graded answers only; skipped and timed-out questions are
/// tallied separately. Older exports may omit the `skipped`/`timedOut`
/// fields, which deserialize as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBlock {
    pub correct: u32,
    pub total: u32,
    pub percentage: u32,
    #[serde(default)]
    pub skipped: u32,
    #[serde(default)]
    pub timed_out: u32,
}

/// Correct/total tally for one breakdown bucket (a question type or a tag).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakdownEntry {
    pub correct: u32,
    pub total: u32,
    pub percentage: u32,
}

impl BreakdownEntry {
    /// Add one graded answer to the bucket and refresh the percentage.
    pub fn record(&mut self, correct: bool) {
        self.total += 1;
        if correct {
            self.correct += 1;
        }
        self.percentage = percent(self.correct, self.total);
    }

    /// Merge another bucket into this one, recomputing the percentage.
    pub fn merge(&mut self, other: &BreakdownEntry) {
        self.correct += other.correct;
        self.total += other.total;
        self.percentage = percent(self.correct, self.total);
    }
}

/// Rounded integer percentage; 0 when `total` is 0.
#[must_use]
pub fn percent(correct: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    {
        (f64::from(correct) / f64::from(total) * 100.0).round() as u32
    }
}

//
// ─── PER-QUESTION RESULT ───────────────────────────────────────────────────────
//

/// Type-erased result for one answered question.
///
/// `user_answer`/`correct_answer` shapes depend on the question type
/// (scalar index, scalar number, permutation, index set, or per-stage
/// outcome list); both are `null` for records with no normalized form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResult {
    pub id: QuestionId,
    #[serde(rename = "type")]
    pub kind: String,
    pub question: String,
    pub correct: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub skipped: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub timed_out: bool,
    #[serde(default)]
    pub user_answer: Value,
    #[serde(default)]
    pub correct_answer: Value,
}

//
// ─── SESSION SUMMARY ───────────────────────────────────────────────────────────
//

/// Portable snapshot of one session's results.
///
/// This is the persisted/exported wire format: older summaries missing
/// `context` or either breakdown map deserialize with empty defaults so the
/// aggregate stats engine can still consume them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub context: SessionContext,
    pub score: ScoreBlock,
    pub results: Vec<QuestionResult>,
    #[serde(default)]
    pub breakdown_by_type: BTreeMap<String, BreakdownEntry>,
    #[serde(default)]
    pub breakdown_by_tag: BTreeMap<String, BreakdownEntry>,
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
