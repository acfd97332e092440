//! Cross-session reporting over exported summaries.
//!
//! Three independent pure operations: structural validation (collecting
//! every problem instead of failing fast), deduplication by timestamp,
//! and statistical aggregation. All of them tolerate the older wire
//! format that predates `context` and the breakdown maps.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde_json::Value;

use quiz_core::model::{BreakdownEntry, QuestionId, ScoreBlock, SessionSummary, percent};

use crate::error::SummaryIssue;

//
// ─── VALIDATION ────────────────────────────────────────────────────────────────
//

/// Structurally validate one exported summary.
///
/// # Errors
///
/// Returns every issue found: the value must be a JSON object with a
/// parseable ISO-8601 `timestamp` and a `score` object carrying numeric
/// `correct` and `total`.
pub fn validate_summary(value: &Value) -> Result<SessionSummary, Vec<SummaryIssue>> {
    let Some(object) = value.as_object() else {
        return Err(vec![SummaryIssue::NotAnObject]);
    };

    let mut issues = Vec::new();

    match object.get("timestamp") {
        None | Some(Value::Null) => issues.push(SummaryIssue::MissingTimestamp),
        Some(raw) => {
            let parseable = raw
                .as_str()
                .is_some_and(|text| DateTime::parse_from_rfc3339(text).is_ok());
            if !parseable {
                issues.push(SummaryIssue::UnparseableTimestamp(raw.to_string()));
            }
        }
    }

    match object.get("score").and_then(Value::as_object) {
        None => issues.push(SummaryIssue::MissingScore),
        Some(score) => {
            for field in ["correct", "total"] {
                if !score.get(field).is_some_and(Value::is_number) {
                    issues.push(SummaryIssue::NonNumericScoreField(field));
                }
            }
        }
    }

    if !issues.is_empty() {
        return Err(issues);
    }

    serde_json::from_value(value.clone()).map_err(|err| vec![SummaryIssue::Shape(err.to_string())])
}

//
// ─── DEDUPLICATION ─────────────────────────────────────────────────────────────
//

/// Keep the first summary per distinct timestamp, dropping later
/// duplicates and preserving the input order otherwise.
#[must_use]
pub fn deduplicate(summaries: Vec<SessionSummary>) -> Vec<SessionSummary> {
    let mut seen = HashSet::new();
    summaries
        .into_iter()
        .filter(|summary| seen.insert(summary.timestamp.to_rfc3339()))
        .collect()
}

//
// ─── AGGREGATION ───────────────────────────────────────────────────────────────
//

/// One point of the chronological accuracy trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendPoint {
    pub timestamp: DateTime<Utc>,
    pub percentage: u32,
}

/// A frequently-missed question and how often it was answered wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissedQuestion {
    pub id: QuestionId,
    pub wrong: u32,
}

/// Combined statistics over a set of session summaries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateStats {
    pub sessions: usize,
    pub score: ScoreBlock,
    pub breakdown_by_type: BTreeMap<String, BreakdownEntry>,
    pub breakdown_by_tag: BTreeMap<String, BreakdownEntry>,
    pub unit_accuracy: BTreeMap<String, BreakdownEntry>,
    pub chapter_accuracy: BTreeMap<String, BreakdownEntry>,
    pub trend: Vec<TrendPoint>,
    pub most_missed: Vec<MissedQuestion>,
}

/// Number of entries the missed-question ranking keeps.
const MOST_MISSED_LIMIT: usize = 10;

/// Statistically combine summaries: summed scores, additively merged
/// breakdowns with recomputed percentages, unit/chapter accuracy from the
/// context block when present, a chronological trend series, and the ten
/// most-missed question ids (skipped/timed-out results excluded).
#[must_use]
pub fn aggregate(summaries: &[SessionSummary]) -> AggregateStats {
    let mut stats = AggregateStats {
        sessions: summaries.len(),
        ..AggregateStats::default()
    };
    let mut wrong_counts: HashMap<QuestionId, u32> = HashMap::new();

    for summary in summaries {
        stats.score.correct += summary.score.correct;
        stats.score.total += summary.score.total;
        stats.score.skipped += summary.score.skipped;
        stats.score.timed_out += summary.score.timed_out;

        for (kind, entry) in &summary.breakdown_by_type {
            stats
                .breakdown_by_type
                .entry(kind.clone())
                .or_default()
                .merge(entry);
        }
        for (tag, entry) in &summary.breakdown_by_tag {
            stats
                .breakdown_by_tag
                .entry(tag.clone())
                .or_default()
                .merge(entry);
        }

        merge_context_accuracy(&mut stats.unit_accuracy, summary, "unit");
        merge_context_accuracy(&mut stats.chapter_accuracy, summary, "chapter");

        for result in &summary.results {
            if !result.correct && !result.skipped && !result.timed_out {
                *wrong_counts.entry(result.id.clone()).or_default() += 1;
            }
        }

        stats.trend.push(TrendPoint {
            timestamp: summary.timestamp,
            percentage: summary.score.percentage,
        });
    }

    stats.score.percentage = percent(stats.score.correct, stats.score.total);
    stats.trend.sort_by_key(|point| point.timestamp);

    let mut missed: Vec<MissedQuestion> = wrong_counts
        .into_iter()
        .map(|(id, wrong)| MissedQuestion { id, wrong })
        .collect();
    missed.sort_by(|a, b| b.wrong.cmp(&a.wrong).then_with(|| a.id.cmp(&b.id)));
    missed.truncate(MOST_MISSED_LIMIT);
    stats.most_missed = missed;

    stats
}

/// Fold one summary's whole-session score into the bucket named by its
/// context label, when that label is present.
fn merge_context_accuracy(
    buckets: &mut BTreeMap<String, BreakdownEntry>,
    summary: &SessionSummary,
    key: &str,
) {
    let Some(label) = summary.context.get(key).and_then(Value::as_str) else {
        return;
    };
    buckets.entry(label.to_owned()).or_default().merge(&BreakdownEntry {
        correct: summary.score.correct,
        total: summary.score.total,
        percentage: summary.score.percentage,
    });
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
