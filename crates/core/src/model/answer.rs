use serde::{Deserialize, Serialize};

use crate::model::ids::QuestionId;

/// Outcome of one two-stage step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageOutcome {
    pub selected: usize,
    pub correct: bool,
}

/// Format-specific payload recorded with an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResponsePayload {
    /// No response was recorded (skipped or timed-out question).
    None,
    Option {
        selected: usize,
    },
    Numeric {
        raw: String,
        parsed: Option<f64>,
    },
    Ordering {
        order: Vec<usize>,
    },
    MultiSelect {
        selected: Vec<usize>,
    },
    TwoStage {
        stages: Vec<StageOutcome>,
    },
}

/// Record of a single answered (or bypassed) question.
///
/// The answer log is position-aligned with the session's fixed question
/// sequence: record *i* always belongs to question *i*.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question_id: QuestionId,
    pub correct: bool,
    pub skipped: bool,
    pub timed_out: bool,
    pub response: ResponsePayload,
}

impl AnswerRecord {
    /// Record for a graded attempt.
    #[must_use]
    pub fn graded(question_id: QuestionId, correct: bool, response: ResponsePayload) -> Self {
        Self {
            question_id,
            correct,
            skipped: false,
            timed_out: false,
            response,
        }
    }

    /// Record for a question the user skipped. Never graded.
    #[must_use]
    pub fn skipped(question_id: QuestionId) -> Self {
        Self {
            question_id,
            correct: false,
            skipped: true,
            timed_out: false,
            response: ResponsePayload::None,
        }
    }

    /// Record for a question the caller timed out. Never graded.
    #[must_use]
    pub fn timed_out(question_id: QuestionId) -> Self {
        Self {
            question_id,
            correct: false,
            skipped: false,
            timed_out: true,
            response: ResponsePayload::None,
        }
    }

    /// True when this record counts toward the score.
    #[must_use]
    pub fn is_graded(&self) -> bool {
        !self.skipped && !self.timed_out
    }
}
