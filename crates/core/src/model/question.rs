use std::fmt;

use thiserror::Error;

use crate::model::ids::QuestionId;
use crate::numeric::Tolerance;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question must offer at least two options")]
    TooFewOptions,

    #[error("correct option index {index} is out of range for {len} options")]
    CorrectIndexOutOfRange { index: usize, len: usize },

    #[error("correct order must be a permutation of 0..{len}")]
    InvalidPermutation { len: usize },

    #[error("numeric answer must be finite")]
    NonFiniteAnswer,

    #[error("relative tolerance must be finite and non-negative")]
    InvalidTolerance,

    #[error("two-stage question must have at least one stage")]
    NoStages,

    #[error("multi-select question must name at least one correct option")]
    NoCorrectSelections,
}

//
// ─── QUESTION KIND ─────────────────────────────────────────────────────────────
//

/// Fieldless mirror of the five question formats.
///
/// Used wherever a format is addressed without its payload: sampler weight
/// maps, summary breakdowns, and the wire-format `type` strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QuestionKind {
    MultipleChoice,
    Numeric,
    Ordering,
    MultiSelect,
    TwoStage,
}

impl QuestionKind {
    /// Every kind, in the fixed order the sampler walks partitions.
    pub const ALL: [QuestionKind; 5] = [
        QuestionKind::MultipleChoice,
        QuestionKind::Numeric,
        QuestionKind::Ordering,
        QuestionKind::MultiSelect,
        QuestionKind::TwoStage,
    ];

    /// Wire-format name used by exported summaries.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionKind::MultipleChoice => "multiple-choice",
            QuestionKind::Numeric => "numeric",
            QuestionKind::Ordering => "ordering",
            QuestionKind::MultiSelect => "multi-select",
            QuestionKind::TwoStage => "two-stage",
        }
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

//
// ─── STAGE ─────────────────────────────────────────────────────────────────────
//

/// One step of a two-stage question.
///
/// Stages are answered in order and the overall question is correct only
/// when every stage was answered correctly.
#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    pub prompt: String,
    pub options: Vec<String>,
    pub correct: usize,
    pub explanation: Option<String>,
    pub references: Vec<String>,
}

impl Stage {
    /// Creates a stage after checking the correct index against the options.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::TooFewOptions` or `CorrectIndexOutOfRange`.
    pub fn new(
        prompt: impl Into<String>,
        options: Vec<String>,
        correct: usize,
    ) -> Result<Self, QuestionError> {
        if options.len() < 2 {
            return Err(QuestionError::TooFewOptions);
        }
        if correct >= options.len() {
            return Err(QuestionError::CorrectIndexOutOfRange {
                index: correct,
                len: options.len(),
            });
        }
        Ok(Self {
            prompt: prompt.into(),
            options,
            correct,
            explanation: None,
            references: Vec::new(),
        })
    }

    #[must_use]
    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }

    #[must_use]
    pub fn with_references(mut self, references: Vec<String>) -> Self {
        self.references = references;
        self
    }
}

//
// ─── QUESTION BODY ─────────────────────────────────────────────────────────────
//

/// Tagged union over the five question formats.
///
/// Grading, summarization, and weight lookup are exhaustive matches over
/// this enum, so a new format cannot silently fall through un-graded.
#[derive(Debug, Clone, PartialEq)]
pub enum QuestionBody {
    MultipleChoice {
        prompt: String,
        options: Vec<String>,
        correct: usize,
    },
    Numeric {
        prompt: String,
        answer: f64,
        tolerance: Option<Tolerance>,
    },
    Ordering {
        prompt: String,
        items: Vec<String>,
        correct_order: Vec<usize>,
    },
    MultiSelect {
        prompt: String,
        options: Vec<String>,
        correct: Vec<usize>,
    },
    TwoStage {
        stages: Vec<Stage>,
    },
}

impl QuestionBody {
    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        match self {
            QuestionBody::MultipleChoice { .. } => QuestionKind::MultipleChoice,
            QuestionBody::Numeric { .. } => QuestionKind::Numeric,
            QuestionBody::Ordering { .. } => QuestionKind::Ordering,
            QuestionBody::MultiSelect { .. } => QuestionKind::MultiSelect,
            QuestionBody::TwoStage { .. } => QuestionKind::TwoStage,
        }
    }

    fn validate(&self) -> Result<(), QuestionError> {
        match self {
            QuestionBody::MultipleChoice {
                options, correct, ..
            } => {
                if options.len() < 2 {
                    return Err(QuestionError::TooFewOptions);
                }
                if *correct >= options.len() {
                    return Err(QuestionError::CorrectIndexOutOfRange {
                        index: *correct,
                        len: options.len(),
                    });
                }
                Ok(())
            }
            QuestionBody::Numeric {
                answer, tolerance, ..
            } => {
                if !answer.is_finite() {
                    return Err(QuestionError::NonFiniteAnswer);
                }
                if let Some(Tolerance::Relative(f)) = tolerance {
                    if !f.is_finite() || *f < 0.0 {
                        return Err(QuestionError::InvalidTolerance);
                    }
                }
                Ok(())
            }
            QuestionBody::Ordering {
                items,
                correct_order,
                ..
            } => {
                if items.len() < 2 {
                    return Err(QuestionError::TooFewOptions);
                }
                if !is_permutation(correct_order, items.len()) {
                    return Err(QuestionError::InvalidPermutation { len: items.len() });
                }
                Ok(())
            }
            QuestionBody::MultiSelect {
                options, correct, ..
            } => {
                if options.len() < 2 {
                    return Err(QuestionError::TooFewOptions);
                }
                if correct.is_empty() {
                    return Err(QuestionError::NoCorrectSelections);
                }
                if let Some(&index) = correct.iter().find(|&&i| i >= options.len()) {
                    return Err(QuestionError::CorrectIndexOutOfRange {
                        index,
                        len: options.len(),
                    });
                }
                Ok(())
            }
            QuestionBody::TwoStage { stages } => {
                if stages.is_empty() {
                    return Err(QuestionError::NoStages);
                }
                for stage in stages {
                    if stage.options.len() < 2 {
                        return Err(QuestionError::TooFewOptions);
                    }
                    if stage.correct >= stage.options.len() {
                        return Err(QuestionError::CorrectIndexOutOfRange {
                            index: stage.correct,
                            len: stage.options.len(),
                        });
                    }
                }
                Ok(())
            }
        }
    }
}

/// True when `order` contains each index in `0..len` exactly once.
fn is_permutation(order: &[usize], len: usize) -> bool {
    if order.len() != len {
        return false;
    }
    let mut seen = vec![false; len];
    for &index in order {
        if index >= len || seen[index] {
            return false;
        }
        seen[index] = true;
    }
    true
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A single practice question, immutable once loaded into a session.
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    id: QuestionId,
    body: QuestionBody,
    tags: Vec<String>,
    explanation: Option<String>,
    details: Option<String>,
    references: Vec<String>,
}

impl Question {
    /// Creates a question after validating the body's correctness data.
    ///
    /// # Errors
    ///
    /// Returns a `QuestionError` when the body is structurally invalid
    /// (out-of-range correct index, non-permutation order, and so on).
    pub fn new(id: impl Into<QuestionId>, body: QuestionBody) -> Result<Self, QuestionError> {
        body.validate()?;
        let body = match body {
            // keep the correct set in canonical order so grading can
            // compare sorted sets directly
            QuestionBody::MultiSelect {
                prompt,
                options,
                mut correct,
            } => {
                correct.sort_unstable();
                correct.dedup();
                QuestionBody::MultiSelect {
                    prompt,
                    options,
                    correct,
                }
            }
            other => other,
        };
        Ok(Self {
            id: id.into(),
            body,
            tags: Vec::new(),
            explanation: None,
            details: None,
            references: Vec::new(),
        })
    }

    #[must_use]
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    #[must_use]
    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }

    /// Long-form explanation shown on demand after grading.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    #[must_use]
    pub fn with_references(mut self, references: Vec<String>) -> Self {
        self.references = references;
        self
    }

    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn body(&self) -> &QuestionBody {
        &self.body
    }

    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        self.body.kind()
    }

    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    #[must_use]
    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    #[must_use]
    pub fn references(&self) -> &[String] {
        &self.references
    }

    /// Prompt shown for this question; for two-stage questions this is the
    /// first stage's prompt.
    #[must_use]
    pub fn display_prompt(&self) -> &str {
        match &self.body {
            QuestionBody::MultipleChoice { prompt, .. }
            | QuestionBody::Numeric { prompt, .. }
            | QuestionBody::Ordering { prompt, .. }
            | QuestionBody::MultiSelect { prompt, .. } => prompt,
            QuestionBody::TwoStage { stages } => {
                stages.first().map_or("", |stage| stage.prompt.as_str())
            }
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
