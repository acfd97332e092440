//! Correctness algorithms, one per question format.
//!
//! These are pure functions over the stored correctness data; the session
//! state machine decides when they run and what gets recorded.

use crate::model::{Question, QuestionBody, Stage, StageOutcome};
use crate::numeric::{self, Tolerance};

/// Correct iff the selected option index equals the stored correct index.
#[must_use]
pub fn grade_multiple_choice(correct: usize, selected: usize) -> bool {
    selected == correct
}

/// Parse free text and grade it against the target under the tolerance
/// policy. Returns the parsed value (for the answer record) alongside the
/// verdict; unparseable text is `(None, false)`.
#[must_use]
pub fn grade_numeric(text: &str, target: f64, tolerance: Option<Tolerance>) -> (Option<f64>, bool) {
    let parsed = numeric::parse_numeric(text);
    let correct = parsed.is_some_and(|value| {
        tolerance
            .unwrap_or(Tolerance::Relative(numeric::DEFAULT_RELATIVE_TOLERANCE))
            .accepts(value, target)
    });
    (parsed, correct)
}

/// Correct iff the submitted permutation matches position by position.
#[must_use]
pub fn grade_ordering(correct_order: &[usize], submitted: &[usize]) -> bool {
    correct_order == submitted
}

/// Correct iff the selected set equals the correct set exactly; excess
/// selections count against the answer the same as missing ones.
#[must_use]
pub fn grade_multi_select(correct: &[usize], selected: &[usize]) -> bool {
    let mut selected = selected.to_vec();
    selected.sort_unstable();
    selected.dedup();

    let mut expected = correct.to_vec();
    expected.sort_unstable();
    expected.dedup();

    selected == expected
}

/// Logical AND across all per-stage outcomes.
#[must_use]
pub fn grade_two_stage(outcomes: &[StageOutcome]) -> bool {
    !outcomes.is_empty() && outcomes.iter().all(|outcome| outcome.correct)
}

//
// ─── FEEDBACK ──────────────────────────────────────────────────────────────────
//

/// Explanation material attached to a graded result event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Feedback {
    pub explanation: Option<String>,
    pub details: Option<String>,
    pub references: Vec<String>,
}

impl Feedback {
    /// Question-level feedback.
    #[must_use]
    pub fn for_question(question: &Question) -> Self {
        Self {
            explanation: question.explanation().map(str::to_owned),
            details: question.details().map(str::to_owned),
            references: question.references().to_vec(),
        }
    }

    /// Stage-level feedback; references fall back to the question-level
    /// list when the stage omits its own.
    #[must_use]
    pub fn for_stage(question: &Question, stage: &Stage) -> Self {
        let references = if stage.references.is_empty() {
            question.references().to_vec()
        } else {
            stage.references.clone()
        };
        Self {
            explanation: stage.explanation.clone(),
            details: question.details().map(str::to_owned),
            references,
        }
    }
}

/// Grade a complete response against a question body.
///
/// Only the formats answerable in one shot are covered here; two-stage
/// questions accumulate `StageOutcome`s in the session and conjoin them
/// with [`grade_two_stage`].
#[must_use]
pub fn grade_response(body: &QuestionBody, response: &Response<'_>) -> Option<bool> {
    match (body, response) {
        (QuestionBody::MultipleChoice { correct, .. }, Response::Option(selected)) => {
            Some(grade_multiple_choice(*correct, *selected))
        }
        (
            QuestionBody::Numeric {
                answer, tolerance, ..
            },
            Response::Numeric(text),
        ) => Some(grade_numeric(text, *answer, *tolerance).1),
        (QuestionBody::Ordering { correct_order, .. }, Response::Ordering(submitted)) => {
            Some(grade_ordering(correct_order, submitted))
        }
        (QuestionBody::MultiSelect { correct, .. }, Response::MultiSelect(selected)) => {
            Some(grade_multi_select(correct, selected))
        }
        _ => None,
    }
}

/// Borrowed view of a single-shot response, for [`grade_response`].
#[derive(Debug, Clone, Copy)]
pub enum Response<'a> {
    Option(usize),
    Numeric(&'a str),
    Ordering(&'a [usize]),
    MultiSelect(&'a [usize]),
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuestionBody;

    #[test]
    fn multiple_choice_compares_indices() {
        assert!(grade_multiple_choice(2, 2));
        assert!(!grade_multiple_choice(2, 0));
    }

    #[test]
    fn numeric_suffix_input_within_tolerance() {
        let (parsed, correct) = grade_numeric("5K", 5000.0, Some(Tolerance::Relative(0.01)));
        assert_eq!(parsed, Some(5000.0));
        assert!(correct);
    }

    #[test]
    fn numeric_garbage_is_incorrect_not_an_error() {
        let (parsed, correct) = grade_numeric("lots", 5000.0, None);
        assert_eq!(parsed, None);
        assert!(!correct);
    }

    #[test]
    fn ordering_requires_exact_positions() {
        assert!(grade_ordering(&[0, 1, 2], &[0, 1, 2]));
        assert!(!grade_ordering(&[0, 1, 2], &[2, 1, 0]));
        assert!(!grade_ordering(&[0, 1, 2], &[0, 1]));
    }

    #[test]
    fn multi_select_penalizes_excess_and_missing() {
        assert!(grade_multi_select(&[0, 2], &[2, 0]));
        assert!(!grade_multi_select(&[0, 2], &[0, 1, 2]));
        assert!(!grade_multi_select(&[0, 2], &[0]));
    }

    #[test]
    fn two_stage_is_a_conjunction() {
        let both = [
            StageOutcome {
                selected: 0,
                correct: true,
            },
            StageOutcome {
                selected: 1,
                correct: true,
            },
        ];
        let mixed = [
            StageOutcome {
                selected: 0,
                correct: false,
            },
            StageOutcome {
                selected: 1,
                correct: true,
            },
        ];
        assert!(grade_two_stage(&both));
        assert!(!grade_two_stage(&mixed));
        assert!(!grade_two_stage(&[]));
    }

    #[test]
    fn stage_references_fall_back_to_question_level() {
        let stage = Stage::new("S1", vec!["a".into(), "b".into()], 0).unwrap();
        let with_refs = Stage::new("S2", vec!["a".into(), "b".into()], 1)
            .unwrap()
            .with_references(vec!["stage ref".into()]);
        let question = Question::new(
            "q",
            QuestionBody::TwoStage {
                stages: vec![stage.clone(), with_refs.clone()],
            },
        )
        .unwrap()
        .with_references(vec!["question ref".into()]);

        let fallback = Feedback::for_stage(&question, &stage);
        assert_eq!(fallback.references, vec!["question ref".to_owned()]);

        let own = Feedback::for_stage(&question, &with_refs);
        assert_eq!(own.references, vec!["stage ref".to_owned()]);
    }

    #[test]
    fn grade_response_rejects_mismatched_formats() {
        let body = QuestionBody::MultipleChoice {
            prompt: "p".into(),
            options: vec!["a".into(), "b".into()],
            correct: 0,
        };
        assert_eq!(grade_response(&body, &Response::Numeric("1")), None);
        assert_eq!(grade_response(&body, &Response::Option(0)), Some(true));
    }
}
