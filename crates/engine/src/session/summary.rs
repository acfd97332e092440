//! Normalizes the session's answer log into the portable summary format.
//!
//! Everything here is a pure projection: no session state is touched and
//! every returned collection is freshly owned, so callers can request a
//! summary mid-session as often as they like.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::{Value, json};

use quiz_core::model::{
    AnswerRecord, BreakdownEntry, Question, QuestionBody, QuestionResult, ResponsePayload,
    ScoreBlock, SessionContext, SessionSummary, percent,
};

/// Build a summary from the position-aligned question/answer lists.
pub(crate) fn build(
    questions: &[Question],
    answers: &[AnswerRecord],
    context: &SessionContext,
    timestamp: DateTime<Utc>,
) -> SessionSummary {
    let mut results = Vec::with_capacity(answers.len());
    let mut by_type: BTreeMap<String, BreakdownEntry> = BTreeMap::new();
    let mut by_tag: BTreeMap<String, BreakdownEntry> = BTreeMap::new();
    let mut score = ScoreBlock::default();

    for (question, answer) in questions.iter().zip(answers) {
        results.push(normalize(question, answer));

        if answer.skipped {
            score.skipped += 1;
            continue;
        }
        if answer.timed_out {
            score.timed_out += 1;
            continue;
        }

        score.total += 1;
        if answer.correct {
            score.correct += 1;
        }
        by_type
            .entry(question.kind().as_str().to_owned())
            .or_default()
            .record(answer.correct);
        for tag in question.tags() {
            by_tag.entry(tag.clone()).or_default().record(answer.correct);
        }
    }
    score.percentage = percent(score.correct, score.total);

    SessionSummary {
        timestamp,
        context: context.clone(),
        score,
        results,
        breakdown_by_type: by_type,
        breakdown_by_tag: by_tag,
    }
}

/// Project one answer into its type-erased result row.
fn normalize(question: &Question, answer: &AnswerRecord) -> QuestionResult {
    let (user_answer, correct_answer) = answer_values(question.body(), &answer.response);
    QuestionResult {
        id: question.id().clone(),
        kind: question.kind().as_str().to_owned(),
        question: question.display_prompt().to_owned(),
        correct: answer.correct,
        tags: question.tags().to_vec(),
        skipped: answer.skipped,
        timed_out: answer.timed_out,
        user_answer,
        correct_answer,
    }
}

/// Per-format `userAnswer`/`correctAnswer` pair.
///
/// The match is exhaustive over the question formats, so a new format
/// cannot silently fall through; a response payload that does not match
/// its question's format normalizes to null/null.
fn answer_values(body: &QuestionBody, response: &ResponsePayload) -> (Value, Value) {
    let correct_answer = match body {
        QuestionBody::MultipleChoice { correct, .. } => json!(correct),
        QuestionBody::Numeric { answer, .. } => json!(answer),
        QuestionBody::Ordering { correct_order, .. } => json!(correct_order),
        QuestionBody::MultiSelect { correct, .. } => json!(correct),
        QuestionBody::TwoStage { stages } => {
            json!(stages.iter().map(|stage| stage.correct).collect::<Vec<_>>())
        }
    };
    let user_answer = match (body, response) {
        (QuestionBody::MultipleChoice { .. }, ResponsePayload::Option { selected }) => {
            json!(selected)
        }
        (QuestionBody::Numeric { .. }, ResponsePayload::Numeric { parsed, .. }) => json!(parsed),
        (QuestionBody::Ordering { .. }, ResponsePayload::Ordering { order }) => json!(order),
        (QuestionBody::MultiSelect { .. }, ResponsePayload::MultiSelect { selected }) => {
            json!(selected)
        }
        (QuestionBody::TwoStage { .. }, ResponsePayload::TwoStage { stages }) => json!(stages),
        (_, ResponsePayload::None) => Value::Null,
        _ => return (Value::Null, Value::Null),
    };
    (user_answer, correct_answer)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{QuestionId, StageOutcome};
    use quiz_core::time::fixed_now;

    fn choice(id: &str, tags: &[&str]) -> Question {
        Question::new(
            id,
            QuestionBody::MultipleChoice {
                prompt: format!("prompt {id}"),
                options: vec!["a".into(), "b".into()],
                correct: 0,
            },
        )
        .unwrap()
        .with_tags(tags.iter().map(|t| (*t).to_owned()).collect())
    }

    #[test]
    fn breakdowns_count_graded_answers_only() {
        let questions = vec![
            choice("q1", &["macro"]),
            choice("q2", &["macro", "rates"]),
            choice("q3", &["rates"]),
        ];
        let answers = vec![
            AnswerRecord::graded(
                QuestionId::new("q1"),
                true,
                ResponsePayload::Option { selected: 0 },
            ),
            AnswerRecord::skipped(QuestionId::new("q2")),
            AnswerRecord::graded(
                QuestionId::new("q3"),
                false,
                ResponsePayload::Option { selected: 1 },
            ),
        ];

        let summary = build(&questions, &answers, &SessionContext::new(), fixed_now());

        assert_eq!(summary.score.correct, 1);
        assert_eq!(summary.score.total, 2);
        assert_eq!(summary.score.skipped, 1);
        assert_eq!(summary.score.percentage, 50);

        let mc = &summary.breakdown_by_type["multiple-choice"];
        assert_eq!((mc.correct, mc.total), (1, 2));

        // the skipped q2 contributes to no tag bucket
        assert_eq!(summary.breakdown_by_tag["macro"].total, 1);
        assert_eq!(summary.breakdown_by_tag["rates"].total, 1);
    }

    #[test]
    fn mid_session_summary_covers_only_answered_questions() {
        let questions = vec![choice("q1", &[]), choice("q2", &[])];
        let answers = vec![AnswerRecord::graded(
            QuestionId::new("q1"),
            true,
            ResponsePayload::Option { selected: 0 },
        )];

        let summary = build(&questions, &answers, &SessionContext::new(), fixed_now());
        assert_eq!(summary.results.len(), 1);
        assert_eq!(summary.score.total, 1);
    }

    #[test]
    fn repeated_builds_return_independent_values() {
        let questions = vec![choice("q1", &["tag"])];
        let answers = vec![AnswerRecord::graded(
            QuestionId::new("q1"),
            true,
            ResponsePayload::Option { selected: 0 },
        )];

        let first = build(&questions, &answers, &SessionContext::new(), fixed_now());
        let mut second = build(&questions, &answers, &SessionContext::new(), fixed_now());
        assert_eq!(first, second);

        second.results[0].tags.push("mutated".into());
        assert_ne!(first, second, "copies must not alias");
    }

    #[test]
    fn two_stage_answers_normalize_to_per_stage_lists() {
        let stages = vec![
            quiz_core::model::Stage::new("s1", vec!["a".into(), "b".into()], 0).unwrap(),
            quiz_core::model::Stage::new("s2", vec!["c".into(), "d".into()], 1).unwrap(),
        ];
        let question = Question::new("t1", QuestionBody::TwoStage { stages }).unwrap();
        let answer = AnswerRecord::graded(
            QuestionId::new("t1"),
            false,
            ResponsePayload::TwoStage {
                stages: vec![
                    StageOutcome {
                        selected: 1,
                        correct: false,
                    },
                    StageOutcome {
                        selected: 1,
                        correct: true,
                    },
                ],
            },
        );

        let summary = build(
            &[question],
            std::slice::from_ref(&answer),
            &SessionContext::new(),
            fixed_now(),
        );
        let result = &summary.results[0];
        assert_eq!(result.correct_answer, json!([0, 1]));
        assert_eq!(result.user_answer[0]["selected"], json!(1));
        assert_eq!(result.user_answer[0]["correct"], json!(false));
    }

    #[test]
    fn skipped_answer_normalizes_to_null_user_answer() {
        let questions = vec![choice("q1", &[])];
        let answers = vec![AnswerRecord::skipped(QuestionId::new("q1"))];

        let summary = build(&questions, &answers, &SessionContext::new(), fixed_now());
        let result = &summary.results[0];
        assert!(result.skipped);
        assert_eq!(result.user_answer, Value::Null);
        // the reviewer still gets the right answer
        assert_eq!(result.correct_answer, json!(0));
    }
}
