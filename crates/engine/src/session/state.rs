use std::collections::HashMap;
use std::fmt;

use rand::rng;
use rand::seq::SliceRandom;
use tracing::debug;

use quiz_core::Clock;
use quiz_core::grading::{self, Feedback};
use quiz_core::model::{
    AnswerRecord, Question, QuestionBody, QuestionId, ResponsePayload, SessionContext,
    SessionSummary, StageOutcome, TrackingEntry,
};
use quiz_core::proficiency;

use crate::events::{Event, EventBus, EventKind, ListenerId};
use crate::plan::{SamplerConfig, SessionSampler};
use crate::session::progress::SessionProgress;
use crate::session::snapshot::SessionSnapshot;
use crate::session::summary;

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

/// Lifecycle states of a practice session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Practicing,
    Answered,
    Complete,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Practicing => "practicing",
            SessionState::Answered => "answered",
            SessionState::Complete => "complete",
        };
        write!(f, "{name}")
    }
}

/// Transient per-question working state, discarded unconditionally when
/// the session moves on.
#[derive(Debug, Clone, Default)]
struct QuestionScratch {
    multi_selected: Vec<usize>,
    ordering: Vec<usize>,
    stage_index: usize,
    stage_outcomes: Vec<StageOutcome>,
}

impl QuestionScratch {
    fn for_question(question: &Question) -> Self {
        let ordering = match question.body() {
            QuestionBody::Ordering { items, .. } => (0..items.len()).collect(),
            _ => Vec::new(),
        };
        Self {
            ordering,
            ..Self::default()
        }
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory practice session over a fixed question sequence.
///
/// The session owns one run's worth of mutable state and nothing else: no
/// I/O, no timers (callers invoke [`timeout`](Self::timeout) themselves),
/// and no global state. Every public operation is synchronous and either
/// completes a transition — emitting its events before returning — or is a
/// silent no-op when called in the wrong state or with an out-of-range
/// argument.
pub struct PracticeSession {
    clock: Clock,
    bus: EventBus,
    sampler_config: SamplerConfig,
    pool: Vec<Question>,
    questions: Vec<Question>,
    answers: Vec<AnswerRecord>,
    context: SessionContext,
    cap: Option<usize>,
    tracking: HashMap<QuestionId, TrackingEntry>,
    state: SessionState,
    current: usize,
    scratch: QuestionScratch,
}

impl Default for PracticeSession {
    fn default() -> Self {
        Self::new()
    }
}

impl PracticeSession {
    #[must_use]
    pub fn new() -> Self {
        Self {
            clock: Clock::default_clock(),
            bus: EventBus::new(),
            sampler_config: SamplerConfig::new(),
            pool: Vec::new(),
            questions: Vec::new(),
            answers: Vec::new(),
            context: SessionContext::new(),
            cap: None,
            tracking: HashMap::new(),
            state: SessionState::Idle,
            current: 0,
            scratch: QuestionScratch::default(),
        }
    }

    /// Use a specific clock (fixed clocks keep tracking timestamps and
    /// summary timestamps deterministic in tests).
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Override the default per-kind sampler weights.
    #[must_use]
    pub fn with_sampler_config(mut self, config: SamplerConfig) -> Self {
        self.sampler_config = config;
        self
    }

    //
    // ─── LISTENERS ─────────────────────────────────────────────────────────────
    //

    pub fn subscribe(
        &mut self,
        kind: EventKind,
        callback: impl FnMut(&Event) + 'static,
    ) -> ListenerId {
        self.bus.subscribe(kind, callback)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.bus.unsubscribe(id)
    }

    //
    // ─── ACCESSORS ─────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current)
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn answers(&self) -> &[AnswerRecord] {
        &self.answers
    }

    #[must_use]
    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    /// Tracking entries updated during this session, for the caller to
    /// persist. The engine never deletes an entry.
    #[must_use]
    pub fn tracking(&self) -> &HashMap<QuestionId, TrackingEntry> {
        &self.tracking
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            total: self.questions.len(),
            answered: self.answers.len(),
            remaining: self.questions.len().saturating_sub(self.answers.len()),
            is_complete: self.state == SessionState::Complete,
        }
    }

    /// Summary of the session so far. Pure and callable in any state,
    /// mid-session included; repeated calls return independently-owned
    /// values.
    #[must_use]
    pub fn session_summary(&self) -> SessionSummary {
        summary::build(
            &self.questions,
            &self.answers,
            &self.context,
            self.clock.now(),
        )
    }

    //
    // ─── LIFECYCLE ─────────────────────────────────────────────────────────────
    //

    /// Load a question set, fixing this session's shuffled, capped
    /// sequence.
    ///
    /// Per-question sampler weights are derived from the supplied tracking
    /// data through the proficiency model; the caller's collections are
    /// copied, never aliased. Returns the session to `Idle`.
    pub fn load_questions(
        &mut self,
        questions: &[Question],
        cap: Option<usize>,
        context: SessionContext,
        tracking: HashMap<QuestionId, TrackingEntry>,
    ) {
        self.pool = questions.to_vec();
        self.cap = cap;
        self.context = context;
        self.tracking = tracking;
        self.answers.clear();
        self.current = 0;
        self.scratch = QuestionScratch::default();
        self.rebuild_sequence();
        self.set_state(SessionState::Idle);
    }

    /// Begin practicing. No-op outside `Idle` or when no questions were
    /// drawn.
    pub fn start(&mut self) {
        if self.state != SessionState::Idle || self.questions.is_empty() {
            return;
        }
        self.current = 0;
        self.reset_scratch();
        self.set_state(SessionState::Practicing);
        self.emit_question_shown();
    }

    /// Move from an answered question to the next one, or complete the
    /// session on the last. No-op outside `Answered`.
    pub fn advance(&mut self) {
        if self.state != SessionState::Answered {
            return;
        }
        if self.current + 1 < self.questions.len() {
            self.current += 1;
            self.reset_scratch();
            self.set_state(SessionState::Practicing);
            self.emit_question_shown();
        } else {
            self.current = self.questions.len();
            self.finish();
        }
    }

    /// Redraw the sequence from the original pool — re-applying the cap
    /// and the latest tracking-derived weights — and re-enter
    /// `Practicing` directly. No-op when nothing was ever loaded.
    pub fn retry(&mut self) {
        if self.pool.is_empty() {
            return;
        }
        self.rebuild_sequence();
        self.answers.clear();
        self.current = 0;
        self.reset_scratch();
        if self.questions.is_empty() {
            self.set_state(SessionState::Idle);
            return;
        }
        self.set_state(SessionState::Practicing);
        self.emit_question_shown();
    }

    /// Clear all session and historical-weighting state and return to
    /// `Idle`.
    pub fn reset(&mut self) {
        self.pool.clear();
        self.questions.clear();
        self.answers.clear();
        self.context.clear();
        self.tracking.clear();
        self.cap = None;
        self.current = 0;
        self.scratch = QuestionScratch::default();
        self.set_state(SessionState::Idle);
    }

    /// Deep copy of the resumable session state.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            questions: self.questions.clone(),
            answers: self.answers.clone(),
            context: self.context.clone(),
            cap: self.cap,
        }
    }

    /// Install a snapshot without re-shuffling and return to `Idle`;
    /// call [`resume`](Self::resume) to continue practicing.
    pub fn restore(&mut self, snapshot: SessionSnapshot) {
        self.pool = snapshot.questions.clone();
        self.questions = snapshot.questions;
        self.answers = snapshot.answers;
        self.context = snapshot.context;
        self.cap = snapshot.cap;
        self.current = self.answers.len().min(self.questions.len());
        self.scratch = QuestionScratch::default();
        self.set_state(SessionState::Idle);
    }

    /// Continue a restored session at its first unanswered question. A
    /// fully-answered snapshot completes immediately instead of
    /// re-entering `Practicing`. No-op outside `Idle` or when empty.
    pub fn resume(&mut self) {
        if self.state != SessionState::Idle || self.questions.is_empty() {
            return;
        }
        self.current = self.answers.len();
        if self.current >= self.questions.len() {
            self.finish();
            return;
        }
        self.reset_scratch();
        self.set_state(SessionState::Practicing);
        self.emit_question_shown();
    }

    //
    // ─── SUBMISSIONS ───────────────────────────────────────────────────────────
    //

    /// Answer a multiple-choice question, or one stage of a two-stage
    /// question. No-op outside `Practicing`, for other formats, or with
    /// an out-of-range index.
    pub fn submit_option(&mut self, index: usize) {
        if self.state != SessionState::Practicing {
            return;
        }
        let Some(question) = self.questions.get(self.current) else {
            return;
        };
        match question.body() {
            QuestionBody::MultipleChoice {
                options, correct, ..
            } => {
                if index >= options.len() {
                    return;
                }
                let correct_index = *correct;
                let verdict = grading::grade_multiple_choice(correct_index, index);
                let feedback = Feedback::for_question(question);
                self.record_answer(verdict, ResponsePayload::Option { selected: index });
                self.bus.emit(&Event::OptionResult {
                    correct: verdict,
                    correct_index,
                    feedback,
                });
                self.set_state(SessionState::Answered);
            }
            QuestionBody::TwoStage { stages } => {
                let stage_index = self.scratch.stage_index;
                let Some(stage) = stages.get(stage_index) else {
                    return;
                };
                if index >= stage.options.len() {
                    return;
                }
                let outcome = StageOutcome {
                    selected: index,
                    correct: index == stage.correct,
                };
                let feedback = Feedback::for_stage(question, stage);
                let chosen_text = stage.options[index].clone();
                let last_stage = stage_index + 1 >= stages.len();
                let next_prompt = if last_stage {
                    String::new()
                } else {
                    stages[stage_index + 1].prompt.clone()
                };
                let final_correct_index = stage.correct;

                self.scratch.stage_outcomes.push(outcome);
                if last_stage {
                    let verdict = grading::grade_two_stage(&self.scratch.stage_outcomes);
                    let outcomes = std::mem::take(&mut self.scratch.stage_outcomes);
                    self.record_answer(verdict, ResponsePayload::TwoStage { stages: outcomes });
                    self.bus.emit(&Event::OptionResult {
                        correct: verdict,
                        correct_index: final_correct_index,
                        feedback,
                    });
                    self.set_state(SessionState::Answered);
                } else {
                    self.scratch.stage_index += 1;
                    self.bus.emit(&Event::TwoStageAdvance {
                        stage_index,
                        outcome,
                        chosen_text,
                        next_prompt,
                        feedback,
                    });
                }
            }
            _ => {}
        }
    }

    /// Answer a numeric question with free text. No-op outside
    /// `Practicing` or for other formats; unparseable text grades as
    /// incorrect rather than erroring.
    pub fn submit_numeric(&mut self, text: &str) {
        if self.state != SessionState::Practicing {
            return;
        }
        let Some(question) = self.questions.get(self.current) else {
            return;
        };
        let QuestionBody::Numeric {
            answer, tolerance, ..
        } = question.body()
        else {
            return;
        };
        let target = *answer;
        let (parsed, verdict) = grading::grade_numeric(text, target, *tolerance);
        let feedback = Feedback::for_question(question);
        self.record_answer(
            verdict,
            ResponsePayload::Numeric {
                raw: text.to_owned(),
                parsed,
            },
        );
        self.bus.emit(&Event::NumericResult {
            correct: verdict,
            answer: target,
            parsed,
            feedback,
        });
        self.set_state(SessionState::Answered);
    }

    /// Toggle one option of a multi-select question in or out of the
    /// working selection. Emits the new selection; grades nothing.
    pub fn toggle_multi_select(&mut self, index: usize) {
        if self.state != SessionState::Practicing {
            return;
        }
        let Some(question) = self.questions.get(self.current) else {
            return;
        };
        let QuestionBody::MultiSelect { options, .. } = question.body() else {
            return;
        };
        if index >= options.len() {
            return;
        }
        match self.scratch.multi_selected.iter().position(|&i| i == index) {
            Some(position) => {
                self.scratch.multi_selected.remove(position);
            }
            None => {
                self.scratch.multi_selected.push(index);
                self.scratch.multi_selected.sort_unstable();
            }
        }
        let selected = self.scratch.multi_selected.clone();
        self.bus.emit(&Event::MultiSelectToggle { selected });
    }

    /// Grade the current multi-select working selection.
    pub fn submit_multi_select(&mut self) {
        if self.state != SessionState::Practicing {
            return;
        }
        let Some(question) = self.questions.get(self.current) else {
            return;
        };
        let QuestionBody::MultiSelect { correct, .. } = question.body() else {
            return;
        };
        let correct_indices = correct.clone();
        let selected = self.scratch.multi_selected.clone();
        let verdict = grading::grade_multi_select(&correct_indices, &selected);
        let feedback = Feedback::for_question(question);
        self.record_answer(verdict, ResponsePayload::MultiSelect { selected });
        self.bus.emit(&Event::MultiSelectResult {
            correct: verdict,
            correct_indices,
            feedback,
        });
        self.set_state(SessionState::Answered);
    }

    /// Move one item of an ordering question from one position to
    /// another within the working order. Out-of-range positions no-op.
    pub fn move_ordering_item(&mut self, from: usize, to: usize) {
        if self.state != SessionState::Practicing {
            return;
        }
        let Some(question) = self.questions.get(self.current) else {
            return;
        };
        if !matches!(question.body(), QuestionBody::Ordering { .. }) {
            return;
        }
        let len = self.scratch.ordering.len();
        if from >= len || to >= len {
            return;
        }
        let item = self.scratch.ordering.remove(from);
        self.scratch.ordering.insert(to, item);
        let order = self.scratch.ordering.clone();
        self.bus.emit(&Event::OrderingUpdate { order });
    }

    /// Grade the current working order of an ordering question.
    pub fn submit_ordering(&mut self) {
        if self.state != SessionState::Practicing {
            return;
        }
        let Some(question) = self.questions.get(self.current) else {
            return;
        };
        let QuestionBody::Ordering { correct_order, .. } = question.body() else {
            return;
        };
        let expected = correct_order.clone();
        let submitted = self.scratch.ordering.clone();
        let verdict = grading::grade_ordering(&expected, &submitted);
        let feedback = Feedback::for_question(question);
        self.record_answer(verdict, ResponsePayload::Ordering { order: submitted });
        self.bus.emit(&Event::OrderingResult {
            correct: verdict,
            correct_order: expected,
            feedback,
        });
        self.set_state(SessionState::Answered);
    }

    /// Bypass the current question without grading it. Tracking data is
    /// untouched. No-op outside `Practicing`.
    pub fn skip(&mut self) {
        self.bypass(false);
    }

    /// Record an externally-driven timeout for the current question.
    /// Tracking data is untouched. No-op outside `Practicing`.
    pub fn timeout(&mut self) {
        self.bypass(true);
    }

    //
    // ─── INTERNALS ─────────────────────────────────────────────────────────────
    //

    fn bypass(&mut self, timed_out: bool) {
        if self.state != SessionState::Practicing {
            return;
        }
        let Some(question) = self.questions.get(self.current) else {
            return;
        };
        let id = question.id().clone();
        let index = self.current;
        let record = if timed_out {
            AnswerRecord::timed_out(id)
        } else {
            AnswerRecord::skipped(id)
        };
        self.answers.push(record);
        let event = if timed_out {
            Event::Timeout { index }
        } else {
            Event::Skip { index }
        };
        self.bus.emit(&event);

        if self.current + 1 < self.questions.len() {
            // practicing -> practicing: same state, next question
            self.current += 1;
            self.reset_scratch();
            self.emit_question_shown();
        } else {
            self.current = self.questions.len();
            self.finish();
        }
    }

    fn record_answer(&mut self, correct: bool, response: ResponsePayload) {
        let id = self.questions[self.current].id().clone();
        let now = self.clock.now();
        self.tracking
            .entry(id.clone())
            .and_modify(|entry| entry.record_attempt(correct, now))
            .or_insert_with(|| TrackingEntry::first_attempt(correct, now));
        self.answers.push(AnswerRecord::graded(id, correct, response));
    }

    fn rebuild_sequence(&mut self) {
        let now = self.clock.now();
        let weights = self
            .pool
            .iter()
            .map(|question| {
                let entry = self.tracking.get(question.id());
                (
                    question.id().clone(),
                    proficiency::sampling_weight(entry, now),
                )
            })
            .collect();
        self.sampler_config.replace_question_weights(weights);
        let sampler = SessionSampler::new(self.sampler_config.clone());
        self.questions = sampler.draw(&self.pool, self.cap).questions;
    }

    fn reset_scratch(&mut self) {
        self.scratch = match self.questions.get(self.current) {
            Some(question) => QuestionScratch::for_question(question),
            None => QuestionScratch::default(),
        };
    }

    fn finish(&mut self) {
        self.set_state(SessionState::Complete);
        let summary = self.session_summary();
        self.bus.emit(&Event::Complete {
            score: summary.score,
            summary,
        });
    }

    fn set_state(&mut self, to: SessionState) {
        let from = self.state;
        if from == to {
            return;
        }
        debug!(%from, %to, "session state change");
        self.state = to;
        self.bus.emit(&Event::StateChange { from, to });
    }

    fn emit_question_shown(&mut self) {
        let Some(question) = self.questions.get(self.current) else {
            return;
        };
        let display_order = display_order_for(question);
        let event = Event::QuestionShown {
            question: question.clone(),
            index: self.current,
            total: self.questions.len(),
            display_order,
        };
        self.bus.emit(&event);
    }
}

/// Shuffled display positions for option-list questions; submissions keep
/// using original indices, so grading is shuffle-agnostic.
fn display_order_for(question: &Question) -> Option<Vec<usize>> {
    let len = match question.body() {
        QuestionBody::MultipleChoice { options, .. }
        | QuestionBody::MultiSelect { options, .. } => options.len(),
        _ => return None,
    };
    let mut order: Vec<usize> = (0..len).collect();
    order.shuffle(&mut rng());
    Some(order)
}

impl fmt::Debug for PracticeSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PracticeSession")
            .field("state", &self.state)
            .field("pool_len", &self.pool.len())
            .field("questions_len", &self.questions.len())
            .field("answers_len", &self.answers.len())
            .field("current", &self.current)
            .field("cap", &self.cap)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use quiz_core::model::Stage;
    use quiz_core::numeric::Tolerance;
    use quiz_core::time::{fixed_clock, fixed_now};

    fn choice(id: &str, correct: usize) -> Question {
        Question::new(
            id,
            QuestionBody::MultipleChoice {
                prompt: format!("prompt {id}"),
                options: vec!["a".into(), "b".into(), "c".into()],
                correct,
            },
        )
        .unwrap()
    }

    fn numeric(id: &str, answer: f64, tolerance: Option<Tolerance>) -> Question {
        Question::new(
            id,
            QuestionBody::Numeric {
                prompt: format!("prompt {id}"),
                answer,
                tolerance,
            },
        )
        .unwrap()
    }

    fn loaded(questions: &[Question]) -> PracticeSession {
        let mut session = PracticeSession::new().with_clock(fixed_clock());
        session.load_questions(questions, None, SessionContext::new(), HashMap::new());
        session
    }

    #[test]
    fn start_is_a_noop_on_an_empty_set() {
        let mut session = loaded(&[]);
        session.start();
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn single_question_session_runs_to_complete() {
        let mut session = loaded(&[choice("q1", 1)]);
        session.start();
        assert_eq!(session.state(), SessionState::Practicing);

        session.submit_option(1);
        assert_eq!(session.state(), SessionState::Answered);
        assert_eq!(session.answers().len(), 1);
        assert!(session.answers()[0].correct);

        session.advance();
        assert_eq!(session.state(), SessionState::Complete);
    }

    #[test]
    fn submission_outside_practicing_is_a_noop() {
        let mut session = loaded(&[choice("q1", 0)]);

        // idle: nothing recorded
        session.submit_option(0);
        assert!(session.answers().is_empty());

        session.start();
        session.submit_option(0);
        assert_eq!(session.answers().len(), 1);

        // answered: the idempotence guard rejects a second submission
        session.submit_option(0);
        session.submit_numeric("1");
        session.submit_multi_select();
        session.submit_ordering();
        assert_eq!(session.answers().len(), 1);
    }

    #[test]
    fn out_of_range_option_index_is_a_noop() {
        let mut session = loaded(&[choice("q1", 0)]);
        session.start();
        session.submit_option(17);
        assert_eq!(session.state(), SessionState::Practicing);
        assert!(session.answers().is_empty());
    }

    #[test]
    fn advance_is_a_noop_outside_answered() {
        let mut session = loaded(&[choice("q1", 0), choice("q2", 0)]);
        session.start();
        session.advance();
        assert_eq!(session.state(), SessionState::Practicing);
        assert_eq!(session.current_index(), 0);
    }

    #[test]
    fn numeric_submission_grades_and_records_raw_text() {
        let mut session = loaded(&[numeric("n1", 5000.0, Some(Tolerance::Relative(0.01)))]);
        session.start();
        session.submit_numeric("5K");
        assert!(session.answers()[0].correct);
        match &session.answers()[0].response {
            ResponsePayload::Numeric { raw, parsed } => {
                assert_eq!(raw, "5K");
                assert_eq!(*parsed, Some(5000.0));
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn ordering_moves_then_grades_final_permutation() {
        let question = Question::new(
            "o1",
            QuestionBody::Ordering {
                prompt: "sort".into(),
                items: vec!["x".into(), "y".into(), "z".into()],
                correct_order: vec![0, 1, 2],
            },
        )
        .unwrap();
        let mut session = loaded(&[question]);
        session.start();

        session.move_ordering_item(0, 2); // [1, 2, 0]
        session.move_ordering_item(5, 0); // out of range, no-op
        session.submit_ordering();

        assert!(!session.answers()[0].correct);
        match &session.answers()[0].response {
            ResponsePayload::Ordering { order } => assert_eq!(order, &[1, 2, 0]),
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn multi_select_toggle_and_submit() {
        let question = Question::new(
            "m1",
            QuestionBody::MultiSelect {
                prompt: "pick".into(),
                options: vec!["a".into(), "b".into(), "c".into()],
                correct: vec![0, 2],
            },
        )
        .unwrap();
        let mut session = loaded(&[question]);
        session.start();

        session.toggle_multi_select(0);
        session.toggle_multi_select(1);
        session.toggle_multi_select(2);
        session.toggle_multi_select(1); // toggle back off
        session.submit_multi_select();

        assert!(session.answers()[0].correct);
    }

    #[test]
    fn two_stage_intermediate_keeps_practicing_and_conjunction_grades() {
        let stages = vec![
            Stage::new("first", vec!["a".into(), "b".into()], 0).unwrap(),
            Stage::new("second", vec!["c".into(), "d".into()], 1).unwrap(),
        ];
        let question = Question::new("t1", QuestionBody::TwoStage { stages }).unwrap();
        let mut session = loaded(&[question]);
        session.start();

        session.submit_option(1); // stage 1 wrong
        assert_eq!(session.state(), SessionState::Practicing);
        assert!(session.answers().is_empty());

        session.submit_option(1); // stage 2 right
        assert_eq!(session.state(), SessionState::Answered);
        assert!(!session.answers()[0].correct, "conjunction must fail");
    }

    #[test]
    fn two_stage_advance_carries_the_continuity_payload() {
        let stages = vec![
            Stage::new("up or down?", vec!["up".into(), "down".into()], 0).unwrap(),
            Stage::new("by how much?", vec!["a little".into(), "a lot".into()], 1).unwrap(),
        ];
        let question = Question::new("t1", QuestionBody::TwoStage { stages }).unwrap();
        let mut session = loaded(&[question]);

        let advances = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&advances);
        session.subscribe(EventKind::TwoStageAdvance, move |event| {
            sink.borrow_mut().push(event.clone());
        });

        session.start();
        session.submit_option(1); // intermediate stage, wrong pick

        let advances = advances.borrow();
        assert_eq!(advances.len(), 1);
        match &advances[0] {
            Event::TwoStageAdvance {
                stage_index,
                outcome,
                chosen_text,
                next_prompt,
                ..
            } => {
                assert_eq!(*stage_index, 0);
                assert_eq!(outcome.selected, 1);
                assert!(!outcome.correct);
                assert_eq!(chosen_text, "down");
                assert_eq!(next_prompt, "by how much?");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn multi_select_toggles_emit_the_sorted_working_set() {
        let question = Question::new(
            "m1",
            QuestionBody::MultiSelect {
                prompt: "pick".into(),
                options: vec!["a".into(), "b".into(), "c".into()],
                correct: vec![0, 2],
            },
        )
        .unwrap();
        let mut session = loaded(&[question]);

        let selections = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&selections);
        session.subscribe(EventKind::MultiSelectToggle, move |event| {
            if let Event::MultiSelectToggle { selected } = event {
                sink.borrow_mut().push(selected.clone());
            }
        });

        session.start();
        session.toggle_multi_select(2);
        session.toggle_multi_select(0);
        session.toggle_multi_select(2); // toggle back off

        assert_eq!(*selections.borrow(), vec![vec![2], vec![0, 2], vec![0]]);
    }

    #[test]
    fn ordering_moves_emit_the_new_working_order() {
        let question = Question::new(
            "o1",
            QuestionBody::Ordering {
                prompt: "sort".into(),
                items: vec!["x".into(), "y".into(), "z".into()],
                correct_order: vec![0, 1, 2],
            },
        )
        .unwrap();
        let mut session = loaded(&[question]);

        let orders = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&orders);
        session.subscribe(EventKind::OrderingUpdate, move |event| {
            if let Event::OrderingUpdate { order } = event {
                sink.borrow_mut().push(order.clone());
            }
        });

        session.start();
        session.move_ordering_item(0, 2); // [1, 2, 0]
        session.move_ordering_item(2, 0); // back to [0, 1, 2]
        session.move_ordering_item(5, 0); // out of range, nothing emitted

        assert_eq!(*orders.borrow(), vec![vec![1, 2, 0], vec![0, 1, 2]]);
    }

    #[test]
    fn skip_advances_without_touching_tracking() {
        let mut session = loaded(&[choice("q1", 0), choice("q2", 0)]);
        session.start();

        session.skip();
        assert_eq!(session.state(), SessionState::Practicing);
        assert_eq!(session.current_index(), 1);
        assert!(session.tracking().is_empty());

        session.skip();
        assert_eq!(session.state(), SessionState::Complete);
        assert_eq!(session.answers().len(), 2);
        assert!(session.answers().iter().all(|a| a.skipped));
    }

    #[test]
    fn graded_attempts_update_tracking() {
        let mut session = loaded(&[choice("q1", 1)]);
        session.start();
        session.submit_option(1);

        let entry = session.tracking().get(&QuestionId::new("q1")).unwrap();
        assert_eq!(entry.seen_count, 1);
        assert_eq!(entry.correct_count, 1);
        assert_eq!(entry.last_seen, fixed_now());
    }

    #[test]
    fn reset_clears_everything_back_to_idle() {
        let mut session = loaded(&[choice("q1", 0)]);
        session.start();
        session.submit_option(0);
        session.reset();

        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.answers().is_empty());
        assert!(session.questions().is_empty());
        assert!(session.tracking().is_empty());
        // after reset even retry has nothing to redraw from
        session.retry();
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn retry_redraws_and_reenters_practicing_directly() {
        let mut session = loaded(&[choice("q1", 0), choice("q2", 0)]);
        session.start();
        session.submit_option(0);
        session.advance();
        session.submit_option(0);
        session.advance();
        assert_eq!(session.state(), SessionState::Complete);

        session.retry();
        assert_eq!(session.state(), SessionState::Practicing);
        assert!(session.answers().is_empty());
        assert_eq!(session.questions().len(), 2);
    }

    #[test]
    fn snapshot_restore_resume_continues_mid_session() {
        let mut session = loaded(&[choice("q1", 0), choice("q2", 0)]);
        session.start();
        session.submit_option(0);
        session.advance();

        let snapshot = session.snapshot();
        assert_eq!(snapshot.answers.len(), 1);

        let second_id = session.questions()[1].id().clone();
        let mut restored = PracticeSession::new().with_clock(fixed_clock());
        restored.restore(snapshot);
        restored.resume();
        assert_eq!(restored.state(), SessionState::Practicing);
        assert_eq!(restored.current_index(), 1);
        assert_eq!(restored.current_question().unwrap().id(), &second_id);
    }

    #[test]
    fn resuming_a_fully_answered_snapshot_completes_immediately() {
        let mut session = loaded(&[choice("q1", 0)]);
        session.start();
        session.submit_option(0);
        session.advance();

        let snapshot = session.snapshot();
        let mut restored = PracticeSession::new().with_clock(fixed_clock());
        restored.restore(snapshot);
        restored.resume();
        assert_eq!(restored.state(), SessionState::Complete);
    }

    #[test]
    fn all_skipped_session_scores_zero_of_zero() {
        let mut session = loaded(&[choice("a", 0), choice("b", 0), choice("c", 0)]);
        session.start();
        session.skip();
        session.skip();
        session.skip();

        assert_eq!(session.state(), SessionState::Complete);
        let summary = session.session_summary();
        assert_eq!(summary.score.correct, 0);
        assert_eq!(summary.score.total, 0);
        assert_eq!(summary.score.skipped, 3);
        assert_eq!(summary.score.percentage, 0);
    }
}
