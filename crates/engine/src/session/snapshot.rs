use quiz_core::model::{AnswerRecord, Question, SessionContext};

/// Deep copy of a session's resumable state.
///
/// Restoring a snapshot re-installs the question sequence exactly as it
/// was drawn — no re-shuffle — so the answer log stays position-aligned.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub questions: Vec<Question>,
    pub answers: Vec<AnswerRecord>,
    pub context: SessionContext,
    pub cap: Option<usize>,
}
