mod answer;
mod ids;
mod question;
mod summary;
mod tracking;

pub use answer::{AnswerRecord, ResponsePayload, StageOutcome};
pub use ids::QuestionId;
pub use question::{Question, QuestionBody, QuestionError, QuestionKind, Stage};
pub use summary::{
    BreakdownEntry, QuestionResult, ScoreBlock, SessionContext, SessionSummary, percent,
};
pub use tracking::TrackingEntry;
