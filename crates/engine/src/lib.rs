#![forbid(unsafe_code)]

pub mod error;
pub mod events;
pub mod plan;
pub mod session;
pub mod stats;

pub use quiz_core::Clock;

pub use error::SummaryIssue;
pub use events::{Event, EventBus, EventKind, ListenerId};
pub use plan::{SamplerConfig, SessionPlan, SessionSampler};
pub use session::{PracticeSession, SessionProgress, SessionSnapshot, SessionState};
pub use stats::{AggregateStats, MissedQuestion, TrendPoint};
