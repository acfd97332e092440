//! Typed, synchronous observer registry.
//!
//! No event loop: `emit` runs every listener registered for the event's
//! kind, in registration order, before returning to the caller.

use std::fmt;

use quiz_core::grading::Feedback;
use quiz_core::model::{Question, ScoreBlock, SessionSummary, StageOutcome};

use crate::session::SessionState;

//
// ─── EVENT KINDS & PAYLOADS ────────────────────────────────────────────────────
//

/// Names of the observable transitions and outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    StateChange,
    QuestionShown,
    OptionResult,
    TwoStageAdvance,
    NumericResult,
    MultiSelectToggle,
    MultiSelectResult,
    OrderingUpdate,
    OrderingResult,
    Skip,
    Timeout,
    Complete,
}

/// Payload for one emitted event, one variant per [`EventKind`].
#[derive(Debug, Clone)]
pub enum Event {
    StateChange {
        from: SessionState,
        to: SessionState,
    },
    QuestionShown {
        question: Question,
        index: usize,
        total: usize,
        /// Shuffled display positions of the original option indices, when
        /// the current question's options are shown shuffled.
        display_order: Option<Vec<usize>>,
    },
    OptionResult {
        correct: bool,
        correct_index: usize,
        feedback: Feedback,
    },
    TwoStageAdvance {
        stage_index: usize,
        outcome: StageOutcome,
        /// Text of the option the user chose, for continuity display.
        chosen_text: String,
        /// Prompt of the stage about to be shown.
        next_prompt: String,
        feedback: Feedback,
    },
    NumericResult {
        correct: bool,
        answer: f64,
        parsed: Option<f64>,
        feedback: Feedback,
    },
    MultiSelectToggle {
        selected: Vec<usize>,
    },
    MultiSelectResult {
        correct: bool,
        correct_indices: Vec<usize>,
        feedback: Feedback,
    },
    OrderingUpdate {
        order: Vec<usize>,
    },
    OrderingResult {
        correct: bool,
        correct_order: Vec<usize>,
        feedback: Feedback,
    },
    Skip {
        index: usize,
    },
    Timeout {
        index: usize,
    },
    Complete {
        score: ScoreBlock,
        summary: SessionSummary,
    },
}

impl Event {
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Event::StateChange { .. } => EventKind::StateChange,
            Event::QuestionShown { .. } => EventKind::QuestionShown,
            Event::OptionResult { .. } => EventKind::OptionResult,
            Event::TwoStageAdvance { .. } => EventKind::TwoStageAdvance,
            Event::NumericResult { .. } => EventKind::NumericResult,
            Event::MultiSelectToggle { .. } => EventKind::MultiSelectToggle,
            Event::MultiSelectResult { .. } => EventKind::MultiSelectResult,
            Event::OrderingUpdate { .. } => EventKind::OrderingUpdate,
            Event::OrderingResult { .. } => EventKind::OrderingResult,
            Event::Skip { .. } => EventKind::Skip,
            Event::Timeout { .. } => EventKind::Timeout,
            Event::Complete { .. } => EventKind::Complete,
        }
    }
}

//
// ─── BUS ───────────────────────────────────────────────────────────────────────
//

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Callback = Box<dyn FnMut(&Event)>;

/// Per-kind listener registry.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<(ListenerId, EventKind, Callback)>,
    next_id: u64,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for one event kind.
    pub fn subscribe(
        &mut self,
        kind: EventKind,
        callback: impl FnMut(&Event) + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, kind, Box::new(callback)));
        id
    }

    /// Remove a listener. Returns false when the id is unknown.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener, _, _)| *listener != id);
        self.listeners.len() != before
    }

    /// Invoke every listener registered for this event's kind, in
    /// registration order, synchronously.
    pub fn emit(&mut self, event: &Event) {
        let kind = event.kind();
        for (_, registered, callback) in &mut self.listeners {
            if *registered == kind {
                callback(event);
            }
        }
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .field("next_id", &self.next_id)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
