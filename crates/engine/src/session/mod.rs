mod progress;
mod snapshot;
mod state;
mod summary;

pub use progress::SessionProgress;
pub use snapshot::SessionSnapshot;
pub use state::{PracticeSession, SessionState};
