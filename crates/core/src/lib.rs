#![forbid(unsafe_code)]

pub mod grading;
pub mod model;
pub mod numeric;
pub mod proficiency;
pub mod time;

pub use time::Clock;
