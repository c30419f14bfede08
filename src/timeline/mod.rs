//! Slide scheduling and line-visibility sets.

pub mod scheduler;
pub mod visibility;
