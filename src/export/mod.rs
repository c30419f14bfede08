//! Export pipeline: sample the timeline, render every frame, encode, report progress.

pub mod gate;
pub mod options;
pub mod progress;
pub mod session;
