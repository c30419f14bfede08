//! Animation curves and typewriter sequencing.

pub mod curves;
pub mod typewriter;
