//! Slides, line ranges and the JSON deck loader.

pub mod file;
pub mod model;
