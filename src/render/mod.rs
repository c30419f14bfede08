//! Frame composition and rasterization.

pub mod backend;
pub mod compose;
pub mod cpu;
pub mod instructions;
pub(crate) mod text;
