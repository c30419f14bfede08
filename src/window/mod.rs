//! Fixed-capacity scrolling viewport.

pub mod scrolling;
