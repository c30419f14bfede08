//! Live playback and scrubbing over the shared frame composer.

pub mod session;
