//! Media encoders.
//!
//! Encoders receive the full ordered frame sequence of an export and return artifact bytes.

/// Encoder trait, format routing and the in-memory test encoder.
pub mod encoder;
/// `ffmpeg`-based MP4/WebM encoder.
pub mod ffmpeg;
/// Animated GIF encoder.
pub mod gif;
