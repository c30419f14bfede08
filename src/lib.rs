//! codereel turns a code listing and an ordered list of slides into an animated walkthrough.
//!
//! The engine is built around one shared per-frame pipeline:
//!
//! - Schedule slides on a [`Timeline`] and locate the active step at any time
//! - Diff the visible line sets of consecutive steps and fit them into a [`ScrollingWindow`]
//! - Sample the per-style animation curves into [`FrameInstructions`]
//!
//! Live playback ([`PreviewSession`]) and offline export ([`ExportEngine`]) both drive that
//! pipeline, so a frame scrubbed to `t` matches the exported frame sampled at `t`.
#![forbid(unsafe_code)]

mod foundation;

pub mod animation;
pub mod code;
pub mod deck;
/// Media encoders (MP4/WebM through `ffmpeg`, animated GIF).
pub mod encode;
pub mod export;
pub mod preview;
pub mod render;
pub mod timeline;
pub mod window;

pub use crate::foundation::core::{Canvas, Fps, FrameIndex, Rgba8};
pub use crate::foundation::error::{ReelError, ReelResult};

pub use crate::animation::typewriter::Sequencing;
pub use crate::code::source::{CodeListing, CodeSource};
pub use crate::code::tokenize::{
    KeywordTokenizer, PlainTokenizer, SyntaxToken, SyntaxTokenizer, TokenKind,
};
pub use crate::deck::file::Deck;
pub use crate::deck::model::{AnimationStyle, LineRange, Slide};
pub use crate::encode::encoder::{
    EncodeConfig, InMemoryEncoder, MediaEncoder, OutputFormat, StandardEncoder,
};
pub use crate::encode::ffmpeg::{FfmpegEncoder, FfmpegEncoderOpts};
pub use crate::encode::gif::{GifEncoder, GifEncoderOpts};
pub use crate::export::gate::CancelToken;
pub use crate::export::options::{ExportOptions, TailPolicy};
pub use crate::export::progress::{ExportError, ExportErrorKind, ExportPhase, ExportProgress};
pub use crate::export::session::{ExportArtifact, ExportEngine, ExportJob, ExportRequest};
pub use crate::preview::session::PreviewSession;
pub use crate::render::backend::{FrameRGBA, RenderingSurface};
pub use crate::render::compose::{ComposerConfig, FrameComposer, render_preview_frame};
pub use crate::render::cpu::{CpuSurface, CpuSurfaceOpts, Theme};
pub use crate::render::instructions::{FrameInstructions, LineState, RenderedLine};
pub use crate::timeline::scheduler::{
    Located, Timeline, TimelineStep, compute_timeline_steps, compute_timeline_steps_for_code,
};
pub use crate::window::scrolling::{Numbering, ScrollType, ScrollingWindow, WindowState};
