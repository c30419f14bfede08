use crate::code::tokenize::SyntaxToken;
use crate::deck::model::AnimationStyle;
use crate::window::scrolling::{Numbering, ScrollType, WindowState};
use serde::Serialize;

/// Transition state of one rendered row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineState {
    Entering,
    Leaving,
    Stable,
}

/// One row of a composed frame.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RenderedLine {
    /// Number shown in the gutter (actual or sequential).
    pub display_line_number: u32,
    pub actual_line_number: u32,
    pub content: String,
    pub tokens: Vec<SyntaxToken>,
    pub opacity: f64,
    pub animation_state: LineState,
    pub line_number_opacity: f64,
    /// Set only for typewriter rows that are entering.
    pub typewriter_progress: Option<f64>,
    pub visible_chars: Option<usize>,
    /// Lateral shift as a fraction of the surface's slide distance.
    pub offset_x: f64,
    pub highlight: f64,
}

impl RenderedLine {
    /// Text the surface should actually draw.
    pub fn visible_text(&self) -> &str {
        match self.visible_chars {
            Some(n) => crate::animation::typewriter::visible_prefix(&self.content, n),
            None => &self.content,
        }
    }
}

/// In-flight window scroll.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ScrollAnimation {
    pub scroll_type: ScrollType,
    pub from_start: u32,
    pub to_start: u32,
    /// `elapsed / 300 ms`, clamped to `[0, 1]`.
    pub progress: f64,
}

/// Everything a [`crate::render::backend::RenderingSurface`] needs to draw one frame.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FrameInstructions {
    pub time_ms: f64,
    /// `None` for blank frames (no active step).
    pub step_index: Option<usize>,
    pub style: Option<AnimationStyle>,
    pub window: WindowState,
    pub scroll: Option<ScrollAnimation>,
    pub numbering: Numbering,
    /// Rows in display order; never more than `window.max_lines`.
    pub lines: Vec<RenderedLine>,
}

impl FrameInstructions {
    /// A frame with nothing on it.
    pub fn blank(time_ms: f64, window: WindowState) -> Self {
        Self {
            time_ms,
            step_index: None,
            style: None,
            window,
            scroll: None,
            numbering: Numbering::Actual,
            lines: Vec::new(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.lines.is_empty()
    }
}
