//! Per-frame composition shared by preview and export.
//!
//! A [`FrameComposer`] turns `(timeline, t)` into [`FrameInstructions`]: it locates the active
//! step, diffs the step's previous and next visible lines, moves its own scrolling window, and
//! samples the animation curves for every row that ends up on screen.

use crate::animation::curves::{self, CurveSample, Transition, code_progress};
use crate::animation::typewriter::{Reveal, Sequencing, reveal_lines};
use crate::code::source::{CodeListing, CodeSource};
use crate::code::tokenize::{KeywordTokenizer, SyntaxTokenizer};
use crate::deck::model::{AnimationStyle, Slide};
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::instructions::{FrameInstructions, LineState, RenderedLine, ScrollAnimation};
use crate::timeline::scheduler::{Timeline, validate_speed};
use crate::timeline::visibility::{self, LineDiff, NumberedLine, clamp_to_code};
use crate::window::scrolling::{
    DEFAULT_MAX_LINES, Numbering, ScrollChange, ScrollType, ScrollingWindow, display_numbers,
    numbering_for,
};
use serde::{Deserialize, Serialize};

/// What to draw for times at or past the end of the last step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TailPolicy {
    /// Freeze on the final state of the last step.
    #[default]
    HoldLast,
    /// Draw an empty frame.
    Blank,
}

/// Composer settings. Preview and export must use equal configs to produce equal frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ComposerConfig {
    pub max_lines: u32,
    pub tail_policy: TailPolicy,
    pub sequencing: Sequencing,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            max_lines: DEFAULT_MAX_LINES,
            tail_policy: TailPolicy::default(),
            sequencing: Sequencing::default(),
        }
    }
}

/// One transition to sample: `prev -> next` at `progress`.
struct StepFrame<'a> {
    prev: &'a [u32],
    next: &'a [u32],
    style: AnimationStyle,
    progress: f64,
    /// Transition finished: leaving rows are gone and everything is stable.
    settled: bool,
}

/// Stateful frame builder. Owns the window state of exactly one session.
#[derive(Clone, Debug)]
pub struct FrameComposer {
    cfg: ComposerConfig,
    window: ScrollingWindow,
    active_step: Option<usize>,
    /// Last window move and the time it started.
    scroll: Option<(ScrollChange, f64)>,
}

impl Default for FrameComposer {
    fn default() -> Self {
        Self {
            cfg: ComposerConfig::default(),
            window: ScrollingWindow::default(),
            active_step: None,
            scroll: None,
        }
    }
}

impl FrameComposer {
    pub fn new(cfg: ComposerConfig) -> ReelResult<Self> {
        Ok(Self {
            cfg,
            window: ScrollingWindow::new(cfg.max_lines)?,
            active_step: None,
            scroll: None,
        })
    }

    pub fn config(&self) -> ComposerConfig {
        self.cfg
    }

    pub fn window(&self) -> &ScrollingWindow {
        &self.window
    }

    /// Forget the active step and restore the default window.
    pub fn reset(&mut self) {
        self.window.reset();
        self.active_step = None;
        self.scroll = None;
    }

    /// Compose the frame at `t_ms`.
    pub fn compose(
        &mut self,
        timeline: &Timeline,
        code: &dyn CodeSource,
        tokenizer: &dyn SyntaxTokenizer,
        language: &str,
        t_ms: f64,
    ) -> FrameInstructions {
        let (step_index, progress, settled) = match timeline.locate(t_ms) {
            Some(loc) => (loc.step_index, loc.local_progress, false),
            None => match self.tail_step(timeline, t_ms) {
                Some(idx) => (idx, 1.0, true),
                None => return self.blank(t_ms),
            },
        };
        let Some(step) = timeline.step(step_index) else {
            return self.blank(t_ms);
        };

        let total_lines = code.line_count();
        let next = clamp_to_code(&step.visible_lines, total_lines);
        let prev = clamp_to_code(&step.previous_visible_lines(), total_lines);

        if self.active_step != Some(step_index) {
            let sequential = match self.active_step {
                Some(active) => active + 1 == step_index,
                None => step_index == 0,
            };
            if !sequential {
                // Rebuild the window the previous step would have left behind.
                self.window.reset();
                self.window.set_window_for_lines(&prev, total_lines);
            }
            let change = self.window.set_window_for_lines(&next, total_lines);
            self.scroll =
                (change.scroll_type != ScrollType::None).then_some((change, step.start_ms));
            self.active_step = Some(step_index);
        }

        let scroll = self.scroll.map(|(change, started_ms)| ScrollAnimation {
            scroll_type: change.scroll_type,
            from_start: change.from_start,
            to_start: change.to_start,
            progress: ((t_ms - started_ms) / change.duration_ms).clamp(0.0, 1.0),
        });

        let frame = StepFrame {
            prev: &prev,
            next: &next,
            style: step.animation_style,
            progress,
            settled,
        };
        let (numbering, lines) = self.rows(code, tokenizer, language, &frame);

        FrameInstructions {
            time_ms: t_ms,
            step_index: Some(step_index),
            style: Some(step.animation_style),
            window: self.window.state(),
            scroll,
            numbering,
            lines,
        }
    }

    fn tail_step(&self, timeline: &Timeline, t_ms: f64) -> Option<usize> {
        let past_end = t_ms >= timeline.total_duration_ms();
        match self.cfg.tail_policy {
            TailPolicy::HoldLast if past_end => timeline.steps().len().checked_sub(1),
            _ => None,
        }
    }

    fn blank(&mut self, t_ms: f64) -> FrameInstructions {
        if self.active_step.take().is_some() {
            tracing::debug!(t_ms, "no active step; composing blank frame");
        }
        self.scroll = None;
        FrameInstructions::blank(t_ms, self.window.state())
    }

    fn rows(
        &self,
        code: &dyn CodeSource,
        tokenizer: &dyn SyntaxTokenizer,
        language: &str,
        frame: &StepFrame<'_>,
    ) -> (Numbering, Vec<RenderedLine>) {
        let diff = visibility::diff(frame.prev, frame.next, code);
        let mut rows = self.collect_rows(&diff, frame.settled);

        let max = self.window.max_lines() as usize;
        while rows.len() > max {
            match rows.iter().rposition(|(_, s)| *s == LineState::Leaving) {
                Some(i) => {
                    rows.remove(i);
                }
                None => {
                    rows.truncate(max);
                }
            }
        }

        let reveals = if frame.style == AnimationStyle::Typewriter && !frame.settled {
            let lens: Vec<usize> = rows
                .iter()
                .filter(|(_, s)| *s == LineState::Entering)
                .map(|(l, _)| l.content.chars().count())
                .collect();
            reveal_lines(&lens, code_progress(frame.progress), self.cfg.sequencing)
        } else {
            Vec::new()
        };
        let mut reveals = reveals.into_iter();

        let numbers: Vec<u32> = rows.iter().map(|(l, _)| l.number).collect();
        let numbering = numbering_for(&numbers);
        let display = display_numbers(&numbers, numbering);

        let lines = rows
            .into_iter()
            .zip(display)
            .map(|((line, state), display_line_number)| {
                let sample = match state {
                    LineState::Entering => {
                        curves::sample(frame.style, frame.progress, Transition::Entering)
                    }
                    LineState::Leaving => {
                        curves::sample(frame.style, frame.progress, Transition::Leaving)
                    }
                    LineState::Stable => CurveSample::STABLE,
                };
                let reveal: Option<Reveal> = if state == LineState::Entering {
                    reveals.next()
                } else {
                    None
                };
                RenderedLine {
                    display_line_number,
                    actual_line_number: line.number,
                    tokens: tokenizer.tokenize(&line.content, language),
                    content: line.content.clone(),
                    opacity: sample.opacity,
                    animation_state: state,
                    line_number_opacity: sample.line_number_opacity,
                    typewriter_progress: reveal.map(|r| r.progress),
                    visible_chars: reveal.map(|r| r.visible_chars),
                    offset_x: sample.offset_x,
                    highlight: sample.highlight,
                }
            })
            .collect();

        (numbering, lines)
    }

    /// Rows of `next ∪ removed` inside the window, ascending by line number.
    fn collect_rows<'d>(
        &self,
        diff: &'d LineDiff,
        settled: bool,
    ) -> Vec<(&'d NumberedLine, LineState)> {
        let leaving: &[NumberedLine] = if settled { &[] } else { &diff.removed };
        let entering_state = if settled {
            LineState::Stable
        } else {
            LineState::Entering
        };
        let mut rows: Vec<(&NumberedLine, LineState)> = diff
            .added
            .iter()
            .map(|l| (l, entering_state))
            .chain(diff.kept.iter().map(|l| (l, LineState::Stable)))
            .chain(leaving.iter().map(|l| (l, LineState::Leaving)))
            .filter(|(l, _)| self.window.is_visible(l.number))
            .collect();
        rows.sort_by_key(|(l, _)| l.number);
        rows
    }
}

/// Compose the rows of a single `from -> to` transition at `progress`.
///
/// Standalone preview entry point: builds a fresh window positioned as if `from_slide` had just
/// been shown. `global_speed` is validated but does not change the result, since `progress` is
/// already normalized.
pub fn render_preview_frame(
    code: &str,
    language: &str,
    from_slide: Option<&Slide>,
    to_slide: &Slide,
    progress: f64,
    global_speed: f64,
) -> ReelResult<Vec<RenderedLine>> {
    validate_speed(global_speed)?;
    if !progress.is_finite() {
        return Err(ReelError::validation(format!(
            "preview progress must be finite (got {progress})"
        )));
    }
    to_slide.validate()?;
    if let Some(from) = from_slide {
        from.validate()?;
    }

    let listing = CodeListing::from_text(code);
    let total_lines = listing.line_count();
    let prev = from_slide
        .map(|s| visibility::visible_lines(s, total_lines))
        .unwrap_or_default();
    let next = visibility::visible_lines(to_slide, total_lines);

    let mut composer = FrameComposer::default();
    composer.window.set_window_for_lines(&prev, total_lines);
    composer.window.set_window_for_lines(&next, total_lines);

    let frame = StepFrame {
        prev: &prev,
        next: &next,
        style: to_slide.animation_style,
        progress: progress.clamp(0.0, 1.0),
        settled: false,
    };
    let (_, lines) = composer.rows(&listing, &KeywordTokenizer, language, &frame);
    Ok(lines)
}

#[cfg(test)]
#[path = "../../tests/unit/render/compose.rs"]
mod tests;
