use crate::deck::model::{AnimationStyle, Slide, ordered_slides, validate_slides};
use crate::foundation::error::{ReelError, ReelResult};
use crate::timeline::visibility::{diff_numbers, expand_within};
use serde::Serialize;

/// Derived scheduling record for one slide.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TimelineStep {
    /// Position of the slide in scheduling order.
    pub slide_index: usize,
    pub slide_id: String,
    /// Absolute start time (ms) after speed scaling.
    pub start_ms: f64,
    /// Effective duration (ms) after speed scaling; always > 0.
    pub duration_ms: f64,
    pub animation_style: AnimationStyle,
    /// Lines visible in this step but not the previous one.
    pub lines_to_add: Vec<u32>,
    /// Lines visible in the previous step but not this one.
    pub lines_to_remove: Vec<u32>,
    /// Sorted, deduplicated lines this step shows. Clipped to the code length when the
    /// timeline was built with one.
    pub visible_lines: Vec<u32>,
}

impl TimelineStep {
    pub fn end_ms(&self) -> f64 {
        self.start_ms + self.duration_ms
    }

    /// Visible lines of the previous step, reconstructed from this step's deltas.
    pub fn previous_visible_lines(&self) -> Vec<u32> {
        let mut prev: Vec<u32> = self
            .visible_lines
            .iter()
            .copied()
            .filter(|n| self.lines_to_add.binary_search(n).is_err())
            .chain(self.lines_to_remove.iter().copied())
            .collect();
        prev.sort_unstable();
        prev
    }
}

/// `duration / global_speed`.
pub fn effective_duration_ms(duration_ms: u64, global_speed: f64) -> f64 {
    duration_ms as f64 / global_speed
}

pub(crate) fn validate_speed(global_speed: f64) -> ReelResult<()> {
    if !global_speed.is_finite() || global_speed <= 0.0 {
        return Err(ReelError::validation(format!(
            "global speed must be finite and > 0 (got {global_speed})"
        )));
    }
    Ok(())
}

/// Convert a slide list and speed multiplier into absolute time spans.
///
/// Line sets are the plain expansion of each slide's ranges. Prefer
/// [`compute_timeline_steps_for_code`] when the code length is known.
pub fn compute_timeline_steps(slides: &[Slide], global_speed: f64) -> ReelResult<Vec<TimelineStep>> {
    build_steps(slides, global_speed, u32::MAX)
}

/// [`compute_timeline_steps`] with every line set clipped to `[1, code_line_count]`.
///
/// Ranges are cut before expansion, so the work per slide is bounded by the code length.
pub fn compute_timeline_steps_for_code(
    slides: &[Slide],
    global_speed: f64,
    code_line_count: u32,
) -> ReelResult<Vec<TimelineStep>> {
    build_steps(slides, global_speed, code_line_count)
}

#[tracing::instrument(skip(slides), fields(slides = slides.len()))]
fn build_steps(
    slides: &[Slide],
    global_speed: f64,
    line_limit: u32,
) -> ReelResult<Vec<TimelineStep>> {
    validate_speed(global_speed)?;
    validate_slides(slides)?;

    let mut steps = Vec::with_capacity(slides.len());
    let mut cursor = 0.0f64;
    let mut prev_visible: Vec<u32> = Vec::new();
    for (slide_index, slide) in ordered_slides(slides).into_iter().enumerate() {
        let visible = expand_within(&slide.line_ranges, line_limit);
        let (added, removed, _) = diff_numbers(&prev_visible, &visible);
        let duration_ms = effective_duration_ms(slide.duration_ms, global_speed);
        steps.push(TimelineStep {
            slide_index,
            slide_id: slide.id.clone(),
            start_ms: cursor,
            duration_ms,
            animation_style: slide.animation_style,
            lines_to_add: added,
            lines_to_remove: removed,
            visible_lines: visible.clone(),
        });
        cursor += duration_ms;
        prev_visible = visible;
    }
    Ok(steps)
}

/// Active step and progress through it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Located {
    pub step_index: usize,
    /// `(t − start) / duration`, in `[0, 1)`.
    pub local_progress: f64,
}

/// Immutable schedule shared by preview, scrubbing and export.
#[derive(Clone, Debug)]
pub struct Timeline {
    steps: Vec<TimelineStep>,
    global_speed: f64,
    total_ms: f64,
}

impl Timeline {
    pub fn new(slides: &[Slide], global_speed: f64) -> ReelResult<Self> {
        Ok(Self::from_steps(
            compute_timeline_steps(slides, global_speed)?,
            global_speed,
        ))
    }

    /// Schedule `slides` against a listing of `code_line_count` lines. Line sets are clipped to
    /// the listing, so a range like `1..=u32::MAX` costs no more than the code itself.
    pub fn for_code(
        slides: &[Slide],
        global_speed: f64,
        code_line_count: u32,
    ) -> ReelResult<Self> {
        Ok(Self::from_steps(
            compute_timeline_steps_for_code(slides, global_speed, code_line_count)?,
            global_speed,
        ))
    }

    fn from_steps(steps: Vec<TimelineStep>, global_speed: f64) -> Self {
        let total_ms = steps.iter().map(|s| s.duration_ms).sum();
        Self {
            steps,
            global_speed,
            total_ms,
        }
    }

    pub fn steps(&self) -> &[TimelineStep] {
        &self.steps
    }

    pub fn step(&self, idx: usize) -> Option<&TimelineStep> {
        self.steps.get(idx)
    }

    pub fn global_speed(&self) -> f64 {
        self.global_speed
    }

    /// Sum of all effective step durations (ms).
    pub fn total_duration_ms(&self) -> f64 {
        self.total_ms
    }

    /// Find the step whose `[start, start + duration)` contains `t_ms`.
    ///
    /// Returns `None` for `t_ms < 0`, `t_ms >= total_duration_ms()` and NaN.
    pub fn locate(&self, t_ms: f64) -> Option<Located> {
        if !(t_ms >= 0.0 && t_ms < self.total_ms) {
            return None;
        }
        // Last step whose start is <= t.
        let idx = self
            .steps
            .partition_point(|s| s.start_ms <= t_ms)
            .checked_sub(1)?;
        let step = &self.steps[idx];
        if t_ms >= step.end_ms() {
            return None;
        }
        Some(Located {
            step_index: idx,
            local_progress: (t_ms - step.start_ms) / step.duration_ms,
        })
    }

    /// Scrubbing entry point; identical to [`Timeline::locate`].
    pub fn seek(&self, t_ms: f64) -> Option<Located> {
        self.locate(t_ms)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/scheduler.rs"]
mod tests;
