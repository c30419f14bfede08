//! Per-style opacity curves.
//!
//! Every transition reserves its first 15% for the line-number fade; the remaining 85% is
//! rescaled to `[0, 1]` as "code progress" and drives content. All functions here are pure.

use crate::deck::model::AnimationStyle;
use serde::{Deserialize, Serialize};

/// Fraction of a transition reserved for the line-number fade.
pub const LINE_NUMBER_PHASE: f64 = 0.15;

/// Opacity ramp multiplier for the `slide` style.
pub const SLIDE_RAMP: f64 = 1.5;

/// Whether a line is appearing or disappearing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transition {
    Entering,
    Leaving,
}

/// Rescale transition progress past the line-number phase to `[0, 1]`.
pub fn code_progress(progress: f64) -> f64 {
    ((progress - LINE_NUMBER_PHASE) / (1.0 - LINE_NUMBER_PHASE)).clamp(0.0, 1.0)
}

/// Gutter opacity: fades in over the first 15%, out over the last 15%.
pub fn line_number_opacity(progress: f64, transition: Transition) -> f64 {
    let p = progress.clamp(0.0, 1.0);
    match transition {
        Transition::Entering => (p / LINE_NUMBER_PHASE).min(1.0),
        Transition::Leaving => {
            1.0 - ((p - (1.0 - LINE_NUMBER_PHASE)) / LINE_NUMBER_PHASE).clamp(0.0, 1.0)
        }
    }
}

type Curve = fn(f64) -> f64;

/// Entering/leaving curves of one style, over code progress.
struct StyleCurves {
    entering: Curve,
    leaving: Curve,
    /// Content shifts sideways while transitioning.
    lateral: bool,
    /// A highlight overlay accompanies entering lines.
    overlay: bool,
}

fn fade_in(cp: f64) -> f64 {
    cp
}

fn fade_out(cp: f64) -> f64 {
    1.0 - cp
}

fn slide_in(cp: f64) -> f64 {
    (cp * SLIDE_RAMP).min(1.0)
}

fn slide_out(cp: f64) -> f64 {
    (1.0 - cp * SLIDE_RAMP).max(0.0)
}

fn highlight_in(cp: f64) -> f64 {
    if cp > 0.2 { 1.0 } else { cp * 5.0 }
}

fn highlight_out(cp: f64) -> f64 {
    if cp < 0.8 { 1.0 } else { (1.0 - cp) * 5.0 }
}

const FADE: StyleCurves = StyleCurves {
    entering: fade_in,
    leaving: fade_out,
    lateral: false,
    overlay: false,
};

const SLIDE: StyleCurves = StyleCurves {
    entering: slide_in,
    leaving: slide_out,
    lateral: true,
    overlay: false,
};

const HIGHLIGHT: StyleCurves = StyleCurves {
    entering: highlight_in,
    leaving: highlight_out,
    lateral: false,
    overlay: true,
};

// Typewriter content opacity follows fade; the character reveal lives in `typewriter`.
const TYPEWRITER: StyleCurves = FADE;

fn curves(style: AnimationStyle) -> &'static StyleCurves {
    match style {
        AnimationStyle::Fade => &FADE,
        AnimationStyle::Slide => &SLIDE,
        AnimationStyle::Typewriter => &TYPEWRITER,
        AnimationStyle::Highlight => &HIGHLIGHT,
    }
}

/// Content opacity for `style` at transition `progress`.
pub fn content_opacity(style: AnimationStyle, progress: f64, transition: Transition) -> f64 {
    let c = curves(style);
    let cp = code_progress(progress);
    let v = match transition {
        Transition::Entering => (c.entering)(cp),
        Transition::Leaving => (c.leaving)(cp),
    };
    v.clamp(0.0, 1.0)
}

/// Everything a renderer needs to draw one transitioning line.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CurveSample {
    pub opacity: f64,
    pub line_number_opacity: f64,
    /// Lateral displacement as a fraction of the renderer's slide distance. Positive values
    /// push content right.
    pub offset_x: f64,
    /// Highlight overlay strength in `[0, 1]`.
    pub highlight: f64,
}

impl CurveSample {
    /// A line that is neither entering nor leaving.
    pub const STABLE: CurveSample = CurveSample {
        opacity: 1.0,
        line_number_opacity: 1.0,
        offset_x: 0.0,
        highlight: 0.0,
    };
}

/// Sample all curves of `style` at `progress`.
pub fn sample(style: AnimationStyle, progress: f64, transition: Transition) -> CurveSample {
    let c = curves(style);
    let opacity = content_opacity(style, progress, transition);
    let offset_x = if c.lateral {
        match transition {
            Transition::Entering => 1.0 - opacity,
            Transition::Leaving => -(1.0 - opacity),
        }
    } else {
        0.0
    };
    let highlight = if c.overlay && transition == Transition::Entering {
        1.0 - code_progress(progress)
    } else {
        0.0
    };
    CurveSample {
        opacity,
        line_number_opacity: line_number_opacity(progress, transition),
        offset_x,
        highlight,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/curves.rs"]
mod tests;
