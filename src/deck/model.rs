use crate::foundation::error::{ReelError, ReelResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// 1-based inclusive range of code lines.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct LineRange {
    /// First line (1-based, inclusive).
    pub start: u32,
    /// Last line (inclusive).
    pub end: u32,
}

impl LineRange {
    /// Create a validated range with `1 <= start <= end`.
    pub fn new(start: u32, end: u32) -> ReelResult<Self> {
        let r = Self { start, end };
        r.validate()?;
        Ok(r)
    }

    /// Single-line range.
    pub fn line(n: u32) -> ReelResult<Self> {
        Self::new(n, n)
    }

    pub fn validate(self) -> ReelResult<()> {
        if self.start == 0 {
            return Err(ReelError::validation("line ranges are 1-based; start must be >= 1"));
        }
        if self.start > self.end {
            return Err(ReelError::validation(format!(
                "line range start {} must be <= end {}",
                self.start, self.end
            )));
        }
        Ok(())
    }

    /// Number of lines covered.
    pub fn line_count(self) -> u32 {
        self.end - self.start + 1
    }

    pub fn contains(self, line: u32) -> bool {
        self.start <= line && line <= self.end
    }
}

// Decks accept `[start, end]`, `{ "start": .., "end": .. }` or a bare line number.
impl<'de> Deserialize<'de> for LineRange {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Line(u32),
            Arr([u32; 2]),
            Obj { start: u32, end: u32 },
        }

        match Repr::deserialize(deserializer)? {
            Repr::Line(n) => Ok(Self { start: n, end: n }),
            Repr::Arr([start, end]) => Ok(Self { start, end }),
            Repr::Obj { start, end } => Ok(Self { start, end }),
        }
    }
}

/// How lines entering or leaving a slide are animated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationStyle {
    /// Opacity cross-fade.
    #[default]
    Fade,
    /// Fast opacity ramp paired with a lateral offset.
    Slide,
    /// Character-by-character reveal of new lines.
    Typewriter,
    /// Quick fade-in with a transient highlight overlay.
    Highlight,
}

impl AnimationStyle {
    /// Every style, in declaration order.
    pub const ALL: [AnimationStyle; 4] = [
        AnimationStyle::Fade,
        AnimationStyle::Slide,
        AnimationStyle::Typewriter,
        AnimationStyle::Highlight,
    ];
}

/// A named, ordered step defining visible code lines, duration and animation style.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Slide {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "lines")]
    pub line_ranges: Vec<LineRange>,
    pub duration_ms: u64,
    #[serde(default, rename = "animation")]
    pub animation_style: AnimationStyle,
    #[serde(default)]
    pub order: u32,
}

impl Slide {
    /// Convenience constructor; `order` defaults to 0 and `name` to the id.
    pub fn new(
        id: impl Into<String>,
        line_ranges: Vec<LineRange>,
        duration_ms: u64,
        animation_style: AnimationStyle,
    ) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            line_ranges,
            duration_ms,
            animation_style,
            order: 0,
        }
    }

    pub fn with_order(mut self, order: u32) -> Self {
        self.order = order;
        self
    }

    pub fn validate(&self) -> ReelResult<()> {
        if self.id.trim().is_empty() {
            return Err(ReelError::validation("slide id must be non-empty"));
        }
        if self.duration_ms == 0 {
            return Err(ReelError::validation(format!(
                "slide '{}' duration_ms must be > 0",
                self.id
            )));
        }
        for r in &self.line_ranges {
            r.validate()
                .map_err(|e| ReelError::validation(format!("slide '{}': {e}", self.id)))?;
        }
        Ok(())
    }
}

/// Validate a slide list as a whole: every slide valid, ids unique, list non-empty.
pub fn validate_slides(slides: &[Slide]) -> ReelResult<()> {
    if slides.is_empty() {
        return Err(ReelError::validation("slide list must be non-empty"));
    }
    let mut seen = BTreeSet::new();
    for s in slides {
        s.validate()?;
        if !seen.insert(s.id.as_str()) {
            return Err(ReelError::validation(format!(
                "duplicate slide id '{}'",
                s.id
            )));
        }
    }
    Ok(())
}

/// Return slides in scheduling order (ascending `order`, stable for ties).
pub fn ordered_slides(slides: &[Slide]) -> Vec<&Slide> {
    let mut out: Vec<&Slide> = slides.iter().collect();
    out.sort_by_key(|s| s.order);
    out
}

#[cfg(test)]
#[path = "../../tests/unit/deck/model.rs"]
mod tests;
