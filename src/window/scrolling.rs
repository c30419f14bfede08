use crate::foundation::error::{ReelError, ReelResult};
use crate::timeline::visibility::density;
use serde::{Deserialize, Serialize};

/// Default viewport capacity in rows.
pub const DEFAULT_MAX_LINES: u32 = 15;

/// Duration of a window scroll when the window start moves.
pub const SCROLL_DURATION_MS: f64 = 300.0;

/// Density at or above which rows keep their true line numbers.
pub const ACTUAL_NUMBERING_MIN_DENSITY: f64 = 0.8;

/// Inclusive viewport over the code, in line numbers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowState {
    pub start_line: u32,
    pub end_line: u32,
    pub max_lines: u32,
}

impl WindowState {
    pub fn contains(&self, line: u32) -> bool {
        self.start_line <= line && line <= self.end_line
    }
}

/// Which way the window moved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScrollType {
    None,
    /// Window start moved to a larger line number (content moves up).
    ScrollUp,
    /// Window start moved to a smaller line number (content moves down).
    ScrollDown,
}

/// Outcome of repositioning the window.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ScrollChange {
    pub scroll_type: ScrollType,
    pub from_start: u32,
    pub to_start: u32,
    /// 300 ms when the window moved, 0 otherwise.
    pub duration_ms: f64,
}

impl ScrollChange {
    fn between(from_start: u32, to_start: u32) -> Self {
        let scroll_type = match to_start.cmp(&from_start) {
            std::cmp::Ordering::Equal => ScrollType::None,
            std::cmp::Ordering::Greater => ScrollType::ScrollUp,
            std::cmp::Ordering::Less => ScrollType::ScrollDown,
        };
        let duration_ms = if scroll_type == ScrollType::None {
            0.0
        } else {
            SCROLL_DURATION_MS
        };
        Self {
            scroll_type,
            from_start,
            to_start,
            duration_ms,
        }
    }
}

/// How rows are numbered in the gutter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Numbering {
    /// True line numbers.
    Actual,
    /// 1..N in ascending actual-line order.
    Sequential,
}

/// Fixed-capacity viewport over the code.
///
/// One instance belongs to exactly one preview or export session.
#[derive(Clone, Debug)]
pub struct ScrollingWindow {
    state: WindowState,
}

impl Default for ScrollingWindow {
    fn default() -> Self {
        Self {
            state: Self::initial(DEFAULT_MAX_LINES),
        }
    }
}

impl ScrollingWindow {
    pub fn new(max_lines: u32) -> ReelResult<Self> {
        if max_lines == 0 {
            return Err(ReelError::validation("window max_lines must be >= 1"));
        }
        Ok(Self {
            state: Self::initial(max_lines),
        })
    }

    fn initial(max_lines: u32) -> WindowState {
        WindowState {
            start_line: 1,
            end_line: max_lines,
            max_lines,
        }
    }

    pub fn state(&self) -> WindowState {
        self.state
    }

    pub fn max_lines(&self) -> u32 {
        self.state.max_lines
    }

    /// Restore the default `[1, max_lines]` window.
    pub fn reset(&mut self) {
        self.state = Self::initial(self.state.max_lines);
    }

    pub fn is_visible(&self, line: u32) -> bool {
        self.state.contains(line)
    }

    /// Reposition the window so it shows `target` out of `total_lines`.
    ///
    /// `target` need not be sorted. An empty target leaves the window where it is.
    pub fn set_window_for_lines(&mut self, target: &[u32], total_lines: u32) -> ScrollChange {
        let max = self.state.max_lines;
        let from = self.state.start_line;

        let (start, end) = if total_lines <= max {
            (1, total_lines.max(1))
        } else {
            let (Some(&min_t), Some(&max_t)) = (target.iter().min(), target.iter().max()) else {
                return ScrollChange::between(from, from);
            };
            let count = u32::try_from(target.len()).unwrap_or(u32::MAX);
            let span = max_t - min_t + 1;
            if count <= max {
                // Exact fit, no padding: sparse slides render compactly.
                (min_t, max_t)
            } else if span > max {
                // Bias toward the tail.
                let start = max_t.saturating_sub(max - 1).max(1);
                (start, max_t)
            } else {
                // More candidates than rows inside a short span (duplicated input).
                let mid = min_t + (max_t - min_t) / 2;
                let latest_start = total_lines - max + 1;
                let start = mid.saturating_sub(max / 2).clamp(1, latest_start);
                (start, start + max - 1)
            }
        };

        self.state.start_line = start;
        self.state.end_line = end;
        let change = ScrollChange::between(from, start);
        tracing::trace!(start, end, scroll = ?change.scroll_type, "window repositioned");
        change
    }

    /// Filter sorted `lines` down to those inside the window.
    pub fn rows_in_window(&self, lines: &[u32]) -> Vec<u32> {
        lines
            .iter()
            .copied()
            .filter(|&n| self.state.contains(n))
            .collect()
    }
}

/// Pick the numbering policy for the rows actually shown.
pub fn numbering_for(rows: &[u32]) -> Numbering {
    if rows.len() <= 1 || density(rows) >= ACTUAL_NUMBERING_MIN_DENSITY {
        Numbering::Actual
    } else {
        Numbering::Sequential
    }
}

/// Display number of each row (rows sorted ascending).
pub fn display_numbers(rows: &[u32], numbering: Numbering) -> Vec<u32> {
    match numbering {
        Numbering::Actual => rows.to_vec(),
        Numbering::Sequential => (1..=rows.len() as u32).collect(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/window/scrolling.rs"]
mod tests;
