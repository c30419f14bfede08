use crate::code::source::CodeSource;
use crate::deck::model::{LineRange, Slide};

/// Expand line ranges into the sorted, deduplicated set of line numbers they cover.
///
/// Allocates one entry per covered line. Use [`expand_within`] when the ranges are not bounded
/// by the code length.
pub fn expand(ranges: &[LineRange]) -> Vec<u32> {
    expand_within(ranges, u32::MAX)
}

/// Like [`expand`], but each range is cut to `[1, limit]` before it is expanded, so the result
/// never holds more than `limit` lines.
pub fn expand_within(ranges: &[LineRange], limit: u32) -> Vec<u32> {
    let mut out: Vec<u32> = ranges
        .iter()
        .flat_map(|r| r.start.max(1)..=r.end.min(limit))
        .collect();
    out.sort_unstable();
    out.dedup();
    out
}

/// Lines a slide shows, clipped to `[1, code_line_count]`.
pub fn visible_lines(slide: &Slide, code_line_count: u32) -> Vec<u32> {
    expand_within(&slide.line_ranges, code_line_count)
}

/// Drop line numbers outside `[1, code_line_count]`. Input must be sorted.
pub fn clamp_to_code(lines: &[u32], code_line_count: u32) -> Vec<u32> {
    lines
        .iter()
        .copied()
        .filter(|&n| n >= 1 && n <= code_line_count)
        .collect()
}

/// A line number paired with its content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NumberedLine {
    pub number: u32,
    pub content: String,
}

/// Result of diffing two visible-line sets.
///
/// `added ∪ kept == next`, `removed ∪ kept == prev`, and neither `added` nor `removed`
/// intersects `kept`. Each list is sorted ascending.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LineDiff {
    pub added: Vec<NumberedLine>,
    pub removed: Vec<NumberedLine>,
    pub kept: Vec<NumberedLine>,
}

impl LineDiff {
    pub fn added_numbers(&self) -> Vec<u32> {
        self.added.iter().map(|l| l.number).collect()
    }

    pub fn removed_numbers(&self) -> Vec<u32> {
        self.removed.iter().map(|l| l.number).collect()
    }

    pub fn kept_numbers(&self) -> Vec<u32> {
        self.kept.iter().map(|l| l.number).collect()
    }
}

/// Set differences of two sorted line sets, as plain numbers: `(next − prev, prev − next,
/// next ∩ prev)`.
pub fn diff_numbers(prev: &[u32], next: &[u32]) -> (Vec<u32>, Vec<u32>, Vec<u32>) {
    let mut added = Vec::new();
    let mut removed = Vec::new();
    let mut kept = Vec::new();

    let (mut i, mut j) = (0usize, 0usize);
    while i < prev.len() && j < next.len() {
        match prev[i].cmp(&next[j]) {
            std::cmp::Ordering::Less => {
                removed.push(prev[i]);
                i += 1;
            }
            std::cmp::Ordering::Greater => {
                added.push(next[j]);
                j += 1;
            }
            std::cmp::Ordering::Equal => {
                kept.push(prev[i]);
                i += 1;
                j += 1;
            }
        }
    }
    removed.extend_from_slice(&prev[i..]);
    added.extend_from_slice(&next[j..]);
    (added, removed, kept)
}

/// Diff two sorted visible-line sets and attach line contents from `code`.
pub fn diff(prev: &[u32], next: &[u32], code: &dyn CodeSource) -> LineDiff {
    let (added, removed, kept) = diff_numbers(prev, next);
    let attach = |nums: Vec<u32>| -> Vec<NumberedLine> {
        nums.into_iter()
            .map(|number| NumberedLine {
                number,
                content: code.line(number).to_owned(),
            })
            .collect()
    };
    LineDiff {
        added: attach(added),
        removed: attach(removed),
        kept: attach(kept),
    }
}

/// Ratio of line count to the numeric span the lines occupy.
///
/// Defined as `1.0` for zero or one line. Input must be sorted ascending.
pub fn density(lines: &[u32]) -> f64 {
    match (lines.first(), lines.last()) {
        (Some(&min), Some(&max)) if lines.len() > 1 => {
            lines.len() as f64 / f64::from(max - min + 1)
        }
        _ => 1.0,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/visibility.rs"]
mod tests;
