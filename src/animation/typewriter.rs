//! Multi-line typewriter sequencing.
//!
//! Newly added lines share the code-progress axis in equal slices, in ascending line order.

use serde::{Deserialize, Serialize};

const SLICE_SNAP: f64 = 1e-9;

/// How the reveal of several lines is scheduled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sequencing {
    /// One line after another; a line shows nothing until the previous one completes.
    #[default]
    Strict,
    /// All lines reveal together over the whole axis.
    Parallel,
}

/// Reveal state of one line.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Reveal {
    /// Progress through this line's slice, in `[0, 1]`.
    pub progress: f64,
    /// `floor(line_len * progress)` characters.
    pub visible_chars: usize,
}

impl Reveal {
    pub const HIDDEN: Reveal = Reveal {
        progress: 0.0,
        visible_chars: 0,
    };

    pub fn is_complete(&self) -> bool {
        self.progress >= 1.0
    }
}

/// Progress through slice `index` of `count` at code progress `cp`.
pub fn slice_progress(index: usize, count: usize, cp: f64) -> f64 {
    if count == 0 {
        return 0.0;
    }
    let local = (cp.clamp(0.0, 1.0) * count as f64 - index as f64).clamp(0.0, 1.0);
    if local > 1.0 - SLICE_SNAP { 1.0 } else { local }
}

fn reveal_for(len_chars: usize, progress: f64) -> Reveal {
    let visible_chars = if progress >= 1.0 {
        len_chars
    } else {
        ((len_chars as f64) * progress).floor() as usize
    };
    Reveal {
        progress,
        visible_chars: visible_chars.min(len_chars),
    }
}

/// Reveal state of each line in `line_lengths` (character counts, in reveal order).
pub fn reveal_lines(line_lengths: &[usize], cp: f64, sequencing: Sequencing) -> Vec<Reveal> {
    let n = line_lengths.len();
    match sequencing {
        Sequencing::Parallel => {
            let p = slice_progress(0, 1, cp);
            line_lengths.iter().map(|&len| reveal_for(len, p)).collect()
        }
        Sequencing::Strict => {
            let mut out = Vec::with_capacity(n);
            let mut previous_complete = true;
            for (i, &len) in line_lengths.iter().enumerate() {
                if !previous_complete {
                    out.push(Reveal::HIDDEN);
                    continue;
                }
                let r = reveal_for(len, slice_progress(i, n, cp));
                previous_complete = r.is_complete();
                out.push(r);
            }
            out
        }
    }
}

/// Prefix of `text` holding its first `chars` characters.
pub fn visible_prefix(text: &str, chars: usize) -> &str {
    match text.char_indices().nth(chars) {
        Some((byte, _)) => &text[..byte],
        None => text,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/typewriter.rs"]
mod tests;
