use crate::animation::typewriter::Sequencing;
use crate::encode::encoder::OutputFormat;
use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::compose::ComposerConfig;
use crate::window::scrolling::DEFAULT_MAX_LINES;
use serde::{Deserialize, Serialize};

pub use crate::render::compose::TailPolicy;

/// Environment variable overriding [`ExportOptions::progress_every`].
pub const PROGRESS_EVERY_ENV: &str = "CODEREEL_PROGRESS_EVERY";

/// Export settings. Every field has a default, so partial JSON objects deserialize.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    pub fps: Fps,
    pub canvas: Canvas,
    pub format: OutputFormat,
    /// Report rendering progress every N frames (the last frame is always reported).
    pub progress_every: u64,
    /// Extra time sampled after the last step so its end state gets frames.
    pub trailing_buffer_ms: u64,
    pub tail_policy: TailPolicy,
    pub max_lines: u32,
    pub typewriter: Sequencing,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            fps: Fps::default(),
            canvas: Canvas::default(),
            format: OutputFormat::default(),
            progress_every: 10,
            trailing_buffer_ms: 500,
            tail_policy: TailPolicy::default(),
            max_lines: DEFAULT_MAX_LINES,
            typewriter: Sequencing::default(),
        }
    }
}

impl ExportOptions {
    pub fn validate(&self) -> ReelResult<()> {
        Fps::new(self.fps.num, self.fps.den)?;
        self.canvas.validate()?;
        if self.progress_every == 0 {
            return Err(ReelError::validation("progress_every must be >= 1"));
        }
        if self.max_lines == 0 {
            return Err(ReelError::validation("max_lines must be >= 1"));
        }
        Ok(())
    }

    /// Composer settings matching these options; preview sessions use the same.
    pub fn composer_config(&self) -> ComposerConfig {
        ComposerConfig {
            max_lines: self.max_lines,
            tail_policy: self.tail_policy,
            sequencing: self.typewriter,
        }
    }

    /// `progress_every`, unless the environment overrides it with a positive integer.
    pub fn effective_progress_every(&self) -> u64 {
        std::env::var(PROGRESS_EVERY_ENV)
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|&n| n > 0)
            .unwrap_or(self.progress_every)
    }
}
