use crate::export::gate::CancelToken;
use crate::foundation::core::Fps;
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::backend::FrameRGBA;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Container/codec of an exported artifact.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// H.264 in MP4 (via `ffmpeg`).
    #[default]
    Mp4,
    /// VP9 in WebM (via `ffmpeg`).
    WebM,
    /// Animated GIF.
    Gif,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::WebM => "webm",
            Self::Gif => "gif",
        }
    }

    /// Infer the format from a file extension (case-insensitive).
    pub fn from_path(path: &Path) -> ReelResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        ext.parse()
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = ReelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mp4" => Ok(Self::Mp4),
            "webm" => Ok(Self::WebM),
            "gif" => Ok(Self::Gif),
            other => Err(ReelError::validation(format!(
                "unsupported output format '{other}' (expected mp4, webm or gif)"
            ))),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Stream parameters handed to a [`MediaEncoder`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncodeConfig {
    pub width: u32,
    pub height: u32,
    pub fps: Fps,
    pub format: OutputFormat,
}

impl EncodeConfig {
    /// Check that every frame matches the configured dimensions.
    pub fn validate_frames(&self, frames: &[FrameRGBA]) -> ReelResult<()> {
        if frames.is_empty() {
            return Err(ReelError::encoding("no frames to encode"));
        }
        let expected = (self.width as usize) * (self.height as usize) * 4;
        for (i, f) in frames.iter().enumerate() {
            if f.width != self.width || f.height != self.height || f.data.len() != expected {
                return Err(ReelError::encoding(format!(
                    "frame {i} size mismatch: got {}x{} ({} bytes), expected {}x{}",
                    f.width,
                    f.height,
                    f.data.len(),
                    self.width,
                    self.height
                )));
            }
        }
        Ok(())
    }
}

/// Turns an ordered frame sequence into artifact bytes.
///
/// `check_config` must reject unsupported formats and stream parameters before any frame is
/// rendered. `encode` reports progress in `[0, 1]` and checks `cancel` between frames.
pub trait MediaEncoder: Send {
    fn supports(&self, format: OutputFormat) -> bool;

    fn check_format(&self, format: OutputFormat) -> ReelResult<()> {
        if self.supports(format) {
            Ok(())
        } else {
            Err(ReelError::validation(format!(
                "output format '{format}' is not supported by this encoder"
            )))
        }
    }

    /// Full pre-render check of a stream. Defaults to [`MediaEncoder::check_format`].
    fn check_config(&self, cfg: &EncodeConfig) -> ReelResult<()> {
        self.check_format(cfg.format)
    }

    fn encode(
        &mut self,
        frames: &[FrameRGBA],
        cfg: &EncodeConfig,
        progress: &mut dyn FnMut(f64),
        cancel: &CancelToken,
    ) -> ReelResult<Vec<u8>>;
}

/// Routes each format to the encoder that handles it.
#[derive(Debug, Default)]
pub struct StandardEncoder {
    ffmpeg: crate::encode::ffmpeg::FfmpegEncoder,
    gif: crate::encode::gif::GifEncoder,
}

impl StandardEncoder {
    pub fn new(
        ffmpeg: crate::encode::ffmpeg::FfmpegEncoder,
        gif: crate::encode::gif::GifEncoder,
    ) -> Self {
        Self { ffmpeg, gif }
    }
}

impl MediaEncoder for StandardEncoder {
    fn supports(&self, format: OutputFormat) -> bool {
        self.ffmpeg.supports(format) || self.gif.supports(format)
    }

    fn check_format(&self, format: OutputFormat) -> ReelResult<()> {
        match format {
            OutputFormat::Gif => self.gif.check_format(format),
            OutputFormat::Mp4 | OutputFormat::WebM => self.ffmpeg.check_format(format),
        }
    }

    fn check_config(&self, cfg: &EncodeConfig) -> ReelResult<()> {
        match cfg.format {
            OutputFormat::Gif => self.gif.check_config(cfg),
            OutputFormat::Mp4 | OutputFormat::WebM => self.ffmpeg.check_config(cfg),
        }
    }

    fn encode(
        &mut self,
        frames: &[FrameRGBA],
        cfg: &EncodeConfig,
        progress: &mut dyn FnMut(f64),
        cancel: &CancelToken,
    ) -> ReelResult<Vec<u8>> {
        match cfg.format {
            OutputFormat::Gif => self.gif.encode(frames, cfg, progress, cancel),
            OutputFormat::Mp4 | OutputFormat::WebM => {
                self.ffmpeg.encode(frames, cfg, progress, cancel)
            }
        }
    }
}

/// Encoder for tests and debugging: keeps the frames and emits their concatenated bytes.
#[derive(Debug, Default)]
pub struct InMemoryEncoder {
    cfg: Option<EncodeConfig>,
    frames: Vec<FrameRGBA>,
    supported: Option<Vec<OutputFormat>>,
}

impl InMemoryEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the formats this encoder accepts (all by default).
    pub fn with_supported(mut self, formats: &[OutputFormat]) -> Self {
        self.supported = Some(formats.to_vec());
        self
    }

    pub fn config(&self) -> Option<EncodeConfig> {
        self.cfg
    }

    /// Frames captured by the last `encode` call.
    pub fn frames(&self) -> &[FrameRGBA] {
        &self.frames
    }
}

impl MediaEncoder for InMemoryEncoder {
    fn supports(&self, format: OutputFormat) -> bool {
        self.supported
            .as_ref()
            .is_none_or(|formats| formats.contains(&format))
    }

    fn encode(
        &mut self,
        frames: &[FrameRGBA],
        cfg: &EncodeConfig,
        progress: &mut dyn FnMut(f64),
        cancel: &CancelToken,
    ) -> ReelResult<Vec<u8>> {
        self.check_format(cfg.format)?;
        cfg.validate_frames(frames)?;
        self.cfg = Some(*cfg);
        self.frames.clear();

        let mut out = Vec::with_capacity(frames.len() * frames[0].data.len());
        let n = frames.len() as f64;
        for (i, f) in frames.iter().enumerate() {
            cancel.checkpoint("encoding")?;
            self.frames.push(f.clone());
            out.extend_from_slice(&f.data);
            progress((i + 1) as f64 / n);
        }
        Ok(out)
    }
}
