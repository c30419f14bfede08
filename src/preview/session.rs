use crate::code::source::{CodeListing, CodeSource};
use crate::code::tokenize::{KeywordTokenizer, SyntaxTokenizer};
use crate::deck::file::Deck;
use crate::deck::model::Slide;
use crate::export::options::ExportOptions;
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::backend::{FrameRGBA, RenderingSurface};
use crate::render::compose::FrameComposer;
use crate::render::instructions::FrameInstructions;
use crate::timeline::scheduler::{Timeline, validate_speed};
use std::sync::Arc;

/// Playback head over one timeline.
///
/// A session owns its composer (and therefore its window), so several previews and a running
/// export never disturb each other. Frames come from the same composer the exporter uses: a
/// preview frame at `t` matches the exported frame sampled at `t`.
pub struct PreviewSession {
    slides: Vec<Slide>,
    code: CodeListing,
    language: String,
    tokenizer: Arc<dyn SyntaxTokenizer>,
    timeline: Timeline,
    composer: FrameComposer,
    position_ms: f64,
    playing: bool,
}

impl std::fmt::Debug for PreviewSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewSession")
            .field("language", &self.language)
            .field("steps", &self.timeline.steps().len())
            .field("position_ms", &self.position_ms)
            .field("playing", &self.playing)
            .finish_non_exhaustive()
    }
}

impl PreviewSession {
    pub fn new(
        code: &str,
        language: impl Into<String>,
        slides: Vec<Slide>,
        global_speed: f64,
        options: &ExportOptions,
    ) -> ReelResult<Self> {
        let code = CodeListing::from_text(code);
        if code.is_empty() {
            return Err(ReelError::validation("code must be non-empty"));
        }
        let timeline = Timeline::for_code(&slides, global_speed, code.line_count())?;
        Ok(Self {
            slides,
            code,
            language: language.into(),
            tokenizer: Arc::new(KeywordTokenizer),
            timeline,
            composer: FrameComposer::new(options.composer_config())?,
            position_ms: 0.0,
            playing: false,
        })
    }

    pub fn from_deck(deck: &Deck) -> ReelResult<Self> {
        Self::new(
            &deck.code,
            deck.language.clone(),
            deck.slides.clone(),
            deck.speed,
            &deck.export,
        )
    }

    pub fn with_tokenizer(mut self, tokenizer: Arc<dyn SyntaxTokenizer>) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn duration_ms(&self) -> f64 {
        self.timeline.total_duration_ms()
    }

    pub fn position_ms(&self) -> f64 {
        self.position_ms
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Start playback; restarts from zero when the head sits at the end.
    pub fn play(&mut self) {
        if self.position_ms >= self.duration_ms() {
            self.position_ms = 0.0;
        }
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Compose the frame at `t_ms` without moving the playback head.
    pub fn frame_at(&mut self, t_ms: f64) -> FrameInstructions {
        self.composer.compose(
            &self.timeline,
            &self.code,
            self.tokenizer.as_ref(),
            &self.language,
            t_ms,
        )
    }

    /// Move the head to `t_ms` and compose the frame there.
    ///
    /// Negative times and NaN seek to zero. Times past the end are kept as given, so the frame
    /// matches what export samples in its trailing buffer; the tail policy decides the rows.
    pub fn seek(&mut self, t_ms: f64) -> FrameInstructions {
        self.position_ms = if t_ms.is_nan() {
            0.0
        } else if t_ms == f64::INFINITY {
            self.duration_ms()
        } else {
            t_ms.max(0.0)
        };
        self.frame_at(self.position_ms)
    }

    /// Advance a playing head by `elapsed_ms` of wall-clock time and compose the frame there.
    ///
    /// Playback stops at the end of the timeline.
    pub fn tick(&mut self, elapsed_ms: f64) -> FrameInstructions {
        if self.playing && elapsed_ms.is_finite() && elapsed_ms > 0.0 {
            let end = self.duration_ms();
            if self.position_ms < end {
                self.position_ms = (self.position_ms + elapsed_ms).min(end);
            }
            if self.position_ms >= end {
                self.playing = false;
                tracing::debug!(end_ms = end, "preview reached the end");
            }
        }
        self.frame_at(self.position_ms)
    }

    /// Change the playback speed, keeping the head on the same point of the animation.
    pub fn set_speed(&mut self, global_speed: f64) -> ReelResult<()> {
        validate_speed(global_speed)?;
        let old = self.timeline.global_speed();
        self.timeline = Timeline::for_code(&self.slides, global_speed, self.code.line_count())?;
        self.position_ms = self.position_ms * old / global_speed;
        self.composer.reset();
        Ok(())
    }

    /// Compose and draw the frame under the playback head.
    pub fn draw(&mut self, surface: &mut dyn RenderingSurface) -> ReelResult<FrameRGBA> {
        let frame = self.frame_at(self.position_ms);
        surface.draw_frame(&frame)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/preview/session.rs"]
mod tests;
