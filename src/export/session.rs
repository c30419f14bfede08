use crate::code::source::{CodeListing, CodeSource};
use crate::code::tokenize::{KeywordTokenizer, SyntaxTokenizer};
use crate::deck::file::Deck;
use crate::deck::model::Slide;
use crate::encode::encoder::{EncodeConfig, MediaEncoder, OutputFormat};
use crate::export::gate::{CancelToken, ExportGate, ExportPermit};
use crate::export::options::{ExportOptions, TailPolicy};
use crate::export::progress::{ExportError, ExportErrorKind, ExportPhase, ExportProgress};
use crate::foundation::core::{Canvas, Fps, FrameIndex};
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::backend::{FrameRGBA, RenderingSurface};
use crate::render::compose::FrameComposer;
use crate::timeline::scheduler::Timeline;
use std::sync::Arc;
use std::thread::JoinHandle;

/// Everything needed to export one animation.
#[derive(Clone)]
pub struct ExportRequest {
    pub code: String,
    pub language: String,
    pub slides: Vec<Slide>,
    pub global_speed: f64,
    pub options: ExportOptions,
    pub tokenizer: Arc<dyn SyntaxTokenizer>,
}

impl std::fmt::Debug for ExportRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportRequest")
            .field("language", &self.language)
            .field("slides", &self.slides.len())
            .field("global_speed", &self.global_speed)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl ExportRequest {
    pub fn new(code: impl Into<String>, language: impl Into<String>, slides: Vec<Slide>) -> Self {
        Self {
            code: code.into(),
            language: language.into(),
            slides,
            global_speed: 1.0,
            options: ExportOptions::default(),
            tokenizer: Arc::new(KeywordTokenizer),
        }
    }

    pub fn from_deck(deck: &Deck) -> Self {
        Self {
            global_speed: deck.speed,
            options: deck.export.clone(),
            ..Self::new(deck.code.clone(), deck.language.clone(), deck.slides.clone())
        }
    }

    pub fn with_speed(mut self, global_speed: f64) -> Self {
        self.global_speed = global_speed;
        self
    }

    pub fn with_options(mut self, options: ExportOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_tokenizer(mut self, tokenizer: Arc<dyn SyntaxTokenizer>) -> Self {
        self.tokenizer = tokenizer;
        self
    }
}

/// Finished export.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportArtifact {
    pub bytes: Vec<u8>,
    pub format: OutputFormat,
    pub frame_count: u64,
    pub fps: Fps,
    pub canvas: Canvas,
    /// Sampled duration, trailing buffer included.
    pub duration_ms: f64,
}

/// Handle to an export running on its own thread.
#[derive(Debug)]
pub struct ExportJob {
    handle: JoinHandle<Result<ExportArtifact, ExportError>>,
    token: CancelToken,
}

impl ExportJob {
    /// Request cancellation; the job settles after the frame in flight.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Block until the export settles.
    pub fn wait(self) -> Result<ExportArtifact, ExportError> {
        self.handle.join().unwrap_or_else(|_| {
            Err(ExportError::new(
                ExportErrorKind::Render,
                "export thread panicked",
            ))
        })
    }
}

/// Runs exports, one at a time. Clones share the same gate.
#[derive(Clone, Debug, Default)]
pub struct ExportEngine {
    gate: Arc<ExportGate>,
}

impl ExportEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_exporting(&self) -> bool {
        self.gate.is_active()
    }

    /// Cancel the running export, if any. Returns whether one was running.
    pub fn cancel_export(&self) -> bool {
        let cancelled = self.gate.cancel_active();
        if cancelled {
            tracing::info!("export cancellation requested");
        }
        cancelled
    }

    fn acquire(
        &self,
        on_progress: &mut dyn FnMut(&ExportProgress),
    ) -> Result<ExportPermit, ExportError> {
        self.gate.try_acquire().ok_or_else(|| {
            let err = ExportError::already_exporting();
            tracing::warn!("{err}");
            on_progress(&ExportProgress::failed(err.clone()));
            err
        })
    }

    /// Start an export on a dedicated thread. The surface and encoder move into the job.
    ///
    /// Fails immediately with `AlreadyExporting` when another export holds this engine.
    pub fn export_video<S, E, F>(
        &self,
        request: ExportRequest,
        mut surface: S,
        mut encoder: E,
        mut on_progress: F,
    ) -> Result<ExportJob, ExportError>
    where
        S: RenderingSurface + 'static,
        E: MediaEncoder + 'static,
        F: FnMut(&ExportProgress) + Send + 'static,
    {
        let permit = self.acquire(&mut on_progress)?;
        let token = permit.token().clone();
        let handle = std::thread::Builder::new()
            .name("codereel-export".to_owned())
            .spawn(move || {
                run_export(&request, permit, &mut surface, &mut encoder, &mut on_progress)
            })
            .map_err(|e| {
                ExportError::new(ExportErrorKind::Render, "failed to spawn export thread")
                    .with_cause(e)
            })?;
        Ok(ExportJob { handle, token })
    }

    /// Run an export on the calling thread.
    pub fn export_blocking(
        &self,
        request: &ExportRequest,
        surface: &mut dyn RenderingSurface,
        encoder: &mut dyn MediaEncoder,
        on_progress: &mut dyn FnMut(&ExportProgress),
    ) -> Result<ExportArtifact, ExportError> {
        let permit = self.acquire(on_progress)?;
        run_export(request, permit, surface, encoder, on_progress)
    }
}

/// Phase bookkeeping and progress emission for one run.
struct ExportRun<'a> {
    phase: ExportPhase,
    total_frames: Option<u64>,
    on_progress: &'a mut dyn FnMut(&ExportProgress),
}

impl ExportRun<'_> {
    fn enter(&mut self, phase: ExportPhase, message: &str) {
        self.phase = phase;
        tracing::info!(phase = ?phase, "{message}");
        self.emit(0.0, None, Some(message.to_owned()));
    }

    fn emit(&mut self, progress: f64, current_frame: Option<u64>, message: Option<String>) {
        let p = ExportProgress {
            current_frame,
            total_frames: self.total_frames,
            message,
            ..ExportProgress::new(self.phase, progress)
        };
        (self.on_progress)(&p);
    }
}

fn encode_config(opts: &ExportOptions) -> EncodeConfig {
    EncodeConfig {
        width: opts.canvas.width,
        height: opts.canvas.height,
        fps: opts.fps,
        format: opts.format,
    }
}

struct Prepared {
    listing: CodeListing,
    timeline: Timeline,
    total_frames: u64,
    progress_every: u64,
}

fn prepare(
    req: &ExportRequest,
    surface: &dyn RenderingSurface,
    encoder: &dyn MediaEncoder,
) -> ReelResult<Prepared> {
    let opts = &req.options;
    let listing = CodeListing::from_text(&req.code);
    if listing.is_empty() {
        return Err(ReelError::validation("code must be non-empty"));
    }
    opts.validate()?;
    if surface.canvas() != opts.canvas {
        return Err(ReelError::validation(format!(
            "surface canvas {}x{} does not match export canvas {}x{}",
            surface.canvas().width,
            surface.canvas().height,
            opts.canvas.width,
            opts.canvas.height
        )));
    }
    encoder.check_config(&encode_config(opts))?;

    let timeline = Timeline::for_code(&req.slides, req.global_speed, listing.line_count())?;
    let sampled_ms = timeline.total_duration_ms() + opts.trailing_buffer_ms as f64;
    let total_frames = opts.fps.ms_to_frames_ceil(sampled_ms);
    if total_frames == 0 {
        return Err(ReelError::validation("export would produce no frames"));
    }

    Ok(Prepared {
        listing,
        timeline,
        total_frames,
        progress_every: opts.effective_progress_every(),
    })
}

fn render_frames(
    req: &ExportRequest,
    prepared: &Prepared,
    token: &CancelToken,
    surface: &mut dyn RenderingSurface,
    run: &mut ExportRun<'_>,
) -> ReelResult<Vec<FrameRGBA>> {
    let opts = &req.options;
    let mut composer = FrameComposer::new(opts.composer_config())?;
    let total = prepared.total_frames;
    let capacity = usize::try_from(total).unwrap_or(usize::MAX).min(4096);
    let mut frames = Vec::with_capacity(capacity);
    let mut blank_frames = 0u64;

    for idx in 0..total {
        let t_ms = opts.fps.frame_to_ms(FrameIndex(idx));
        let instructions = composer.compose(
            &prepared.timeline,
            &prepared.listing,
            req.tokenizer.as_ref(),
            &req.language,
            t_ms,
        );
        if instructions.is_blank() {
            blank_frames += 1;
        }
        let frame = surface
            .draw_frame(&instructions)
            .map_err(|e| ReelError::render(format!("frame {idx} at {t_ms:.1} ms: {e}")))?;
        if frame.width != opts.canvas.width || frame.height != opts.canvas.height {
            return Err(ReelError::render(format!(
                "frame {idx}: surface returned {}x{}, expected {}x{}",
                frame.width, frame.height, opts.canvas.width, opts.canvas.height
            )));
        }
        frames.push(frame);

        std::thread::yield_now();
        token.checkpoint("rendering")?;

        let done = idx + 1;
        if done % prepared.progress_every == 0 || done == total {
            tracing::debug!(frame = done, total, "rendered");
            run.emit(done as f64 / total as f64, Some(done), None);
        }
    }

    if blank_frames > 0 && opts.tail_policy == TailPolicy::Blank {
        tracing::warn!(blank_frames, "frames past the last step were rendered blank");
    }
    Ok(frames)
}

/// Run one export under `permit`. The permit is released before the terminal progress event,
/// so `is_exporting()` already reads `false` inside that callback.
#[tracing::instrument(skip_all, fields(slides = req.slides.len(), format = %req.options.format))]
fn run_export(
    req: &ExportRequest,
    permit: ExportPermit,
    surface: &mut dyn RenderingSurface,
    encoder: &mut dyn MediaEncoder,
    on_progress: &mut dyn FnMut(&ExportProgress),
) -> Result<ExportArtifact, ExportError> {
    let token = permit.token().clone();
    let mut run = ExportRun {
        phase: ExportPhase::Preparing,
        total_frames: None,
        on_progress,
    };

    let result = (|| -> ReelResult<ExportArtifact> {
        run.enter(ExportPhase::Preparing, "validating export");
        let prepared = prepare(req, surface, encoder)?;
        run.total_frames = Some(prepared.total_frames);
        tracing::info!(
            total_frames = prepared.total_frames,
            duration_ms = prepared.timeline.total_duration_ms(),
            "export prepared"
        );
        run.emit(1.0, None, None);

        run.enter(ExportPhase::Rendering, "rendering frames");
        let frames = render_frames(req, &prepared, &token, surface, &mut run)?;

        run.enter(ExportPhase::Encoding, "encoding");
        let opts = &req.options;
        let cfg = encode_config(opts);
        let bytes = encoder.encode(&frames, &cfg, &mut |p| run.emit(p, None, None), &token)?;
        token.checkpoint("encoding")?;

        Ok(ExportArtifact {
            bytes,
            format: opts.format,
            frame_count: prepared.total_frames,
            fps: opts.fps,
            canvas: opts.canvas,
            duration_ms: opts.fps.frame_to_ms(FrameIndex(prepared.total_frames)),
        })
    })();
    drop(permit);

    match result {
        Ok(artifact) => {
            run.phase = ExportPhase::Complete;
            tracing::info!(bytes = artifact.bytes.len(), "export complete");
            run.emit(1.0, Some(artifact.frame_count), Some("export complete".to_owned()));
            Ok(artifact)
        }
        Err(e) => {
            let err = ExportError::from_reel(e, run.phase);
            if err.is_cancelled() {
                tracing::warn!(phase = ?run.phase, "export cancelled");
            } else {
                tracing::error!(phase = ?run.phase, "{err}");
            }
            (run.on_progress)(&ExportProgress {
                total_frames: run.total_frames,
                ..ExportProgress::failed(err.clone())
            });
            Err(err)
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/session.rs"]
mod tests;
