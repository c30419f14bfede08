use super::*;
use crate::deck::model::{AnimationStyle, LineRange};
use crate::encode::encoder::InMemoryEncoder;
use crate::render::instructions::FrameInstructions;
use std::sync::Mutex;

#[derive(Default)]
struct RecordingSurface {
    seen: Arc<Mutex<Vec<(f64, Option<usize>)>>>,
}

impl RenderingSurface for RecordingSurface {
    fn canvas(&self) -> Canvas {
        Canvas {
            width: 4,
            height: 2,
        }
    }

    fn draw_frame(&mut self, frame: &FrameInstructions) -> ReelResult<FrameRGBA> {
        self.seen
            .lock()
            .unwrap()
            .push((frame.time_ms, frame.step_index));
        Ok(FrameRGBA {
            width: 4,
            height: 2,
            data: vec![255; 4 * 2 * 4],
            premultiplied: true,
        })
    }
}

fn request() -> ExportRequest {
    let slides = vec![
        Slide::new("a", vec![LineRange::new(1, 2).unwrap()], 1000, AnimationStyle::Fade),
        Slide::new("b", vec![LineRange::new(2, 4).unwrap()], 1000, AnimationStyle::Slide),
    ];
    let options = ExportOptions {
        fps: Fps { num: 10, den: 1 },
        canvas: Canvas {
            width: 4,
            height: 2,
        },
        ..ExportOptions::default()
    };
    ExportRequest::new("a\nb\nc\nd\ne", "text", slides).with_options(options)
}

#[test]
fn blocking_export_samples_every_frame_in_order() {
    let engine = ExportEngine::new();
    let mut surface = RecordingSurface::default();
    let seen = Arc::clone(&surface.seen);
    let mut encoder = InMemoryEncoder::new();
    let mut events = Vec::new();

    let artifact = engine
        .export_blocking(&request(), &mut surface, &mut encoder, &mut |p| {
            events.push(p.clone())
        })
        .unwrap();

    // 2000 ms of steps plus 500 ms trailing buffer at 10 fps.
    assert_eq!(artifact.frame_count, 25);
    assert_eq!(encoder.frames().len(), 25);
    let seen = seen.lock().unwrap();
    assert_eq!(seen[0], (0.0, Some(0)));
    assert_eq!(seen[15], (1500.0, Some(1)));
    assert!(seen.windows(2).all(|w| w[0].0 < w[1].0));

    let phases: Vec<ExportPhase> = events.iter().map(|e| e.phase).collect();
    assert_eq!(phases.first(), Some(&ExportPhase::Preparing));
    assert_eq!(phases.last(), Some(&ExportPhase::Complete));
    assert!(phases.contains(&ExportPhase::Rendering));
    assert!(phases.contains(&ExportPhase::Encoding));
    assert!(!engine.is_exporting());
}

#[test]
fn canvas_mismatch_is_a_validation_error() {
    let mut req = request();
    req.options.canvas = Canvas {
        width: 8,
        height: 8,
    };
    let mut last = None;
    let err = ExportEngine::new()
        .export_blocking(
            &req,
            &mut RecordingSurface::default(),
            &mut InMemoryEncoder::new(),
            &mut |p| last = Some(p.clone()),
        )
        .unwrap_err();
    assert_eq!(err.kind, ExportErrorKind::Validation);
    let last = last.unwrap();
    assert_eq!(last.phase, ExportPhase::Error);
    assert_eq!(last.error.map(|e| e.kind), Some(ExportErrorKind::Validation));
}

#[test]
fn unsupported_format_is_rejected_before_rendering() {
    let mut surface = RecordingSurface::default();
    let seen = Arc::clone(&surface.seen);
    let mut encoder = InMemoryEncoder::new().with_supported(&[OutputFormat::Gif]);
    let err = ExportEngine::new()
        .export_blocking(&request(), &mut surface, &mut encoder, &mut |_| {})
        .unwrap_err();
    assert_eq!(err.kind, ExportErrorKind::Validation);
    assert!(seen.lock().unwrap().is_empty());
}

#[test]
fn empty_code_is_rejected() {
    let mut req = request();
    req.code.clear();
    let err = ExportEngine::new()
        .export_blocking(
            &req,
            &mut RecordingSurface::default(),
            &mut InMemoryEncoder::new(),
            &mut |_| {},
        )
        .unwrap_err();
    assert_eq!(err.kind, ExportErrorKind::Validation);
}

#[test]
fn held_gate_reports_already_exporting() {
    let engine = ExportEngine::new();
    let _permit = engine.gate.try_acquire().unwrap();
    let mut last = None;
    let err = engine
        .export_blocking(
            &request(),
            &mut RecordingSurface::default(),
            &mut InMemoryEncoder::new(),
            &mut |p| last = Some(p.clone()),
        )
        .unwrap_err();
    assert_eq!(err.kind, ExportErrorKind::AlreadyExporting);
    assert_eq!(last.map(|p| p.phase), Some(ExportPhase::Error));
    assert!(engine.is_exporting());
}

/// Accepts only even stream dimensions, like the yuv420p encoders.
struct EvenOnly {
    inner: InMemoryEncoder,
    encodes: usize,
}

impl MediaEncoder for EvenOnly {
    fn supports(&self, format: OutputFormat) -> bool {
        self.inner.supports(format)
    }

    fn check_config(&self, cfg: &EncodeConfig) -> ReelResult<()> {
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            return Err(ReelError::validation("width/height must be even"));
        }
        self.check_format(cfg.format)
    }

    fn encode(
        &mut self,
        frames: &[FrameRGBA],
        cfg: &EncodeConfig,
        progress: &mut dyn FnMut(f64),
        cancel: &CancelToken,
    ) -> ReelResult<Vec<u8>> {
        self.encodes += 1;
        self.inner.encode(frames, cfg, progress, cancel)
    }
}

struct OddSurface;

impl RenderingSurface for OddSurface {
    fn canvas(&self) -> Canvas {
        Canvas {
            width: 5,
            height: 3,
        }
    }

    fn draw_frame(&mut self, _frame: &FrameInstructions) -> ReelResult<FrameRGBA> {
        panic!("no frame may be drawn for a rejected stream");
    }
}

#[test]
fn stream_parameters_are_checked_before_rendering() {
    let mut req = request();
    req.options.canvas = Canvas {
        width: 5,
        height: 3,
    };
    let mut encoder = EvenOnly {
        inner: InMemoryEncoder::new(),
        encodes: 0,
    };
    let mut phases = Vec::new();
    let err = ExportEngine::new()
        .export_blocking(&req, &mut OddSurface, &mut encoder, &mut |p| phases.push(p.phase))
        .unwrap_err();

    assert_eq!(err.kind, ExportErrorKind::Validation);
    assert!(err.message.contains("even"), "{}", err.message);
    assert_eq!(encoder.encodes, 0);
    assert_eq!(phases, vec![ExportPhase::Preparing, ExportPhase::Error]);
}

#[test]
fn ranges_past_the_listing_cost_no_more_than_the_listing() {
    let mut req = request();
    req.slides = vec![
        Slide::new("all", vec![LineRange::new(1, u32::MAX).unwrap()], 1000, AnimationStyle::Fade),
        Slide::new("tail", vec![LineRange::new(3, u32::MAX).unwrap()], 1000, AnimationStyle::Fade),
    ];
    let mut encoder = InMemoryEncoder::new();
    let artifact = ExportEngine::new()
        .export_blocking(&req, &mut RecordingSurface::default(), &mut encoder, &mut |_| {})
        .unwrap();
    assert_eq!(artifact.frame_count, 25);
}
