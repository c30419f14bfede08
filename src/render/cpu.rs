use crate::code::tokenize::{SyntaxToken, TokenKind};
use crate::foundation::core::{Canvas, Rgba8};
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::backend::{FrameRGBA, RenderingSurface};
use crate::render::instructions::{FrameInstructions, RenderedLine};
use crate::render::text::{TextBrushRgba8, TextLayoutEngine};
use std::path::Path;
use std::sync::Arc;

/// Palette used by [`CpuSurface`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Theme {
    pub background: Rgba8,
    pub text: Rgba8,
    pub gutter: Rgba8,
    pub keyword: Rgba8,
    pub string: Rgba8,
    pub number: Rgba8,
    pub comment: Rgba8,
    pub punctuation: Rgba8,
    /// Overlay behind lines entering with the `highlight` style.
    pub highlight: Rgba8,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: Rgba8::rgb(30, 30, 36),
            text: Rgba8::rgb(220, 223, 228),
            gutter: Rgba8::rgb(110, 114, 130),
            keyword: Rgba8::rgb(198, 120, 221),
            string: Rgba8::rgb(152, 195, 121),
            number: Rgba8::rgb(209, 154, 102),
            comment: Rgba8::rgb(92, 99, 112),
            punctuation: Rgba8::rgb(171, 178, 191),
            highlight: Rgba8 {
                r: 255,
                g: 215,
                b: 0,
                a: 64,
            },
        }
    }
}

impl Theme {
    pub fn color_for(&self, kind: TokenKind) -> Rgba8 {
        match kind {
            TokenKind::Plain => self.text,
            TokenKind::Keyword => self.keyword,
            TokenKind::String => self.string,
            TokenKind::Number => self.number,
            TokenKind::Comment => self.comment,
            TokenKind::Punctuation => self.punctuation,
        }
    }
}

/// Options for [`CpuSurface`].
#[derive(Clone, Debug)]
pub struct CpuSurfaceOpts {
    pub canvas: Canvas,
    /// TTF/OTF bytes. Without a font, glyphs are drawn as solid boxes.
    pub font: Option<Arc<[u8]>>,
    pub font_size_px: f32,
    /// Row height as a multiple of the font size.
    pub line_height: f32,
    pub padding_px: f32,
    /// Distance in pixels that `offset_x == 1.0` moves a line.
    pub slide_distance_px: f32,
    pub theme: Theme,
}

impl Default for CpuSurfaceOpts {
    fn default() -> Self {
        Self {
            canvas: Canvas::default(),
            font: None,
            font_size_px: 22.0,
            line_height: 1.5,
            padding_px: 32.0,
            slide_distance_px: 48.0,
            theme: Theme::default(),
        }
    }
}

impl CpuSurfaceOpts {
    pub fn with_canvas(mut self, canvas: Canvas) -> Self {
        self.canvas = canvas;
        self
    }

    /// Load font bytes from a file.
    pub fn with_font_file(mut self, path: impl AsRef<Path>) -> ReelResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            ReelError::validation(format!("read font '{}': {e}", path.display()))
        })?;
        self.font = Some(bytes.into());
        Ok(self)
    }

    fn char_width(&self) -> f64 {
        f64::from(self.font_size_px) * 0.6
    }

    fn row_height(&self) -> f64 {
        f64::from(self.font_size_px) * f64::from(self.line_height)
    }
}

struct TextState {
    engine: TextLayoutEngine,
    font: vello_cpu::peniko::FontData,
}

/// CPU rasterizer for code frames, powered by `vello_cpu` and `parley`.
pub struct CpuSurface {
    opts: CpuSurfaceOpts,
    width: u16,
    height: u16,
    ctx: Option<vello_cpu::RenderContext>,
    text: Option<TextState>,
}

impl CpuSurface {
    pub fn new(opts: CpuSurfaceOpts) -> ReelResult<Self> {
        opts.canvas.validate()?;
        let width = u16::try_from(opts.canvas.width)
            .map_err(|_| ReelError::validation("canvas width exceeds u16"))?;
        let height = u16::try_from(opts.canvas.height)
            .map_err(|_| ReelError::validation("canvas height exceeds u16"))?;
        if !(opts.font_size_px.is_finite() && opts.font_size_px > 0.0) {
            return Err(ReelError::validation("font_size_px must be finite and > 0"));
        }
        if !(opts.line_height.is_finite() && opts.line_height > 0.0) {
            return Err(ReelError::validation("line_height must be finite and > 0"));
        }

        let text = match &opts.font {
            Some(bytes) => Some(TextState {
                engine: TextLayoutEngine::new(bytes)?,
                font: vello_cpu::peniko::FontData::new(
                    vello_cpu::peniko::Blob::from(bytes.to_vec()),
                    0,
                ),
            }),
            None => {
                tracing::debug!("no font configured; drawing glyph boxes");
                None
            }
        };

        Ok(Self {
            opts,
            width,
            height,
            ctx: None,
            text,
        })
    }

    pub fn opts(&self) -> &CpuSurfaceOpts {
        &self.opts
    }

    fn take_ctx(&mut self) -> vello_cpu::RenderContext {
        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == self.width && ctx.height() == self.height => ctx,
            _ => vello_cpu::RenderContext::new(self.width, self.height),
        };
        ctx.reset();
        ctx
    }

    fn draw_line(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        line: &RenderedLine,
        y: f64,
        gutter_digits: usize,
    ) -> ReelResult<()> {
        let opts = &self.opts;
        let row_h = opts.row_height();
        let pad = f64::from(opts.padding_px);

        if line.highlight > 0.0 {
            ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.set_paint(color(opts.theme.highlight.with_opacity(line.highlight)));
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                0.0,
                y,
                f64::from(self.width),
                y + row_h,
            ));
        }

        let number = format!("{:>gutter_digits$}", line.display_line_number);
        let number_tokens = [SyntaxToken::new(TokenKind::Plain, number.as_str())];
        draw_text(
            ctx,
            self.text.as_mut(),
            opts,
            TextRun {
                text: &number,
                tokens: &number_tokens,
                x: pad,
                y,
                opacity: line.line_number_opacity,
                fixed: Some(opts.theme.gutter),
            },
        )?;

        let gutter_w = (gutter_digits as f64 + 2.0) * opts.char_width();
        draw_text(
            ctx,
            self.text.as_mut(),
            opts,
            TextRun {
                text: line.visible_text(),
                tokens: &line.tokens,
                x: pad + gutter_w + line.offset_x * f64::from(opts.slide_distance_px),
                y,
                opacity: line.opacity,
                fixed: None,
            },
        )
    }
}

impl RenderingSurface for CpuSurface {
    fn canvas(&self) -> Canvas {
        self.opts.canvas
    }

    fn draw_frame(&mut self, frame: &FrameInstructions) -> ReelResult<FrameRGBA> {
        let mut ctx = self.take_ctx();

        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(color(self.opts.theme.background));
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(self.width),
            f64::from(self.height),
        ));

        let row_h = self.opts.row_height();
        let shift = scroll_shift(frame, row_h);
        let gutter_digits = frame
            .lines
            .iter()
            .map(|l| l.display_line_number.to_string().len())
            .max()
            .unwrap_or(1);
        let top = f64::from(self.opts.padding_px);
        for (i, line) in frame.lines.iter().enumerate() {
            let y = top + (i as f64) * row_h + shift;
            self.draw_line(&mut ctx, line, y, gutter_digits)?;
        }

        ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(self.width, self.height);
        ctx.render_to_pixmap(&mut pixmap);
        self.ctx = Some(ctx);

        Ok(FrameRGBA {
            width: u32::from(self.width),
            height: u32::from(self.height),
            data: pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }
}

struct TextRun<'a> {
    text: &'a str,
    tokens: &'a [SyntaxToken],
    x: f64,
    y: f64,
    opacity: f64,
    /// Overrides token colors.
    fixed: Option<Rgba8>,
}

fn draw_text(
    ctx: &mut vello_cpu::RenderContext,
    text: Option<&mut TextState>,
    opts: &CpuSurfaceOpts,
    run: TextRun<'_>,
) -> ReelResult<()> {
    if run.opacity <= 0.0 || run.text.is_empty() {
        return Ok(());
    }
    let color_of = |tok: &SyntaxToken| run.fixed.unwrap_or_else(|| opts.theme.color_for(tok.kind));

    let layered = run.opacity < 1.0;
    if layered {
        ctx.push_opacity_layer(run.opacity as f32);
    }
    match text {
        Some(t) => {
            let layout = t.engine.layout_tokens(
                run.text,
                run.tokens,
                opts.font_size_px,
                TextBrushRgba8::from(run.fixed.unwrap_or(opts.theme.text)),
                |tok| TextBrushRgba8::from(color_of(tok)),
            )?;
            ctx.set_transform(vello_cpu::kurbo::Affine::translate((run.x, run.y)));
            for line in layout.lines() {
                for item in line.items() {
                    let parley::layout::PositionedLayoutItem::GlyphRun(glyph_run) = item else {
                        continue;
                    };
                    let brush = glyph_run.style().brush;
                    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                        brush.r, brush.g, brush.b, brush.a,
                    ));
                    let glyphs = glyph_run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                        id: g.id,
                        x: g.x,
                        y: g.y,
                    });
                    ctx.glyph_run(&t.font)
                        .font_size(glyph_run.run().font_size())
                        .fill_glyphs(glyphs);
                }
            }
        }
        None => draw_glyph_boxes(ctx, opts, &run, color_of),
    }
    if layered {
        ctx.pop_layer();
    }
    Ok(())
}

/// Fallback without a font: one box per visible non-space character.
fn draw_glyph_boxes(
    ctx: &mut vello_cpu::RenderContext,
    opts: &CpuSurfaceOpts,
    run: &TextRun<'_>,
    color_of: impl Fn(&SyntaxToken) -> Rgba8,
) {
    let cw = opts.char_width();
    let fs = f64::from(opts.font_size_px);
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);

    let mut remaining = run.text.chars().count();
    let mut col = 0usize;
    for tok in run.tokens {
        if remaining == 0 {
            break;
        }
        ctx.set_paint(color(color_of(tok)));
        for ch in tok.text.chars().take(remaining) {
            if !ch.is_whitespace() {
                let x0 = run.x + (col as f64) * cw;
                ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                    x0 + 0.1 * cw,
                    run.y + 0.2 * fs,
                    x0 + 0.9 * cw,
                    run.y + 0.9 * fs,
                ));
            }
            col += 1;
            remaining -= 1;
        }
    }
}

/// Vertical offset of the content while the window scrolls.
fn scroll_shift(frame: &FrameInstructions, row_h: f64) -> f64 {
    let Some(scroll) = frame.scroll else {
        return 0.0;
    };
    let max_rows = f64::from(frame.window.max_lines);
    let delta = (f64::from(scroll.to_start) - f64::from(scroll.from_start)).clamp(-max_rows, max_rows);
    let p = scroll.progress.clamp(0.0, 1.0);
    let eased = p * p * (3.0 - 2.0 * p);
    delta * row_h * (1.0 - eased)
}

fn color(c: Rgba8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
