use crate::foundation::core::Canvas;
use crate::foundation::error::ReelResult;
use crate::render::instructions::FrameInstructions;

/// A rendered frame as RGBA8 pixels.
///
/// Frames produced by [`crate::render::cpu::CpuSurface`] are premultiplied alpha; the
/// `premultiplied` flag makes this explicit at encoder boundaries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether the `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Straight-alpha copy of the pixel data.
    pub fn to_straight_rgba(&self) -> Vec<u8> {
        if !self.premultiplied {
            return self.data.clone();
        }
        let mut out = self.data.clone();
        for px in out.chunks_exact_mut(4) {
            let a = u16::from(px[3]);
            if a == 0 || a == 255 {
                continue;
            }
            for c in &mut px[..3] {
                *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
            }
        }
        out
    }
}

/// Draws composed frames into pixels.
///
/// Surfaces hold per-session state (render contexts, fonts) and are moved into the export
/// session that uses them, so they must be `Send`.
pub trait RenderingSurface: Send {
    /// Fixed pixel dimensions of every frame this surface produces.
    fn canvas(&self) -> Canvas;

    fn draw_frame(&mut self, frame: &FrameInstructions) -> ReelResult<FrameRGBA>;
}
