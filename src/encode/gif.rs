use crate::encode::encoder::{EncodeConfig, MediaEncoder, OutputFormat};
use crate::encode::ffmpeg::flatten_to_opaque_rgba8;
use crate::export::gate::CancelToken;
use crate::foundation::core::Fps;
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::backend::FrameRGBA;
use image::codecs::gif::{GifEncoder as ImageGifEncoder, Repeat};
use image::{Delay, Frame, RgbaImage};
use std::time::Duration;

/// Options for [`GifEncoder`].
#[derive(Clone, Copy, Debug)]
pub struct GifEncoderOpts {
    /// Quantizer speed, 1 (best) to 30 (fastest).
    pub speed: i32,
    /// Background color used to flatten alpha (RGBA8, straight alpha).
    pub bg_rgba: [u8; 4],
}

impl Default for GifEncoderOpts {
    fn default() -> Self {
        Self {
            speed: 10,
            bg_rgba: [0, 0, 0, 255],
        }
    }
}

/// Looping animated GIF encoder built on `image`.
#[derive(Clone, Debug, Default)]
pub struct GifEncoder {
    opts: GifEncoderOpts,
}

impl GifEncoder {
    pub fn new(opts: GifEncoderOpts) -> Self {
        Self { opts }
    }
}

impl MediaEncoder for GifEncoder {
    fn supports(&self, format: OutputFormat) -> bool {
        format == OutputFormat::Gif
    }

    #[tracing::instrument(skip_all, fields(frames = frames.len()))]
    fn encode(
        &mut self,
        frames: &[FrameRGBA],
        cfg: &EncodeConfig,
        progress: &mut dyn FnMut(f64),
        cancel: &CancelToken,
    ) -> ReelResult<Vec<u8>> {
        self.check_format(cfg.format)?;
        cfg.validate_frames(frames)?;

        let delay = frame_delay(cfg.fps);
        let mut out = Vec::new();
        {
            let mut enc = ImageGifEncoder::new_with_speed(&mut out, self.opts.speed.clamp(1, 30));
            enc.set_repeat(Repeat::Infinite)
                .map_err(|e| ReelError::encoding(format!("gif: set repeat: {e}")))?;

            let n = frames.len() as f64;
            for (i, frame) in frames.iter().enumerate() {
                cancel.checkpoint("encoding")?;
                let mut rgba = vec![0u8; frame.data.len()];
                flatten_to_opaque_rgba8(&mut rgba, frame, self.opts.bg_rgba)?;
                let buf = RgbaImage::from_raw(cfg.width, cfg.height, rgba)
                    .ok_or_else(|| ReelError::encoding("gif: frame buffer has wrong length"))?;
                enc.encode_frame(Frame::from_parts(buf, 0, 0, delay))
                    .map_err(|e| ReelError::encoding(format!("gif: encode frame {i}: {e}")))?;
                progress((i + 1) as f64 / n);
            }
        }
        Ok(out)
    }
}

/// Per-frame delay for `fps`. Falls back to a duration when `1000 * den` overflows `u32`.
fn frame_delay(fps: Fps) -> Delay {
    match 1000u32.checked_mul(fps.den) {
        Some(numer) => Delay::from_numer_denom_ms(numer, fps.num),
        None => Delay::from_saturating_duration(Duration::from_secs_f64(
            f64::from(fps.den) / f64::from(fps.num),
        )),
    }
}
