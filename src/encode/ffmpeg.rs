use crate::encode::encoder::{EncodeConfig, MediaEncoder, OutputFormat};
use crate::export::gate::CancelToken;
use crate::foundation::core::Fps;
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::backend::FrameRGBA;
use std::io::{Read, Write as _};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::JoinHandle;

/// Options for [`FfmpegEncoder`].
#[derive(Clone, Debug)]
pub struct FfmpegEncoderOpts {
    /// Executable to spawn.
    pub program: PathBuf,
    /// Background color used to flatten alpha (RGBA8, straight alpha).
    pub bg_rgba: [u8; 4],
    /// Constant rate factor passed to the video codec.
    pub crf: u8,
}

impl Default for FfmpegEncoderOpts {
    fn default() -> Self {
        Self {
            program: PathBuf::from("ffmpeg"),
            bg_rgba: [0, 0, 0, 255],
            crf: 23,
        }
    }
}

/// MP4/WebM encoder that spawns the system `ffmpeg` and streams raw frames to stdin.
///
/// Output goes to a temporary file that is read back and removed.
#[derive(Clone, Debug, Default)]
pub struct FfmpegEncoder {
    opts: FfmpegEncoderOpts,
}

impl FfmpegEncoder {
    pub fn new(opts: FfmpegEncoderOpts) -> Self {
        Self { opts }
    }

    fn spawn(&self, cfg: &EncodeConfig, out: &Path) -> ReelResult<FfmpegProcess> {
        let mut cmd = Command::new(&self.opts.program);
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        // Input: raw RGBA8 frames, flattened to opaque before writing.
        cmd.args([
            "-y",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
        ]);
        push_input_fps(&mut cmd, cfg.fps);
        cmd.args(["-i", "pipe:0", "-an"]);

        let crf = self.opts.crf.to_string();
        match cfg.format {
            OutputFormat::Mp4 => {
                cmd.args([
                    "-c:v",
                    "libx264",
                    "-pix_fmt",
                    "yuv420p",
                    "-crf",
                    &crf,
                    "-movflags",
                    "+faststart",
                ]);
            }
            OutputFormat::WebM => {
                cmd.args([
                    "-c:v",
                    "libvpx-vp9",
                    "-pix_fmt",
                    "yuv420p",
                    "-crf",
                    &crf,
                    "-b:v",
                    "0",
                ]);
            }
            OutputFormat::Gif => {
                return Err(ReelError::validation("ffmpeg encoder does not produce gif"));
            }
        }
        cmd.arg(out);

        let mut child = cmd.spawn().map_err(|e| {
            ReelError::encoding(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ReelError::encoding("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| ReelError::encoding("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        Ok(FfmpegProcess {
            child,
            stdin: Some(stdin),
            stderr_drain: Some(stderr_drain),
        })
    }
}

impl MediaEncoder for FfmpegEncoder {
    fn supports(&self, format: OutputFormat) -> bool {
        matches!(format, OutputFormat::Mp4 | OutputFormat::WebM)
    }

    fn check_format(&self, format: OutputFormat) -> ReelResult<()> {
        if !self.supports(format) {
            return Err(ReelError::validation(format!(
                "output format '{format}' is not supported by the ffmpeg encoder"
            )));
        }
        if !is_program_on_path(&self.opts.program) {
            return Err(ReelError::validation(format!(
                "ffmpeg is required for {format} encoding, but was not found on PATH"
            )));
        }
        Ok(())
    }

    fn check_config(&self, cfg: &EncodeConfig) -> ReelResult<()> {
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            return Err(ReelError::validation(format!(
                "ffmpeg output width/height must be even (required for yuv420p), got {}x{}",
                cfg.width, cfg.height
            )));
        }
        self.check_format(cfg.format)
    }

    #[tracing::instrument(skip_all, fields(format = %cfg.format, frames = frames.len()))]
    fn encode(
        &mut self,
        frames: &[FrameRGBA],
        cfg: &EncodeConfig,
        progress: &mut dyn FnMut(f64),
        cancel: &CancelToken,
    ) -> ReelResult<Vec<u8>> {
        self.check_config(cfg)?;
        cfg.validate_frames(frames)?;

        let out = TempFileGuard(Some(temp_output_path(cfg.format)));
        let out_path = out.path().to_path_buf();
        let mut proc = self.spawn(cfg, &out_path)?;

        let mut scratch = vec![0u8; (cfg.width as usize) * (cfg.height as usize) * 4];
        let n = frames.len() as f64;
        for (i, frame) in frames.iter().enumerate() {
            if let Err(e) = cancel.checkpoint("encoding") {
                proc.abort();
                return Err(e);
            }
            flatten_to_opaque_rgba8(&mut scratch, frame, self.opts.bg_rgba)?;
            if let Err(e) = proc.write(&scratch) {
                // ffmpeg usually died; its stderr explains why.
                let detail = proc.finish().err().map(|f| f.to_string()).unwrap_or_default();
                return Err(ReelError::encoding(format!(
                    "failed to write frame to ffmpeg stdin: {e}. {detail}"
                )));
            }
            progress((i + 1) as f64 / n);
        }

        proc.finish()?;
        let bytes = std::fs::read(&out_path).map_err(|e| {
            ReelError::encoding(format!(
                "failed to read ffmpeg output '{}': {e}",
                out_path.display()
            ))
        })?;
        tracing::debug!(bytes = bytes.len(), "ffmpeg finished");
        Ok(bytes)
    }
}

struct FfmpegProcess {
    child: Child,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
}

impl FfmpegProcess {
    fn write(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        match self.stdin.as_mut() {
            Some(stdin) => stdin.write_all(bytes),
            None => Err(std::io::Error::other("ffmpeg stdin already closed")),
        }
    }

    /// Close stdin, wait for exit and surface stderr on failure.
    fn finish(&mut self) -> ReelResult<()> {
        drop(self.stdin.take());
        let status = self.child.wait().map_err(|e| {
            ReelError::encoding(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| ReelError::encoding("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| ReelError::encoding(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(ReelError::encoding(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }
        Ok(())
    }

    fn abort(&mut self) {
        drop(self.stdin.take());
        let _ = self.child.kill();
        let _ = self.child.wait();
        if let Some(handle) = self.stderr_drain.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for FfmpegProcess {
    fn drop(&mut self) {
        if self.stdin.is_some() {
            self.abort();
        }
    }
}

struct TempFileGuard(Option<PathBuf>);

impl TempFileGuard {
    fn path(&self) -> &Path {
        self.0.as_deref().unwrap_or_else(|| Path::new(""))
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

fn temp_output_path(format: OutputFormat) -> PathBuf {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    std::env::temp_dir().join(format!(
        "codereel_export_{}_{}_{}.{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0),
        COUNTER.fetch_add(1, Ordering::Relaxed),
        format.extension()
    ))
}

fn push_input_fps(cmd: &mut Command, fps: Fps) {
    // For rawvideo input, `-r` before `-i` sets the input framerate.
    cmd.args(["-r", &format!("{}/{}", fps.num, fps.den)]);
}

/// Flatten a frame over `bg_rgba` into opaque straight RGBA8.
pub(crate) fn flatten_to_opaque_rgba8(
    dst: &mut [u8],
    frame: &FrameRGBA,
    bg_rgba: [u8; 4],
) -> ReelResult<()> {
    let src = &frame.data;
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(ReelError::validation(
            "flatten_to_opaque_rgba8 expects equal-length rgba8 buffers",
        ));
    }

    let bg = [
        u16::from(bg_rgba[0]),
        u16::from(bg_rgba[1]),
        u16::from(bg_rgba[2]),
    ];
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let a = u16::from(s[3]);
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }
        let inv = 255 - a;
        for c in 0..3 {
            let fg = if frame.premultiplied {
                u16::from(s[c])
            } else {
                mul_div255(u16::from(s[c]), a)
            };
            d[c] = (fg + mul_div255(bg[c], inv)).min(255) as u8;
        }
        d[3] = 255;
    }
    Ok(())
}

fn mul_div255(x: u16, y: u16) -> u16 {
    (x * y + 127) / 255
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> ReelResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    is_program_on_path(Path::new("ffmpeg"))
}

fn is_program_on_path(program: &Path) -> bool {
    Command::new(program)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
