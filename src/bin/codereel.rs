use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use codereel::CodeSource as _;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "codereel", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the computed timeline steps as JSON.
    Steps(StepsArgs),
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
    /// Export the whole animation (MP4/WebM need `ffmpeg` on PATH).
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct StepsArgs {
    /// Input deck JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Parser, Debug)]
struct SurfaceArgs {
    /// TTF/OTF font used for code text. Glyph boxes are drawn without one.
    #[arg(long)]
    font: Option<PathBuf>,

    /// Override the deck's canvas width.
    #[arg(long)]
    width: Option<u32>,

    /// Override the deck's canvas height.
    #[arg(long)]
    height: Option<u32>,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input deck JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Timeline position in milliseconds.
    #[arg(long)]
    time_ms: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    surface: SurfaceArgs,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input deck JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output path; the extension picks the format (mp4, webm, gif).
    #[arg(long)]
    out: PathBuf,

    /// Override the deck's frame rate (integer fps).
    #[arg(long)]
    fps: Option<u32>,

    #[command(flatten)]
    surface: SurfaceArgs,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Steps(args) => cmd_steps(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Render(args) => cmd_render(args),
    }
}

fn read_deck(path: &Path) -> anyhow::Result<codereel::Deck> {
    codereel::Deck::from_path(path).with_context(|| format!("load deck '{}'", path.display()))
}

fn apply_canvas(canvas: &mut codereel::Canvas, args: &SurfaceArgs) {
    if let Some(w) = args.width {
        canvas.width = w;
    }
    if let Some(h) = args.height {
        canvas.height = h;
    }
}

fn make_surface(
    canvas: codereel::Canvas,
    args: &SurfaceArgs,
) -> anyhow::Result<codereel::CpuSurface> {
    let mut opts = codereel::CpuSurfaceOpts::default().with_canvas(canvas);
    if let Some(font) = &args.font {
        opts = opts
            .with_font_file(font)
            .with_context(|| format!("load font '{}'", font.display()))?;
    }
    Ok(codereel::CpuSurface::new(opts)?)
}

fn cmd_steps(args: StepsArgs) -> anyhow::Result<()> {
    let deck = read_deck(&args.in_path)?;
    let code = codereel::CodeListing::from_text(&deck.code);
    let timeline = codereel::Timeline::for_code(&deck.slides, deck.speed, code.line_count())?;
    let out = serde_json::to_string_pretty(timeline.steps()).context("serialize timeline")?;
    println!("{out}");
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let mut deck = read_deck(&args.in_path)?;
    apply_canvas(&mut deck.export.canvas, &args.surface);

    let mut surface = make_surface(deck.export.canvas, &args.surface)?;
    let mut preview = codereel::PreviewSession::from_deck(&deck)?;
    preview.seek(args.time_ms);
    let frame = preview.draw(&mut surface)?;

    codereel::encode::ffmpeg::ensure_parent_dir(&args.out)?;
    image::save_buffer_with_format(
        &args.out,
        &frame.to_straight_rgba(),
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let mut deck = read_deck(&args.in_path)?;
    apply_canvas(&mut deck.export.canvas, &args.surface);
    if let Some(fps) = args.fps {
        deck.export.fps = codereel::Fps::new(fps, 1)?;
    }
    deck.export.format = codereel::OutputFormat::from_path(&args.out)?;

    let surface = make_surface(deck.export.canvas, &args.surface)?;
    let request = codereel::ExportRequest::from_deck(&deck);
    let engine = codereel::ExportEngine::new();
    let job = engine
        .export_video(
            request,
            surface,
            codereel::StandardEncoder::default(),
            |p: &codereel::ExportProgress| {
                if p.error.is_none() {
                    tracing::info!(
                        phase = ?p.phase,
                        frame = p.current_frame,
                        total = p.total_frames,
                        "{:>5.1}%",
                        p.progress * 100.0
                    );
                }
            },
        )
        .context("start export")?;
    let artifact = job.wait().context("export failed")?;

    codereel::encode::ffmpeg::ensure_parent_dir(&args.out)?;
    std::fs::write(&args.out, &artifact.bytes)
        .with_context(|| format!("write '{}'", args.out.display()))?;

    eprintln!(
        "wrote {} ({} frames, {:.2} s)",
        args.out.display(),
        artifact.frame_count,
        artifact.duration_ms / 1000.0
    );
    Ok(())
}
