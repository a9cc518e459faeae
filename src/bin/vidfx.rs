use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "vidfx", version)]
struct Cli {
    /// Pipeline options JSON (see `PipelineOpts`).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Raise log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print video metadata (requires `ffprobe` on PATH).
    Metadata(MetadataArgs),
    /// Apply transforms and export a new video (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Extract thumbnails at timestamps or evenly spaced key frames.
    Thumbnails(ThumbnailArgs),
    /// Combine color matrices and write the resulting 3D LUT as a `.cube` file.
    Lut(LutArgs),
}

#[derive(Parser, Debug)]
struct MetadataArgs {
    /// Input video.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Print JSON instead of a summary line.
    #[arg(long)]
    json: bool,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input video.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output path; the extension is not inspected, use `--format`.
    #[arg(long)]
    out: PathBuf,

    /// Transform parameters JSON (host argument map). Flags below override it.
    #[arg(long)]
    params: Option<PathBuf>,

    /// Clockwise quarter turns.
    #[arg(long, allow_hyphen_values = true)]
    rotate: Option<i64>,

    #[arg(long)]
    flip_x: bool,

    #[arg(long)]
    flip_y: bool,

    /// Crop rectangle in source pixels as `x,y,width,height`.
    #[arg(long, value_parser = parse_crop)]
    crop: Option<[i64; 4]>,

    /// Uniform scale factor.
    #[arg(long)]
    scale: Option<f64>,

    /// Gaussian blur sigma.
    #[arg(long)]
    blur: Option<f64>,

    /// Overlay image composited over every frame.
    #[arg(long)]
    overlay: Option<PathBuf>,

    /// Playback speed factor.
    #[arg(long)]
    speed: Option<f64>,

    #[arg(long)]
    start_us: Option<i64>,

    #[arg(long)]
    end_us: Option<i64>,

    /// Video bitrate in bits per second.
    #[arg(long)]
    bitrate: Option<u32>,

    #[arg(long)]
    no_audio: bool,

    #[arg(long, value_enum)]
    format: Option<vidfx::OutputFormat>,
}

#[derive(Parser, Debug)]
struct ThumbnailArgs {
    /// Input video.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Directory receiving `thumb_<n>.<ext>` files.
    #[arg(long)]
    out_dir: PathBuf,

    /// Timestamps in microseconds (comma separated).
    #[arg(long = "at-us", value_delimiter = ',')]
    at_us: Vec<i64>,

    /// Sample this many key frames instead of explicit timestamps.
    #[arg(long, default_value_t = vidfx::DEFAULT_MAX_OUTPUT_FRAMES)]
    max_frames: usize,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    #[arg(long, value_enum, default_value_t = vidfx::BoxFit::Contain)]
    fit: vidfx::BoxFit,

    #[arg(long, value_enum, default_value_t = vidfx::ThumbnailFormat::Jpeg)]
    format: vidfx::ThumbnailFormat,
}

#[derive(Parser, Debug)]
struct LutArgs {
    /// JSON list of 20-float color matrices, applied in order.
    #[arg(long)]
    matrices: Option<PathBuf>,

    /// Built-in matrix applied after `--matrices`.
    #[arg(long, value_enum)]
    preset: Option<Preset>,

    /// Cube side length.
    #[arg(long, default_value_t = vidfx::DEFAULT_LUT_SIZE)]
    size: usize,

    #[arg(long, default_value = "vidfx")]
    title: String,

    /// Output `.cube` path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Preset {
    Identity,
    Grayscale,
    Sepia,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let opts = match &cli.config {
        Some(path) => vidfx::PipelineOpts::from_json_file(path)?,
        None => vidfx::PipelineOpts::default(),
    };

    match cli.cmd {
        Command::Metadata(args) => cmd_metadata(args, &opts),
        Command::Render(args) => cmd_render(args, opts),
        Command::Thumbnails(args) => cmd_thumbnails(args, &opts),
        Command::Lut(args) => cmd_lut(args),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_crop(s: &str) -> Result<[i64; 4], String> {
    let parts: Vec<i64> = s
        .split(',')
        .map(|p| p.trim().parse::<i64>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("crop '{s}': {e}"))?;
    parts
        .try_into()
        .map_err(|_| format!("crop '{s}' must be x,y,width,height"))
}

fn read_input(path: &Path) -> anyhow::Result<(Vec<u8>, String)> {
    let bytes = std::fs::read(path).with_context(|| format!("read input '{}'", path.display()))?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("mp4")
        .to_string();
    Ok((bytes, ext))
}

fn cmd_metadata(args: MetadataArgs, opts: &vidfx::PipelineOpts) -> anyhow::Result<()> {
    let (bytes, ext) = read_input(&args.in_path)?;
    let meta = vidfx::inspect(&bytes, &ext, opts)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&meta)?);
    } else {
        println!("{}", vidfx::describe(&meta));
    }
    Ok(())
}

fn cmd_render(args: RenderArgs, opts: vidfx::PipelineOpts) -> anyhow::Result<()> {
    let mut params = match &args.params {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("read params '{}'", path.display()))?;
            vidfx::TransformParams::from_json_str(&text)?
        }
        None => vidfx::TransformParams::default(),
    };
    if let Some(r) = args.rotate {
        params.rotate_quarter_turns = r;
    }
    params.flip_x |= args.flip_x;
    params.flip_y |= args.flip_y;
    if let Some([x, y, w, h]) = args.crop {
        params.crop_x = Some(x);
        params.crop_y = Some(y);
        params.crop_width = Some(w);
        params.crop_height = Some(h);
    }
    if let Some(s) = args.scale {
        params.scale_x = Some(s);
        params.scale_y = Some(s);
    }
    params.blur_sigma = args.blur.or(params.blur_sigma);
    params.playback_speed = args.speed.or(params.playback_speed);
    params.start_us = args.start_us.or(params.start_us);
    params.end_us = args.end_us.or(params.end_us);
    params.bitrate = args.bitrate.or(params.bitrate);
    if args.no_audio {
        params.enable_audio = false;
    }
    if let Some(f) = args.format {
        params.output_format = f;
    }
    if let Some(path) = &args.overlay {
        params.overlay_image = Some(
            std::fs::read(path).with_context(|| format!("read overlay '{}'", path.display()))?,
        );
    }

    let (bytes, ext) = read_input(&args.in_path)?;
    let handle = vidfx::RenderJob::new(1, bytes, ext, params)
        .with_opts(Arc::new(opts))
        .spawn()?;
    let output = handle.wait_with_progress(|ev| {
        eprint!("\rrendering {:>5.1}%", ev.progress * 100.0);
    })?;
    eprintln!();

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(&args.out, &output.data)
        .with_context(|| format!("write output '{}'", args.out.display()))?;

    eprintln!(
        "wrote {} ({}x{}, {} frames)",
        args.out.display(),
        output.size.width,
        output.size.height,
        output.frames
    );
    Ok(())
}

fn cmd_thumbnails(args: ThumbnailArgs, opts: &vidfx::PipelineOpts) -> anyhow::Result<()> {
    let (bytes, ext) = read_input(&args.in_path)?;
    let request = vidfx::ThumbnailRequest {
        timestamps_us: args.at_us,
        max_output_frames: Some(args.max_frames),
        box_fit: args.fit,
        width: args.width,
        height: args.height,
        format: args.format,
    };
    let thumbs = vidfx::generate_thumbnails(&bytes, &ext, &request, opts, &|p| {
        tracing::debug!(progress = p, "thumbnails");
    })?;

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create output dir '{}'", args.out_dir.display()))?;
    for (i, data) in thumbs.iter().enumerate() {
        let path = args
            .out_dir
            .join(format!("thumb_{i:03}.{}", args.format.extension()));
        std::fs::write(&path, data).with_context(|| format!("write '{}'", path.display()))?;
    }
    eprintln!("wrote {} thumbnails to {}", thumbs.len(), args.out_dir.display());
    Ok(())
}

fn cmd_lut(args: LutArgs) -> anyhow::Result<()> {
    let mut matrices: Vec<vidfx::ColorMatrix> = match &args.matrices {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("read matrices '{}'", path.display()))?;
            let lists: Vec<Vec<f64>> =
                serde_json::from_str(&text).with_context(|| "parse matrices JSON")?;
            lists
                .into_iter()
                .map(vidfx::ColorMatrix::try_from)
                .collect::<Result<_, _>>()?
        }
        None => Vec::new(),
    };
    if let Some(p) = args.preset {
        matrices.push(match p {
            Preset::Identity => vidfx::ColorMatrix::IDENTITY,
            Preset::Grayscale => vidfx::ColorMatrix::grayscale(),
            Preset::Sepia => vidfx::ColorMatrix::sepia(),
        });
    }

    let combined = vidfx::combine(&matrices)
        .context("no color matrices given (use --matrices and/or --preset)")?;
    let lut = vidfx::ColorLut::build(&combined, args.size)?;
    lut.write_cube(&args.out, &args.title)?;

    eprintln!("wrote {} ({}^3 entries)", args.out.display(), lut.size());
    Ok(())
}
