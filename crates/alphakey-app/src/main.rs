//! AlphaKey - chroma-key alpha synthesis for raw video
//!
//! Entry point: reads raw frames, keys them, writes raw frames.

use std::path::PathBuf;

use alphakey_core::{FrameRate, PixelFormat, StreamInfo};
use alphakey_effects::{
    negotiate, ChromaKeyStage, ConfigSource, FileSource, NoSource, StageConfig, SUPPORTED_FORMATS,
};
use alphakey_media::{FramePump, RawFileSink, RawFileSource};
use anyhow::{Context as _, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "alphakey", version, about = "Synthesise alpha from chroma distance")]
struct Cli {
    /// Raw input frames, tightly packed.
    #[arg(long, short)]
    input: Option<PathBuf>,

    /// Raw output frames.
    #[arg(long, short)]
    output: Option<PathBuf>,

    #[arg(long, default_value_t = 1920)]
    width: u32,

    #[arg(long, default_value_t = 1080)]
    height: u32,

    /// Pixel format name, e.g. yuva420p or rgba.
    #[arg(long, default_value = "yuva444p")]
    format: PixelFormat,

    /// Frame rate as `num/den` or an integer.
    #[arg(long, default_value = "25")]
    fps: FrameRate,

    /// Keying options, `key=value` pairs joined by `:`.
    #[arg(long, short, default_value = "")]
    params: String,

    /// File polled for a new option line before every frame.
    #[arg(long, default_value = "uv.txt")]
    reload: PathBuf,

    /// Do not poll a reload file.
    #[arg(long, default_value_t = false)]
    no_reload: bool,

    /// Print the resolved configuration as JSON and exit.
    #[arg(long, default_value_t = false)]
    dump_params: bool,
}

fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    let format = negotiate(&[cli.format], &SUPPORTED_FORMATS)
        .with_context(|| format!("pixel format {} cannot be keyed", cli.format))?;
    let config = StageConfig::from_options(&cli.params, format)
        .with_context(|| format!("invalid keying options '{}'", cli.params))?;

    if cli.dump_params {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let (input_path, output_path) = match (&cli.input, &cli.output) {
        (Some(i), Some(o)) => (i, o),
        _ => anyhow::bail!("--input and --output are required unless --dump-params is given"),
    };

    let source: Box<dyn ConfigSource> = if cli.no_reload {
        Box::new(NoSource)
    } else {
        Box::new(FileSource::new(&cli.reload))
    };
    let stage = ChromaKeyStage::new(config, source);

    let link = StreamInfo::new(cli.width, cli.height, format, cli.fps)?;
    let out_link = stage.configure_output(&link)?;
    info!(
        width = out_link.width,
        height = out_link.height,
        format = %out_link.format,
        fps = %out_link.frame_rate,
        "link configured"
    );

    let upstream = RawFileSource::open(input_path, link)
        .with_context(|| format!("open input '{}'", input_path.display()))?;
    let downstream = RawFileSink::create(output_path)
        .with_context(|| format!("create output '{}'", output_path.display()))?;

    let mut pump = FramePump::new(stage, upstream, downstream);
    let emitted = pump.run_to_end()?;
    info!(
        emitted,
        dropped = pump.frames_dropped(),
        output = %output_path.display(),
        "done"
    );
    Ok(())
}
