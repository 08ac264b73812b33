use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn, Level};

use art_studio::{
    audio::{Analyser, AudioLoader, ClipSource},
    config::Config,
    modules::{ModuleFactory, ModuleKind},
    studio::{run, Composition, ExportFormat, RunOptions, Studio},
    surface::Surface,
};

#[cfg(feature = "gif")]
use art_studio::export::GifRecorder;

#[derive(Parser)]
#[command(
    name = "art-studio",
    version,
    about = "Render layered generative artwork",
    long_about = "Art Studio renders compositions of visual modules (generators, shapes, audio-reactive layers and effects) frame by frame, optionally driven by an audio track."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Render a composition file to numbered images
    Render(RenderArgs),

    /// List the built-in module types
    List,

    /// Print the default options of a module type as JSON
    Defaults {
        /// Module type tag, e.g. "circles"
        kind: String,
    },
}

#[derive(clap::Args)]
struct RenderArgs {
    /// Composition JSON file
    #[arg(short = 'i', long)]
    composition: PathBuf,

    /// Number of frames to render
    #[arg(short, long, default_value_t = 60)]
    frames: u64,

    /// Output directory for frame images
    #[arg(short, long)]
    output: PathBuf,

    /// Save every Kth frame
    #[arg(long, default_value_t = 1)]
    every: u64,

    /// Image format for saved frames (png, jpg)
    #[arg(long, default_value = "png")]
    format: String,

    /// Configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Audio file driving audio-reactive modules
    #[arg(short, long)]
    audio: Option<PathBuf>,

    /// Also write an animated GIF of every rendered frame
    #[arg(long)]
    gif: Option<PathBuf>,

    /// Seed for randomized modules, overriding the configuration
    #[arg(long)]
    seed: Option<u64>,

    /// Pace frames at the configured fps instead of rendering flat out
    #[arg(long)]
    realtime: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .init();

    match cli.command {
        Command::Render(args) => render(args).await,
        Command::List => {
            list_modules();
            Ok(())
        }
        Command::Defaults { kind } => print_defaults(&kind),
    }
}

async fn render(args: RenderArgs) -> Result<()> {
    info!("Starting Art Studio v{}", env!("CARGO_PKG_VERSION"));
    info!("Composition: {:?}", args.composition);
    info!("Output: {:?}", args.output);

    // Load configuration
    let mut config = match &args.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(config_path)?
        }
        None => {
            info!("Using default configuration");
            Config::default()
        }
    };
    if args.seed.is_some() {
        config.animation.seed = args.seed;
    }
    config.validate()?;

    if args.every == 0 {
        bail!("--every must be at least 1");
    }
    let format = ExportFormat::from_extension(&args.format)
        .with_context(|| format!("Unsupported frame format: {}", args.format))?;

    if let Err(e) = rayon::ThreadPoolBuilder::new()
        .num_threads(config.render.threads)
        .build_global()
    {
        warn!("Could not size the render thread pool: {}", e);
    }

    let mut studio = Studio::from_config(&config)?;

    let data = Composition::read_file(&args.composition)
        .with_context(|| format!("Failed to read composition {:?}", args.composition))?;
    let report = studio.load_composition(&data)?;
    for skipped in &report.skipped {
        warn!("Module entry {} skipped: {}", skipped.index, skipped.reason);
    }
    info!("Loaded {} modules", report.loaded.len());

    if let Some(audio_path) = &args.audio {
        let audio = AudioLoader::load(audio_path).await?;
        info!(
            "Audio: {:.1}s, {} Hz, {} channels",
            audio.duration, audio.sample_rate, audio.channels
        );
        let analyser = Analyser::from_config(&config.audio)?;
        let source = ClipSource::new(&audio, config.animation.fps, analyser);
        studio.enable_audio_reactivity(Box::new(source));
    }

    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("Failed to create output directory {:?}", args.output))?;

    let mut sink = FrameSink {
        output: args.output.clone(),
        every: args.every,
        format,
        saved: 0,
        #[cfg(feature = "gif")]
        gif: match &args.gif {
            Some(_) => {
                let (width, height) = studio.size();
                Some(GifRecorder::new(width, height, config.animation.fps, args.frames as usize)?)
            }
            None => None,
        },
    };

    #[cfg(not(feature = "gif"))]
    if args.gif.is_some() {
        bail!("This build was compiled without GIF support");
    }

    let frames = if args.realtime {
        let options = RunOptions {
            fps: config.animation.fps,
            max_frames: Some(args.frames),
        };
        let shutdown = async {
            if tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
        };
        run(&mut studio, options, |studio, frame| sink.on_frame(studio, frame), shutdown).await?
    } else {
        studio.start();
        let mut frames = 0;
        while frames < args.frames && studio.tick() {
            frames += 1;
            sink.on_frame(&studio, frames)?;
        }
        studio.stop();
        frames
    };

    info!("Rendered {} frames, saved {} images", frames, sink.saved);

    #[cfg(feature = "gif")]
    if let (Some(recorder), Some(path)) = (&sink.gif, &args.gif) {
        recorder.encode_to_file(path)?;
    }

    info!("Render complete! Output saved to: {:?}", args.output);
    Ok(())
}

/// Writes rendered frames to disk
struct FrameSink {
    output: PathBuf,
    every: u64,
    format: ExportFormat,
    saved: u64,
    #[cfg(feature = "gif")]
    gif: Option<GifRecorder>,
}

impl FrameSink {
    fn on_frame<S: Surface>(&mut self, studio: &Studio<S>, frame: u64) -> art_studio::Result<()> {
        #[cfg(feature = "gif")]
        if let Some(recorder) = &mut self.gif {
            recorder.capture(studio)?;
        }

        if frame % self.every != 0 {
            return Ok(());
        }

        let path = frame_path(&self.output, frame, self.format);
        std::fs::write(&path, studio.export_image(self.format)?)?;
        self.saved += 1;
        Ok(())
    }
}

fn frame_path(dir: &Path, frame: u64, format: ExportFormat) -> PathBuf {
    dir.join(format!("frame_{:05}.{}", frame, format.extension()))
}

fn list_modules() {
    println!("{:<16} {:<10} DESCRIPTION", "TYPE", "CATEGORY");
    for kind in ModuleKind::ALL {
        let category = format!("{:?}", kind.category()).to_lowercase();
        println!("{:<16} {:<10} {}", kind.tag(), category, kind.description());
    }
}

fn print_defaults(kind: &str) -> Result<()> {
    let factory = ModuleFactory::with_seed(0);
    let defaults = factory
        .defaults(kind)
        .with_context(|| format!("Unknown module type: {}", kind))?;
    println!("{}", serde_json::to_string_pretty(&defaults)?);
    Ok(())
}
