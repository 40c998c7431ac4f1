use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use orb_core::{
    record::write_png, render_frame, AnimationController, Feeling, FrameBuffer, Mode, OrbConfig,
    OrbScene, Palette, PlaybackClock, Recorder, Scheduler,
};
use tracing_subscriber::EnvFilter;

fn main() -> orb_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            common,
            time,
            output,
        } => run_render(&common, time, &output),
        Commands::Record {
            common,
            script,
            duration,
            output_dir,
            fps,
        } => run_record(&common, script.as_deref(), duration, output_dir, fps),
        Commands::Classify { text } => run_classify(&text.join(" ")),
    }
}

fn run_render(common: &CommonArgs, time: f64, output: &Path) -> orb_core::Result<()> {
    let config = common.resolve()?;
    tracing::info!(?output, time, "rendering still frame");

    let mut scene = scene_from(&config);
    let inputs = scene.frame(0.0).at_time(time as f32);
    let mut buffer = FrameBuffer::default();
    render_frame(&inputs, &mut buffer);
    write_png(output, &buffer, config.recording.background)
}

fn run_record(
    common: &CommonArgs,
    script: Option<&Path>,
    duration: Option<f64>,
    output_dir: Option<String>,
    fps: Option<u32>,
) -> orb_core::Result<()> {
    let mut config = common.resolve()?;
    if let Some(dir) = output_dir {
        config.recording.output_dir = dir;
    }
    if let Some(fps) = fps {
        config.recording.fps = fps;
    }

    let mut scheduler = match script {
        Some(path) => Scheduler::load(path)?,
        None => Scheduler::new(),
    };
    let duration = duration.unwrap_or_else(|| scheduler.duration() + 2.0);
    let step = 1.0 / f64::from(config.recording.fps.max(1));
    let frames = (duration / step).ceil().max(1.0) as u32;
    tracing::info!(duration, frames, events = scheduler.events().len(), "recording session");

    let mut scene = scene_from(&config);
    let mut recorder = Recorder::new(config.recording.clone());
    let mut clock = PlaybackClock::default();
    let mut buffer = FrameBuffer::default();

    recorder.start()?;
    for _ in 0..frames {
        let fired = scheduler.tick(&clock, &mut scene);
        if fired > 0 {
            tracing::debug!(fired, time = clock.time_seconds, "script events applied");
        }
        let inputs = scene.frame(clock.time_seconds);
        render_frame(&inputs, &mut buffer);
        recorder.write_frame(&buffer)?;
        clock.advance(step);
    }
    recorder.stop()
}

fn run_classify(text: &str) -> orb_core::Result<()> {
    let result = orb_core::classify(text);
    let palette = result.palette.map_or("-".to_string(), |p| p.to_string());
    println!(
        "feeling={} palette={} confidence={:.2} applies={}",
        result.feeling,
        palette,
        result.confidence,
        result.is_confident()
    );

    let mode = orb_core::match_mode(text);
    let feeling = orb_core::match_feeling(text);
    let palette = orb_core::match_palette(text);
    if mode.is_some() || feeling.is_some() || palette.is_some() {
        println!(
            "command: mode={} feeling={} palette={}",
            display_or_dash(mode),
            display_or_dash(feeling),
            display_or_dash(palette)
        );
    }
    Ok(())
}

fn display_or_dash<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn scene_from(config: &OrbConfig) -> OrbScene {
    let initial = config.initial;
    OrbScene::with_controller(
        AnimationController::new(initial.mode, initial.feeling, initial.palette),
        config.surface.width,
        config.surface.height,
    )
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Render and record the animated agent orb", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Flags shared by the rendering subcommands; they override the config file.
#[derive(Args, Debug)]
struct CommonArgs {
    /// JSON config file to start from.
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(long)]
    width: Option<u32>,
    #[arg(long)]
    height: Option<u32>,
    /// Initial mode, e.g. `thinking`.
    #[arg(long)]
    mode: Option<Mode>,
    /// Initial feeling, e.g. `curiosity`.
    #[arg(long)]
    feeling: Option<Feeling>,
    /// Initial palette, e.g. `loch-grey-green`.
    #[arg(long)]
    palette: Option<Palette>,
}

impl CommonArgs {
    fn resolve(&self) -> orb_core::Result<OrbConfig> {
        let mut config = match &self.config {
            Some(path) => OrbConfig::load(path)?,
            None => OrbConfig::default(),
        };
        if let Some(width) = self.width {
            config.surface.width = width;
        }
        if let Some(height) = self.height {
            config.surface.height = height;
        }
        if let Some(mode) = self.mode {
            config.initial.mode = mode;
        }
        if let Some(feeling) = self.feeling {
            config.initial.feeling = feeling;
        }
        if let Some(palette) = self.palette {
            config.initial.palette = palette;
        }
        Ok(config)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a single frame to a PNG file.
    Render {
        #[command(flatten)]
        common: CommonArgs,
        /// Animation time of the frame, in seconds.
        #[arg(short, long, default_value_t = 0.0)]
        time: f64,
        /// Output PNG path.
        #[arg(short, long, default_value = "orb.png")]
        output: PathBuf,
    },
    /// Render a numbered PNG sequence, optionally driven by a command script.
    Record {
        #[command(flatten)]
        common: CommonArgs,
        /// JSON list of `{ "time_seconds", "label" }` events.
        #[arg(short, long)]
        script: Option<PathBuf>,
        /// Length of the recording in seconds; defaults to the script length
        /// plus two seconds.
        #[arg(short, long)]
        duration: Option<f64>,
        #[arg(short, long)]
        output_dir: Option<String>,
        #[arg(long)]
        fps: Option<u32>,
    },
    /// Classify text with the sentiment and command matchers.
    Classify {
        /// Text to classify.
        #[arg(required = true)]
        text: Vec<String>,
    },
}
