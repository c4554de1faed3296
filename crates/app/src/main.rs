use std::path::PathBuf;

use clap::{Parser, Subcommand};
use media_lab_core::{Color, MediaConfig, MediaSession, Sound};
use tracing_subscriber::EnvFilter;

fn main() -> media_lab_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let mut session = build_session(&cli)?;

    match cli.command {
        Commands::SoundInfo { input } => run_sound_info(&mut session, &input),
        Commands::Tone {
            frequency,
            amplitude,
            seconds,
            output,
        } => run_tone(&mut session, frequency, amplitude, seconds, &output),
        Commands::Volume {
            input,
            output,
            factor,
        } => run_volume(&mut session, &input, &output, factor),
        Commands::Blank {
            output,
            width,
            height,
            color,
        } => run_blank(&mut session, &output, width, height, color),
        Commands::Grayscale { input, output } => run_grayscale(&mut session, &input, &output),
    }
}

fn build_session(cli: &Cli) -> media_lab_core::Result<MediaSession> {
    let config = match &cli.config {
        Some(path) => MediaConfig::load(path)?,
        None => MediaConfig::default(),
    };
    let mut session = MediaSession::new(config);
    if let Some(folder) = &cli.media_folder {
        session.set_media_folder(folder);
    }
    Ok(session)
}

fn run_sound_info(session: &mut MediaSession, input: &PathBuf) -> media_lab_core::Result<()> {
    let sound = session.make_sound(input)?;
    let metadata = serde_json::to_string_pretty(&sound.metadata())?;
    println!("{metadata}");
    Ok(())
}

fn run_tone(
    session: &mut MediaSession,
    frequency: f64,
    amplitude: f64,
    seconds: f64,
    output: &PathBuf,
) -> media_lab_core::Result<()> {
    let config = &session.config().sound;
    let rate = config.sample_rate;
    tracing::info!(frequency, amplitude, seconds, rate, "synthesising tone");
    let sound = Sound::pure_tone_with_config(frequency, amplitude, seconds, rate, config)?;
    let path = session.write_sound_to(&sound, output)?;
    println!("{sound} -> {}", path.display());
    Ok(())
}

fn run_volume(
    session: &mut MediaSession,
    input: &PathBuf,
    output: &PathBuf,
    factor: f64,
) -> media_lab_core::Result<()> {
    let mut sound = session.make_sound(input)?;
    let clipped = sound.scale_volume(factor)?;
    if clipped > 0 {
        tracing::warn!(clipped, "samples were clipped while changing volume");
    }
    let path = session.write_sound_to(&sound, output)?;
    println!("{sound} -> {}", path.display());
    Ok(())
}

fn run_blank(
    session: &mut MediaSession,
    output: &PathBuf,
    width: usize,
    height: usize,
    color: Option<Color>,
) -> media_lab_core::Result<()> {
    let mut picture = session.make_empty_picture(width, height)?;
    if let Some(color) = color {
        picture.fill(color);
    }
    let path = session.write_picture_to(&picture, output)?;
    println!("{picture} -> {}", path.display());
    Ok(())
}

fn run_grayscale(
    session: &mut MediaSession,
    input: &PathBuf,
    output: &PathBuf,
) -> media_lab_core::Result<()> {
    let mut picture = session.make_picture(input)?;
    picture.map_colors(|color| Color::gray(color.luminance() as i32));
    tracing::debug!(row_fetches = picture.row_fetches(), "grayscale pass finished");
    let path = session.write_picture_to(&picture, output)?;
    println!("{picture} -> {}", path.display());
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Picture and sound toolkit for media computation", long_about = None)]
struct Cli {
    /// JSON configuration file with sound and picture defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Folder that relative file names are resolved against.
    #[arg(long, global = true)]
    media_folder: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the metadata of a WAV file as JSON.
    SoundInfo {
        input: PathBuf,
    },
    /// Write a pure sine tone to a WAV file.
    Tone {
        #[arg(short, long, default_value_t = 440.0)]
        frequency: f64,
        #[arg(short, long, default_value_t = 8000.0)]
        amplitude: f64,
        #[arg(short, long, default_value_t = 1.0)]
        seconds: f64,
        output: PathBuf,
    },
    /// Scale every sample of a WAV file, clipping at the sample range.
    Volume {
        input: PathBuf,
        output: PathBuf,
        #[arg(short, long)]
        factor: f64,
    },
    /// Write a picture filled with a single colour.
    Blank {
        output: PathBuf,
        #[arg(long)]
        width: usize,
        #[arg(long)]
        height: usize,
        /// Palette name or #rrggbb; defaults to the configured background.
        #[arg(short, long)]
        color: Option<Color>,
    },
    /// Convert a picture to grayscale.
    Grayscale {
        input: PathBuf,
        output: PathBuf,
    },
}
