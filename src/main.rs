use std::sync::Arc;

use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use echomood::{cli, config, error, types::MoodTarget, types::PkceToken};
use tokio::sync::Mutex;

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Authorize with Spotify API
    Auth,

    /// List collected tracks with familiarity scores
    Tracks(TracksOptions),

    #[clap(about = "Filter your library by familiarity and mood, optionally into a new playlist")]
    Mix(MixOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct TracksOptions {
    /// Collect from a playlist link instead of your saved tracks
    #[clap(long)]
    pub playlist: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct MixOptions {
    /// Collect from a playlist link instead of your saved tracks
    #[clap(long)]
    pub playlist: Option<String>,

    /// Minimum familiarity score (0-100) a track must reach
    #[clap(long, default_value_t = 50)]
    pub threshold: u8,

    /// Genre to keep; can be repeated. No genre means no genre filtering
    #[clap(long = "genre")]
    pub genres: Vec<String>,

    /// Mood target: valence (0.0-1.0)
    #[clap(long)]
    pub valence: Option<f32>,

    /// Mood target: energy (0.0-1.0)
    #[clap(long)]
    pub energy: Option<f32>,

    /// Mood target: danceability (0.0-1.0)
    #[clap(long)]
    pub danceability: Option<f32>,

    /// Mood target: acousticness (0.0-1.0)
    #[clap(long)]
    pub acousticness: Option<f32>,

    /// Mood target: instrumentalness (0.0-1.0)
    #[clap(long)]
    pub instrumentalness: Option<f32>,

    /// Mood target: liveness (0.0-1.0)
    #[clap(long)]
    pub liveness: Option<f32>,

    /// Allowed deviation per mood dimension
    #[clap(long, default_value_t = 0.3)]
    pub tolerance: f32,

    /// Name of the playlist to create; omit for a dry run
    #[clap(long)]
    pub name: Option<String>,

    /// Maximum number of tracks in the playlist
    #[clap(long, default_value_t = 30)]
    pub count: usize,

    /// Shuffle before truncating to the requested count
    #[clap(long)]
    pub shuffle: bool,

    /// Create a public playlist instead of a private one
    #[clap(long)]
    pub public: bool,

    /// Seed for the random fallback scorer (for reproducible dry runs)
    #[clap(long)]
    pub seed: Option<u64>,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    let cli = Cli::parse();

    match cli.command {
        Command::Auth => {
            let oauth_result: Arc<Mutex<Option<PkceToken>>> = Arc::new(Mutex::new(None));
            cli::auth(Arc::clone(&oauth_result)).await;
        }
        Command::Tracks(opt) => cli::tracks(opt.playlist).await,
        Command::Mix(opt) => {
            let mood = MoodTarget {
                valence: opt.valence,
                energy: opt.energy,
                danceability: opt.danceability,
                acousticness: opt.acousticness,
                instrumentalness: opt.instrumentalness,
                liveness: opt.liveness,
                tolerance: opt.tolerance,
            };

            cli::mix(cli::MixRequest {
                playlist: opt.playlist,
                threshold: opt.threshold,
                genres: opt.genres,
                mood,
                name: opt.name,
                count: opt.count,
                shuffle: opt.shuffle,
                public: opt.public,
                seed: opt.seed,
            })
            .await
        }
        Command::Completions(opt) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}
