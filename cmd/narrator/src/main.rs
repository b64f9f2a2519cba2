//! narrator - reads text files aloud through a streaming synthesizer.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{ConfigCommand, DevicesCommand, SpeakCommand};

/// narrator - reads text files aloud through a streaming synthesizer.
///
/// The text is fed to the synthesizer word by word and the audio is either
/// written to a WAV file, played live, or streamed as raw PCM to stdout.
///
/// Configuration is stored in ~/.narrator/narrator/ and supports multiple
/// contexts, each a synthesis profile.
#[derive(Parser)]
#[command(name = "narrator")]
#[command(about = "Streaming text-to-speech narrator")]
#[command(version)]
pub struct Cli {
    /// Config file (default is ~/.narrator/narrator/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Context name to use
    #[arg(short = 'c', long, global = true)]
    pub context: Option<String>,

    /// Output as JSON (for piping)
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read a text file aloud
    Speak(SpeakCommand),
    /// Manage CLI configuration
    Config(ConfigCommand),
    /// List audio output devices
    Devices(DevicesCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout may carry raw PCM.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Speak(cmd) => cmd.run(&cli).await,
        Commands::Config(cmd) => cmd.run(&cli).await,
        Commands::Devices(cmd) => cmd.run(&cli).await,
    }
}
