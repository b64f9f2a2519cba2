//! Speak command.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::Args;
use narrator_audio::playback::OutputDevice;
use narrator_speech::{
    AudioStream, Completion, Pipeline, PipelineError, RunReport, SinkMode, SinkSelection,
    ToneSynthesizer,
};
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{get_profile, output, print_info, print_success};
use crate::Cli;

/// Read a text file aloud.
///
/// Exactly one destination must be chosen: an output WAV file, `--play` for
/// the default output device, or `--raw` for little-endian PCM on stdout.
#[derive(Args)]
pub struct SpeakCommand {
    /// Text file to read
    input: PathBuf,

    /// WAV file to write
    output: Option<PathBuf>,

    /// Play through the default output device
    #[arg(long)]
    play: bool,

    /// Write raw little-endian PCM to stdout
    #[arg(long)]
    raw: bool,

    /// Voice (overrides the context)
    #[arg(long)]
    voice: Option<String>,

    /// Language hint (overrides the context)
    #[arg(long)]
    lang: Option<String>,
}

impl SpeakCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let mut profile = get_profile(cli)?;
        if let Some(voice) = &self.voice {
            profile.voice = voice.clone();
        }
        if let Some(lang) = &self.lang {
            profile.lang = Some(lang.clone());
        }
        let selection = self.validate()?;
        debug!(
            voice = %profile.voice,
            lang = profile.lang.as_deref().unwrap_or(""),
            ?selection,
            "speak: resolved profile"
        );

        let synthesizer = Arc::new(ToneSynthesizer::new(profile.tone.clone()));
        let pipeline = Pipeline::new(synthesizer, profile.pipeline_options());

        // Only live playback reacts to SIGINT and SIGTERM.
        let cancel = CancellationToken::new();
        let device = if self.play {
            tokio::spawn(cancel_on_signal(cancel.clone()));
            Some(output_device())
        } else {
            None
        };

        let outcome = match pipeline
            .synthesize_file(&self.input, &selection, device, &cancel)
            .await
        {
            Ok(Completion::Finished(report)) => Ok(report),
            Ok(Completion::Streaming(stream)) => write_raw(stream).await,
            Err(e) => Err(e),
        };

        let report = match outcome {
            Ok(report) => report,
            Err(PipelineError::Interrupted) => {
                print_info("Playback interrupted");
                return Ok(());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("failed to speak {}", self.input.display()));
            }
        };

        if self.raw {
            info!(samples = report.samples, "speak: raw stream finished");
            return Ok(());
        }
        if let Some(path) = &self.output {
            print_success(&format!("Audio saved to {}", path.display()));
        }
        output(cli).write(&report)
    }

    /// Checks the destination flags, then the output file name.
    fn validate(&self) -> anyhow::Result<SinkSelection> {
        let selection = self.selection();
        if let SinkMode::File(path) = selection.resolve()? {
            check_wav_path(&path)?;
        }
        Ok(selection)
    }

    fn selection(&self) -> SinkSelection {
        SinkSelection {
            output: self.output.clone(),
            play: self.play,
            stream: self.raw,
        }
    }
}

/// Rejects output paths that do not end in `.wav`.
fn check_wav_path(path: &Path) -> anyhow::Result<()> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("wav") => Ok(()),
        _ => anyhow::bail!("output file must end with .wav: {}", path.display()),
    }
}

/// Copies the stream to stdout, then waits for the run to finish.
async fn write_raw(mut stream: AudioStream) -> Result<RunReport, PipelineError> {
    let stdout_failure = |source| PipelineError::WriteFailure {
        target: "stdout".to_string(),
        source,
    };

    let mut stdout = tokio::io::stdout();
    while let Some(samples) = stream.next().await {
        stdout
            .write_all(&samples.to_le_bytes())
            .await
            .map_err(stdout_failure)?;
    }
    stdout.flush().await.map_err(stdout_failure)?;
    stream.join().await
}

async fn cancel_on_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "speak: cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "speak: cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("speak: received Ctrl+C, stopping playback"),
        _ = terminate => info!("speak: received SIGTERM, stopping playback"),
    }
    cancel.cancel();
}

#[cfg(feature = "portaudio")]
fn output_device() -> Box<dyn OutputDevice> {
    Box::new(narrator_audio::portaudio::PortAudioDevice::new())
}

#[cfg(not(feature = "portaudio"))]
fn output_device() -> Box<dyn OutputDevice> {
    Box::new(narrator_audio::playback::Unavailable::new(
        "narrator was built without the portaudio feature",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_wav_path() {
        assert!(check_wav_path(Path::new("out.wav")).is_ok());
        assert!(check_wav_path(Path::new("dir/OUT.WAV")).is_ok());
        assert!(check_wav_path(Path::new("out.mp3")).is_err());
        assert!(check_wav_path(Path::new("out")).is_err());
    }

    #[test]
    fn test_cli_parses_speak() {
        use clap::Parser;

        let cli = Cli::try_parse_from(["narrator", "speak", "in.txt", "out.wav", "--voice", "am_adam"])
            .unwrap();
        let crate::Commands::Speak(cmd) = cli.command else {
            panic!("expected speak");
        };
        assert_eq!(cmd.voice.as_deref(), Some("am_adam"));
        assert_eq!(cmd.selection(), SinkSelection::file("out.wav"));

        let cli = Cli::try_parse_from(["narrator", "-v", "speak", "in.txt", "--play", "--raw"]).unwrap();
        let crate::Commands::Speak(cmd) = cli.command else {
            panic!("expected speak");
        };
        assert!(cli.verbose);
        assert!(matches!(
            cmd.selection().resolve(),
            Err(PipelineError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_conflicting_modes_reported_before_extension() {
        use clap::Parser;

        let parse = |args: &[&str]| {
            let cli = Cli::try_parse_from(args).unwrap();
            let crate::Commands::Speak(cmd) = cli.command else {
                panic!("expected speak");
            };
            cmd
        };

        let err = parse(&["narrator", "speak", "in.txt", "out.mp3", "--play"])
            .validate()
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::InvalidConfiguration(_))
        ));

        let err = parse(&["narrator", "speak", "in.txt", "out.mp3"])
            .validate()
            .unwrap_err();
        assert!(err.downcast_ref::<PipelineError>().is_none());
        assert!(err.to_string().contains(".wav"));

        let selection = parse(&["narrator", "speak", "in.txt", "out.wav"]).validate().unwrap();
        assert_eq!(selection, SinkSelection::file("out.wav"));
        assert!(parse(&["narrator", "speak", "in.txt", "--raw"]).validate().is_ok());
    }

    #[cfg(not(feature = "portaudio"))]
    #[tokio::test]
    async fn test_play_without_backend() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.txt");
        std::fs::write(&input, "hello").unwrap();

        let pipeline = Pipeline::new(Arc::new(ToneSynthesizer::default()), Default::default());
        let err = pipeline
            .synthesize_file(
                &input,
                &SinkSelection::playback(),
                Some(output_device()),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::DeviceUnavailable(_)));
    }
}
