//! Output device listing.

use clap::Args;

use crate::Cli;

/// List audio output devices.
///
/// Requires the `portaudio` feature.
#[derive(Args)]
pub struct DevicesCommand {}

impl DevicesCommand {
    #[cfg(feature = "portaudio")]
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let devices = tokio::task::spawn_blocking(narrator_audio::portaudio::list_output_devices)
            .await??;
        if devices.is_empty() {
            println!("No output devices found");
            return Ok(());
        }
        super::output(cli).write(&devices)
    }

    #[cfg(not(feature = "portaudio"))]
    pub async fn run(&self, _cli: &Cli) -> anyhow::Result<()> {
        anyhow::bail!("narrator was built without the portaudio feature")
    }
}
