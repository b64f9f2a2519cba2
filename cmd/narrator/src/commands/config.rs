//! Configuration management commands.

use clap::{Args, Subcommand};

use narrator_cli::Profile;

use super::{get_config, print_success};
use crate::Cli;

/// Manage CLI configuration.
///
/// Each context is a synthesis profile: voice, language hint and pacing.
///
/// Configuration is stored in ~/.narrator/narrator/config.yaml
#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    command: ConfigSubcommand,
}

#[derive(Subcommand)]
enum ConfigSubcommand {
    /// List all contexts
    #[command(alias = "ls")]
    List,
    /// Set the current context
    Use {
        /// Context name
        name: String,
    },
    /// Create or update a context
    Set {
        /// Context name
        name: String,
        /// Voice identifier
        #[arg(long)]
        voice: Option<String>,
        /// Language hint
        #[arg(long)]
        lang: Option<String>,
        /// Pause between pushed words, in milliseconds
        #[arg(long)]
        token_delay_ms: Option<u64>,
        /// Pause after each playback write, in milliseconds
        #[arg(long)]
        playback_pause_ms: Option<u64>,
    },
    /// Delete a context
    Delete {
        /// Context name
        name: String,
    },
}

impl ConfigCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        match &self.command {
            ConfigSubcommand::List => {
                let cfg = get_config(cli)?;
                let names = cfg.list_contexts();
                if names.is_empty() {
                    println!("No contexts configured");
                    return Ok(());
                }

                println!("{:<8} {:<20} {:<16} {:<8} {}", "CURRENT", "NAME", "VOICE", "LANG", "DELAY_MS");
                for name in names {
                    let Some(profile) = cfg.get_context(name) else {
                        continue;
                    };
                    let current = if name == cfg.current_context { "*" } else { "" };
                    println!(
                        "{:<8} {:<20} {:<16} {:<8} {}",
                        current,
                        name,
                        profile.voice,
                        profile.lang.as_deref().unwrap_or("-"),
                        profile.token_delay_ms
                    );
                }
                Ok(())
            }

            ConfigSubcommand::Use { name } => {
                let mut cfg = get_config(cli)?;
                cfg.use_context(name)?;
                print_success(&format!("Switched to context \"{}\"", name));
                Ok(())
            }

            ConfigSubcommand::Set {
                name,
                voice,
                lang,
                token_delay_ms,
                playback_pause_ms,
            } => {
                let mut cfg = get_config(cli)?;
                let mut profile = cfg.get_context(name).cloned().unwrap_or_else(Profile::default);

                if let Some(voice) = voice {
                    profile.voice = voice.clone();
                }
                if let Some(lang) = lang {
                    profile.lang = Some(lang.clone());
                }
                if let Some(ms) = token_delay_ms {
                    profile.token_delay_ms = *ms;
                }
                if let Some(ms) = playback_pause_ms {
                    profile.playback_pause_ms = *ms;
                }

                cfg.set_context(name, profile)?;
                if cfg.current_context.is_empty() {
                    cfg.use_context(name)?;
                }
                print_success(&format!("Context \"{}\" saved", name));
                Ok(())
            }

            ConfigSubcommand::Delete { name } => {
                let mut cfg = get_config(cli)?;
                cfg.delete_context(name)?;
                print_success(&format!("Context \"{}\" deleted", name));
                Ok(())
            }
        }
    }
}
