//! Utility functions for CLI commands.

use narrator_cli::{load_config, Config, Output, OutputFormat, Profile};

use crate::Cli;

const APP_NAME: &str = "narrator";

/// Gets the global configuration.
pub fn get_config(cli: &Cli) -> anyhow::Result<Config> {
    load_config(APP_NAME, cli.config.as_deref())
}

/// Gets the profile selected by `-c` or the current context.
pub fn get_profile(cli: &Cli) -> anyhow::Result<Profile> {
    get_config(cli)?.resolve_profile(cli.context.as_deref())
}

/// Returns the printer for structured results.
pub fn output(cli: &Cli) -> Output {
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Yaml
    };
    Output::new(format)
}

/// Prints success message.
pub fn print_success(msg: &str) {
    eprintln!("\x1b[32m✓\x1b[0m {}", msg);
}

/// Prints info message.
pub fn print_info(msg: &str) {
    eprintln!("\x1b[34mℹ\x1b[0m {}", msg);
}
