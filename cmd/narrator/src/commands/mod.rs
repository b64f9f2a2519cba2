//! CLI commands module.

mod config;
mod devices;
mod speak;
mod util;

pub use config::ConfigCommand;
pub use devices::DevicesCommand;
pub use speak::SpeakCommand;

pub(crate) use util::*;
