//! Command line helpers for narrator.
//!
//! This crate provides the YAML configuration with named contexts and the
//! report printer shared by the `narrator` binary.

pub mod config;
pub mod output;

pub use config::{load_config, Config, Profile};
pub use output::{Output, OutputFormat};
