//! Output utilities for the command line.

use std::io::Write;

use serde::Serialize;

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// YAML format (default).
    #[default]
    Yaml,
    /// JSON format.
    Json,
}

/// How structured results are printed.
#[derive(Debug, Clone)]
pub struct Output {
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Renders a value in the configured format.
    pub fn render<T: Serialize>(&self, value: &T) -> anyhow::Result<String> {
        Ok(match self.format {
            OutputFormat::Yaml => serde_yaml::to_string(value)?,
            OutputFormat::Json => serde_json::to_string_pretty(value)? + "\n",
        })
    }

    /// Outputs the result to stdout.
    pub fn write<T: Serialize>(&self, value: &T) -> anyhow::Result<()> {
        self.write_to(&mut std::io::stdout().lock(), value)
    }

    /// Outputs the result to a writer.
    pub fn write_to<W: Write, T: Serialize>(&self, out: &mut W, value: &T) -> anyhow::Result<()> {
        out.write_all(self.render(value)?.as_bytes())?;
        out.flush()?;
        Ok(())
    }
}
