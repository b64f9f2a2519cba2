//! Configuration management for the command line.
//!
//! Configuration is stored in ~/.narrator/{app_name}/config.yaml and holds
//! named contexts, each a synthesis profile.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use narrator_speech::{PipelineOptions, ToneConfig, DEFAULT_VOICE};
use serde::{Deserialize, Serialize};

/// Default base configuration directory name.
pub const DEFAULT_BASE_DIR: &str = ".narrator";
/// Default configuration filename.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Application name (not serialized).
    #[serde(skip)]
    pub app_name: String,

    /// Name of the currently active context.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub current_context: String,

    /// Map of context name to profile.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub contexts: HashMap<String, Profile>,

    /// Path to the config file (not serialized).
    #[serde(skip)]
    config_path: PathBuf,
}

/// Synthesis settings of one context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    /// Context name.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// Voice identifier passed to the synthesizer.
    pub voice: String,

    /// Language hint. Recorded for synthesizers that take one; the built-in
    /// tone synthesizer ignores it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,

    /// Pause between pushed tokens.
    pub token_delay_ms: u64,

    /// Pause after each playback write.
    pub playback_pause_ms: u64,

    /// Buffers held for a raw stream reader.
    pub stream_capacity: usize,

    /// Built-in tone synthesizer settings.
    pub tone: ToneConfig,
}

impl Default for Profile {
    fn default() -> Self {
        let options = PipelineOptions::default();
        Self {
            name: String::new(),
            voice: DEFAULT_VOICE.to_string(),
            lang: None,
            token_delay_ms: options.token_delay.as_millis() as u64,
            playback_pause_ms: options.playback_pause.as_millis() as u64,
            stream_capacity: options.stream_capacity,
            tone: ToneConfig::default(),
        }
    }
}

impl Profile {
    /// Returns the pipeline options described by this profile.
    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            voice: self.voice.clone(),
            token_delay: Duration::from_millis(self.token_delay_ms),
            playback_pause: Duration::from_millis(self.playback_pause_ms),
            stream_capacity: self.stream_capacity,
        }
    }
}

impl Config {
    /// Gets the default config directory.
    pub fn default_config_dir(app_name: &str) -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(DEFAULT_BASE_DIR).join(app_name))
    }

    /// Gets the default config file path.
    pub fn default_config_path(app_name: &str) -> Option<PathBuf> {
        Self::default_config_dir(app_name).map(|dir| dir.join(DEFAULT_CONFIG_FILE))
    }

    /// Returns the config file path.
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Saves the configuration to disk.
    pub fn save(&self) -> anyhow::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(&self.config_path, content)?;
        Ok(())
    }

    /// Adds or replaces a context.
    pub fn set_context(&mut self, name: &str, mut profile: Profile) -> anyhow::Result<()> {
        profile.name = name.to_string();
        self.contexts.insert(name.to_string(), profile);
        self.save()
    }

    /// Deletes a context.
    pub fn delete_context(&mut self, name: &str) -> anyhow::Result<()> {
        if self.contexts.remove(name).is_none() {
            anyhow::bail!("context '{}' not found", name);
        }
        if self.current_context == name {
            self.current_context.clear();
        }
        self.save()
    }

    /// Sets the current context.
    pub fn use_context(&mut self, name: &str) -> anyhow::Result<()> {
        if !self.contexts.contains_key(name) {
            anyhow::bail!("context '{}' not found", name);
        }
        self.current_context = name.to_string();
        self.save()
    }

    /// Gets a specific context.
    pub fn get_context(&self, name: &str) -> Option<&Profile> {
        self.contexts.get(name)
    }

    /// Gets the current context.
    pub fn get_current_context(&self) -> Option<&Profile> {
        if self.current_context.is_empty() {
            return None;
        }
        self.contexts.get(&self.current_context)
    }

    /// Resolves the profile to run with.
    ///
    /// A named context must exist. Without a name the current context is
    /// used, falling back to the default profile when none is set.
    pub fn resolve_profile(&self, name: Option<&str>) -> anyhow::Result<Profile> {
        match name {
            Some(n) if !n.is_empty() => self
                .get_context(n)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("context '{}' not found", n)),
            _ => Ok(self.get_current_context().cloned().unwrap_or_default()),
        }
    }

    /// Lists all context names, sorted.
    pub fn list_contexts(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.contexts.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

/// Loads configuration for the specified app, creating an empty file if
/// none exists yet.
pub fn load_config(app_name: &str, custom_path: Option<&str>) -> anyhow::Result<Config> {
    let config_path = match custom_path {
        Some(p) => PathBuf::from(p),
        None => Config::default_config_path(app_name)
            .ok_or_else(|| anyhow::anyhow!("cannot determine config path"))?,
    };

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut cfg: Config = if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        serde_yaml::from_str(&content)?
    } else {
        let cfg = Config::default();
        std::fs::write(&config_path, serde_yaml::to_string(&cfg)?)?;
        cfg
    };

    cfg.app_name = app_name.to_string();
    cfg.config_path = config_path;

    Ok(cfg)
}
