//! Configuration loading and types for autotyper
//!
//! Configuration is loaded in layers:
//! 1. Built-in defaults
//! 2. Config file (~/.config/autotyper/config.toml)
//! 3. Environment variables (AUTOTYPER_*)
//! 4. CLI arguments (highest priority)

use crate::error::{AutotyperError, JobError};
use crate::job::{
    AdjacencyTable, Timing, TypingJob, TypingMode, DEFAULT_JITTER, DEFAULT_SPEED_CPM,
    DEFAULT_TYPO_PROBABILITY,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration file content
pub const DEFAULT_CONFIG: &str = r#"# Autotyper Configuration
#
# Location: ~/.config/autotyper/config.toml
# All settings can be overridden via CLI flags

# Log file for typing sessions
# Use "auto" for the default location (~/.local/share/autotyper/autotyper.log),
# a custom path, or "disabled" to turn off.
log_file = "auto"

[typing]
# Emission mode: "turbo", "block", "natural" or "super_human"
# - turbo: paste the whole text at once
# - block: paste line by line, pressing Enter between lines
# - natural: type one character at a time with randomized delays
# - super_human: natural typing with thinking pauses and corrected typos
mode = "natural"

# Typing speed in characters per minute
speed_cpm = 1200

# Random variation of each keystroke delay (0.0 - 1.0)
jitter = 0.1

# Chance of a corrected typo per character in super_human mode (0.0 - 1.0)
typo_probability = 0.03

# Fixed random seed for reproducible runs (omit for a fresh seed every run)
# seed = 42

# Replace the keyboard neighbour table used to pick typos
# [typing.adjacency]
# a = "qwsz"
# s = "awedxz"

[timing]
# Seconds to switch to the target window before typing starts
countdown_secs = 5

# How often pause and stop requests are checked
poll_interval_ms = 100

# Wait between a clipboard copy and the paste
clipboard_settle_ms = 50

# Wait after each pasted line in block mode
line_delay_ms = 300

# Super-human pauses (uniform between min and max)
think_min_ms = 1000
think_max_ms = 3000
reaction_min_ms = 100
reaction_max_ms = 300
correction_min_ms = 50
correction_max_ms = 100

[hotkey]
# Enable the global pause/stop hotkey (default: true)
# Press once to pause or resume, twice quickly to stop
enabled = true

# Key name, e.g. ESCAPE, PAUSE, SCROLLLOCK, F13-F24
key = "ESCAPE"

# Two presses closer together than this stop the run
double_press_ms = 500

# Alt+Shift+= and Alt+Shift+- change speed while typing
speed_keys = true
speed_step = 100

[output]
# Keystroke backend: "auto", "wtype", "ydotool" or "dry_run"
# - auto: wtype on Wayland, then ydotool
# - dry_run: print to the terminal instead of typing
backend = "auto"
"#;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Log file for typing sessions
    /// "auto" for the default location, a path, or "disabled"
    #[serde(default)]
    pub log_file: Option<String>,

    #[serde(default)]
    pub typing: TypingConfig,

    #[serde(default)]
    pub timing: TimingConfig,

    #[serde(default)]
    pub hotkey: HotkeyConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Typing behaviour
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TypingConfig {
    #[serde(default)]
    pub mode: TypingMode,

    #[serde(default = "default_speed_cpm")]
    pub speed_cpm: u32,

    #[serde(default = "default_jitter")]
    pub jitter: f64,

    #[serde(default = "default_typo_probability")]
    pub typo_probability: f64,

    /// Fixed RNG seed for reproducible runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Replacement neighbour table, keyed by single characters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adjacency: Option<HashMap<String, String>>,
}

fn default_speed_cpm() -> u32 {
    DEFAULT_SPEED_CPM
}

fn default_jitter() -> f64 {
    DEFAULT_JITTER
}

fn default_typo_probability() -> f64 {
    DEFAULT_TYPO_PROBABILITY
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self {
            mode: TypingMode::default(),
            speed_cpm: default_speed_cpm(),
            jitter: default_jitter(),
            typo_probability: default_typo_probability(),
            seed: None,
            adjacency: None,
        }
    }
}

impl TypingConfig {
    /// Neighbour table for typos: the configured one, or QWERTY
    pub fn adjacency_table(&self) -> AdjacencyTable {
        match &self.adjacency {
            Some(map) => AdjacencyTable::from_pairs(
                map.iter()
                    .filter_map(|(key, near)| key.chars().next().map(|k| (k, near.as_str()))),
            ),
            None => AdjacencyTable::qwerty(),
        }
    }
}

/// Delays used by the engine, in milliseconds
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimingConfig {
    pub countdown_secs: u32,
    pub poll_interval_ms: u64,
    pub clipboard_settle_ms: u64,
    pub line_delay_ms: u64,
    pub think_min_ms: u64,
    pub think_max_ms: u64,
    pub reaction_min_ms: u64,
    pub reaction_max_ms: u64,
    pub correction_min_ms: u64,
    pub correction_max_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            countdown_secs: 5,
            poll_interval_ms: 100,
            clipboard_settle_ms: 50,
            line_delay_ms: 300,
            think_min_ms: 1000,
            think_max_ms: 3000,
            reaction_min_ms: 100,
            reaction_max_ms: 300,
            correction_min_ms: 50,
            correction_max_ms: 100,
        }
    }
}

impl From<&TimingConfig> for Timing {
    fn from(config: &TimingConfig) -> Self {
        let ms = Duration::from_millis;
        Timing {
            countdown_ticks: config.countdown_secs,
            countdown_tick: Duration::from_secs(1),
            poll_interval: ms(config.poll_interval_ms),
            clipboard_settle: ms(config.clipboard_settle_ms),
            line_delay: ms(config.line_delay_ms),
            think: (ms(config.think_min_ms), ms(config.think_max_ms)),
            reaction: (ms(config.reaction_min_ms), ms(config.reaction_max_ms)),
            correction: (ms(config.correction_min_ms), ms(config.correction_max_ms)),
        }
    }
}

/// Hotkey detection configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HotkeyConfig {
    /// Enable built-in hotkey detection (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Key name (Examples: "ESCAPE", "PAUSE", "F13")
    #[serde(default = "default_hotkey_key")]
    pub key: String,

    /// Presses closer together than this stop the run
    #[serde(default = "default_double_press_ms")]
    pub double_press_ms: u64,

    /// Listen for Alt+Shift+= / Alt+Shift+- speed changes
    #[serde(default = "default_true")]
    pub speed_keys: bool,

    /// Speed change per key press, in cpm
    #[serde(default = "default_speed_step")]
    pub speed_step: u32,
}

fn default_hotkey_key() -> String {
    "ESCAPE".to_string()
}

fn default_double_press_ms() -> u64 {
    500
}

fn default_speed_step() -> u32 {
    100
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            key: default_hotkey_key(),
            double_press_ms: default_double_press_ms(),
            speed_keys: true,
            speed_step: default_speed_step(),
        }
    }
}

impl HotkeyConfig {
    pub fn double_press_threshold(&self) -> Duration {
        Duration::from_millis(self.double_press_ms)
    }
}

/// Keystroke output configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub backend: OutputBackend,
}

/// Keystroke backend selection
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputBackend {
    /// wtype on Wayland, then ydotool
    #[default]
    Auto,
    Wtype,
    Ydotool,
    /// Print to the terminal instead of typing
    DryRun,
}

impl std::fmt::Display for OutputBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OutputBackend::Auto => "auto",
            OutputBackend::Wtype => "wtype",
            OutputBackend::Ydotool => "ydotool",
            OutputBackend::DryRun => "dry_run",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for OutputBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "auto" => Ok(OutputBackend::Auto),
            "wtype" => Ok(OutputBackend::Wtype),
            "ydotool" => Ok(OutputBackend::Ydotool),
            "dry_run" | "dryrun" | "print" => Ok(OutputBackend::DryRun),
            other => Err(format!("unknown output backend '{}'", other)),
        }
    }
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_file: Some("auto".to_string()),
            typing: TypingConfig::default(),
            timing: TimingConfig::default(),
            hotkey: HotkeyConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Get the config directory path
    pub fn config_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "autotyper")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the data directory path (for logs)
    pub fn data_dir() -> PathBuf {
        directories::ProjectDirs::from("", "", "autotyper")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Resolve the log file path from config
    /// Returns None if log_file is not configured or explicitly disabled
    pub fn resolve_log_file(&self) -> Option<PathBuf> {
        self.log_file
            .as_ref()
            .and_then(|path| match path.to_lowercase().as_str() {
                "disabled" | "none" | "off" | "false" => None,
                "auto" => Some(Self::data_dir().join("autotyper.log")),
                _ => Some(PathBuf::from(path)),
            })
    }

    /// Build a validated job for `text` from the typing and timing sections
    pub fn job(&self, text: impl Into<String>) -> Result<TypingJob, JobError> {
        let mut builder = TypingJob::builder(text)
            .mode(self.typing.mode)
            .speed_cpm(self.typing.speed_cpm)
            .jitter(self.typing.jitter)
            .typo_probability(self.typing.typo_probability)
            .adjacency(self.typing.adjacency_table())
            .timing(Timing::from(&self.timing));
        if let Some(seed) = self.typing.seed {
            builder = builder.seed(seed);
        }
        builder.build()
    }
}

/// Load configuration from file, with defaults for missing values
pub fn load_config(path: Option<&Path>) -> Result<Config, AutotyperError> {
    // Start with defaults
    let mut config = Config::default();

    // Determine config file path
    let config_path = path.map(PathBuf::from).or_else(Config::default_path);

    // Load from file if it exists
    if let Some(ref path) = config_path {
        if path.exists() {
            tracing::debug!("Loading config from {:?}", path);
            let contents = std::fs::read_to_string(path)
                .map_err(|e| AutotyperError::Config(format!("Failed to read config: {}", e)))?;

            config = toml::from_str(&contents)
                .map_err(|e| AutotyperError::Config(format!("Invalid config: {}", e)))?;
        } else {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
        }
    }

    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
    Ok(config)
}

/// Override config values from AUTOTYPER_* variables
fn apply_env_overrides(
    config: &mut Config,
    var: impl Fn(&str) -> Option<String>,
) -> Result<(), AutotyperError> {
    if let Some(mode) = var("AUTOTYPER_MODE") {
        config.typing.mode = mode.parse().map_err(AutotyperError::Config)?;
    }
    if let Some(speed) = var("AUTOTYPER_SPEED") {
        config.typing.speed_cpm = speed
            .trim()
            .parse()
            .map_err(|_| AutotyperError::Config(format!("Invalid AUTOTYPER_SPEED: {}", speed)))?;
    }
    if let Some(backend) = var("AUTOTYPER_BACKEND") {
        config.output.backend = backend.parse().map_err(AutotyperError::Config)?;
    }
    if let Some(key) = var("AUTOTYPER_HOTKEY") {
        config.hotkey.key = key;
    }
    Ok(())
}

/// Save configuration to file
pub fn save_config(config: &Config, path: &Path) -> Result<(), AutotyperError> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| AutotyperError::Config(format!("Failed to create config dir: {}", e)))?;
    }

    let contents = toml::to_string_pretty(config)
        .map_err(|e| AutotyperError::Config(format!("Failed to serialize config: {}", e)))?;

    std::fs::write(path, contents)
        .map_err(|e| AutotyperError::Config(format!("Failed to write config: {}", e)))?;

    Ok(())
}
