//! Configuration and color scheme management for termdock.
//!
//! This module provides:
//! - TOML configuration file loading from `~/.termdock/config.toml`
//! - Panel height bounds and re-fit timing
//! - Built-in color schemes (default, solarized-dark, nord, dracula, tokyo-night)
//!
//! # Configuration File
//!
//! ```toml
//! prompt = "$ "
//! greeting = "Welcome to termdock. Type 'help' to get started."
//! color_scheme = "tokyo-night"
//!
//! [panel]
//! min_height = 30        # topbar height, drag floor
//! default_height = 200
//! max_height = 500
//! cell_height = 16       # pixels per text row
//! refit_interval_ms = 3000
//!
//! [keybinds]
//! enabled = true
//!
//! [emulator]
//! scrollback = 1000
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::core::layout::{BoundsError, PanelBounds};
use crate::core::output::OutputStyle;
use crate::core::term::DEFAULT_SCROLLBACK;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Marker written at the start of every input line
    pub prompt: String,
    /// Line written once when the panel mounts
    pub greeting: Option<String>,
    /// Color scheme name
    pub color_scheme: String,
    pub panel: PanelConfig,
    pub keybinds: KeybindConfig,
    pub emulator: EmulatorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prompt: "$ ".to_string(),
            greeting: Some("Welcome to termdock. Type 'help' to get started.".to_string()),
            color_scheme: "default".to_string(),
            panel: PanelConfig::default(),
            keybinds: KeybindConfig::default(),
            emulator: EmulatorConfig::default(),
        }
    }
}

/// Panel geometry, in pixels
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    pub min_height: u32,
    pub default_height: u32,
    pub max_height: u32,
    /// Pixels per text row
    pub cell_height: u32,
    /// Periodic re-fit interval
    pub refit_interval_ms: u64,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            min_height: 30,
            default_height: 200,
            max_height: 500,
            cell_height: 16,
            refit_interval_ms: 3000,
        }
    }
}

impl PanelConfig {
    pub fn bounds(&self) -> Result<PanelBounds, BoundsError> {
        PanelBounds::new(self.min_height, self.default_height, self.max_height)
    }

    pub fn refit_interval(&self) -> Duration {
        Duration::from_millis(self.refit_interval_ms.max(1))
    }
}

/// Document-scoped shortcut settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeybindConfig {
    pub enabled: bool,
}

impl Default for KeybindConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmulatorConfig {
    /// Lines kept in the buffer
    pub scrollback: usize,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            scrollback: DEFAULT_SCROLLBACK,
        }
    }
}

impl Config {
    /// Load configuration from the default location, falling back to
    /// defaults when the file is missing or broken
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!("{}; using defaults", e);
                Self::default()
            }
        }
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(content)?;
        config.validate();
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Replace values that cannot work with their defaults
    fn validate(&mut self) {
        if let Err(e) = self.panel.bounds() {
            warn!("Invalid panel heights: {}; using defaults", e);
            let defaults = PanelConfig::default();
            self.panel.min_height = defaults.min_height;
            self.panel.default_height = defaults.default_height;
            self.panel.max_height = defaults.max_height;
        }
        if self.panel.cell_height == 0 {
            warn!("cell_height must be positive; using default");
            self.panel.cell_height = PanelConfig::default().cell_height;
        }
        if self.prompt.is_empty() {
            warn!("Empty prompt; using default");
            self.prompt = Config::default().prompt;
        }
    }

    /// Directory holding config and log files
    pub fn config_dir() -> Option<PathBuf> {
        let dir = home_dir()?.join(".termdock");
        if !dir.exists() {
            let _ = fs::create_dir_all(&dir);
        }
        Some(dir)
    }

    /// Get config file path
    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Get the color scheme
    pub fn get_color_scheme(&self) -> ColorScheme {
        ColorScheme::by_name(&self.color_scheme)
    }
}

/// Color definition (RGB)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Convert to crossterm Color
    pub fn to_crossterm(&self) -> crossterm::style::Color {
        crossterm::style::Color::Rgb {
            r: self.r,
            g: self.g,
            b: self.b,
        }
    }

    fn rgb(&self) -> (u8, u8, u8) {
        (self.r, self.g, self.b)
    }
}

/// Color scheme definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorScheme {
    pub name: String,

    // Hint banner
    pub banner_bg: Color,
    pub banner_fg: Color,

    // Panel topbar and its controls
    pub topbar_bg: Color,
    pub topbar_fg: Color,
    pub control_active_bg: Color,
    pub control_active_fg: Color,
    pub progress_fg: Color,
    pub progress_track: Color,

    // Panel body
    pub panel_bg: Color,
    pub output_fg: Color,
    pub error_fg: Color,
    pub warning_fg: Color,

    // Selection colors
    pub selection_bg: Color,
    pub selection_fg: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self::default_scheme()
    }
}

impl ColorScheme {
    /// Default color scheme
    pub fn default_scheme() -> Self {
        Self {
            name: "default".to_string(),

            banner_bg: Color::new(40, 40, 40),
            banner_fg: Color::new(150, 150, 150),

            topbar_bg: Color::new(60, 60, 60),
            topbar_fg: Color::new(220, 220, 220),
            control_active_bg: Color::new(60, 60, 180),
            control_active_fg: Color::new(255, 255, 255),
            progress_fg: Color::new(100, 150, 255),
            progress_track: Color::new(80, 80, 80),

            panel_bg: Color::new(20, 20, 20),
            output_fg: Color::new(220, 220, 220),
            error_fg: Color::new(240, 80, 80),
            warning_fg: Color::new(230, 200, 60),

            selection_bg: Color::new(255, 255, 255),
            selection_fg: Color::new(0, 0, 0),
        }
    }

    /// Solarized Dark scheme
    pub fn solarized_dark() -> Self {
        Self {
            name: "solarized-dark".to_string(),

            banner_bg: Color::new(0, 43, 54),
            banner_fg: Color::new(101, 123, 131),

            topbar_bg: Color::new(7, 54, 66),
            topbar_fg: Color::new(147, 161, 161),
            control_active_bg: Color::new(38, 139, 210),
            control_active_fg: Color::new(253, 246, 227),
            progress_fg: Color::new(133, 153, 0),
            progress_track: Color::new(0, 43, 54),

            panel_bg: Color::new(0, 43, 54),
            output_fg: Color::new(147, 161, 161),
            error_fg: Color::new(220, 50, 47),
            warning_fg: Color::new(181, 137, 0),

            selection_bg: Color::new(38, 139, 210),
            selection_fg: Color::new(253, 246, 227),
        }
    }

    /// Nord scheme
    pub fn nord() -> Self {
        Self {
            name: "nord".to_string(),

            banner_bg: Color::new(46, 52, 64),
            banner_fg: Color::new(147, 161, 181),

            topbar_bg: Color::new(59, 66, 82),
            topbar_fg: Color::new(216, 222, 233),
            control_active_bg: Color::new(136, 192, 208),
            control_active_fg: Color::new(46, 52, 64),
            progress_fg: Color::new(163, 190, 140),
            progress_track: Color::new(76, 86, 106),

            panel_bg: Color::new(46, 52, 64),
            output_fg: Color::new(216, 222, 233),
            error_fg: Color::new(191, 97, 106),
            warning_fg: Color::new(235, 203, 139),

            selection_bg: Color::new(76, 86, 106),
            selection_fg: Color::new(236, 239, 244),
        }
    }

    /// Dracula scheme
    pub fn dracula() -> Self {
        Self {
            name: "dracula".to_string(),

            banner_bg: Color::new(40, 42, 54),
            banner_fg: Color::new(98, 114, 164),

            topbar_bg: Color::new(68, 71, 90),
            topbar_fg: Color::new(248, 248, 242),
            control_active_bg: Color::new(189, 147, 249),
            control_active_fg: Color::new(40, 42, 54),
            progress_fg: Color::new(80, 250, 123),
            progress_track: Color::new(40, 42, 54),

            panel_bg: Color::new(40, 42, 54),
            output_fg: Color::new(248, 248, 242),
            error_fg: Color::new(255, 85, 85),
            warning_fg: Color::new(241, 250, 140),

            selection_bg: Color::new(68, 71, 90),
            selection_fg: Color::new(248, 248, 242),
        }
    }

    /// Tokyo Night scheme
    pub fn tokyo_night() -> Self {
        Self {
            name: "tokyo-night".to_string(),

            banner_bg: Color::new(26, 27, 38),
            banner_fg: Color::new(86, 95, 137),

            topbar_bg: Color::new(36, 40, 59),
            topbar_fg: Color::new(169, 177, 214),
            control_active_bg: Color::new(122, 162, 247),
            control_active_fg: Color::new(26, 27, 38),
            progress_fg: Color::new(158, 206, 106),
            progress_track: Color::new(41, 46, 66),

            panel_bg: Color::new(26, 27, 38),
            output_fg: Color::new(192, 202, 245),
            error_fg: Color::new(247, 118, 142),
            warning_fg: Color::new(224, 175, 104),

            selection_bg: Color::new(51, 59, 91),
            selection_fg: Color::new(192, 202, 245),
        }
    }

    /// Get scheme by name
    pub fn by_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "solarized-dark" | "solarized_dark" | "solarized" => Self::solarized_dark(),
            "nord" => Self::nord(),
            "dracula" => Self::dracula(),
            "tokyo-night" | "tokyo_night" | "tokyonight" => Self::tokyo_night(),
            _ => Self::default_scheme(),
        }
    }

    /// List available schemes
    pub fn list() -> Vec<&'static str> {
        vec!["default", "solarized-dark", "nord", "dracula", "tokyo-night"]
    }

    /// Colors for tagging interpreter output
    pub fn output_style(&self) -> OutputStyle {
        OutputStyle {
            text: self.output_fg.rgb(),
            error: self.error_fg.rgb(),
            warning: self.warning_fg.rgb(),
        }
    }
}

// Get home directory
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("USERPROFILE")
        .or_else(|| std::env::var_os("HOME"))
        .map(PathBuf::from)
}
