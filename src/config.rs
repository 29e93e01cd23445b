//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every section and field is optional; anything left out falls back to the
//! defaults below (150Hz loop, 5000 stick dead zone, 0.04 cursor speed).

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{PadMouseError, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub controller: ControllerConfig,
    #[serde(default)]
    pub motion: MotionConfig,
    #[serde(default)]
    pub scroll: ScrollConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub cues: CueConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Controller configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ControllerConfig {
    /// Controller slot to poll and to power off (XInput user index).
    #[serde(default)]
    pub user_index: u32,

    /// evdev device path; empty means auto-detect the first gamepad.
    #[serde(default)]
    pub device_path: String,
}

/// Cursor motion configuration (left stick)
#[derive(Debug, Deserialize, Clone)]
pub struct MotionConfig {
    #[serde(default = "default_motion_dead_zone")]
    pub dead_zone: i32,

    #[serde(default = "default_speed_super_low")]
    pub speed_super_low: f64,

    #[serde(default = "default_speed_low")]
    pub speed_low: f64,

    #[serde(default = "default_speed_medium")]
    pub speed_medium: f64,

    #[serde(default = "default_speed_high")]
    pub speed_high: f64,
}

/// Wheel configuration (right stick)
#[derive(Debug, Deserialize, Clone)]
pub struct ScrollConfig {
    #[serde(default = "default_scroll_dead_zone")]
    pub dead_zone: i32,

    #[serde(default = "default_scroll_speed")]
    pub speed: u32,
}

/// Loop timing configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TimingConfig {
    #[serde(default = "default_tick_rate_hz")]
    pub tick_rate_hz: u32,
}

/// Audible cue configuration
#[derive(Debug, Deserialize, Clone)]
pub struct CueConfig {
    #[serde(default = "default_disable_hz")]
    pub disable_hz: u32,

    #[serde(default = "default_enable_hz")]
    pub enable_hz: u32,

    #[serde(default = "default_power_off_hz")]
    pub power_off_hz: u32,

    #[serde(default = "default_cue_duration_ms")]
    pub duration_ms: u32,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path; empty logs to stderr only.
    #[serde(default)]
    pub file: String,
}

// Default value functions
fn default_motion_dead_zone() -> i32 { 5000 }
fn default_speed_super_low() -> f64 { 0.008 }
fn default_speed_low() -> f64 { 0.032 }
fn default_speed_medium() -> f64 { 0.04 }
fn default_speed_high() -> f64 { 0.072 }

fn default_scroll_dead_zone() -> i32 { 7000 }
fn default_scroll_speed() -> u32 { 20 }

fn default_tick_rate_hz() -> u32 { 150 }

fn default_disable_hz() -> u32 { 1000 }
fn default_enable_hz() -> u32 { 1800 }
fn default_power_off_hz() -> u32 { 120 }
fn default_cue_duration_ms() -> u32 { 300 }

fn default_log_level() -> String { "info".to_string() }

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            user_index: 0,
            device_path: String::new(),
        }
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            dead_zone: default_motion_dead_zone(),
            speed_super_low: default_speed_super_low(),
            speed_low: default_speed_low(),
            speed_medium: default_speed_medium(),
            speed_high: default_speed_high(),
        }
    }
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            dead_zone: default_scroll_dead_zone(),
            speed: default_scroll_speed(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: default_tick_rate_hz(),
        }
    }
}

impl Default for CueConfig {
    fn default() -> Self {
        Self {
            disable_hz: default_disable_hz(),
            enable_hz: default_enable_hz(),
            power_off_hz: default_power_off_hz(),
            duration_ms: default_cue_duration_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: String::new(),
        }
    }
}

impl TimingConfig {
    /// Sleep between ticks, `1000 / tick_rate_hz` whole milliseconds.
    #[must_use]
    pub fn period_ms(&self) -> u64 {
        u64::from(1000 / self.tick_rate_hz.max(1))
    }
}

/// Shorthand for a validation failure.
fn invalid(msg: impl std::fmt::Display) -> PadMouseError {
    PadMouseError::Config(toml::de::Error::custom(msg))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use padmouse::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.controller.user_index > 3 {
            return Err(invalid("user_index must be between 0 and 3"));
        }

        // Dead zones are compared against signed 16-bit stick readings
        if !(0..=i32::from(i16::MAX)).contains(&self.motion.dead_zone) {
            return Err(invalid("motion dead_zone must be between 0 and 32767"));
        }

        if !(0..=i32::from(i16::MAX)).contains(&self.scroll.dead_zone) {
            return Err(invalid("scroll dead_zone must be between 0 and 32767"));
        }

        for (name, value) in [
            ("speed_super_low", self.motion.speed_super_low),
            ("speed_low", self.motion.speed_low),
            ("speed_medium", self.motion.speed_medium),
            ("speed_high", self.motion.speed_high),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(invalid(format!("{} must be a positive number", name)));
            }
        }

        if self.scroll.speed == 0 || self.scroll.speed > 1200 {
            return Err(invalid("scroll speed must be between 1 and 1200"));
        }

        if self.timing.tick_rate_hz == 0 || self.timing.tick_rate_hz > 1000 {
            return Err(invalid("tick_rate_hz must be between 1 and 1000"));
        }

        // Range accepted by the Win32 Beep call
        for (name, value) in [
            ("disable_hz", self.cues.disable_hz),
            ("enable_hz", self.cues.enable_hz),
            ("power_off_hz", self.cues.power_off_hz),
        ] {
            if !(37..=32767).contains(&value) {
                return Err(invalid(format!("{} must be between 37 and 32767", name)));
            }
        }

        if self.cues.duration_ms == 0 || self.cues.duration_ms > 5000 {
            return Err(invalid("cue duration_ms must be between 1 and 5000"));
        }

        if self.logging.level.parse::<tracing::Level>().is_err() {
            return Err(invalid(
                "log level must be one of: trace, debug, info, warn, error",
            ));
        }

        Ok(())
    }
}
