//! Configuration system
//!
//! Engine-wide settings plus the defaults applied to every new hitbox.
//! Any config type can be loaded from or saved to TOML or RON, picked by file
//! extension.

pub use serde::{Deserialize, Serialize};

use crate::foundation::math::Vec3;
use crate::hitbox::DetectionMode;
use crate::scene::RayFilter;
use std::path::Path;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        match extension(path) {
            Some("toml") => toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            Some("ron") => ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match extension(path) {
            Some("toml") => toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?,
            Some("ron") => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
            _ => return Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        };

        std::fs::write(path, contents)?;
        Ok(())
    }
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|ext| ext.to_str())
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Values that parse but cannot drive the engine
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Defaults copied into every newly created hitbox
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HitboxSettings {
    /// Hit classification mode
    pub detection_mode: DetectionMode,
    /// Draw debug rays
    pub visualize: bool,
    /// Log arm/disarm transitions and hits at info level
    pub debug_log: bool,
    /// Ray filter handed to the scene
    pub filter: RayFilter,
}

impl Default for HitboxSettings {
    fn default() -> Self {
        Self {
            detection_mode: DetectionMode::Object,
            visualize: true,
            debug_log: false,
            filter: RayFilter::default(),
        }
    }
}

/// # Engine Configuration
///
/// Scheduler timing, debug-ray pooling and the hitbox defaults.
///
/// ```toml
/// tick_rate = 60.0
/// debug_ray_duration = 0.25
/// debug_ray_park_position = [0.0, -10000.0, 0.0]
/// marker_name = "DmgPoint"
///
/// [hitbox_defaults]
/// detection_mode = "Entity"
/// visualize = false
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Scheduler ticks per second
    pub tick_rate: f64,
    /// Seconds a debug ray may sit idle before it is parked
    pub debug_ray_duration: f64,
    /// Off-scene position for retracted debug rays
    pub debug_ray_park_position: [f32; 3],
    /// Name of marker objects picked up by recalibration
    pub marker_name: String,
    /// Settings applied to new hitboxes
    pub hitbox_defaults: HitboxSettings,
}

impl EngineConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the scheduler tick rate
    pub fn with_tick_rate(mut self, tick_rate: f64) -> Self {
        self.tick_rate = tick_rate;
        self
    }

    /// Set the debug ray idle duration
    pub fn with_debug_ray_duration(mut self, seconds: f64) -> Self {
        self.debug_ray_duration = seconds;
        self
    }

    /// Set the recalibration marker name
    pub fn with_marker_name(mut self, name: impl Into<String>) -> Self {
        self.marker_name = name.into();
        self
    }

    /// Set the defaults for new hitboxes
    pub fn with_hitbox_defaults(mut self, defaults: HitboxSettings) -> Self {
        self.hitbox_defaults = defaults;
        self
    }

    /// Duration of one scheduler tick in seconds
    pub fn tick_duration(&self) -> f64 {
        1.0 / self.tick_rate
    }

    /// Park position as a vector
    pub fn park_position(&self) -> Vec3 {
        Vec3::from(self.debug_ray_park_position)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.tick_rate.is_finite() && self.tick_rate > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "tick_rate must be positive, got {}",
                self.tick_rate
            )));
        }
        if self.debug_ray_duration.is_nan() || self.debug_ray_duration < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "debug_ray_duration must not be negative, got {}",
                self.debug_ray_duration
            )));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60.0,
            debug_ray_duration: 0.25,
            debug_ray_park_position: [0.0, -10_000.0, 0.0],
            marker_name: "DmgPoint".to_string(),
            hitbox_defaults: HitboxSettings::default(),
        }
    }
}

impl Config for EngineConfig {}
