//! Configuration management for Waypane
//!
//! This module handles loading, parsing, and validating configuration from
//! TOML files. Every field has a default, so running without a config file
//! reproduces the classic demo: a 600x500 toplevel filled with the constant
//! byte 64.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Largest accepted canvas edge. Keeps stride * height comfortably inside
/// the i32 range the wire protocol uses for pool and buffer sizes.
pub const MAX_CANVAS_DIM: u32 = 16_384;

/// Main configuration struct containing all Waypane settings
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct WaypaneConfig {
    /// Canvas geometry and shell metadata
    #[serde(default)]
    pub surface: SurfaceConfig,

    /// Pixel fill settings
    #[serde(default)]
    pub fill: FillConfig,
}

/// Canvas geometry and shell metadata.
///
/// Dimensions are read once at startup and fixed for the lifetime of the
/// client; the buffer is never resized.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SurfaceConfig {
    /// Canvas width in pixels
    pub width: u32,

    /// Canvas height in pixels
    pub height: u32,

    /// Title passed to the shell surface
    pub title: String,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            width: 600,
            height: 500,
            title: "waypane".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FillConfig {
    /// Byte value written across the whole mapping (every channel of every
    /// ARGB8888 pixel)
    pub value: u8,
}

impl Default for FillConfig {
    fn default() -> Self {
        Self { value: 64 }
    }
}

impl WaypaneConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        // Expand ~ to home directory
        let expanded_path = if path.to_string_lossy().starts_with('~') {
            let home = std::env::var("HOME").context("Failed to get HOME environment variable")?;
            Path::new(&home).join(path.strip_prefix("~").unwrap_or(path))
        } else {
            path.to_path_buf()
        };

        let contents = fs::read_to_string(&expanded_path)
            .with_context(|| format!("Failed to read config file: {}", expanded_path.display()))?;

        let config: WaypaneConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", expanded_path.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.surface.width == 0 || self.surface.height == 0 {
            anyhow::bail!(
                "Invalid canvas size {}x{}: dimensions must be non-zero",
                self.surface.width,
                self.surface.height
            );
        }

        if self.surface.width > MAX_CANVAS_DIM || self.surface.height > MAX_CANVAS_DIM {
            anyhow::bail!(
                "Invalid canvas size {}x{}: dimensions must be at most {}",
                self.surface.width,
                self.surface.height,
                MAX_CANVAS_DIM
            );
        }

        Ok(())
    }

    /// Save configuration to a TOML file
    #[allow(dead_code)]
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        fs::write(path, contents).context("Failed to write configuration file")?;

        Ok(())
    }
}
