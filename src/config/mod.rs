//! Configuration file support for drawer.
//!
//! This module handles loading and validating user settings from the configuration file
//! located at `~/.config/drawer/config.toml`. Settings include the canvas size and
//! background, eraser and text tool defaults, arrow appearance and scene persistence.
//!
//! If no config file exists, sensible defaults are used automatically.

pub mod enums;
pub mod types;

pub use enums::SceneCompression;
pub use types::{ArrowConfig, CanvasConfig, EraserConfig, SceneConfig, TextConfig};

use crate::draw::canvas::CanvasOptions;
use crate::draw::eraser::EraserPath;
use crate::draw::erasable::ShapeError;
use crate::draw::geometry::Point;
use crate::draw::line::ArrowShape;
use crate::draw::path::smooth_path;
use crate::draw::props::ObjectProps;
use crate::draw::text::{EditIcon, TextShape};
use crate::draw::FontDescriptor;
use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Largest surface dimension Cairo accepts.
const MAX_CANVAS_DIMENSION: i32 = 32767;

/// Main configuration structure containing all user settings.
///
/// # Example TOML
/// ```toml
/// [canvas]
/// width = 1920
/// height = 1080
/// background = "#FFFFFF"
///
/// [eraser]
/// width = 24.0
///
/// [text]
/// font_family = "Sans"
/// font_size = 24.0
/// edit_icon_size = 20.0
///
/// [arrow]
/// length = 20.0
/// angle_degrees = 30.0
///
/// [scene]
/// compression = "auto"
/// backup_retention = 2
/// ```
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Config {
    /// Canvas size, background and scratch surface budget
    #[serde(default)]
    pub canvas: CanvasConfig,

    /// Eraser brush settings
    #[serde(default)]
    pub eraser: EraserConfig,

    /// Text defaults and edit icon placement
    #[serde(default)]
    pub text: TextConfig,

    /// Arrow appearance settings
    #[serde(default)]
    pub arrow: ArrowConfig,

    /// Scene file persistence
    #[serde(default)]
    pub scene: SceneConfig,
}

impl Config {
    /// Validates and clamps all configuration values to acceptable ranges.
    ///
    /// Invalid values are clamped to the nearest valid value and a warning is logged.
    ///
    /// Validated ranges:
    /// - `canvas.width`/`canvas.height`: 1 - 32767
    /// - `canvas.max_scratch_pixels`: at least 1
    /// - `eraser.width`: 1.0 - 200.0
    /// - `text.font_size`: 8.0 - 144.0
    /// - `text.edit_icon_size`: 8.0 - 64.0
    /// - `arrow.length`: 5.0 - 50.0
    /// - `arrow.angle_degrees`: 15.0 - 60.0
    /// - `scene.backup_retention`: 0 - 10
    /// - `scene.max_objects`: at least 1
    pub fn validate_and_clamp(&mut self) {
        for (name, value) in [
            ("width", &mut self.canvas.width),
            ("height", &mut self.canvas.height),
        ] {
            if !(1..=MAX_CANVAS_DIMENSION).contains(&*value) {
                log::warn!(
                    "Invalid canvas {} {}, clamping to 1-{} range",
                    name,
                    value,
                    MAX_CANVAS_DIMENSION
                );
                *value = (*value).clamp(1, MAX_CANVAS_DIMENSION);
            }
        }

        if self.canvas.max_scratch_pixels == 0 {
            log::warn!("Invalid max_scratch_pixels 0, using 1");
            self.canvas.max_scratch_pixels = 1;
        }

        // Eraser width: 1.0 - 200.0
        if !(1.0..=200.0).contains(&self.eraser.width) {
            log::warn!(
                "Invalid eraser width {:.1}, clamping to 1.0-200.0 range",
                self.eraser.width
            );
            self.eraser.width = clamp_or(self.eraser.width, 1.0, 200.0);
        }

        // Font size: 8.0 - 144.0
        if !(8.0..=144.0).contains(&self.text.font_size) {
            log::warn!(
                "Invalid font_size {:.1}, clamping to 8.0-144.0 range",
                self.text.font_size
            );
            self.text.font_size = clamp_or(self.text.font_size, 8.0, 144.0);
        }

        // Edit icon: 8.0 - 64.0
        if !(8.0..=64.0).contains(&self.text.edit_icon_size) {
            log::warn!(
                "Invalid edit_icon_size {:.1}, clamping to 8.0-64.0 range",
                self.text.edit_icon_size
            );
            self.text.edit_icon_size = clamp_or(self.text.edit_icon_size, 8.0, 64.0);
        }

        if self.text.edit_icon_offset.iter().any(|v| !v.is_finite()) {
            log::warn!(
                "Invalid edit_icon_offset {:?}, using [14.0, -14.0]",
                self.text.edit_icon_offset
            );
            self.text.edit_icon_offset = [14.0, -14.0];
        }

        // Arrow length: 5.0 - 50.0
        if !(5.0..=50.0).contains(&self.arrow.length) {
            log::warn!(
                "Invalid arrow length {:.1}, clamping to 5.0-50.0 range",
                self.arrow.length
            );
            self.arrow.length = clamp_or(self.arrow.length, 5.0, 50.0);
        }

        // Arrow angle: 15.0 - 60.0 degrees
        if !(15.0..=60.0).contains(&self.arrow.angle_degrees) {
            log::warn!(
                "Invalid arrow angle {:.1}°, clamping to 15.0-60.0° range",
                self.arrow.angle_degrees
            );
            self.arrow.angle_degrees = clamp_or(self.arrow.angle_degrees, 15.0, 60.0);
        }

        let valid_weight = matches!(
            self.text.font_weight.to_lowercase().as_str(),
            "normal" | "bold" | "light" | "ultralight" | "heavy" | "ultrabold"
        ) || self
            .text
            .font_weight
            .parse::<u32>()
            .is_ok_and(|w| (100..=900).contains(&w));

        if !valid_weight {
            log::warn!(
                "Invalid font_weight '{}', falling back to 'normal'",
                self.text.font_weight
            );
            self.text.font_weight = "normal".to_string();
        }

        if !matches!(
            self.text.font_style.to_lowercase().as_str(),
            "normal" | "italic" | "oblique"
        ) {
            log::warn!(
                "Invalid font_style '{}', falling back to 'normal'",
                self.text.font_style
            );
            self.text.font_style = "normal".to_string();
        }

        if self.scene.backup_retention > 10 {
            log::warn!(
                "Invalid backup_retention {}, clamping to 10",
                self.scene.backup_retention
            );
            self.scene.backup_retention = 10;
        }

        if self.scene.max_objects == 0 {
            log::warn!("Invalid max_objects 0, using 1");
            self.scene.max_objects = 1;
        }
    }

    /// Returns the path to the configuration file.
    ///
    /// The config file is located at `~/.config/drawer/config.toml`.
    ///
    /// # Errors
    /// Returns an error if the config directory cannot be determined (e.g., HOME not set).
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not find config directory")?
            .join("drawer");

        Ok(config_dir.join("config.toml"))
    }

    /// Loads configuration from the default location, or returns defaults if not found.
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        Self::load_from(&config_path)
    }

    /// Loads configuration from `config_path`, or returns defaults if the file is absent.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or is not valid TOML.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            info!("Config file not found, using defaults");
            debug!("Expected config at: {}", config_path.display());
            return Ok(Self::default());
        }

        let config_str = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config from {}", config_path.display()))?;

        let mut config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config from {}", config_path.display()))?;

        config.validate_and_clamp();

        info!("Loaded config from {}", config_path.display());
        debug!("Config: {:?}", config);

        Ok(config)
    }

    /// Saves the configuration to the default location.
    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;
        self.save_to(&config_path)
    }

    /// Serializes the config to TOML and writes it, creating the parent directory.
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let config_str = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(config_path, config_str)
            .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

        info!("Saved config to {}", config_path.display());
        Ok(())
    }

    // =========================================================================
    // Tool defaults
    // =========================================================================

    pub fn canvas_options(&self) -> CanvasOptions {
        CanvasOptions {
            width: self.canvas.width,
            height: self.canvas.height,
            background: self.canvas.background,
            max_scratch_pixels: self.canvas.max_scratch_pixels,
        }
    }

    pub fn font(&self) -> FontDescriptor {
        FontDescriptor::new(
            self.text.font_family.clone(),
            self.text.font_weight.clone(),
            self.text.font_style.clone(),
        )
    }

    pub fn edit_icon(&self) -> EditIcon {
        let [x, y] = self.text.edit_icon_offset;
        EditIcon {
            size: self.text.edit_icon_size,
            offset: Point::new(x, y),
        }
    }

    /// Text object using the configured font and edit icon.
    pub fn new_text(
        &self,
        text: impl Into<String>,
        props: ObjectProps,
    ) -> Result<TextShape, ShapeError> {
        Ok(TextShape::new(text, self.font(), self.text.font_size, props)?
            .with_edit_icon(self.edit_icon()))
    }

    /// Arrow with the configured head length and angle.
    pub fn new_arrow(&self, from: Point, to: Point, props: ObjectProps) -> ArrowShape {
        ArrowShape::new(from.x, from.y, to.x, to.y, props)
            .with_head_shape(self.arrow.length, self.arrow.angle_degrees)
    }

    /// Eraser stroke through pointer samples at the configured width.
    pub fn new_eraser(&self, samples: &[Point]) -> Result<EraserPath, ShapeError> {
        let mut props = ObjectProps::default();
        props.stroke_width = self.eraser.width;
        EraserPath::new(smooth_path(samples), props)
    }
}

/// Clamps `value` into `[min, max]`, mapping NaN to `min`.
fn clamp_or(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() { min } else { value.clamp(min, max) }
}
