//! Configuration type definitions.

use super::enums::SceneCompression;
use crate::draw::Color;
use serde::{Deserialize, Serialize};

/// Canvas size and compositing settings.
#[derive(Debug, Serialize, Deserialize)]
pub struct CanvasConfig {
    /// Default canvas width in pixels (valid range: 1 - 32767)
    #[serde(default = "default_canvas_width")]
    pub width: i32,

    /// Default canvas height in pixels (valid range: 1 - 32767)
    #[serde(default = "default_canvas_height")]
    pub height: i32,

    /// Background colour painted beneath the scene, as `#RRGGBB` or `#RRGGBBAA`.
    /// Leave unset for a transparent background.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<Color>,

    /// Largest scratch surface (width × height) to allocate for compositing.
    /// Bigger canvases are composited directly onto the target.
    #[serde(default = "default_max_scratch_pixels")]
    pub max_scratch_pixels: u64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: default_canvas_width(),
            height: default_canvas_height(),
            background: None,
            max_scratch_pixels: default_max_scratch_pixels(),
        }
    }
}

/// Eraser brush settings.
#[derive(Debug, Serialize, Deserialize)]
pub struct EraserConfig {
    /// Eraser stroke width in pixels (valid range: 1.0 - 200.0)
    #[serde(default = "default_eraser_width")]
    pub width: f64,
}

impl Default for EraserConfig {
    fn default() -> Self {
        Self {
            width: default_eraser_width(),
        }
    }
}

/// Text object defaults and the edit icon shown next to selected text.
#[derive(Debug, Serialize, Deserialize)]
pub struct TextConfig {
    /// Font family name (e.g., "Sans", "Monospace", "JetBrains Mono")
    #[serde(default = "default_font_family")]
    pub font_family: String,

    /// Font weight (e.g., "normal", "bold", "light" or numeric 100-900)
    #[serde(default = "default_font_weight")]
    pub font_weight: String,

    /// Font style (e.g., "normal", "italic", "oblique")
    #[serde(default = "default_font_style")]
    pub font_style: String,

    /// Font size in points (valid range: 8.0 - 144.0)
    #[serde(default = "default_font_size")]
    pub font_size: f64,

    /// Edit icon side length in pixels (valid range: 8.0 - 64.0)
    #[serde(default = "default_edit_icon_size")]
    pub edit_icon_size: f64,

    /// Edit icon offset `[x, y]` from the text's top-right corner
    #[serde(default = "default_edit_icon_offset")]
    pub edit_icon_offset: [f64; 2],
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            font_family: default_font_family(),
            font_weight: default_font_weight(),
            font_style: default_font_style(),
            font_size: default_font_size(),
            edit_icon_size: default_edit_icon_size(),
            edit_icon_offset: default_edit_icon_offset(),
        }
    }
}

/// Arrow drawing settings.
#[derive(Debug, Serialize, Deserialize)]
pub struct ArrowConfig {
    /// Arrowhead length in pixels (valid range: 5.0 - 50.0)
    #[serde(default = "default_arrow_length")]
    pub length: f64,

    /// Arrowhead angle in degrees (valid range: 15.0 - 60.0)
    /// Smaller angles create narrower arrowheads, larger angles create wider ones
    #[serde(default = "default_arrow_angle")]
    pub angle_degrees: f64,
}

impl Default for ArrowConfig {
    fn default() -> Self {
        Self {
            length: default_arrow_length(),
            angle_degrees: default_arrow_angle(),
        }
    }
}

/// Scene file persistence settings.
#[derive(Debug, Serialize, Deserialize)]
pub struct SceneConfig {
    /// Compression for saved scenes: "off", "on" or "auto"
    #[serde(default)]
    pub compression: SceneCompression,

    /// Payload size at which "auto" starts compressing
    #[serde(default = "default_auto_compress_threshold")]
    pub auto_compress_threshold_bytes: u64,

    /// Scenes larger than this are neither saved nor loaded
    #[serde(default = "default_max_file_size")]
    pub max_file_size_bytes: u64,

    /// Number of previous scene files to keep as backups (valid range: 0 - 10)
    #[serde(default = "default_backup_retention")]
    pub backup_retention: usize,

    /// Objects beyond this count are dropped when loading
    #[serde(default = "default_max_objects")]
    pub max_objects: usize,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            compression: SceneCompression::default(),
            auto_compress_threshold_bytes: default_auto_compress_threshold(),
            max_file_size_bytes: default_max_file_size(),
            backup_retention: default_backup_retention(),
            max_objects: default_max_objects(),
        }
    }
}

// =============================================================================
// Default value functions
// =============================================================================

fn default_canvas_width() -> i32 {
    1280
}

fn default_canvas_height() -> i32 {
    720
}

fn default_max_scratch_pixels() -> u64 {
    crate::draw::canvas::DEFAULT_MAX_SCRATCH_PIXELS
}

fn default_eraser_width() -> f64 {
    20.0
}

fn default_font_family() -> String {
    "Sans".to_string()
}

fn default_font_weight() -> String {
    "normal".to_string()
}

fn default_font_style() -> String {
    "normal".to_string()
}

fn default_font_size() -> f64 {
    crate::draw::text::DEFAULT_FONT_SIZE
}

fn default_edit_icon_size() -> f64 {
    20.0
}

fn default_edit_icon_offset() -> [f64; 2] {
    [14.0, -14.0]
}

fn default_arrow_length() -> f64 {
    crate::draw::line::DEFAULT_HEAD_LENGTH
}

fn default_arrow_angle() -> f64 {
    crate::draw::line::DEFAULT_HEAD_ANGLE
}

fn default_auto_compress_threshold() -> u64 {
    100 * 1024
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024
}

fn default_backup_retention() -> usize {
    1
}

fn default_max_objects() -> usize {
    10_000
}
