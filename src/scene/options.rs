use crate::config::{SceneCompression, SceneConfig};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub const DEFAULT_AUTO_COMPRESS_THRESHOLD_BYTES: u64 = 100 * 1024; // 100 KiB

/// Compression preference for scene files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMode {
    /// Always write plain JSON.
    Off,
    /// Always write gzip-compressed JSON.
    On,
    /// Write gzip when payload exceeds the configured threshold.
    Auto,
}

impl From<SceneCompression> for CompressionMode {
    fn from(value: SceneCompression) -> Self {
        match value {
            SceneCompression::Off => CompressionMode::Off,
            SceneCompression::On => CompressionMode::On,
            SceneCompression::Auto => CompressionMode::Auto,
        }
    }
}

/// Runtime options for saving and loading scene files.
#[derive(Debug, Clone)]
pub struct SceneOptions {
    pub compression: CompressionMode,
    pub auto_compress_threshold_bytes: u64,
    pub max_file_size_bytes: u64,
    pub backup_retention: usize,
    pub max_objects: usize,
}

impl Default for SceneOptions {
    fn default() -> Self {
        Self {
            compression: CompressionMode::Auto,
            auto_compress_threshold_bytes: DEFAULT_AUTO_COMPRESS_THRESHOLD_BYTES,
            max_file_size_bytes: 10 * 1024 * 1024,
            backup_retention: 1,
            max_objects: 10_000,
        }
    }
}

impl SceneOptions {
    pub fn from_config(config: &SceneConfig) -> Self {
        Self {
            compression: config.compression.into(),
            auto_compress_threshold_bytes: config.auto_compress_threshold_bytes,
            max_file_size_bytes: config.max_file_size_bytes,
            backup_retention: config.backup_retention,
            max_objects: config.max_objects,
        }
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

/// Backup slot `index` for a scene file: `scene.json.bak`, `scene.json.bak.1`, ...
pub fn backup_file_path(scene_path: &Path, index: usize) -> PathBuf {
    if index == 0 {
        with_suffix(scene_path, ".bak")
    } else {
        with_suffix(scene_path, &format!(".bak.{index}"))
    }
}

pub fn lock_file_path(scene_path: &Path) -> PathBuf {
    with_suffix(scene_path, ".lock")
}

/// Temporary file used while writing, skipping names that already exist.
pub(crate) fn temp_file_path(scene_path: &Path) -> PathBuf {
    let mut candidate = with_suffix(scene_path, ".tmp");
    let mut counter = 0u32;
    while candidate.exists() {
        counter += 1;
        candidate = with_suffix(scene_path, &format!(".tmp{counter}"));
    }
    candidate
}
