use super::options::{
    CompressionMode, SceneOptions, backup_file_path, lock_file_path, temp_file_path,
};
use crate::draw::Color;
use crate::draw::canvas::CompositingCanvas;
use crate::draw::object::ObjectData;
use anyhow::{Context, Result, bail};
use chrono::Utc;
use flate2::{Compression, bufread::GzDecoder, write::GzEncoder};
use fs2::FileExt;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;

pub const CURRENT_VERSION: u32 = 1;

/// On-disk scene: canvas settings plus object records, bottom to top.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneFile {
    pub version: u32,
    #[serde(default)]
    pub last_modified: String,
    pub width: i32,
    pub height: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<Color>,
    #[serde(default)]
    pub objects: Vec<ObjectData>,
}

impl SceneFile {
    /// Captures the current scene of a canvas.
    pub fn from_canvas(canvas: &CompositingCanvas) -> Self {
        Self {
            version: CURRENT_VERSION,
            last_modified: Utc::now().to_rfc3339(),
            width: canvas.width(),
            height: canvas.height(),
            background: canvas.background(),
            objects: canvas.objects().map(|(_, object)| object.to_object()).collect(),
        }
    }
}

/// A scene read from disk, with how it was stored.
#[derive(Debug, Clone)]
pub struct LoadedScene {
    pub scene: SceneFile,
    pub compressed: bool,
}

fn open_lock(scene_path: &Path) -> Result<File> {
    let lock_path = lock_file_path(scene_path);
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)
        .with_context(|| format!("failed to open scene lock file {}", lock_path.display()))
}

fn release_lock(lock_file: &File, scene_path: &Path) {
    lock_file.unlock().unwrap_or_else(|err| {
        warn!(
            "failed to unlock scene file {}: {}",
            scene_path.display(),
            err
        )
    });
}

/// Writes `scene` to `path` atomically, rotating earlier versions into backups.
pub fn save_scene(path: &Path, scene: &SceneFile, options: &SceneOptions) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create scene directory {}", parent.display()))?;
    }

    let lock_file = open_lock(path)?;
    lock_file
        .lock_exclusive()
        .with_context(|| format!("failed to lock scene file {}", path.display()))?;

    let result = save_scene_inner(path, scene, options);
    release_lock(&lock_file, path);
    result
}

fn save_scene_inner(path: &Path, scene: &SceneFile, options: &SceneOptions) -> Result<()> {
    let mut bytes = serde_json::to_vec_pretty(scene).context("failed to serialise scene")?;

    if bytes.len() as u64 > options.max_file_size_bytes {
        bail!(
            "scene data is {} bytes, above the configured limit of {} bytes",
            bytes.len(),
            options.max_file_size_bytes
        );
    }

    let should_compress = match options.compression {
        CompressionMode::Off => false,
        CompressionMode::On => true,
        CompressionMode::Auto => bytes.len() as u64 >= options.auto_compress_threshold_bytes,
    };
    if should_compress {
        bytes = compress_bytes(&bytes)?;
    }

    let tmp_path = temp_file_path(path);
    let replaced = write_temp_file(&tmp_path, &bytes).and_then(|()| {
        if path.exists() {
            rotate_backups(path, options.backup_retention)?;
        }
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "failed to move temporary scene file {} -> {}",
                tmp_path.display(),
                path.display()
            )
        })
    });
    if let Err(err) = replaced {
        if tmp_path.exists() {
            fs::remove_file(&tmp_path).unwrap_or_else(|remove_err| {
                warn!(
                    "failed to remove temporary scene file {}: {}",
                    tmp_path.display(),
                    remove_err
                )
            });
        }
        return Err(err);
    }

    info!(
        "Scene saved to {} ({} objects, {} bytes, compression={})",
        path.display(),
        scene.objects.len(),
        bytes.len(),
        should_compress
    );
    Ok(())
}

fn write_temp_file(tmp_path: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp_file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(tmp_path)
        .with_context(|| format!("failed to open temporary scene file {}", tmp_path.display()))?;
    tmp_file
        .write_all(bytes)
        .context("failed to write scene payload")?;
    tmp_file
        .sync_all()
        .context("failed to sync temporary scene file")
}

/// Shifts `scene.bak.N-1 -> scene.bak.N`, then moves the current file into slot 0.
fn rotate_backups(path: &Path, retention: usize) -> Result<()> {
    if retention == 0 {
        fs::remove_file(path).ok();
        return Ok(());
    }

    let oldest = backup_file_path(path, retention - 1);
    if oldest.exists() {
        fs::remove_file(&oldest).ok();
    }
    for index in (0..retention - 1).rev() {
        let from = backup_file_path(path, index);
        if from.exists() {
            let to = backup_file_path(path, index + 1);
            fs::rename(&from, &to).with_context(|| {
                format!(
                    "failed to rotate scene backup {} -> {}",
                    from.display(),
                    to.display()
                )
            })?;
        }
    }

    let first = backup_file_path(path, 0);
    fs::rename(path, &first).with_context(|| {
        format!(
            "failed to rotate previous scene file {} -> {}",
            path.display(),
            first.display()
        )
    })?;
    debug!("Rotated {} into {}", path.display(), first.display());
    Ok(())
}

/// Reads a scene file, plain or gzip-compressed.
///
/// Files above the size limit are refused; object lists above the object
/// limit are truncated with a warning.
pub fn load_scene(path: &Path, options: &SceneOptions) -> Result<LoadedScene> {
    let metadata = fs::metadata(path)
        .with_context(|| format!("failed to stat scene file {}", path.display()))?;
    if metadata.len() > options.max_file_size_bytes {
        bail!(
            "scene file {} is {} bytes which exceeds the configured limit ({} bytes)",
            path.display(),
            metadata.len(),
            options.max_file_size_bytes
        );
    }

    let lock_file = open_lock(path)?;
    lock_file
        .lock_shared()
        .with_context(|| format!("failed to acquire shared lock for {}", path.display()))?;

    let result = load_scene_inner(path, options);
    release_lock(&lock_file, path);
    result
}

fn load_scene_inner(path: &Path, options: &SceneOptions) -> Result<LoadedScene> {
    let mut file_bytes = Vec::new();
    {
        let mut file = File::open(path)
            .with_context(|| format!("failed to open scene file {}", path.display()))?;
        file.read_to_end(&mut file_bytes)
            .context("failed to read scene file")?;
    }

    let compressed = is_gzip(&file_bytes);
    let decompressed = if compressed {
        // One byte past the limit is enough to know the payload is too large.
        let mut decoder = GzDecoder::new(&file_bytes[..])
            .take(options.max_file_size_bytes.saturating_add(1));
        let mut out = Vec::new();
        decoder
            .read_to_end(&mut out)
            .context("failed to decompress scene file")?;
        if out.len() as u64 > options.max_file_size_bytes {
            bail!(
                "decompressed scene {} exceeds the configured limit ({} bytes)",
                path.display(),
                options.max_file_size_bytes
            );
        }
        out
    } else {
        file_bytes
    };

    let mut scene: SceneFile =
        serde_json::from_slice(&decompressed).context("failed to parse scene json")?;

    if scene.version > CURRENT_VERSION {
        warn!(
            "Scene file {} has version {} (newer than {}); loading what is understood",
            path.display(),
            scene.version,
            CURRENT_VERSION
        );
    }

    if scene.objects.len() > options.max_objects {
        warn!(
            "Scene {} contains {} objects which exceeds the limit of {}; truncating",
            path.display(),
            scene.objects.len(),
            options.max_objects
        );
        scene.objects.truncate(options.max_objects);
    }

    debug!(
        "Loaded scene {} ({} objects, compressed={})",
        path.display(),
        scene.objects.len(),
        compressed
    );
    Ok(LoadedScene { scene, compressed })
}

fn compress_bytes(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .context("failed to compress scene payload")?;
    encoder
        .finish()
        .context("failed to finalise compressed scene payload")
}

fn is_gzip(bytes: &[u8]) -> bool {
    bytes.len() > 2 && bytes[0] == 0x1f && bytes[1] == 0x8b
}
