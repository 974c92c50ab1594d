//! Scene persistence and reconstruction.
//!
//! Serialises a canvas into a scene file, writes it to disk with locking,
//! optional compression and backup rotation, and rebuilds the objects of a
//! loaded scene through a deferred resource loader.

mod file;
pub mod loader;
mod options;
mod restore;

pub use file::{CURRENT_VERSION, LoadedScene, SceneFile, load_scene, save_scene};
pub use loader::{FileLoader, LoadError, MemoryLoader, ResourceLoader};
pub use options::{
    CompressionMode, DEFAULT_AUTO_COMPRESS_THRESHOLD_BYTES, SceneOptions, backup_file_path,
    lock_file_path,
};
pub use restore::{RestoreSummary, restore_into};

#[cfg(test)]
mod tests;
