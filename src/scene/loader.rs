//! External resources needed to rebuild images and eraser strokes.
//!
//! Loading is deferred: a request only queues its callback, and nothing is
//! read until [`ResourceLoader::run_pending`] is called from the owner's loop.
//! This keeps reconstruction on the caller's thread while letting the scene
//! change between a request and its completion.

use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Errors delivered to load callbacks.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("resource '{0}' not found")]
    NotFound(String),

    #[error("resource '{0}' escapes the resource directory")]
    OutsideRoot(String),

    #[error("failed to read resource '{src}': {source}")]
    Io {
        src: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode resource '{src}': {message}")]
    Decode { src: String, message: String },
}

/// Completion callback for a single request.
pub type LoadCallback<T> = Box<dyn FnOnce(Result<T, LoadError>)>;

/// Asynchronous resource access used by reconstruction.
pub trait ResourceLoader {
    /// Requests a PNG image.
    fn load_image(&mut self, src: &str, done: LoadCallback<cairo::ImageSurface>);

    /// Requests a UTF-8 text resource.
    fn load_text(&mut self, src: &str, done: LoadCallback<String>);

    /// Completes every queued request, returning how many were processed.
    fn run_pending(&mut self) -> usize;

    /// Number of requests still waiting.
    fn pending(&self) -> usize;
}

/// Where a deferred loader reads raw bytes from.
pub trait ResourceSource {
    fn read(&self, src: &str) -> Result<Vec<u8>, LoadError>;
}

/// Files below a root directory.
#[derive(Debug, Clone)]
pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ResourceSource for FileSource {
    fn read(&self, src: &str) -> Result<Vec<u8>, LoadError> {
        let relative = Path::new(src);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(LoadError::OutsideRoot(src.to_string()));
        }
        let path = self.root.join(relative);
        fs::read(&path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                LoadError::NotFound(src.to_string())
            } else {
                LoadError::Io {
                    src: src.to_string(),
                    source,
                }
            }
        })
    }
}

/// In-memory resources keyed by source name.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    entries: HashMap<String, Vec<u8>>,
}

impl ResourceSource for MemorySource {
    fn read(&self, src: &str) -> Result<Vec<u8>, LoadError> {
        self.entries
            .get(src)
            .cloned()
            .ok_or_else(|| LoadError::NotFound(src.to_string()))
    }
}

enum Request {
    Image(String, LoadCallback<cairo::ImageSurface>),
    Text(String, LoadCallback<String>),
}

/// Queues requests and serves them from a [`ResourceSource`] on demand.
pub struct DeferredLoader<S> {
    source: S,
    queue: VecDeque<Request>,
}

/// Loader reading from the filesystem.
pub type FileLoader = DeferredLoader<FileSource>;

/// Loader reading from a map, used for embedding and tests.
pub type MemoryLoader = DeferredLoader<MemorySource>;

impl<S> DeferredLoader<S> {
    pub fn with_source(source: S) -> Self {
        Self {
            source,
            queue: VecDeque::new(),
        }
    }
}

impl FileLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_source(FileSource::new(root))
    }
}

impl Default for MemoryLoader {
    fn default() -> Self {
        Self::with_source(MemorySource::default())
    }
}

impl MemoryLoader {
    pub fn insert_bytes(&mut self, src: impl Into<String>, bytes: Vec<u8>) {
        self.source.entries.insert(src.into(), bytes);
    }

    pub fn insert_text(&mut self, src: impl Into<String>, text: &str) {
        self.insert_bytes(src, text.as_bytes().to_vec());
    }

    /// Stores a surface encoded as PNG.
    pub fn insert_image(
        &mut self,
        src: impl Into<String>,
        surface: &cairo::ImageSurface,
    ) -> Result<(), cairo::IoError> {
        let mut png = Vec::new();
        surface.write_to_png(&mut png)?;
        self.insert_bytes(src, png);
        Ok(())
    }
}

impl<S> std::fmt::Debug for DeferredLoader<S>
where
    S: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeferredLoader")
            .field("source", &self.source)
            .field("pending", &self.queue.len())
            .finish()
    }
}

fn decode_png(src: &str, bytes: &[u8]) -> Result<cairo::ImageSurface, LoadError> {
    let mut reader = bytes;
    cairo::ImageSurface::create_from_png(&mut reader).map_err(|err| LoadError::Decode {
        src: src.to_string(),
        message: err.to_string(),
    })
}

fn decode_text(src: &str, bytes: Vec<u8>) -> Result<String, LoadError> {
    String::from_utf8(bytes).map_err(|err| LoadError::Decode {
        src: src.to_string(),
        message: err.to_string(),
    })
}

impl<S: ResourceSource> ResourceLoader for DeferredLoader<S> {
    fn load_image(&mut self, src: &str, done: LoadCallback<cairo::ImageSurface>) {
        log::debug!("Queued image load for {src}");
        self.queue.push_back(Request::Image(src.to_string(), done));
    }

    fn load_text(&mut self, src: &str, done: LoadCallback<String>) {
        log::debug!("Queued text load for {src}");
        self.queue.push_back(Request::Text(src.to_string(), done));
    }

    fn run_pending(&mut self) -> usize {
        let mut processed = 0;
        while let Some(request) = self.queue.pop_front() {
            processed += 1;
            match request {
                Request::Image(src, done) => {
                    done(self.source.read(&src).and_then(|bytes| decode_png(&src, &bytes)))
                }
                Request::Text(src, done) => {
                    done(self.source.read(&src).and_then(|bytes| decode_text(&src, bytes)))
                }
            }
        }
        processed
    }

    fn pending(&self) -> usize {
        self.queue.len()
    }
}
