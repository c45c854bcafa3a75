//! Filesystem abstraction for entry resolution.
//!
//! Manifest discovery, source probing and declaration emit all go through
//! the [`Runtime`] trait so they can be exercised against an in-memory
//! filesystem in tests.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::task;

/// Result type for runtime operations
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors that can occur during runtime operations
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(String),

    /// Other runtime error
    #[error("Runtime error: {0}")]
    Other(String),
}

/// File metadata
#[derive(Debug, Clone)]
pub struct FileMetadata {
    /// File size in bytes
    pub size: u64,
    /// Whether this is a directory
    pub is_dir: bool,
    /// Whether this is a file
    pub is_file: bool,
}

/// Platform runtime trait
///
/// Every method takes paths as given; callers join relative paths onto the
/// working directory themselves.
#[async_trait]
pub trait Runtime: Send + Sync + std::fmt::Debug {
    /// Read a file from the filesystem
    async fn read_file(&self, path: &Path) -> RuntimeResult<Vec<u8>>;

    /// Get file metadata
    async fn metadata(&self, path: &Path) -> RuntimeResult<FileMetadata>;

    /// Check if a path exists
    fn exists(&self, path: &Path) -> bool;

    /// Get the current working directory
    fn get_cwd(&self) -> RuntimeResult<PathBuf>;

    /// Check whether `path` names a regular file.
    ///
    /// Missing paths and directories both answer `false`.
    async fn is_file(&self, path: &Path) -> bool {
        self.metadata(path)
            .await
            .map(|meta| meta.is_file)
            .unwrap_or(false)
    }
}

/// Native filesystem runtime.
///
/// Blocking `std::fs` calls run on tokio's blocking pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeRuntime;

impl NativeRuntime {
    /// Create a new NativeRuntime instance.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Runtime for NativeRuntime {
    async fn read_file(&self, path: &Path) -> RuntimeResult<Vec<u8>> {
        let path = path.to_path_buf();

        task::spawn_blocking(move || {
            std::fs::read(&path).map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    RuntimeError::FileNotFound(path.clone())
                } else {
                    RuntimeError::Io(format!("Failed to read {}: {}", path.display(), e))
                }
            })
        })
        .await
        .map_err(|e| RuntimeError::Other(format!("Task join error: {}", e)))?
    }

    async fn metadata(&self, path: &Path) -> RuntimeResult<FileMetadata> {
        let path = path.to_path_buf();

        task::spawn_blocking(move || {
            let metadata = std::fs::metadata(&path).map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    RuntimeError::FileNotFound(path.clone())
                } else {
                    RuntimeError::Io(format!(
                        "Failed to get metadata for {}: {}",
                        path.display(),
                        e
                    ))
                }
            })?;

            Ok(FileMetadata {
                size: metadata.len(),
                is_dir: metadata.is_dir(),
                is_file: metadata.is_file(),
            })
        })
        .await
        .map_err(|e| RuntimeError::Other(format!("Task join error: {}", e)))?
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn get_cwd(&self) -> RuntimeResult<PathBuf> {
        std::env::current_dir()
            .map_err(|e| RuntimeError::Io(format!("Failed to get current directory: {}", e)))
    }
}

/// In-memory runtime for tests and dry runs.
///
/// Files live in a flat map keyed by their cleaned path. Directories exist
/// implicitly as ancestors of stored files.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug)]
pub struct MemoryRuntime {
    cwd: PathBuf,
    files: parking_lot::RwLock<rustc_hash::FxHashMap<PathBuf, Vec<u8>>>,
}

#[cfg(any(test, feature = "test-utils"))]
impl MemoryRuntime {
    /// Create an empty runtime rooted at `cwd`.
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            files: parking_lot::RwLock::new(rustc_hash::FxHashMap::default()),
        }
    }

    /// Add a file. Relative paths are taken from the working directory.
    pub fn with_file(self, path: impl AsRef<Path>, content: impl AsRef<[u8]>) -> Self {
        self.insert(path, content);
        self
    }

    /// Add or replace a file.
    pub fn insert(&self, path: impl AsRef<Path>, content: impl AsRef<[u8]>) {
        let key = self.key(path.as_ref());
        self.files.write().insert(key, content.as_ref().to_vec());
    }

    fn key(&self, path: &Path) -> PathBuf {
        use path_clean::PathClean;
        if path.is_absolute() {
            path.clean()
        } else {
            self.cwd.join(path).clean()
        }
    }

    fn is_dir(&self, path: &Path) -> bool {
        let key = self.key(path);
        self.files
            .read()
            .keys()
            .any(|file| file != &key && file.starts_with(&key))
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl Runtime for MemoryRuntime {
    async fn read_file(&self, path: &Path) -> RuntimeResult<Vec<u8>> {
        self.files
            .read()
            .get(&self.key(path))
            .cloned()
            .ok_or_else(|| RuntimeError::FileNotFound(path.to_path_buf()))
    }

    async fn metadata(&self, path: &Path) -> RuntimeResult<FileMetadata> {
        if let Some(content) = self.files.read().get(&self.key(path)) {
            return Ok(FileMetadata {
                size: content.len() as u64,
                is_dir: false,
                is_file: true,
            });
        }

        if self.is_dir(path) {
            return Ok(FileMetadata {
                size: 0,
                is_dir: true,
                is_file: false,
            });
        }

        Err(RuntimeError::FileNotFound(path.to_path_buf()))
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.read().contains_key(&self.key(path)) || self.is_dir(path)
    }

    fn get_cwd(&self) -> RuntimeResult<PathBuf> {
        Ok(self.cwd.clone())
    }
}
