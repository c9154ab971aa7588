//! Tiles stored as individual files on disk.
//!
//! Layout:
//!
//! ```text
//! <root>/
//!   0/0/0.jpg
//!   1/0/0.jpg  1/0/1.jpg
//!   ...
//!   <level>/<row>/<col><ext>
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use crate::error::IoError;

use super::TileStreamProvider;

/// Default file extension for tile files.
pub const DEFAULT_TILE_EXTENSION: &str = ".jpg";

/// Provider reading `<root>/<level>/<row>/<col><ext>` files.
#[derive(Debug, Clone)]
pub struct DirectoryTileProvider {
    root: PathBuf,
    extension: String,
}

impl DirectoryTileProvider {
    /// Create a provider rooted at `root`, using [`DEFAULT_TILE_EXTENSION`].
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extension: DEFAULT_TILE_EXTENSION.to_string(),
        }
    }

    /// Use another file extension. A missing leading dot is added.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        let extension = extension.into();
        self.extension = if extension.is_empty() || extension.starts_with('.') {
            extension
        } else {
            format!(".{}", extension)
        };
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Path of the file holding a tile.
    pub fn tile_path(&self, row: u32, col: u32, level: usize) -> PathBuf {
        self.root
            .join(level.to_string())
            .join(row.to_string())
            .join(format!("{}{}", col, self.extension))
    }

    async fn read_tile(&self, path: &Path) -> Result<Bytes, IoError> {
        tokio::fs::read(path)
            .await
            .map(Bytes::from)
            .map_err(|e| IoError::from_io(path.display().to_string(), e))
    }
}

#[async_trait]
impl TileStreamProvider for DirectoryTileProvider {
    async fn tile_stream(&self, row: u32, col: u32, level: usize) -> Option<Bytes> {
        let path = self.tile_path(row, col, level);
        match self.read_tile(&path).await {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                debug!(error = %err, "tile unavailable");
                None
            }
        }
    }
}
