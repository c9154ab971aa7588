use thiserror::Error;

/// Errors raised while configuring a tile pyramid.
///
/// These are fail-fast construction errors: a resolver is never built from
/// parameters that produced one of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PyramidError {
    /// A pyramid needs at least one level
    #[error("Invalid level count: {level_count} (a pyramid needs at least one level)")]
    InvalidLevelCount { level_count: usize },

    /// Full-resolution dimensions must both be non-zero
    #[error("Invalid map dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// Tiles must have a non-zero edge length
    #[error("Invalid tile size: {0}")]
    InvalidTileSize(u32),
}

/// I/O errors that can occur when reading tile bytes from backing storage.
///
/// Providers never surface these to the loader: a failed read is reported
/// as an absent tile. The type exists so the failure can be logged with
/// its cause.
#[derive(Debug, Clone, Error)]
pub enum IoError {
    /// Tile file or entry does not exist
    #[error("Tile not found: {0}")]
    NotFound(String),

    /// The read itself failed
    #[error("Failed to read {path}: {message}")]
    Read { path: String, message: String },
}

impl IoError {
    /// Build an `IoError` from a `std::io::Error` for the given path.
    pub fn from_io(path: impl Into<String>, err: std::io::Error) -> Self {
        let path = path.into();
        if err.kind() == std::io::ErrorKind::NotFound {
            IoError::NotFound(path)
        } else {
            IoError::Read {
                path,
                message: err.to_string(),
            }
        }
    }
}

/// Errors produced while turning tile bytes into a bitmap.
#[derive(Debug, Clone, Error)]
pub enum TileError {
    /// The tile bytes are not a decodable image
    #[error("Failed to decode tile: {message}")]
    Decode { message: String },

    /// A decode task ended without producing a result
    #[error("Decode task failed: {message}")]
    Task { message: String },
}
