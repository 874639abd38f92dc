//! Error types for the mosaic engine.
//!
//! Per-tile failures (`TileDecode`) are absorbed where they happen; the other
//! variants escalate to whoever started the job.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the engine.
pub type Result<T> = std::result::Result<T, MosaicError>;

/// Errors that can occur while indexing a corpus or composing a mosaic.
#[derive(Debug, Error)]
pub enum MosaicError {
    /// The tile corpus itself could not be listed.
    #[error("Tile corpus {path} is unreadable: {source}")]
    CorpusUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A single tile could not be read or decoded.
    #[error("Failed to decode tile {name}: {source}")]
    TileDecode {
        name: String,
        #[source]
        source: image::ImageError,
    },

    /// Every tile of the job's index has already been consumed.
    #[error("No tiles available: the tile index is exhausted")]
    TileIndexExhausted,

    /// The caller handed the engine something it cannot work with.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A composition task panicked or was cancelled.
    #[error("Composition worker failed: {0}")]
    Worker(String),

    /// Encoding or saving an image failed.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}
