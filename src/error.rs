//! Error types for the photo fetcher

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for photo fetcher operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the photo fetcher
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse timestamp from {source_info}: {message}")]
    TimestampParse { source_info: String, message: String },

    #[error("Failed to retrieve {url}: {message}")]
    Retrieval { url: String, message: String },

    #[error("Failed to embed metadata into {path}: {message}")]
    MetadataEmbed { path: PathBuf, message: String },

    #[error("Invalid metadata record: {0}")]
    InvalidRecord(String),

    #[error("Failed to set file timestamps on {path}: {message}")]
    TimestampSync { path: PathBuf, message: String },

    #[error("Failed to load manifest {path}: {message}")]
    ManifestLoad { path: PathBuf, message: String },

    #[error("Failed to load park coordinates {path}: {message}")]
    ParkTable { path: PathBuf, message: String },

    #[error("Failed to read EXIF data from {path}: {message}")]
    ExifRead { path: PathBuf, message: String },

    #[error("Unsupported file format: {path}")]
    UnsupportedFormat { path: PathBuf },

    #[error("Configuration error: {0}")]
    Config(String),
}
