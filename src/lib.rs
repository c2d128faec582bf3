//! PhotoPass Fetch - download PhotoPass photos with capture metadata
//!
//! This library provides:
//! - Manifest and park coordinate table loading
//! - Capture time resolution into UTC, local wall time and offset
//! - EXIF embedding of attribution, timestamps and park GPS coordinates
//! - File timestamp synchronization (creation time on Windows)
//! - EXIF propagation onto edited copies of downloaded photos

pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod manifest;
pub mod metadata;
pub mod os;
pub mod process;
pub mod propagate;
pub mod sync;
pub mod time;

pub use cli::{Cli, Command};
pub use config::{Config, ConfigError, PropagateConfig};
pub use error::{Error, Result};
pub use fetch::{Fetch, HttpFetcher};
pub use manifest::{Manifest, ParkCoordinates, ParkLocation};
pub use metadata::MetadataRecord;
pub use process::{AssetResult, AssetStatus, DownloadStats, Downloader};
pub use propagate::{PropagateStats, PropagateStatus, copy_exif_data};
pub use time::LocalTime;
