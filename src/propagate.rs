//! EXIF propagation between two directories of same-named images
//!
//! Each image in the target directory whose name matches a file in the
//! source directory receives the source's raw EXIF payload, untouched, and
//! the source file's access, modification and creation times.

use crate::error::{Error, Result};
use crate::sync::{FileTimes, SyncOutcome, apply_file_times};
use img_parts::{Bytes, DynImage, ImageEXIF};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{Level, debug, error, info, span, warn};
use walkdir::WalkDir;

/// Target extensions considered for propagation (lowercase)
pub const PROPAGATE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Outcome for one target file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropagateStatus {
    Updated,
    SourceMissing,
    NoExif,
    Failed,
}

#[derive(Debug, Clone)]
pub struct PropagateResult {
    pub target: PathBuf,
    pub status: PropagateStatus,
    pub sync: Option<SyncOutcome>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropagateStats {
    /// Candidate images found in the target directory
    pub found: usize,
    pub updated: usize,
    pub source_missing: usize,
    pub no_exif: usize,
    pub failed: usize,
}

impl PropagateStats {
    fn record(&mut self, status: PropagateStatus) {
        match status {
            PropagateStatus::Updated => self.updated += 1,
            PropagateStatus::SourceMissing => self.source_missing += 1,
            PropagateStatus::NoExif => self.no_exif += 1,
            PropagateStatus::Failed => self.failed += 1,
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "Found: {}, Updated: {}, Source missing: {}, No EXIF: {}, Failed: {}",
            self.found, self.updated, self.source_missing, self.no_exif, self.failed
        )
    }
}

fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .is_some_and(|e| PROPAGATE_EXTENSIONS.contains(&e.as_str()))
}

/// List candidate target images, sorted by name
fn target_images(target_dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(target_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "Error walking target directory");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| has_supported_extension(path))
        .collect()
}

fn parse_image(path: &Path) -> Result<DynImage> {
    let bytes = fs::read(path)?;
    DynImage::from_bytes(Bytes::from(bytes))
        .map_err(|e| Error::ExifRead {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
        .ok_or_else(|| Error::UnsupportedFormat {
            path: path.to_path_buf(),
        })
}

/// Raw EXIF payload of `path`, if it carries one
pub fn read_exif_payload(path: &Path) -> Result<Option<Bytes>> {
    Ok(parse_image(path)?.exif())
}

/// Replace the EXIF payload of `path` with `exif`, keeping pixel data as is
pub fn write_exif_payload(path: &Path, exif: Bytes) -> Result<()> {
    let mut image = parse_image(path)?;
    image.set_exif(Some(exif));

    let mut output = Vec::new();
    image
        .encoder()
        .write_to(&mut output)
        .map_err(|e| Error::MetadataEmbed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    fs::write(path, output)?;
    Ok(())
}

fn propagate_file(source: &Path, target: &Path) -> PropagateResult {
    let mut result = PropagateResult {
        target: target.to_path_buf(),
        status: PropagateStatus::SourceMissing,
        sync: None,
        error: None,
    };

    if !source.is_file() {
        warn!(?target, "Source file not found");
        return result;
    }

    let copied = read_exif_payload(source).and_then(|exif| match exif {
        Some(exif) => write_exif_payload(target, exif).map(|()| true),
        None => Ok(false),
    });

    match copied {
        Ok(true) => {
            info!(?target, "Copied EXIF");
            result.status = PropagateStatus::Updated;
        }
        Ok(false) => {
            info!(?source, "No EXIF in source");
            result.status = PropagateStatus::NoExif;
            return result;
        }
        Err(e) => {
            error!(?target, error = %e, "Failed to copy EXIF");
            result.status = PropagateStatus::Failed;
            result.error = Some(e.to_string());
            return result;
        }
    }

    match FileTimes::read(source) {
        Ok(times) => result.sync = Some(apply_file_times(target, &times)),
        Err(e) => warn!(?source, error = %e, "Could not read source timestamps"),
    }
    result
}

/// Copy EXIF payloads and file times from `source_dir` onto same-named
/// images in `target_dir`.
///
/// A missing directory is logged and yields empty results.
pub fn copy_exif_data(source_dir: &Path, target_dir: &Path) -> (Vec<PropagateResult>, PropagateStats) {
    let _span = span!(Level::INFO, "copy_exif").entered();
    let mut stats = PropagateStats::default();

    if !source_dir.is_dir() {
        error!(?source_dir, "Source directory not found");
        return (Vec::new(), stats);
    }
    if !target_dir.is_dir() {
        error!(?target_dir, "Target directory not found");
        return (Vec::new(), stats);
    }

    let targets = target_images(target_dir);
    stats.found = targets.len();
    info!(count = targets.len(), ?target_dir, "Found images to process");

    let results: Vec<_> = targets
        .iter()
        .filter_map(|target| {
            let name = target.file_name()?;
            Some(propagate_file(&source_dir.join(name), target))
        })
        .inspect(|r| stats.record(r.status))
        .collect();

    debug!(summary = %stats.summary(), "Propagation finished");
    info!(updated = stats.updated, "Finished EXIF propagation");
    (results, stats)
}
