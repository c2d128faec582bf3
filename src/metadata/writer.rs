//! EXIF container writing for downloaded renditions
//!
//! Downloaded files are always stored as JPEG. Renditions that arrive in
//! another still format are re-encoded first, then the record is written as
//! a fresh EXIF container that replaces whatever the file carried before.

use super::MetadataRecord;
use crate::error::{Error, Result};
use image::ImageFormat;
use image::codecs::jpeg::JpegEncoder;
use little_exif::metadata::Metadata;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Quality used when re-encoding non-JPEG renditions
pub const JPEG_QUALITY: u8 = 95;

/// Re-encode the file at `path` as JPEG unless it already is one.
///
/// Returns `true` when the file was rewritten.
pub fn normalize_to_jpeg(path: &Path) -> Result<bool> {
    let bytes = fs::read(path)?;
    let format = image::guess_format(&bytes).map_err(|_| Error::UnsupportedFormat {
        path: path.to_path_buf(),
    })?;

    if format == ImageFormat::Jpeg {
        return Ok(false);
    }

    let decoded = image::load_from_memory_with_format(&bytes, format).map_err(|e| {
        Error::MetadataEmbed {
            path: path.to_path_buf(),
            message: format!("failed to decode {:?} rendition: {}", format, e),
        }
    })?;

    let mut encoded = Vec::with_capacity(bytes.len());
    JpegEncoder::new_with_quality(&mut encoded, JPEG_QUALITY)
        .encode_image(&decoded.to_rgb8())
        .map_err(|e| Error::MetadataEmbed {
            path: path.to_path_buf(),
            message: format!("failed to encode JPEG: {}", e),
        })?;

    fs::write(path, &encoded)?;
    info!(?path, from = ?format, "Converted rendition to JPEG");
    Ok(true)
}

/// Validate `record` and write it into the file's EXIF container
pub fn embed_record(path: &Path, record: &MetadataRecord) -> Result<()> {
    record.validate()?;
    normalize_to_jpeg(path)?;

    let mut metadata = Metadata::new();
    for tag in record.to_exif_tags() {
        metadata.set_tag(tag);
    }

    metadata
        .write_to_file(path)
        .map_err(|e| Error::MetadataEmbed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    debug!(?path, gps = record.has_gps(), "Embedded EXIF metadata");
    Ok(())
}
