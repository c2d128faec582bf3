//! Read-back of embedded capture metadata

use crate::error::{Error, Result};
use chrono::NaiveDateTime;
use exif::{Exif, Field, In, Reader, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::trace;

/// EXIF tags to try for date extraction, in priority order
const DATE_TAGS: &[Tag] = &[
    Tag::DateTimeOriginal,  // When the original image was taken
    Tag::DateTimeDigitized, // When the image was digitized
    Tag::DateTime,          // File modification date/time
];

/// Capture-related fields found in a file's EXIF container
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbeddedMetadata {
    pub make: Option<String>,
    pub model: Option<String>,
    pub software: Option<String>,
    pub capture_time: Option<NaiveDateTime>,
    pub offset_time: Option<String>,
    pub offset_time_original: Option<String>,
    pub latitude_ref: Option<String>,
    pub longitude_ref: Option<String>,
    /// Signed decimal degrees
    pub latitude: Option<f64>,
    /// Signed decimal degrees
    pub longitude: Option<f64>,
    pub gps_date_stamp: Option<String>,
}

impl EmbeddedMetadata {
    pub fn has_gps(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}

/// Read the fields this tool writes back out of an image
pub fn read_embedded(path: &Path) -> Result<EmbeddedMetadata> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let exif = Reader::new()
        .read_from_container(&mut reader)
        .map_err(|e| Error::ExifRead {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let latitude_ref = ascii_field(&exif, Tag::GPSLatitudeRef);
    let longitude_ref = ascii_field(&exif, Tag::GPSLongitudeRef);

    Ok(EmbeddedMetadata {
        make: ascii_field(&exif, Tag::Make),
        model: ascii_field(&exif, Tag::Model),
        software: ascii_field(&exif, Tag::Software),
        capture_time: capture_time(&exif, path),
        offset_time: ascii_field(&exif, Tag::OffsetTime),
        offset_time_original: ascii_field(&exif, Tag::OffsetTimeOriginal),
        latitude: signed_degrees(&exif, Tag::GPSLatitude, latitude_ref.as_deref(), "S"),
        longitude: signed_degrees(&exif, Tag::GPSLongitude, longitude_ref.as_deref(), "W"),
        latitude_ref,
        longitude_ref,
        gps_date_stamp: ascii_field(&exif, Tag::GPSDateStamp),
    })
}

fn capture_time(exif: &Exif, path: &Path) -> Option<NaiveDateTime> {
    for tag in DATE_TAGS {
        if let Some(value) = ascii_field(exif, *tag)
            && let Some(datetime) = parse_exif_datetime(&value)
        {
            trace!(?path, ?tag, "Found EXIF date");
            return Some(datetime);
        }
    }
    None
}

fn primary_field(exif: &Exif, tag: Tag) -> Option<&Field> {
    exif.get_field(tag, In::PRIMARY)
}

fn ascii_field(exif: &Exif, tag: Tag) -> Option<String> {
    match &primary_field(exif, tag)?.value {
        Value::Ascii(parts) => parts.first().map(|bytes| {
            String::from_utf8_lossy(bytes)
                .trim_end_matches('\0')
                .trim()
                .to_string()
        }),
        _ => None,
    }
}

fn signed_degrees(exif: &Exif, tag: Tag, reference: Option<&str>, negative: &str) -> Option<f64> {
    let Value::Rational(parts) = &primary_field(exif, tag)?.value else {
        return None;
    };
    if parts.len() < 3 {
        return None;
    }
    let degrees = parts[0].to_f64() + parts[1].to_f64() / 60.0 + parts[2].to_f64() / 3600.0;
    Some(if reference == Some(negative) {
        -degrees
    } else {
        degrees
    })
}

/// Parse EXIF datetime string format: "YYYY:MM:DD HH:MM:SS"
fn parse_exif_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim().trim_matches('"');

    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y:%m:%d %H:%M:%S") {
        return Some(dt);
    }

    // Try with subseconds
    NaiveDateTime::parse_from_str(s, "%Y:%m:%d %H:%M:%S%.f").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_exif_datetime() {
        let dt = parse_exif_datetime("2024:01:15 14:30:00").unwrap();
        assert_eq!(dt.year(), 2024);
        assert_eq!(dt.month(), 1);
        assert_eq!(dt.day(), 15);
        assert_eq!(dt.hour(), 14);
        assert_eq!(dt.minute(), 30);
        assert_eq!(dt.second(), 0);

        // With quotes
        let dt = parse_exif_datetime("\"2024:01:15 14:30:00\"").unwrap();
        assert_eq!(dt.year(), 2024);

        let dt = parse_exif_datetime("2024:01:15 14:30:00.25").unwrap();
        assert_eq!(dt.second(), 0);

        assert!(parse_exif_datetime("invalid").is_none());
        assert!(parse_exif_datetime("2024-01-15 14:30:00").is_none());
    }

    #[test]
    fn test_read_non_image_fails() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"definitely not an image").unwrap();
        file.flush().unwrap();

        let result = read_embedded(file.path());
        assert!(matches!(result, Err(Error::ExifRead { .. })));
    }
}
