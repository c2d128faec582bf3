//! Media manifest and park coordinate table
//!
//! The manifest is the JSON export listing guest media grouped by encounter:
//! `guestMedia.encounters[].mediaList[]`. Only the fields the downloader
//! uses are modelled; everything else in the export is ignored.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{info, warn};

/// Identifier used when a media item has no `mediaId`
pub const UNKNOWN_MEDIA_ID: &str = "unknown";

/// Top-level manifest document
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default)]
    pub guest_media: GuestMedia,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GuestMedia {
    #[serde(default)]
    pub encounters: Vec<Encounter>,
}

/// A photo encounter at one park
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Encounter {
    #[serde(default)]
    pub orig_park: Option<String>,
    #[serde(default)]
    pub media_list: Vec<MediaItem>,
}

/// One photo with its renditions
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    #[serde(default)]
    pub media_id: Option<String>,
    #[serde(default)]
    pub capture_date: Option<String>,
    #[serde(default)]
    pub media_thumb: Option<Rendition>,
    #[serde(default)]
    pub media_medium: Option<Rendition>,
}

/// A single resolution variant of a photo
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Rendition {
    #[serde(default)]
    pub uri: Option<String>,
}

impl Rendition {
    fn usable_uri(&self) -> Option<&str> {
        self.uri.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }
}

impl MediaItem {
    pub fn id(&self) -> &str {
        self.media_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .unwrap_or(UNKNOWN_MEDIA_ID)
    }

    /// Medium rendition URI, falling back to the thumbnail
    pub fn source_uri(&self) -> Option<&str> {
        self.media_medium
            .as_ref()
            .and_then(Rendition::usable_uri)
            .or_else(|| self.media_thumb.as_ref().and_then(Rendition::usable_uri))
    }
}

impl Manifest {
    /// Load a manifest from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::ManifestLoad {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let reader = BufReader::new(file);

        let manifest: Self = serde_json::from_reader(reader).map_err(|e| Error::ManifestLoad {
            path: path.to_path_buf(),
            message: format!("invalid JSON: {}", e),
        })?;

        info!(
            encounters = manifest.encounters().len(),
            media = manifest.media_count(),
            "Loaded manifest"
        );
        Ok(manifest)
    }

    pub fn encounters(&self) -> &[Encounter] {
        &self.guest_media.encounters
    }

    pub fn media_count(&self) -> usize {
        self.encounters().iter().map(|e| e.media_list.len()).sum()
    }
}

/// Decimal position of a park; either half may be missing in the table
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct ParkLocation {
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
}

impl ParkLocation {
    /// Both coordinates, if present
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.lat?, self.lon?))
    }
}

/// Park code to location lookup, read-only once loaded
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct ParkCoordinates {
    parks: HashMap<String, ParkLocation>,
}

impl ParkCoordinates {
    pub fn new(parks: HashMap<String, ParkLocation>) -> Self {
        Self { parks }
    }

    /// Load the table from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::ParkTable {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let reader = BufReader::new(file);

        let table: Self = serde_json::from_reader(reader).map_err(|e| Error::ParkTable {
            path: path.to_path_buf(),
            message: format!("invalid JSON: {}", e),
        })?;

        info!(parks = table.len(), "Loaded park coordinates");
        Ok(table)
    }

    /// Load the table, or return an empty one (GPS tagging disabled) on any failure
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::load(path) {
            Ok(table) => table,
            Err(e) => {
                warn!(error = %e, "Park coordinates unavailable, GPS tagging will be skipped");
                Self::default()
            }
        }
    }

    pub fn get(&self, park: &str) -> Option<&ParkLocation> {
        self.parks.get(park)
    }

    pub fn len(&self) -> usize {
        self.parks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE_MANIFEST: &str = r#"{
        "guestMedia": {
            "encounters": [
                {
                    "encounterId": "8c2b",
                    "origPark": "MK",
                    "mediaList": [
                        {
                            "mediaId": "123",
                            "captureDate": "2026-01-18T19:16:29Z",
                            "mediaThumb": { "uri": "https://example.com/media/123/mediaThumb.jpg" },
                            "mediaMedium": { "uri": "https://example.com/media/123/mediaMedium.jpg", "renditionType": "mediaMedium_wm" }
                        },
                        {
                            "mediaId": "456",
                            "captureDate": "2026-01-18T19:20:00Z",
                            "mediaThumb": { "uri": "https://example.com/media/456/mediaThumb.jpg" },
                            "mediaMedium": null
                        },
                        {
                            "captureDate": "not a date",
                            "mediaMedium": { "uri": "" }
                        }
                    ]
                }
            ]
        },
        "metaData": { "lastCapture": "2026-01-18T19:20:00Z" }
    }"#;

    #[test]
    fn test_parse_manifest() {
        let manifest: Manifest = serde_json::from_str(SAMPLE_MANIFEST).unwrap();
        assert_eq!(manifest.encounters().len(), 1);
        assert_eq!(manifest.media_count(), 3);

        let encounter = &manifest.encounters()[0];
        assert_eq!(encounter.orig_park.as_deref(), Some("MK"));

        let first = &encounter.media_list[0];
        assert_eq!(first.id(), "123");
        assert_eq!(
            first.source_uri(),
            Some("https://example.com/media/123/mediaMedium.jpg")
        );

        let second = &encounter.media_list[1];
        assert_eq!(
            second.source_uri(),
            Some("https://example.com/media/456/mediaThumb.jpg")
        );

        let third = &encounter.media_list[2];
        assert_eq!(third.id(), UNKNOWN_MEDIA_ID);
        assert_eq!(third.source_uri(), None);
    }

    #[test]
    fn test_empty_manifest() {
        let manifest: Manifest = serde_json::from_str("{}").unwrap();
        assert!(manifest.encounters().is_empty());
    }

    #[test]
    fn test_load_missing_manifest() {
        let result = Manifest::load(Path::new("/nonexistent/photos.json"));
        assert!(matches!(result, Err(Error::ManifestLoad { .. })));
    }

    #[test]
    fn test_load_malformed_manifest() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();
        file.flush().unwrap();
        assert!(matches!(
            Manifest::load(file.path()),
            Err(Error::ManifestLoad { .. })
        ));
    }

    #[test]
    fn test_park_coordinates() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(
            br#"{ "MK": { "lat": 28.4177, "lon": -81.5812 }, "EPCOT": { "lat": 28.3747 } }"#,
        )
        .unwrap();
        file.flush().unwrap();

        let table = ParkCoordinates::load(file.path()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.get("MK").and_then(ParkLocation::coordinates),
            Some((28.4177, -81.5812))
        );
        assert_eq!(table.get("EPCOT").and_then(ParkLocation::coordinates), None);
        assert!(table.get("POLY").is_none());
    }

    #[test]
    fn test_park_coordinates_missing_file_is_empty() {
        let table = ParkCoordinates::load_or_empty(Path::new("/nonexistent/parks.json"));
        assert!(table.is_empty());
    }
}
