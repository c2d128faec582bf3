//! Manifest-driven download pipeline
//!
//! For every media item, in manifest order:
//! - pick the medium rendition URI, falling back to the thumbnail
//! - name the file after the UTC capture time and media id
//! - download it, embed EXIF metadata and align file times
//!
//! Every per-asset failure is logged and recorded; only an unusable output
//! directory stops the run.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::fetch::Fetch;
use crate::manifest::{Encounter, Manifest, MediaItem, ParkCoordinates, ParkLocation};
use crate::metadata::MetadataRecord;
use crate::metadata::gps::is_valid_position;
use crate::metadata::writer::embed_record;
use crate::sync::{SyncOutcome, apply_capture_time};
use crate::time::{LocalTime, parse_timezone, resolve_local_time};
use chrono_tz::Tz;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{Level, debug, error, info, span, warn};

/// Extension used for every downloaded file
pub const OUTPUT_EXTENSION: &str = "jpg";

/// Outcome of one media item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetStatus {
    /// Saved with full metadata including GPS
    Tagged,
    /// Saved with timestamps and attribution but no GPS block
    TaggedWithoutGps,
    /// Saved under its media id; capture date could not be parsed
    Untagged,
    /// Saved, but writing the EXIF container failed
    EmbedFailed,
    /// No medium or thumbnail URI in the manifest
    SkippedNoUri,
    /// Retrieval or saving the bytes failed
    RetrievalFailed,
}

impl AssetStatus {
    /// Whether the file ended up in the output directory
    pub fn is_saved(self) -> bool {
        self.is_processed() || self == AssetStatus::EmbedFailed
    }

    /// Whether the item went through every step that applied to it.
    ///
    /// A failed embed leaves the bytes on disk but does not count.
    pub fn is_processed(self) -> bool {
        matches!(
            self,
            AssetStatus::Tagged | AssetStatus::TaggedWithoutGps | AssetStatus::Untagged
        )
    }
}

/// Why an asset's GPS block was left empty
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GpsOmission {
    /// The encounter has no `origPark`
    NoPark,
    /// The park code is not in the coordinate table
    UnknownPark(String),
    /// The table entry lacks latitude or longitude
    IncompleteCoordinates(String),
    /// The table entry is not a finite, in-range position
    InvalidCoordinates(String),
}

/// Result of processing a single media item
#[derive(Debug, Clone)]
pub struct AssetResult {
    pub media_id: String,
    pub park: Option<String>,
    pub url: Option<String>,
    pub destination: Option<PathBuf>,
    pub capture_time: Option<LocalTime>,
    pub status: AssetStatus,
    pub gps_omission: Option<GpsOmission>,
    pub sync: Option<SyncOutcome>,
    pub error: Option<String>,
}

impl AssetResult {
    fn new(item: &MediaItem, park: Option<&str>) -> Self {
        Self {
            media_id: item.id().to_string(),
            park: park.map(str::to_string),
            url: item.source_uri().map(str::to_string),
            destination: None,
            capture_time: None,
            status: AssetStatus::SkippedNoUri,
            gps_omission: None,
            sync: None,
            error: None,
        }
    }
}

/// Download statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadStats {
    pub total: usize,
    /// Items that completed every applicable step
    pub processed: usize,
    /// Files written to the output directory, including failed embeds
    pub saved: usize,
    pub tagged: usize,
    pub tagged_without_gps: usize,
    pub untagged: usize,
    pub embed_failed: usize,
    pub skipped_no_uri: usize,
    pub retrieval_failed: usize,
    pub timestamp_sync_failed: usize,
}

impl DownloadStats {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&mut self, result: &AssetResult) {
        self.total += 1;
        if result.status.is_processed() {
            self.processed += 1;
        }
        if result.status.is_saved() {
            self.saved += 1;
        }
        match result.status {
            AssetStatus::Tagged => self.tagged += 1,
            AssetStatus::TaggedWithoutGps => self.tagged_without_gps += 1,
            AssetStatus::Untagged => self.untagged += 1,
            AssetStatus::EmbedFailed => self.embed_failed += 1,
            AssetStatus::SkippedNoUri => self.skipped_no_uri += 1,
            AssetStatus::RetrievalFailed => self.retrieval_failed += 1,
        }
        if result.sync.is_some_and(|s| !s.times_set) {
            self.timestamp_sync_failed += 1;
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "Total: {}, Processed: {}, Saved: {}, Tagged: {}, Without GPS: {}, Untagged: {}, Embed failed: {}, No URI: {}, Retrieval failed: {}, Timestamp sync failed: {}",
            self.total,
            self.processed,
            self.saved,
            self.tagged,
            self.tagged_without_gps,
            self.untagged,
            self.embed_failed,
            self.skipped_no_uri,
            self.retrieval_failed,
            self.timestamp_sync_failed
        )
    }
}

/// Build the output filename for a media item.
///
/// `YYYY-MM-DD_HH-MM-SS_<id>.jpg` from the UTC capture time, or `<id>.jpg`
/// when the capture date did not parse.
pub fn asset_filename(media_id: &str, capture_time: Option<&LocalTime>) -> String {
    let id = sanitize_component(media_id);
    match capture_time {
        Some(time) => format!("{}_{}.{}", time.filename_stem(), id, OUTPUT_EXTENSION),
        None => format!("{}.{}", id, OUTPUT_EXTENSION),
    }
}

/// Keep ids from escaping the output directory
fn sanitize_component(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            c => c,
        })
        .collect()
}

/// Resolve an encounter's park to a location, or say why there is none
fn lookup_park<'a>(
    parks: &'a ParkCoordinates,
    encounter: &Encounter,
) -> (Option<&'a ParkLocation>, Option<GpsOmission>) {
    let Some(code) = encounter.orig_park.as_deref() else {
        return (None, Some(GpsOmission::NoPark));
    };
    match parks.get(code) {
        None => (None, Some(GpsOmission::UnknownPark(code.to_string()))),
        Some(location) => match location.coordinates() {
            None => (
                None,
                Some(GpsOmission::IncompleteCoordinates(code.to_string())),
            ),
            Some((lat, lon)) if !is_valid_position(lat, lon) => (
                None,
                Some(GpsOmission::InvalidCoordinates(code.to_string())),
            ),
            Some(_) => (Some(location), None),
        },
    }
}

/// Main downloader driving the per-asset pipeline
pub struct Downloader<F: Fetch> {
    output_dir: PathBuf,
    timezone: Tz,
    attribution: String,
    parks: ParkCoordinates,
    fetcher: F,
    stats: DownloadStats,
}

impl<F: Fetch> Downloader<F> {
    /// Create a downloader; fails only on an unknown timezone name
    pub fn new(config: &Config, parks: ParkCoordinates, fetcher: F) -> Result<Self> {
        Ok(Self {
            output_dir: config.output_dir.clone(),
            timezone: parse_timezone(&config.timezone)?,
            attribution: config.attribution.clone(),
            parks,
            fetcher,
            stats: DownloadStats::new(),
        })
    }

    pub fn stats(&self) -> &DownloadStats {
        &self.stats
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Run the pipeline over every media item in `manifest`
    pub fn run(&mut self, manifest: &Manifest) -> Result<Vec<AssetResult>> {
        let _span = span!(Level::INFO, "download_run").entered();

        if manifest.encounters().is_empty() {
            info!("No encounters found in manifest");
            return Ok(Vec::new());
        }

        fs::create_dir_all(&self.output_dir).map_err(|e| {
            Error::Config(format!(
                "Cannot create output directory {}: {}",
                self.output_dir.display(),
                e
            ))
        })?;

        let mut results = Vec::with_capacity(manifest.media_count());
        for encounter in manifest.encounters() {
            let park = encounter.orig_park.as_deref();
            let (location, omission) = lookup_park(&self.parks, encounter);
            if let Some(reason) = &omission {
                debug!(?park, ?reason, "GPS tagging unavailable for encounter");
            }

            for item in &encounter.media_list {
                let mut result = self.process_item(item, park, location);
                if result.status == AssetStatus::TaggedWithoutGps {
                    result.gps_omission = omission.clone();
                }
                self.stats.record(&result);
                results.push(result);
            }
        }

        info!(summary = %self.stats.summary(), "Download complete");
        Ok(results)
    }

    fn process_item(
        &self,
        item: &MediaItem,
        park: Option<&str>,
        location: Option<&ParkLocation>,
    ) -> AssetResult {
        let mut result = AssetResult::new(item, park);

        let Some(url) = item.source_uri() else {
            info!(media_id = item.id(), "Skipping media item without a rendition URI");
            result.status = AssetStatus::SkippedNoUri;
            return result;
        };

        let capture_date = item.capture_date.as_deref().unwrap_or_default();
        let capture_time = match resolve_local_time(capture_date, self.timezone) {
            Ok(time) => Some(time),
            Err(e) => {
                warn!(media_id = item.id(), error = %e, "Could not parse capture date, using id filename");
                None
            }
        };

        let filename = asset_filename(item.id(), capture_time.as_ref());
        let path = self.output_dir.join(&filename);

        info!(filename = %filename, "Downloading");
        if let Err(e) = self.download(url, &path) {
            error!(filename = %filename, url, error = %e, "Download failed");
            result.status = AssetStatus::RetrievalFailed;
            result.error = Some(e.to_string());
            return result;
        }
        result.destination = Some(path.clone());

        let Some(capture_time) = capture_time else {
            result.status = AssetStatus::Untagged;
            return result;
        };

        let embedded = MetadataRecord::builder(&self.attribution)
            .local_time(&capture_time)
            .location(location)
            .build()
            .and_then(|record| embed_record(&path, &record).map(|()| record.has_gps()));

        result.status = match embedded {
            Ok(true) => AssetStatus::Tagged,
            Ok(false) => AssetStatus::TaggedWithoutGps,
            Err(e) => {
                // File keeps its download times; only tagged files are re-timed
                error!(filename = %filename, error = %e, "Failed to embed metadata");
                result.error = Some(e.to_string());
                result.status = AssetStatus::EmbedFailed;
                result.capture_time = Some(capture_time);
                return result;
            }
        };
        info!(
            filename = %filename,
            park = park.unwrap_or("-"),
            gps = result.status == AssetStatus::Tagged,
            local_time = %capture_time.local,
            offset = %capture_time.offset,
            "Tagged"
        );

        result.sync = Some(apply_capture_time(&path, capture_time.utc));
        result.capture_time = Some(capture_time);
        result
    }

    fn download(&self, url: &str, path: &Path) -> Result<()> {
        let bytes = self.fetcher.fetch(url)?;
        fs::write(path, &bytes)?;
        debug!(?path, size = bytes.len(), "Saved rendition");
        Ok(())
    }
}
