//! Metadata record assembly
//!
//! A [`MetadataRecord`] is built once per downloaded asset from the resolved
//! capture time and the encounter's park location. It is validated on its
//! own before [`writer::embed_record`] turns it into EXIF tags and rewrites
//! the file's container.

pub mod gps;
pub mod writer;

use crate::error::{Error, Result};
use crate::manifest::ParkLocation;
use crate::time::LocalTime;
use gps::{DmsCoordinate, Hemispheres, Rational, is_valid_position, to_dms};
use little_exif::exif_tag::ExifTag;
use tracing::warn;

/// Camera attribution fields (IFD0 Make/Model/Software)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceBlock {
    pub make: String,
    pub model: String,
    pub software: String,
}

/// Local civil timestamps and their UTC offsets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampBlock {
    pub date_time: String,
    pub date_time_original: String,
    pub date_time_digitized: String,
    pub offset_time: String,
    pub offset_time_original: String,
    pub offset_time_digitized: String,
}

/// GPS position plus the UTC time of the fix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpsBlock {
    pub latitude: DmsCoordinate,
    pub longitude: DmsCoordinate,
    pub time_stamp: [Rational; 3],
    pub date_stamp: String,
}

/// Everything written into one downloaded file's EXIF container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRecord {
    pub device: DeviceBlock,
    pub timestamps: TimestampBlock,
    pub gps: Option<GpsBlock>,
    /// Reserved; downloaded renditions never carry an embedded thumbnail
    pub thumbnail: Option<Vec<u8>>,
}

impl MetadataRecord {
    /// Start building a record attributed to `attribution`
    pub fn builder(attribution: &str) -> MetadataRecordBuilder<'_> {
        MetadataRecordBuilder {
            attribution,
            local_time: None,
            location: None,
        }
    }

    pub fn has_gps(&self) -> bool {
        self.gps.is_some()
    }

    /// Check field layouts before anything touches the file
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("Make", &self.device.make),
            ("Model", &self.device.model),
            ("Software", &self.device.software),
        ] {
            if value.trim().is_empty() {
                return Err(Error::InvalidRecord(format!("{} is empty", name)));
            }
        }

        let ts = &self.timestamps;
        for (name, value) in [
            ("DateTime", &ts.date_time),
            ("DateTimeOriginal", &ts.date_time_original),
            ("DateTimeDigitized", &ts.date_time_digitized),
        ] {
            if !is_exif_datetime(value) {
                return Err(Error::InvalidRecord(format!(
                    "{} '{}' is not YYYY:MM:DD HH:MM:SS",
                    name, value
                )));
            }
        }
        for (name, value) in [
            ("OffsetTime", &ts.offset_time),
            ("OffsetTimeOriginal", &ts.offset_time_original),
            ("OffsetTimeDigitized", &ts.offset_time_digitized),
        ] {
            if !is_exif_offset(value) {
                return Err(Error::InvalidRecord(format!(
                    "{} '{}' is not +HH:MM",
                    name, value
                )));
            }
        }

        if let Some(gps) = &self.gps {
            if gps.latitude.dms[0].numerator > 90 {
                return Err(Error::InvalidRecord("GPS latitude above 90 degrees".into()));
            }
            if gps.longitude.dms[0].numerator > 180 {
                return Err(Error::InvalidRecord("GPS longitude above 180 degrees".into()));
            }
            let [h, m, s] = gps.time_stamp;
            if h.numerator > 23 || m.numerator > 59 || s.numerator > 60 {
                return Err(Error::InvalidRecord("GPS time stamp out of range".into()));
            }
            if !is_exif_date(&gps.date_stamp) {
                return Err(Error::InvalidRecord(format!(
                    "GPSDateStamp '{}' is not YYYY:MM:DD",
                    gps.date_stamp
                )));
            }
        }

        if self.thumbnail.is_some() {
            return Err(Error::InvalidRecord("thumbnail section must be empty".into()));
        }

        Ok(())
    }

    /// Flatten the record into `little_exif` tags
    pub fn to_exif_tags(&self) -> Vec<ExifTag> {
        let ts = &self.timestamps;
        let mut tags = vec![
            ExifTag::Make(self.device.make.clone()),
            ExifTag::Model(self.device.model.clone()),
            ExifTag::Software(self.device.software.clone()),
            ExifTag::ModifyDate(ts.date_time.clone()),
            ExifTag::DateTimeOriginal(ts.date_time_original.clone()),
            ExifTag::CreateDate(ts.date_time_digitized.clone()),
            ExifTag::OffsetTime(ts.offset_time.clone()),
            ExifTag::OffsetTimeOriginal(ts.offset_time_original.clone()),
            ExifTag::OffsetTimeDigitized(ts.offset_time_digitized.clone()),
        ];

        if let Some(gps) = &self.gps {
            tags.push(ExifTag::GPSLatitudeRef(gps.latitude.reference.to_string()));
            tags.push(ExifTag::GPSLatitude(gps.latitude.to_exif()));
            tags.push(ExifTag::GPSLongitudeRef(gps.longitude.reference.to_string()));
            tags.push(ExifTag::GPSLongitude(gps.longitude.to_exif()));
            tags.push(ExifTag::GPSTimeStamp(
                gps.time_stamp.iter().copied().map(Into::into).collect(),
            ));
            tags.push(ExifTag::GPSDateStamp(gps.date_stamp.clone()));
        }

        tags
    }
}

/// Builder for [`MetadataRecord`]
#[derive(Debug)]
pub struct MetadataRecordBuilder<'a> {
    attribution: &'a str,
    local_time: Option<&'a LocalTime>,
    location: Option<&'a ParkLocation>,
}

impl<'a> MetadataRecordBuilder<'a> {
    pub fn local_time(mut self, local_time: &'a LocalTime) -> Self {
        self.local_time = Some(local_time);
        self
    }

    /// Park location for the GPS block; `None` leaves the block empty
    pub fn location(mut self, location: Option<&'a ParkLocation>) -> Self {
        self.location = location;
        self
    }

    pub fn build(self) -> Result<MetadataRecord> {
        let local_time = self
            .local_time
            .ok_or_else(|| Error::InvalidRecord("capture time is required".into()))?;

        let device = DeviceBlock {
            make: self.attribution.to_string(),
            model: self.attribution.to_string(),
            software: self.attribution.to_string(),
        };

        let datetime = local_time.exif_datetime();
        let timestamps = TimestampBlock {
            date_time: datetime.clone(),
            date_time_original: datetime.clone(),
            date_time_digitized: datetime,
            offset_time: local_time.offset.clone(),
            offset_time_original: local_time.offset.clone(),
            offset_time_digitized: local_time.offset.clone(),
        };

        let gps = self
            .location
            .and_then(ParkLocation::coordinates)
            .and_then(|(lat, lon)| {
                if !is_valid_position(lat, lon) {
                    warn!(lat, lon, "Park coordinates out of range, omitting GPS block");
                    return None;
                }
                Some(GpsBlock {
                    latitude: to_dms(lat, Hemispheres::LATITUDE),
                    longitude: to_dms(lon, Hemispheres::LONGITUDE),
                    time_stamp: local_time.gps_timestamp(),
                    date_stamp: local_time.gps_datestamp(),
                })
            });

        let record = MetadataRecord {
            device,
            timestamps,
            gps,
            thumbnail: None,
        };
        record.validate()?;
        Ok(record)
    }
}

fn is_exif_datetime(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 19
        && b.iter().enumerate().all(|(i, c)| match i {
            4 | 7 | 13 | 16 => *c == b':',
            10 => *c == b' ',
            _ => c.is_ascii_digit(),
        })
}

fn is_exif_date(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 10
        && b.iter().enumerate().all(|(i, c)| match i {
            4 | 7 => *c == b':',
            _ => c.is_ascii_digit(),
        })
}

fn is_exif_offset(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 6
        && (b[0] == b'+' || b[0] == b'-')
        && b[3] == b':'
        && [1, 2, 4, 5].iter().all(|&i| b[i].is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::resolve_local_time;
    use chrono_tz::America::New_York;

    fn magic_kingdom() -> ParkLocation {
        ParkLocation {
            lat: Some(28.4177),
            lon: Some(-81.5812),
        }
    }

    #[test]
    fn test_build_with_gps() {
        let local = resolve_local_time("2026-01-18T19:16:29Z", New_York).unwrap();
        let park = magic_kingdom();
        let record = MetadataRecord::builder("Disney Photo Pass")
            .local_time(&local)
            .location(Some(&park))
            .build()
            .unwrap();

        assert_eq!(record.device.make, "Disney Photo Pass");
        assert_eq!(record.device.model, "Disney Photo Pass");
        assert_eq!(record.device.software, "Disney Photo Pass");
        assert_eq!(record.timestamps.date_time_original, "2026:01:18 14:16:29");
        assert_eq!(record.timestamps.date_time, "2026:01:18 14:16:29");
        assert_eq!(record.timestamps.date_time_digitized, "2026:01:18 14:16:29");
        assert_eq!(record.timestamps.offset_time_original, "-05:00");

        let gps = record.gps.as_ref().unwrap();
        assert_eq!(gps.latitude.reference, "N");
        assert_eq!(gps.longitude.reference, "W");
        assert_eq!(
            gps.time_stamp,
            [Rational::whole(19), Rational::whole(16), Rational::whole(29)]
        );
        assert_eq!(gps.date_stamp, "2026:01:18");
        assert!(record.thumbnail.is_none());
    }

    #[test]
    fn test_build_without_location() {
        let local = resolve_local_time("2026-01-18T19:16:29Z", New_York).unwrap();
        let record = MetadataRecord::builder("Disney Photo Pass")
            .local_time(&local)
            .location(None)
            .build()
            .unwrap();
        assert!(!record.has_gps());
        assert_eq!(record.to_exif_tags().len(), 9);
    }

    #[test]
    fn test_partial_location_omits_gps() {
        let local = resolve_local_time("2026-01-18T19:16:29Z", New_York).unwrap();
        let park = ParkLocation {
            lat: Some(28.4177),
            lon: None,
        };
        let record = MetadataRecord::builder("Disney Photo Pass")
            .local_time(&local)
            .location(Some(&park))
            .build()
            .unwrap();
        assert!(!record.has_gps());
    }

    #[test]
    fn test_out_of_range_location_omits_gps() {
        let local = resolve_local_time("2026-01-18T19:16:29Z", New_York).unwrap();
        let park = ParkLocation {
            lat: Some(128.0),
            lon: Some(-81.5812),
        };
        let record = MetadataRecord::builder("Disney Photo Pass")
            .local_time(&local)
            .location(Some(&park))
            .build()
            .unwrap();
        assert!(!record.has_gps());
    }

    #[test]
    fn test_gps_tags_present() {
        let local = resolve_local_time("2026-01-18T19:16:29Z", New_York).unwrap();
        let park = magic_kingdom();
        let record = MetadataRecord::builder("Disney Photo Pass")
            .local_time(&local)
            .location(Some(&park))
            .build()
            .unwrap();
        let tags = record.to_exif_tags();
        assert_eq!(tags.len(), 15);
        assert!(
            tags.iter()
                .any(|t| matches!(t, ExifTag::GPSLatitudeRef(s) if s == "N"))
        );
        assert!(
            tags.iter()
                .any(|t| matches!(t, ExifTag::GPSLongitudeRef(s) if s == "W"))
        );
        assert!(
            tags.iter()
                .any(|t| matches!(t, ExifTag::GPSDateStamp(s) if s == "2026:01:18"))
        );
    }

    #[test]
    fn test_missing_time_is_rejected() {
        let result = MetadataRecord::builder("Disney Photo Pass").build();
        assert!(matches!(result, Err(Error::InvalidRecord(_))));
    }

    #[test]
    fn test_empty_attribution_is_rejected() {
        let local = resolve_local_time("2026-01-18T19:16:29Z", New_York).unwrap();
        let result = MetadataRecord::builder("  ").local_time(&local).build();
        assert!(matches!(result, Err(Error::InvalidRecord(_))));
    }

    #[test]
    fn test_validate_rejects_bad_offset() {
        let local = resolve_local_time("2026-01-18T19:16:29Z", New_York).unwrap();
        let mut record = MetadataRecord::builder("Disney Photo Pass")
            .local_time(&local)
            .build()
            .unwrap();
        record.timestamps.offset_time = "-0500".to_string();
        assert!(record.validate().is_err());
    }

    #[test]
    fn test_layout_checks() {
        assert!(is_exif_datetime("2026:01:18 14:16:29"));
        assert!(!is_exif_datetime("2026-01-18 14:16:29"));
        assert!(is_exif_date("2026:01:18"));
        assert!(!is_exif_date("2026:1:18"));
        assert!(is_exif_offset("+05:30"));
        assert!(is_exif_offset("-05:00"));
        assert!(!is_exif_offset("05:00"));
    }
}
