//! Decimal coordinate to EXIF degrees/minutes/seconds conversion

use little_exif::rational::uR64;

/// Denominator used for the seconds component of a DMS triple
pub const SECONDS_DENOMINATOR: u32 = 10_000;

/// Unsigned EXIF rational (numerator / denominator)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rational {
    pub numerator: u32,
    pub denominator: u32,
}

impl Rational {
    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Rational with denominator 1
    pub const fn whole(value: u32) -> Self {
        Self::new(value, 1)
    }

    pub fn to_f64(self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }
}

impl From<Rational> for uR64 {
    fn from(value: Rational) -> Self {
        uR64 {
            nominator: value.numerator,
            denominator: value.denominator,
        }
    }
}

/// Hemisphere reference labels for one axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hemispheres {
    pub positive: &'static str,
    pub negative: &'static str,
}

impl Hemispheres {
    pub const LATITUDE: Self = Self {
        positive: "N",
        negative: "S",
    };
    pub const LONGITUDE: Self = Self {
        positive: "E",
        negative: "W",
    };
}

/// A coordinate in EXIF form: degrees, minutes, seconds plus hemisphere
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DmsCoordinate {
    pub dms: [Rational; 3],
    pub reference: &'static str,
}

impl DmsCoordinate {
    /// Unsigned decimal degrees represented by the triple
    pub fn to_decimal(&self) -> f64 {
        self.dms[0].to_f64() + self.dms[1].to_f64() / 60.0 + self.dms[2].to_f64() / 3600.0
    }

    pub fn to_exif(&self) -> Vec<uR64> {
        self.dms.iter().copied().map(uR64::from).collect()
    }
}

/// Whether `lat`/`lon` are finite and within ±90/±180 degrees
pub fn is_valid_position(lat: f64, lon: f64) -> bool {
    lat.is_finite() && lon.is_finite() && lat.abs() <= 90.0 && lon.abs() <= 180.0
}

/// Convert a signed decimal coordinate to a DMS triple.
///
/// Degrees and minutes are truncated to integers; seconds keep four
/// decimal places as `round(seconds * 10000) / 10000`.
pub fn to_dms(value: f64, hemispheres: Hemispheres) -> DmsCoordinate {
    let reference = if value < 0.0 {
        hemispheres.negative
    } else {
        hemispheres.positive
    };

    let abs_value = value.abs();
    let degrees = abs_value.trunc();
    let minutes_float = (abs_value - degrees) * 60.0;
    let minutes = minutes_float.trunc();
    let seconds_float = (minutes_float - minutes) * 60.0;
    let seconds = (seconds_float * SECONDS_DENOMINATOR as f64).round() as u32;

    DmsCoordinate {
        dms: [
            Rational::whole(degrees as u32),
            Rational::whole(minutes as u32),
            Rational::new(seconds, SECONDS_DENOMINATOR),
        ],
        reference,
    }
}
