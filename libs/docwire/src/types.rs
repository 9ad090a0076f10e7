use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::{Error, Result};

// ════════════════════════════════════════════════════════════════
//  Timestamp
// ════════════════════════════════════════════════════════════════

/// Seconds of 0001-01-01T00:00:00Z relative to the Unix epoch.
const MIN_SECONDS: i64 = -62_135_596_800;
/// Seconds of 9999-12-31T23:59:59Z relative to the Unix epoch.
const MAX_SECONDS: i64 = 253_402_300_799;
const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// A point in time, always UTC, with nanosecond precision.
///
/// Covers 0001-01-01T00:00:00Z through 9999-12-31T23:59:59.999999999Z, the
/// range the document store accepts. Defaults to the Unix epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    seconds: i64,
    nanos: i32,
}

impl Timestamp {
    pub const UNIX_EPOCH: Timestamp = Timestamp {
        seconds: 0,
        nanos: 0,
    };

    pub fn new(seconds: i64, nanos: i32) -> Result<Self> {
        if !(0..NANOS_PER_SECOND as i32).contains(&nanos) {
            return Err(Error::invalid(format!(
                "timestamp nanos {nanos} outside [0, 999999999]"
            )));
        }
        if !(MIN_SECONDS..=MAX_SECONDS).contains(&seconds) {
            return Err(Error::invalid(format!(
                "timestamp seconds {seconds} outside 0001-01-01..=9999-12-31"
            )));
        }
        Ok(Self { seconds, nanos })
    }

    pub fn seconds(&self) -> i64 {
        self.seconds
    }

    pub fn nanos(&self) -> i32 {
        self.nanos
    }

    pub fn now() -> Self {
        // The clock is always inside the supported range.
        Self::from_system_time(SystemTime::now()).unwrap_or(Self::UNIX_EPOCH)
    }

    pub fn from_system_time(time: SystemTime) -> Result<Self> {
        match time.duration_since(UNIX_EPOCH) {
            Ok(after) => Self::new(
                i64::try_from(after.as_secs())
                    .map_err(|_| Error::invalid("system time beyond 9999-12-31"))?,
                after.subsec_nanos() as i32,
            ),
            Err(before) => {
                let before = before.duration();
                let mut seconds = -i64::try_from(before.as_secs())
                    .map_err(|_| Error::invalid("system time before 0001-01-01"))?;
                let mut nanos = before.subsec_nanos() as i32;
                if nanos > 0 {
                    seconds -= 1;
                    nanos = NANOS_PER_SECOND as i32 - nanos;
                }
                Self::new(seconds, nanos)
            }
        }
    }

    pub fn to_datetime(&self) -> DateTime<Utc> {
        // Every valid Timestamp lies well inside chrono's range.
        DateTime::<Utc>::from_timestamp(self.seconds, self.nanos as u32).unwrap_or_default()
    }

    /// RFC 3339 rendering in UTC, e.g. `2017-10-06T01:02:03.000000099Z`.
    pub fn to_rfc3339(&self) -> String {
        self.to_datetime().to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }

    pub fn parse_rfc3339(s: &str) -> Result<Self> {
        let parsed = DateTime::parse_from_rfc3339(s)
            .map_err(|e| Error::invalid(format!("timestamp '{s}': {e}")))?;
        Self::try_from(parsed.with_timezone(&Utc))
    }
}

impl TryFrom<DateTime<Utc>> for Timestamp {
    type Error = Error;

    fn try_from(dt: DateTime<Utc>) -> Result<Self> {
        let nanos = dt.timestamp_subsec_nanos();
        if nanos >= NANOS_PER_SECOND as u32 {
            return Err(Error::invalid(format!("leap second {dt} has no timestamp form")));
        }
        Self::new(dt.timestamp(), nanos as i32)
    }
}

impl From<Timestamp> for DateTime<Utc> {
    fn from(ts: Timestamp) -> Self {
        ts.to_datetime()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

// ════════════════════════════════════════════════════════════════
//  GeoPoint
// ════════════════════════════════════════════════════════════════

/// Latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(Error::invalid(format!(
                "latitude {latitude} outside [-90, 90]"
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(Error::invalid(format!(
                "longitude {longitude} outside [-180, 180]"
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

// ════════════════════════════════════════════════════════════════
//  Blob / DocumentReference
// ════════════════════════════════════════════════════════════════

/// Opaque byte sequence.
///
/// A plain `Vec<u8>` serializes as an array of integers; wrap it in `Blob`
/// to get a bytes value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Blob(pub Vec<u8>);

impl Blob {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for Blob {
    fn from(bytes: Vec<u8>) -> Self {
        Blob(bytes)
    }
}

impl From<&[u8]> for Blob {
    fn from(bytes: &[u8]) -> Self {
        Blob(bytes.to_vec())
    }
}

/// Pointer to another document. The path is carried verbatim; this crate
/// never resolves or validates it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentReference {
    path: String,
}

impl DocumentReference {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for DocumentReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}
