use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::{PvError, Result};

/// Accepted wall-clock layouts, tried in order. `%.f` also matches an absent fraction.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
];

/// Parse a naive calendar date-time.
///
/// Offset-qualified RFC 3339 strings are accepted and reduced to their local
/// wall-clock time; a bare date means midnight.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime> {
    let trimmed = raw.trim();

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(dt);
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.naive_local());
    }

    if let Some(dt) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(dt);
    }

    Err(PvError::InvalidTimestamp(format!(
        "cannot parse '{}' as a calendar date-time",
        raw
    )))
}

/// One telemetry observation from a panel.
///
/// Values are taken as reported; range checks belong to the rule layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    pub timestamp: NaiveDateTime,
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub power_mw: f64,
}

impl RawSample {
    pub fn new(timestamp: NaiveDateTime, temperature_c: f64, humidity_pct: f64, power_mw: f64) -> Self {
        Self {
            timestamp,
            temperature_c,
            humidity_pct,
            power_mw,
        }
    }

    /// Build a sample from a transport-level timestamp string.
    pub fn parse(timestamp: &str, temperature_c: f64, humidity_pct: f64, power_mw: f64) -> Result<Self> {
        Ok(Self::new(
            parse_timestamp(timestamp)?,
            temperature_c,
            humidity_pct,
            power_mw,
        ))
    }

    pub fn power_w(&self) -> f64 {
        self.power_mw / 1000.0
    }

    pub fn hour(&self) -> u32 {
        self.timestamp.hour()
    }

    /// Whole seconds elapsed since local midnight; sub-second precision is dropped.
    pub fn seconds_since_midnight(&self) -> u32 {
        let t = self.timestamp.time();
        t.hour() * 3600 + t.minute() * 60 + t.second()
    }
}

/// Final verdict for one sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionResult {
    pub is_anomaly: bool,
    /// Raw scorer output; more negative means more anomalous.
    pub anomaly_score: f64,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_space_separated() {
        let dt = parse_timestamp("2024-12-01 12:00:00").unwrap();
        assert_eq!(dt.to_string(), "2024-12-01 12:00:00");
    }

    #[test]
    fn parses_iso_t_and_fraction() {
        let dt = parse_timestamp("2024-12-01T06:30:15.750").unwrap();
        assert_eq!(dt.hour(), 6);
        assert_eq!(dt.minute(), 30);
        assert_eq!(dt.second(), 15);
    }

    #[test]
    fn parses_offset_as_local_wall_clock() {
        let dt = parse_timestamp("2024-12-01T23:10:00+02:00").unwrap();
        assert_eq!(dt.hour(), 23);
    }

    #[test]
    fn bare_date_is_midnight() {
        let dt = parse_timestamp("2024-12-01").unwrap();
        assert_eq!(dt.hour(), 0);
        assert_eq!(dt.minute(), 0);
    }

    #[test]
    fn rejects_garbage() {
        let err = parse_timestamp("yesterday at noon").unwrap_err();
        assert!(matches!(err, PvError::InvalidTimestamp(_)));
    }

    #[test]
    fn rejects_impossible_date() {
        assert!(parse_timestamp("2024-02-30 10:00:00").is_err());
        assert!(parse_timestamp("2024-12-01 25:00:00").is_err());
    }

    #[test]
    fn seconds_since_midnight_drops_fraction() {
        let s = RawSample::parse("2024-12-01 01:02:03.999", 20.0, 50.0, 0.0).unwrap();
        assert_eq!(s.seconds_since_midnight(), 3723);
    }

    #[test]
    fn power_in_watts() {
        let s = RawSample::parse("2024-12-01 12:00:00", 20.0, 50.0, 500.0).unwrap();
        assert!((s.power_w() - 0.5).abs() < 1e-12);
        assert_eq!(s.hour(), 12);
    }
}
