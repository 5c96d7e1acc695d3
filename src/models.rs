use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The only error the buffer surfaces to its caller. Terminal: once raised,
/// the outer controller must treat safe RTL as unavailable, though the
/// stored trail stays readable for a best-effort flyback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("return buffer exhausted: no compaction strategy can free enough slots")]
    OutOfMemory,
}

/// Flight-log parsing failures.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed flight log XML: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("flight log contains no usable GPS fixes")]
    NoFixes,
    #[error("flight log too large: {0} bytes")]
    TooLarge(usize),
}

/// One GPS fix from a flight log, WGS-84 degrees plus elevation in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlightSample {
    pub lat: f64,
    pub lon: f64,
    pub ele_m: f64,
    pub time: Option<DateTime<Utc>>,
}

/// A parsed flight log: ordered fixes, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedFlightLog {
    pub name: Option<String>,
    pub samples: Vec<FlightSample>,
}

impl ParsedFlightLog {
    /// Wall-clock span of the log, when timestamps are present.
    pub fn duration_seconds(&self) -> Option<i64> {
        let mut times = self
            .samples
            .iter()
            .filter_map(|s| s.time)
            .collect::<Vec<_>>();
        if times.len() < 2 {
            return None;
        }
        times.sort();
        Some((*times.last()? - *times.first()?).num_seconds())
    }
}
