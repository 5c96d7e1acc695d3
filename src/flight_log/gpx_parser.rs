// GPX flight-log parser for breadcrumb
// A flight log is track points only: lat/lon attributes, <ele>, <time>

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{debug, warn};

use crate::models::{FlightSample, ParseError, ParsedFlightLog};

/// Largest flight log the parser accepts, bytes.
pub static MAX_LOG_SIZE: Lazy<usize> = Lazy::new(|| {
    std::env::var("BREADCRUMB_MAX_LOG_BYTES")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(50 * 1024 * 1024)
});

/// Parses a GPX flight log, returns the ordered GPS fixes.
///
/// Fixes without an `<ele>` default to 0 m elevation; fixes without a
/// parseable `<time>` carry none. Returns `ParseError::NoFixes` when the
/// document holds no track point with both coordinates.
pub fn parse_gpx(bytes: &[u8]) -> Result<ParsedFlightLog, ParseError> {
    if bytes.len() > *MAX_LOG_SIZE {
        return Err(ParseError::TooLarge(bytes.len()));
    }
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    let mut samples = Vec::new();
    let mut name: Option<String> = None;

    // State for the track point currently being assembled
    let mut in_trkpt = false;
    let mut lat: Option<f64> = None;
    let mut lon: Option<f64> = None;
    let mut ele: Option<f64> = None;
    let mut time: Option<DateTime<Utc>> = None;
    let mut text_target: Option<&'static str> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                let tag = tag.split(':').next_back().unwrap_or(&tag).to_string();
                match tag.as_str() {
                    "trkpt" => {
                        in_trkpt = true;
                        lat = attr_f64(e, b"lat");
                        lon = attr_f64(e, b"lon");
                        ele = None;
                        time = None;
                    }
                    "ele" if in_trkpt => text_target = Some("ele"),
                    "time" if in_trkpt => text_target = Some("time"),
                    "name" if name.is_none() && samples.is_empty() => text_target = Some("name"),
                    _ => {}
                }
            }
            Ok(Event::Text(ref t)) => {
                if let Some(target) = text_target.take() {
                    let text = String::from_utf8_lossy(t.as_ref()).to_string();
                    match target {
                        "ele" => ele = text.parse::<f64>().ok(),
                        "time" => time = parse_gpx_time(&text),
                        "name" => name = Some(text),
                        _ => {}
                    }
                }
            }
            Ok(Event::Empty(ref e)) => {
                // Self-closing <trkpt lat=".." lon=".."/> carries no children.
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if tag.split(':').next_back().unwrap_or(&tag) == "trkpt" {
                    if let (Some(lat), Some(lon)) = (attr_f64(e, b"lat"), attr_f64(e, b"lon")) {
                        samples.push(FlightSample {
                            lat,
                            lon,
                            ele_m: 0.0,
                            time: None,
                        });
                    }
                }
            }
            Ok(Event::End(ref e)) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if tag.split(':').next_back().unwrap_or(&tag) == "trkpt" {
                    in_trkpt = false;
                    if let (Some(lat), Some(lon)) = (lat, lon) {
                        samples.push(FlightSample {
                            lat,
                            lon,
                            ele_m: ele.unwrap_or(0.0),
                            time,
                        });
                    } else {
                        warn!("skipping track point without coordinates");
                    }
                }
                text_target = None;
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ParseError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    if samples.is_empty() {
        return Err(ParseError::NoFixes);
    }
    debug!(fixes = samples.len(), name = ?name, "parsed flight log");
    Ok(ParsedFlightLog { name, samples })
}

fn attr_f64(e: &quick_xml::events::BytesStart<'_>, key: &[u8]) -> Option<f64> {
    e.attributes().find_map(|a| {
        a.ok().and_then(|attr| {
            if attr.key.as_ref() == key {
                std::str::from_utf8(&attr.value).ok()?.parse::<f64>().ok()
            } else {
                None
            }
        })
    })
}

/// Try to parse a GPX `<time>` string with multiple formats.
pub fn parse_gpx_time(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    let formats = [
        "%Y-%m-%dT%H:%M:%S%.fZ", // 2023-05-22T17:56:42.123Z
        "%Y-%m-%dT%H:%M:%S",     // 2023-05-22T17:56:42
    ];
    for fmt in formats.iter() {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&dt));
        }
    }
    warn!("Failed to parse GPX <time>: {}", s);
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_log() {
        let gpx = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test">
  <trk><name>Survey flight</name><trkseg>
    <trkpt lat="55.0" lon="37.0"><ele>120.0</ele></trkpt>
    <trkpt lat="55.001" lon="37.0"><ele>135.5</ele></trkpt>
  </trkseg></trk>
</gpx>"#;
        let log = parse_gpx(gpx.as_bytes()).unwrap();
        assert_eq!(log.name.as_deref(), Some("Survey flight"));
        assert_eq!(log.samples.len(), 2);
        assert_eq!(log.samples[0].lat, 55.0);
        assert_eq!(log.samples[1].ele_m, 135.5);
        assert!(log.samples[0].time.is_none());
    }

    #[test]
    fn test_parse_log_with_time() {
        let gpx = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test">
  <trk><trkseg>
    <trkpt lat="55.0" lon="37.0"><ele>100</ele><time>2025-06-01T10:00:00Z</time></trkpt>
    <trkpt lat="55.001" lon="37.0"><ele>110</ele><time>2025-06-01T10:00:30Z</time></trkpt>
  </trkseg></trk>
</gpx>"#;
        let log = parse_gpx(gpx.as_bytes()).unwrap();
        assert!(log.samples.iter().all(|s| s.time.is_some()));
        assert_eq!(log.duration_seconds(), Some(30));
    }

    #[test]
    fn test_missing_elevation_defaults_to_zero() {
        let gpx = r#"<gpx><trk><trkseg>
    <trkpt lat="55.0" lon="37.0"></trkpt>
  </trkseg></trk></gpx>"#;
        let log = parse_gpx(gpx.as_bytes()).unwrap();
        assert_eq!(log.samples[0].ele_m, 0.0);
    }

    #[test]
    fn test_empty_document_is_an_error() {
        let gpx = r#"<gpx><trk><trkseg></trkseg></trk></gpx>"#;
        assert!(matches!(
            parse_gpx(gpx.as_bytes()),
            Err(ParseError::NoFixes)
        ));
    }

    #[test]
    fn test_namespaced_tags() {
        let gpx = r#"<gpx:gpx xmlns:gpx="http://www.topografix.com/GPX/1/1"><gpx:trk><gpx:trkseg>
    <gpx:trkpt lat="55.0" lon="37.0"><gpx:ele>42.0</gpx:ele></gpx:trkpt>
  </gpx:trkseg></gpx:trk></gpx:gpx>"#;
        let log = parse_gpx(gpx.as_bytes()).unwrap();
        assert_eq!(log.samples[0].ele_m, 42.0);
    }

    #[test]
    fn test_parse_gpx_time_formats() {
        let dt = parse_gpx_time("2023-05-22T17:56:42Z").unwrap();
        assert_eq!(dt.timestamp(), 1684778202);
        let dt2 = parse_gpx_time("2023-05-22T17:56:42.123Z").unwrap();
        assert_eq!(dt2.timestamp(), 1684778202);
        assert!(parse_gpx_time("not-a-date").is_none());
    }
}
