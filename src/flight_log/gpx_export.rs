// Renders a flyback path back to GPX so external tools can visualize the
// hypothetical return trajectory.

use chrono::Utc;

use crate::flight_log::geodetic::LocalTangentPlane;
use crate::path_buffer::geometry::Point3;

/// Generate GPX XML for a path expressed in the local tangent frame.
///
/// Each point is mapped back to WGS-84 through `frame` (the same frame the
/// fixes were ingested with), so the output overlays the source log in any
/// GPX viewer.
pub fn flyback_to_gpx(points: &[Point3], frame: &LocalTangentPlane, name: &str) -> String {
    let created_at = Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
    let name = xml_escape(name);

    let mut track_points = String::new();
    for p in points {
        let (lat, lon, ele) = frame.to_geodetic(p);
        track_points.push_str(&format!(
            "      <trkpt lat=\"{lat:.7}\" lon=\"{lon:.7}\"><ele>{ele:.2}</ele></trkpt>\n"
        ));
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="breadcrumb"
     xmlns="http://www.topografix.com/GPX/1/1"
     xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
     xsi:schemaLocation="http://www.topografix.com/GPX/1/1 http://www.topografix.com/GPX/1/1/gpx.xsd">
  <metadata>
    <name>{name}</name>
    <time>{created_at}</time>
  </metadata>
  <trk>
    <name>{name}</name>
    <trkseg>
{track_points}    </trkseg>
  </trk>
</gpx>"#
    )
}

/// GeoJSON LineString of a local-frame path, `[lon, lat, ele]` coordinate
/// order per the GeoJSON spec.
pub fn flyback_to_geojson(points: &[Point3], frame: &LocalTangentPlane) -> serde_json::Value {
    let coordinates: Vec<serde_json::Value> = points
        .iter()
        .map(|p| {
            let (lat, lon, ele) = frame.to_geodetic(p);
            serde_json::json!([lon, lat, ele])
        })
        .collect();
    serde_json::json!({
        "type": "LineString",
        "coordinates": coordinates,
    })
}

fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
