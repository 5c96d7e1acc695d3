//! Flight-log collaborators: everything between a recorded flight and the
//! local-frame points the buffer consumes, and back again.

pub mod geodetic;
pub mod gpx_export;
pub mod gpx_parser;

pub use geodetic::{haversine_distance, LocalTangentPlane, EARTH_RADIUS_M};
pub use gpx_export::{flyback_to_geojson, flyback_to_gpx};
pub use gpx_parser::{parse_gpx, parse_gpx_time};
