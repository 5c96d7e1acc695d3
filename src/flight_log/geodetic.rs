// Geodetic utilities for breadcrumb
// Converts WGS-84 fixes into the local tangent frame the buffer works in

use crate::path_buffer::geometry::Point3;

/// Mean Earth radius, meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Calculates the distance between two points (lat, lon) in meters using the haversine formula
pub fn haversine_distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    let (lat1, lon1) = a;
    let (lat2, lon2) = b;
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let lat1 = lat1.to_radians();
    let lat2 = lat2.to_radians();
    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

/// A local tangent frame centered on the launch fix.
///
/// Uses the equirectangular small-area approximation: at flight scale
/// (kilometers) the error against a full geodetic solution is far below the
/// buffer's position_delta, and the conversion is a pair of multiplies per
/// fix.
#[derive(Debug, Clone, Copy)]
pub struct LocalTangentPlane {
    origin_lat: f64,
    origin_lon: f64,
    origin_ele_m: f64,
    cos_origin_lat: f64,
}

impl LocalTangentPlane {
    /// Center the frame on the launch fix.
    pub fn new(origin_lat: f64, origin_lon: f64, origin_ele_m: f64) -> Self {
        LocalTangentPlane {
            origin_lat,
            origin_lon,
            origin_ele_m,
            cos_origin_lat: origin_lat.to_radians().cos(),
        }
    }

    /// WGS-84 fix to local frame: north, east, altitude-above-launch meters.
    pub fn to_local(&self, lat: f64, lon: f64, ele_m: f64) -> Point3 {
        let north = (lat - self.origin_lat).to_radians() * EARTH_RADIUS_M;
        let east = (lon - self.origin_lon).to_radians() * EARTH_RADIUS_M * self.cos_origin_lat;
        Point3::new(north, east, ele_m - self.origin_ele_m)
    }

    /// Local frame back to a WGS-84 fix `(lat, lon, ele_m)`.
    pub fn to_geodetic(&self, p: &Point3) -> (f64, f64, f64) {
        let lat = self.origin_lat + (p.x / EARTH_RADIUS_M).to_degrees();
        let lon = self.origin_lon + (p.y / (EARTH_RADIUS_M * self.cos_origin_lat)).to_degrees();
        (lat, lon, p.z + self.origin_ele_m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_haversine_distance_zero() {
        let a = (55.0, 37.0);
        let b = (55.0, 37.0);
        assert_approx_eq!(haversine_distance(a, b), 0.0, 1e-6);
    }

    #[test]
    fn test_haversine_distance_known() {
        let a = (55.0, 37.0);
        let b = (55.1, 37.0);
        let d = haversine_distance(a, b);
        assert!((d - 11119.5).abs() < 100.0); // ~11.1km
    }

    #[test]
    fn test_origin_maps_to_origin() {
        let frame = LocalTangentPlane::new(55.0, 37.0, 120.0);
        let p = frame.to_local(55.0, 37.0, 120.0);
        assert_approx_eq!(p.x, 0.0, 1e-9);
        assert_approx_eq!(p.y, 0.0, 1e-9);
        assert_approx_eq!(p.z, 0.0, 1e-9);
    }

    #[test]
    fn test_north_displacement_matches_haversine() {
        let frame = LocalTangentPlane::new(55.0, 37.0, 0.0);
        let p = frame.to_local(55.01, 37.0, 0.0);
        let expected = haversine_distance((55.0, 37.0), (55.01, 37.0));
        assert!((p.x - expected).abs() < 1.0);
        assert_approx_eq!(p.y, 0.0, 1e-9);
    }

    #[test]
    fn test_east_displacement_shrinks_with_latitude() {
        let equator = LocalTangentPlane::new(0.0, 37.0, 0.0);
        let north = LocalTangentPlane::new(60.0, 37.0, 0.0);
        let at_equator = equator.to_local(0.0, 37.01, 0.0);
        let at_60 = north.to_local(60.0, 37.01, 0.0);
        // cos(60 deg) = 0.5: the same longitude step is half the meters.
        assert_approx_eq!(at_60.y / at_equator.y, 0.5, 1e-6);
    }

    #[test]
    fn test_round_trip() {
        let frame = LocalTangentPlane::new(55.0, 37.0, 150.0);
        let p = frame.to_local(55.013, 36.981, 212.5);
        let (lat, lon, ele) = frame.to_geodetic(&p);
        assert_approx_eq!(lat, 55.013, 1e-9);
        assert_approx_eq!(lon, 36.981, 1e-9);
        assert_approx_eq!(ele, 212.5, 1e-9);
    }
}
