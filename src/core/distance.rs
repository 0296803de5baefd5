use crate::models::{BoundingBox, Coordinate};

/// Earth's mean radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Calculate the Haversine distance between two points in kilometers
///
/// # Arguments
/// * `lat1` - Latitude of first point in degrees
/// * `lon1` - Longitude of first point in degrees
/// * `lat2` - Latitude of second point in degrees
/// * `lon2` - Longitude of second point in degrees
///
/// # Returns
/// Distance in kilometers, never negative
#[inline]
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let hav = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);

    // Rounding can push hav a hair outside [0, 1] for identical or antipodal points
    let root = hav.clamp(0.0, 1.0).sqrt();
    let c = 2.0 * root.clamp(-1.0, 1.0).asin();

    EARTH_RADIUS_KM * c
}

/// Great-circle distance between two coordinates in kilometers
#[inline]
pub fn distance_km(a: &Coordinate, b: &Coordinate) -> f64 {
    haversine_distance(a.latitude(), a.longitude(), b.latitude(), b.longitude())
}

/// Calculate a bounding box around a center point
///
/// Much cheaper than Haversine, so the store uses it as a coarse pre-filter.
/// The longitude span uses the exact great-circle extent
/// `asin(sin(d) / cos(lat))`, so no point within the radius falls outside.
/// Exact filtering happens afterwards with [`distance_km`].
pub fn calculate_bounding_box(origin: &Coordinate, radius_km: f64) -> BoundingBox {
    // Pad by 1% so points exactly on the radius survive the coarse stage
    let angular = (radius_km.max(0.0) * 1.01) / EARTH_RADIUS_KM;
    let lat = origin.latitude();
    let lon = origin.longitude();

    // Work in degrees around the origin so a zero radius keeps the origin inside
    let lat_delta = angular.to_degrees();
    let min_lat = lat - lat_delta;
    let max_lat = lat + lat_delta;

    // A pole inside the circle means every longitude is reachable
    if min_lat <= -90.0 || max_lat >= 90.0 {
        return BoundingBox {
            min_lat: min_lat.max(-90.0),
            max_lat: max_lat.min(90.0),
            min_lon: -180.0,
            max_lon: 180.0,
        };
    }

    let lon_delta = (angular.sin() / lat.to_radians().cos())
        .clamp(-1.0, 1.0)
        .asin()
        .to_degrees();
    let min_lon = lon - lon_delta;
    let max_lon = lon + lon_delta;

    // Crossing the antimeridian: fall back to the full longitude range
    let (min_lon, max_lon) = if min_lon < -180.0 || max_lon > 180.0 {
        (-180.0, 180.0)
    } else {
        (min_lon, max_lon)
    };

    BoundingBox {
        min_lat,
        max_lat,
        min_lon,
        max_lon,
    }
}

/// Check if a point is within a bounding box
#[inline]
pub fn is_within_bounding_box(point: &Coordinate, bbox: &BoundingBox) -> bool {
    point.latitude() >= bbox.min_lat
        && point.latitude() <= bbox.max_lat
        && point.longitude() >= bbox.min_lon
        && point.longitude() <= bbox.max_lon
}
