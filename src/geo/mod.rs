//! Geographic helpers: great-circle distance, nearest sensitive area and
//! ward-boundary membership.
//!
//! Coordinates are `(latitude, longitude)` pairs in degrees, matching the
//! order used by the seed data and the frontend map.

use crate::models::SensitiveArea;

/// Mean earth radius used by the Haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two points in kilometers.
pub fn haversine_km(a: (f64, f64), b: (f64, f64)) -> f64 {
    let (lat1, lng1) = (a.0.to_radians(), a.1.to_radians());
    let (lat2, lng2) = (b.0.to_radians(), b.1.to_radians());
    let dlat = lat2 - lat1;
    let dlng = lng2 - lng1;

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Nearest sensitive area to a point.
#[derive(Debug, Clone, PartialEq)]
pub struct Proximity<'a> {
    pub area: &'a SensitiveArea,
    pub distance_m: f64,
    pub is_near: bool,
}

/// Find the nearest area and whether it lies within `radius_m`.
///
/// Returns `None` when `areas` is empty.
pub fn nearest_within<'a>(
    point: (f64, f64),
    areas: &'a [SensitiveArea],
    radius_m: f64,
) -> Option<Proximity<'a>> {
    areas
        .iter()
        .map(|area| {
            let distance_m = haversine_km(point, (area.latitude, area.longitude)) * 1000.0;
            (area, distance_m)
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(area, distance_m)| Proximity {
            area,
            distance_m,
            is_near: distance_m <= radius_m,
        })
}

/// Ray casting point-in-polygon test.
///
/// Longitude is the x axis and latitude the y axis. The polygon may or may
/// not repeat its first vertex at the end.
pub fn point_in_polygon(point: (f64, f64), polygon: &[[f64; 2]]) -> bool {
    if polygon.len() < 3 {
        return false;
    }

    let (y, x) = point;
    let mut inside = false;
    let mut j = polygon.len() - 1;

    for i in 0..polygon.len() {
        let (yi, xi) = (polygon[i][0], polygon[i][1]);
        let (yj, xj) = (polygon[j][0], polygon[j][1]);

        let crosses = (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi;
        if crosses {
            inside = !inside;
        }
        j = i;
    }

    inside
}

/// Check that a coordinate pair is a finite, in-range position.
pub fn is_valid_coordinate(latitude: f64, longitude: f64) -> bool {
    latitude.is_finite()
        && longitude.is_finite()
        && (-90.0..=90.0).contains(&latitude)
        && (-180.0..=180.0).contains(&longitude)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::seed;
    use crate::models::SensitiveAreaType;

    fn area(id: &str, lat: f64, lng: f64) -> SensitiveArea {
        SensitiveArea {
            id: id.into(),
            area_type: SensitiveAreaType::School,
            name: id.into(),
            latitude: lat,
            longitude: lng,
            ward: "Rohini".into(),
            ward_no: 8,
        }
    }

    #[test]
    fn test_haversine_zero_and_known_distance() {
        assert_eq!(haversine_km((28.7, 77.1), (28.7, 77.1)), 0.0);
        // One degree of latitude is roughly 111.19 km on a 6371 km sphere.
        let d = haversine_km((28.0, 77.0), (29.0, 77.0));
        assert!((d - 111.19).abs() < 0.05, "got {}", d);
    }

    #[test]
    fn test_nearest_within_picks_closest() {
        let areas = vec![area("far", 28.80, 77.10), area("near", 28.7045, 77.1030)];
        let found = nearest_within((28.7041, 77.1025), &areas, 750.0).unwrap();
        assert_eq!(found.area.id, "near");
        assert!(found.is_near);
        assert!(found.distance_m < 100.0);
    }

    #[test]
    fn test_nearest_within_outside_radius() {
        let areas = vec![area("a", 28.72, 77.12)];
        let found = nearest_within((28.7041, 77.1025), &areas, 750.0).unwrap();
        assert!(!found.is_near);
        assert!(nearest_within((28.7, 77.1), &[], 750.0).is_none());
    }

    #[test]
    fn test_point_in_rohini_boundary() {
        let rohini = seed::ward_boundary(8).unwrap();
        // Rohini Sector 3 Market hotspot
        assert!(point_in_polygon((28.7041, 77.1025), rohini));
        // Dwarka ward center
        assert!(!point_in_polygon((28.5921, 77.0460), rohini));
    }

    #[test]
    fn test_point_in_square() {
        let square = [[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0]];
        assert!(point_in_polygon((0.5, 0.5), &square));
        assert!(!point_in_polygon((1.5, 0.5), &square));
        assert!(!point_in_polygon((0.5, 0.5), &square[..2]));
    }

    #[test]
    fn test_coordinate_validation() {
        assert!(is_valid_coordinate(28.7, 77.1));
        assert!(!is_valid_coordinate(91.0, 77.1));
        assert!(!is_valid_coordinate(f64::NAN, 77.1));
    }
}
