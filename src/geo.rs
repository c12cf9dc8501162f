//! Great-circle distance, unit conversion, and bounding boxes.
//!
//! Pure functions, deterministic, no I/O. Used by every other module that
//! needs a distance between two (lat, lon) points.

/// Earth radius in kilometers, used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Kilometers per mile (inverse of the commonly quoted 0.621371 mi/km).
pub const KM_PER_MILE: f64 = 1.0 / 0.621371;

/// Great-circle distance between two (lat, lon) points, in kilometers.
pub fn haversine_km(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lon1) = from;
    let (lat2, lon2) = to;

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Convert kilometers to miles.
pub fn km_to_miles(km: f64) -> f64 {
    km * 0.621371
}

/// Convert miles to kilometers.
pub fn miles_to_km(mi: f64) -> f64 {
    mi * KM_PER_MILE
}

/// A lat/lon bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// Bounding box covering a circle of `radius_km` around `(lat, lon)`.
    ///
    /// Latitude delta is `radius_km / 111.0` degrees. Longitude delta
    /// additionally accounts for the shrinking of a degree of longitude
    /// away from the equator; guards against `lat == 0` by falling back to
    /// the latitude delta.
    pub fn around(lat: f64, lon: f64, radius_km: f64) -> Self {
        let lat_delta = radius_km / 111.0;
        let lon_delta = if lat.abs() > f64::EPSILON {
            radius_km / (111.0 * lat.to_radians().cos().abs())
        } else {
            lat_delta
        };

        Self {
            min_lat: lat - lat_delta,
            max_lat: lat + lat_delta,
            min_lon: lon - lon_delta,
            max_lon: lon + lon_delta,
        }
    }

    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_point_is_zero() {
        let d = haversine_km((30.5, -97.5), (30.5, -97.5));
        assert!(d < 1e-9);
    }

    #[test]
    fn symmetric() {
        let a = (30.5427, -97.5467);
        let b = (30.5127, -97.6780);
        assert!((haversine_km(a, b) - haversine_km(b, a)).abs() < 1e-9);
    }

    #[test]
    fn known_distance_austin_to_dallas() {
        // Austin to Dallas is roughly 310 km.
        let d = haversine_km((30.2672, -97.7431), (32.7767, -96.7970));
        assert!(d > 280.0 && d < 340.0, "got {d}");
    }

    #[test]
    fn km_mi_round_trip() {
        for km in [0.0, 1.0, 10.0, 123.456, 9999.0] {
            let mi = km_to_miles(km);
            let back = miles_to_km(mi);
            assert!((back - km).abs() < 1e-4, "km={km} back={back}");
        }
    }

    #[test]
    fn bounding_box_contains_center() {
        let bb = BoundingBox::around(30.5, -97.5, 10.0);
        assert!(bb.contains(30.5, -97.5));
        assert!(!bb.contains(40.0, -97.5));
    }

    #[test]
    fn bounding_box_handles_equator() {
        let bb = BoundingBox::around(0.0, 0.0, 10.0);
        assert!(bb.max_lon > bb.min_lon);
        assert!(bb.contains(0.0, 0.0));
    }
}
