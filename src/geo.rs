use crate::types::LatLon;

/// Mean Earth radius used for all great-circle distances.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in km between two points (haversine on a sphere).
pub fn haversine_km(a: LatLon, b: LatLon) -> f64 {
    let (lat1, lon1) = (a.lat.to_radians(), a.lon.to_radians());
    let (lat2, lon2) = (b.lat.to_radians(), b.lon.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    // Rounding can push near-antipodal pairs just above 1.
    let h = ((dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2))
        .min(1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Even-odd ray-casting test of `(x, y)` = `(lon, lat)` against a closed ring.
///
/// Edges are walked between consecutive vertices only, so the ring must repeat
/// its first vertex at the end. Membership of points exactly on an edge or
/// vertex is not defined.
pub fn point_in_ring(x: f64, y: f64, ring: &[[f64; 2]]) -> bool {
    let mut inside = false;
    for edge in ring.windows(2) {
        let [x1, y1] = edge[0];
        let [x2, y2] = edge[1];
        if y1.min(y2) < y && y <= y1.max(y2) {
            let x_cross = if x1 == x2 { x1 } else { (y - y1) * (x2 - x1) / (y2 - y1) + x1 };
            if x <= x_cross {
                inside = !inside;
            }
        }
    }
    inside
}

/// Round half away from zero to `decimals` places.
pub fn round_to(x: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (x * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    const SQUARE: [[f64; 2]; 5] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]];

    #[test]
    fn coincident_points_are_zero_apart() {
        let p = LatLon::new(46.0, 8.9);
        assert_eq!(haversine_km(p, p), 0.0);
    }

    #[test]
    fn zurich_to_bern_is_about_95_km() {
        let d = haversine_km(LatLon::new(47.3769, 8.5417), LatLon::new(46.9480, 7.4474));
        assert!(d > 90.0 && d < 100.0, "got {d}");
    }

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let d = haversine_km(LatLon::new(0.0, 0.0), LatLon::new(1.0, 0.0));
        assert!((d - 111.19).abs() < 0.01, "got {d}");
    }

    #[test]
    fn centre_of_square_is_inside() {
        assert!(point_in_ring(0.5, 0.5, &SQUARE));
    }

    #[test]
    fn far_point_is_outside() {
        assert!(!point_in_ring(5.0, 5.0, &SQUARE));
        assert!(!point_in_ring(-0.5, 0.5, &SQUARE));
    }

    #[test]
    fn concave_notch_is_outside() {
        // U shape opening upwards; (1.5, 1.5) sits in the notch.
        let u = [
            [0.0, 0.0], [3.0, 0.0], [3.0, 2.0], [2.0, 2.0], [2.0, 1.0],
            [1.0, 1.0], [1.0, 2.0], [0.0, 2.0], [0.0, 0.0],
        ];
        assert!(!point_in_ring(1.5, 1.5, &u));
        assert!(point_in_ring(0.5, 1.5, &u));
        assert!(point_in_ring(1.5, 0.5, &u));
    }

    #[test]
    fn degenerate_rings_contain_nothing() {
        assert!(!point_in_ring(0.0, 0.0, &[]));
        assert!(!point_in_ring(0.0, 0.0, &[[0.0, 0.0]]));
    }

    proptest! {
        #[test]
        fn haversine_is_symmetric(
            lat1 in -90.0f64..90.0, lon1 in -180.0f64..180.0,
            lat2 in -90.0f64..90.0, lon2 in -180.0f64..180.0,
        ) {
            let a = LatLon::new(lat1, lon1);
            let b = LatLon::new(lat2, lon2);
            let ab = haversine_km(a, b);
            let ba = haversine_km(b, a);
            prop_assert!((ab - ba).abs() <= 1e-9 * ab.max(1.0));
            prop_assert!(ab >= 0.0);
            prop_assert!(ab <= std::f64::consts::PI * EARTH_RADIUS_KM + 1e-6);
        }

        #[test]
        fn haversine_zero_for_same_point(lat in -90.0f64..90.0, lon in -180.0f64..180.0) {
            let p = LatLon::new(lat, lon);
            prop_assert_eq!(haversine_km(p, p), 0.0);
        }
    }
}
