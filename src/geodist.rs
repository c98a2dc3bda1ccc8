use geo::{GeodesicDistance, Point};

/// Distance in meters over the WGS84 ellipsoid.
pub fn meters(a: Point, b: Point) -> f64 {
    a.geodesic_distance(&b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_points_are_zero_meters() {
        for (lon, lat) in [(0.0, 0.0), (-46.63, -23.55), (151.2, -33.87)] {
            let p = Point::new(lon, lat);
            assert_eq!(meters(p, p), 0.0);
        }
    }

    #[test]
    fn sao_paulo_to_rio() {
        let sao_paulo = Point::new(-46.6333, -23.5505);
        let rio = Point::new(-43.1729, -22.9068);
        let d = meters(sao_paulo, rio);
        assert!((355_000.0..365_000.0).contains(&d), "{d}");
    }

    #[test]
    fn antipodal_points_stay_finite() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(180.0, 0.0);
        let d = meters(a, b);
        assert!(d.is_finite());
        assert!(d > 19_000_000.0, "{d}");
    }
}
