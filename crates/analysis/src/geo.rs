//! Great-circle helpers on WGS84 degrees.
//!
//! All distances are meters, all bearings are degrees clockwise from north.

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine distance between two points.
pub fn distance_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Forward azimuth from point 1 to point 2 in `[0, 360)`.
///
/// Meaningless when the points coincide; callers check the distance first.
pub fn bearing_deg(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let y = d_lambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * d_lambda.cos();
    wrap_360(y.atan2(x).to_degrees())
}

/// Normalize any angle into `[0, 360)`.
pub fn wrap_360(deg: f64) -> f64 {
    let w = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if w >= 360.0 {
        0.0
    } else {
        w
    }
}

/// Signed difference `to - from` folded into `[-180, 180]`.
pub fn signed_angle_diff(from: f64, to: f64) -> f64 {
    let mut d = to - from;
    if d > 180.0 {
        d -= 360.0;
    }
    if d < -180.0 {
        d += 360.0;
    }
    d
}

/// Turn severity bucket for an absolute heading change (1 = sharpest).
pub fn severity_for_angle(abs_angle: f64) -> u8 {
    if abs_angle >= 150.0 {
        1
    } else if abs_angle >= 120.0 {
        2
    } else if abs_angle >= 90.0 {
        3
    } else if abs_angle >= 60.0 {
        4
    } else if abs_angle >= 30.0 {
        5
    } else {
        6
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POINTS: [(f64, f64); 5] = [
        (51.5007, -0.1246),
        (48.8584, 2.2945),
        (-33.8568, 151.2153),
        (35.6586, 139.7454),
        (0.0, 0.0),
    ];

    #[test]
    fn test_distance_symmetric() {
        for a in POINTS {
            for b in POINTS {
                let ab = distance_m(a.0, a.1, b.0, b.1);
                let ba = distance_m(b.0, b.1, a.0, a.1);
                assert!((ab - ba).abs() < 1e-6, "{:?} {:?}: {} vs {}", a, b, ab, ba);
            }
        }
    }

    #[test]
    fn test_distance_zero_for_same_point() {
        for a in POINTS {
            assert_eq!(distance_m(a.0, a.1, a.0, a.1), 0.0);
        }
    }

    #[test]
    fn test_one_degree_latitude() {
        let d = distance_m(35.0, 139.0, 36.0, 139.0);
        assert!((d - 111_195.0).abs() < 100.0, "got {}", d);
    }

    #[test]
    fn test_bearing_cardinal() {
        assert!(bearing_deg(0.0, 0.0, 1.0, 0.0).abs() < 1e-9);
        assert!((bearing_deg(0.0, 0.0, 0.0, 1.0) - 90.0).abs() < 1e-9);
        assert!((bearing_deg(0.0, 0.0, -1.0, 0.0) - 180.0).abs() < 1e-9);
        assert!((bearing_deg(0.0, 0.0, 0.0, -1.0) - 270.0).abs() < 1e-9);
    }

    #[test]
    fn test_bearing_range() {
        for a in POINTS {
            for b in POINTS {
                if distance_m(a.0, a.1, b.0, b.1) < 1.0 {
                    continue;
                }
                let brg = bearing_deg(a.0, a.1, b.0, b.1);
                assert!((0.0..360.0).contains(&brg), "bearing {} out of range", brg);
            }
        }
    }

    #[test]
    fn test_signed_angle_diff_wraps() {
        assert_eq!(signed_angle_diff(350.0, 10.0), 20.0);
        assert_eq!(signed_angle_diff(10.0, 350.0), -20.0);
        assert_eq!(signed_angle_diff(0.0, 170.0), 170.0);
        assert_eq!(signed_angle_diff(0.0, 190.0), -170.0);
    }

    #[test]
    fn test_severity_buckets() {
        assert_eq!(severity_for_angle(170.0), 1);
        assert_eq!(severity_for_angle(150.0), 1);
        assert_eq!(severity_for_angle(149.9), 2);
        assert_eq!(severity_for_angle(90.0), 3);
        assert_eq!(severity_for_angle(60.0), 4);
        assert_eq!(severity_for_angle(30.0), 5);
        assert_eq!(severity_for_angle(12.5), 6);
    }

    #[test]
    fn test_wrap_360() {
        assert_eq!(wrap_360(-90.0), 270.0);
        assert_eq!(wrap_360(360.0), 0.0);
        assert_eq!(wrap_360(725.0), 5.0);
    }
}
