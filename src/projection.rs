//! Flat cartesian (spherical web mercator) projection used for every point
//! written to the dataset.

use std::f64::consts::PI;

use geo::{point, Point};

/// Spherical web mercator earth radius in meters.
pub const EARTH_RADIUS: f64 = 6_378_137.0;
/// Half the extent of the projected plane along either axis.
pub const HALF_SIZE: f64 = PI * EARTH_RADIUS;

/// Projected `[x, y]` pair in meters.
pub type CartesianPoint = [f64; 2];

/// Projects a geographic point (x = longitude, y = latitude, degrees).
///
/// y is clamped to `±HALF_SIZE` so latitudes close to the poles stay finite.
pub fn to_cartesian(geographic: Point) -> CartesianPoint {
    let x = HALF_SIZE * geographic.x() / 180.0;
    let y = (EARTH_RADIUS * (PI * (geographic.y() + 90.0) / 360.0).tan().ln())
        .clamp(-HALF_SIZE, HALF_SIZE);

    [x, y]
}

/// Reverses [`to_cartesian`].
pub fn from_cartesian([x, y]: CartesianPoint) -> Point {
    let lng = x * 180.0 / HALF_SIZE;
    let y = y.clamp(-HALF_SIZE, HALF_SIZE);
    let lat = 360.0 * (y / EARTH_RADIUS).exp().atan() / PI - 90.0;

    point! { x: lng, y: lat }
}

#[cfg(test)]
mod test {
    use geo::point;

    use super::{from_cartesian, to_cartesian, HALF_SIZE};

    #[test]
    fn test_roundtrip() {
        for lat in (-85..=84).step_by(7) {
            for lng in (-179..=179).step_by(11) {
                let lat = f64::from(lat) + 0.123_456;
                let lng = f64::from(lng) + 0.654_321;
                let roundtrip = from_cartesian(to_cartesian(point! { x: lng, y: lat }));
                assert!(
                    (roundtrip.x() - lng).abs() < 1e-6 && (roundtrip.y() - lat).abs() < 1e-6,
                    "left: {roundtrip:?} not equal right: ({lng}, {lat})"
                );
            }
        }
    }

    #[test]
    fn test_roundtrip_beyond_clamp() {
        let max_lat = from_cartesian([0.0, HALF_SIZE]).y();
        assert!((max_lat - 85.051_128_78).abs() < 1e-6, "{max_lat}");

        let north = from_cartesian(to_cartesian(point! { x: 12.5, y: 87.9 }));
        assert!((north.x() - 12.5).abs() < 1e-9);
        assert!((north.y() - max_lat).abs() < 1e-9, "{north:?}");

        let south = from_cartesian(to_cartesian(point! { x: -12.5, y: -87.9 }));
        assert!((south.y() + max_lat).abs() < 1e-9, "{south:?}");
    }

    #[test]
    fn test_known_values() {
        let [x, y] = to_cartesian(point! { x: 0.0, y: 0.0 });
        assert!(x.abs() < 1e-9);
        assert!(y.abs() < 1e-6);

        let [x, _] = to_cartesian(point! { x: 180.0, y: 0.0 });
        assert!((x - HALF_SIZE).abs() < 1e-6);

        let [_, y] = to_cartesian(point! { x: 11.0, y: 48.0 });
        assert!((y - 6_106_854.834_885_074).abs() < 1e-3, "{y}");
    }

    #[test]
    fn test_pole_is_clamped() {
        let [_, north] = to_cartesian(point! { x: 0.0, y: 90.0 });
        let [_, south] = to_cartesian(point! { x: 0.0, y: -90.0 });
        assert!(north.is_finite() && (north - HALF_SIZE).abs() < 1e-6);
        assert!(south.is_finite() && (south + HALF_SIZE).abs() < 1e-6);
    }
}
