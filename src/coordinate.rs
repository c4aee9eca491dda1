//! Sector file coordinate codec.
//!
//! Sector files pack coordinates as `N049.08.17.000`: hemisphere letter,
//! three digit degrees, minutes, seconds and fractional seconds separated by
//! dots. Packed fields are first rewritten into a plain `D:M:S.fffH` token
//! which the pest grammar in `pest/coordinate.pest` then parses.

use geo::{point, Point};
use pest::{iterators::Pair, Parser};
use pest_derive::Parser;
use thiserror::Error;

use crate::projection::{self, CartesianPoint};

#[derive(Parser)]
#[grammar = "pest/coordinate.pest"]
pub struct CoordinateParser;

#[derive(Error, Debug)]
pub enum CoordinateError {
    #[error("malformed packed coordinate: {0:?}")]
    Malformed(String),
    #[error("failed to parse coordinate: {0}")]
    Parse(#[from] pest::error::Error<Rule>),
    #[error("coordinate out of range: {0:?}")]
    OutOfRange(String),
}

pub type CoordinateResult<T> = Result<T, CoordinateError>;

/// Rewrites a packed coordinate field into a `D:M:S.fffH` token.
///
/// Anything after the first whitespace (i.e. inline comments) is ignored.
/// At least four dot-separated segments are required, extra segments are
/// dropped.
pub fn unpack_coordinate(raw: &str) -> CoordinateResult<String> {
    let malformed = || CoordinateError::Malformed(raw.to_string());
    let token = raw.split_whitespace().next().ok_or_else(malformed)?;
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() < 4 {
        return Err(malformed());
    }

    let mut head = parts[0].chars();
    let hemisphere = head.next().ok_or_else(malformed)?;
    let degrees: u32 = head
        .take(3)
        .collect::<String>()
        .parse()
        .map_err(|_| malformed())?;

    Ok(format!(
        "{degrees}:{}:{}.{}{hemisphere}",
        parts[1], parts[2], parts[3]
    ))
}

fn parse_number(pair: &Pair<Rule>) -> CoordinateResult<f64> {
    pair.as_str()
        .parse()
        .map_err(|_| CoordinateError::Malformed(pair.as_str().to_string()))
}

fn parse_coordinate_part(pair: Pair<Rule>, limit: f64) -> CoordinateResult<f64> {
    let text = pair.as_str().to_string();
    let mut coordinate_part = pair.into_inner();
    let (Some(degrees), Some(minutes), Some(seconds), Some(hemisphere)) = (
        coordinate_part.next(),
        coordinate_part.next(),
        coordinate_part.next(),
        coordinate_part.next(),
    ) else {
        return Err(CoordinateError::Malformed(text));
    };

    let degrees = parse_number(&degrees)?;
    let minutes = parse_number(&minutes)?;
    let seconds = parse_number(&seconds)?;
    let sign = if matches!(hemisphere.as_str(), "S" | "W" | "s" | "w") {
        -1.0
    } else {
        1.0
    };
    let decimal = degrees + minutes / 60.0 + seconds / 3600.0;

    if minutes >= 60.0 || seconds >= 60.0 || decimal > limit {
        return Err(CoordinateError::OutOfRange(text));
    }

    Ok(sign * decimal)
}

/// Parses a `"D:M:S.fffH D:M:S.fffH"` latitude/longitude pair.
pub fn parse_lat_lon(text: &str) -> CoordinateResult<Point> {
    let malformed = || CoordinateError::Malformed(text.to_string());
    let lat_lon = CoordinateParser::parse(Rule::lat_lon, text)?
        .next()
        .ok_or_else(malformed)?;
    let mut parts = lat_lon.into_inner();
    let (Some(lat), Some(lng)) = (parts.next(), parts.next()) else {
        return Err(malformed());
    };

    let lat = parse_coordinate_part(lat, 90.0)?;
    let lng = parse_coordinate_part(lng, 180.0)?;

    Ok(point! { x: lng, y: lat })
}

/// Geographic point (x = longitude, y = latitude) of a packed field pair.
pub fn to_geographic(lat_raw: &str, lon_raw: &str) -> CoordinateResult<Point> {
    let lat = unpack_coordinate(lat_raw)?;
    let lng = unpack_coordinate(lon_raw)?;
    parse_lat_lon(&format!("{lat} {lng}"))
}

/// Projected cartesian point of a packed field pair.
pub fn to_cartesian(lat_raw: &str, lon_raw: &str) -> CoordinateResult<CartesianPoint> {
    to_geographic(lat_raw, lon_raw).map(projection::to_cartesian)
}

fn decimal_to_dms(decimal: f64, is_latitude: bool) -> (u16, u8, f64, char) {
    let abs = decimal.abs();
    let mut degrees = abs.trunc();
    let mut minutes = ((abs - degrees) * 60.0).trunc();
    let mut seconds = ((abs - degrees - minutes / 60.0) * 3600.0 * 1000.0).round() / 1000.0;
    if seconds >= 60.0 {
        seconds = 0.0;
        minutes += 1.0;
    }
    if minutes >= 60.0 {
        minutes = 0.0;
        degrees += 1.0;
    }

    let direction = match (is_latitude, decimal.is_sign_negative()) {
        (true, false) => 'N',
        (true, true) => 'S',
        (false, false) => 'E',
        (false, true) => 'W',
    };

    (degrees as u16, minutes as u8, seconds, direction)
}

/// Formatting of geographic points back into the packed sector file notation.
pub trait PackedCoordinateExt {
    fn lat_packed_fmt(&self) -> String;
    fn lng_packed_fmt(&self) -> String;
    fn packed_fmt(&self) -> String {
        format!("{}:{}", self.lat_packed_fmt(), self.lng_packed_fmt())
    }
}

impl PackedCoordinateExt for Point {
    fn lat_packed_fmt(&self) -> String {
        let (deg, min, sec, hemi) = decimal_to_dms(self.y(), true);
        format!("{hemi}{deg:03}.{min:02}.{sec:.3}")
    }

    fn lng_packed_fmt(&self) -> String {
        let (deg, min, sec, hemi) = decimal_to_dms(self.x(), false);
        format!("{hemi}{deg:03}.{min:02}.{sec:.3}")
    }
}

/// Packed `lat:lon` notation of a geographic point.
pub fn to_packed(geographic: Point) -> String {
    geographic.packed_fmt()
}

#[cfg(test)]
mod test {
    use geo::point;

    use crate::projection::HALF_SIZE;

    use super::{
        parse_lat_lon, to_cartesian, to_geographic, to_packed, unpack_coordinate, CoordinateError,
    };

    fn assert_close(left: f64, right: f64) {
        assert!(
            (left - right).abs() < 1e-9,
            "left: {left:?} not equal right: {right:?}"
        );
    }

    #[test]
    fn test_unpack() {
        assert_eq!(
            unpack_coordinate("N049.08.17.000").unwrap(),
            "49:08:17.000N"
        );
        assert_eq!(
            unpack_coordinate("W151.12.30.500").unwrap(),
            "151:12:30.500W"
        );
        assert_eq!(
            unpack_coordinate("E011.07.57.000 ; inline comment").unwrap(),
            "11:07:57.000E"
        );
        assert!(matches!(
            unpack_coordinate("N049.08.17"),
            Err(CoordinateError::Malformed(_))
        ));
        assert!(matches!(
            unpack_coordinate("NXYZ.08.17.000"),
            Err(CoordinateError::Malformed(_))
        ));
        assert!(matches!(
            unpack_coordinate(""),
            Err(CoordinateError::Malformed(_))
        ));
    }

    #[test]
    fn test_geographic() {
        let point = to_geographic("N049.08.17.000", "E011.07.57.000").unwrap();
        assert_close(point.y(), 49.138_055_555_555_55);
        assert_close(point.x(), 11.1325);

        let point = to_geographic("S033.52.00.000", "W151.12.30.500").unwrap();
        assert_close(point.y(), -33.866_666_666_666_67);
        assert_close(point.x(), -151.208_472_222_222_2);
    }

    #[test]
    fn test_lat_lon_grammar() {
        let point = parse_lat_lon("48:40:0.000N 10:58:0.5E").unwrap();
        assert_close(point.y(), 48.666_666_666_666_666);
        assert_close(point.x(), 10.966_805_555_555_556);

        // hemispheres swapped
        assert!(matches!(
            parse_lat_lon("10:58:0.5E 48:40:0.000N"),
            Err(CoordinateError::Parse(_))
        ));
    }

    #[test]
    fn test_invalid_coordinates() {
        assert!(matches!(
            to_geographic("S999.00.00.000", "E999.00.00.000"),
            Err(CoordinateError::OutOfRange(_))
        ));
        assert!(matches!(
            to_geographic("N049.75.00.000", "E011.00.00.000"),
            Err(CoordinateError::OutOfRange(_))
        ));
        assert!(to_cartesian("N049.08", "E011.07.57.000").is_err());
        assert!(to_cartesian("X049.08.17.000", "E011.07.57.000").is_err());
    }

    #[test]
    fn test_cartesian() {
        let [x, y] = to_cartesian("N000.00.00.000", "E180.00.00.000").unwrap();
        assert!((x - HALF_SIZE).abs() < 1e-6, "{x}");
        assert!(y.abs() < 1e-6, "{y}");
    }

    #[test]
    fn test_packed_fmt() {
        let point = point! { x: 10.966_805_555_555_556, y: 48.666_666_666_666_666 };
        assert_eq!(to_packed(point), "N048.40.0.000:E010.58.0.500");

        let point = point! { x: -151.208_472_222_222_2, y: -33.866_666_666_666_67 };
        assert_eq!(to_packed(point), "S033.52.0.000:W151.12.30.500");

        let roundtrip = to_packed(to_geographic("N049.08.17.250", "E011.07.57.000").unwrap());
        assert_eq!(roundtrip, "N049.08.17.250:E011.07.57.000");
    }
}
