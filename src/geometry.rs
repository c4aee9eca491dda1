//! Circular sector line discretisation.

use geo::{Destination, Haversine, Point};
use thiserror::Error;
use uom::si::f64::Length;
use uom::si::length::{meter, nautical_mile};

use crate::{
    coordinate::{self, CoordinateError},
    navaid::{Navaid, Navaids},
    projection::{self, CartesianPoint},
};

/// Number of segments approximating a circle.
pub const CIRCLE_STEPS: u32 = 10;

#[derive(Error, Debug)]
pub enum GeometryError {
    #[error("expected <navaid>:<radius> or <lat>:<lon>:<radius>, got {0} fields")]
    Malformed(usize),
    #[error("no navaid named {0:?}")]
    UnknownNavaid(String),
    #[error("invalid circle center: lat {lat}, lon {lon}")]
    InvalidCenter { lat: f64, lon: f64 },
    #[error("invalid circle radius: {0:?}")]
    InvalidRadius(String),
    #[error("invalid circle center coordinate: {0}")]
    Coordinate(#[from] CoordinateError),
}

pub type GeometryResult<T> = Result<T, GeometryError>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CircleCenter {
    Coordinate { lat: String, lon: String },
    Navaid(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Circle {
    pub center: CircleCenter,
    /// nautical miles, unparsed
    pub radius: String,
}

impl Circle {
    /// Builds a circle from the fields following `CIRCLE_SECTORLINE:<id>`.
    pub fn from_fields(fields: &[&str]) -> GeometryResult<Self> {
        match fields {
            [lat, lon, radius] => Ok(Self {
                center: CircleCenter::Coordinate {
                    lat: (*lat).to_string(),
                    lon: (*lon).to_string(),
                },
                radius: (*radius).to_string(),
            }),
            [navaid, radius] => Ok(Self {
                center: CircleCenter::Navaid(navaid.trim().to_string()),
                radius: (*radius).to_string(),
            }),
            _ => Err(GeometryError::Malformed(fields.len())),
        }
    }

    /// Geographic center, either parsed from the record or looked up by navaid
    /// name. The first navaid with a matching name wins.
    pub fn resolve_center(&self, navaids: &Navaids) -> GeometryResult<Point> {
        let center = match &self.center {
            CircleCenter::Coordinate { lat, lon } => coordinate::to_geographic(lat, lon)?,
            CircleCenter::Navaid(name) => navaids
                .find(name)
                .first()
                .map(Navaid::point)
                .ok_or_else(|| GeometryError::UnknownNavaid(name.clone()))?,
        };

        // zero and NaN are what broken navaid data looks like
        if center.x().is_normal() && center.y().is_normal() {
            Ok(center)
        } else {
            Err(GeometryError::InvalidCenter {
                lat: center.y(),
                lon: center.x(),
            })
        }
    }

    pub fn radius_nm(&self) -> GeometryResult<f64> {
        self.radius
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|radius| radius.is_finite())
            .ok_or_else(|| GeometryError::InvalidRadius(self.radius.clone()))
    }

    /// Closed, projected polygon approximating the circle.
    pub fn points(&self, navaids: &Navaids) -> GeometryResult<Vec<CartesianPoint>> {
        let center = self.resolve_center(navaids)?;
        let radius = self.radius_nm()?;
        Ok(circle_points(center, radius))
    }
}

/// `CIRCLE_STEPS` vertices counter-clockwise from true north around a
/// geographic center, closed by repeating the first vertex, projected.
pub fn circle_points(center: Point, radius_nm: f64) -> Vec<CartesianPoint> {
    let radius = Length::new::<nautical_mile>(radius_nm);
    let mut points: Vec<CartesianPoint> = (0..CIRCLE_STEPS)
        .map(|step| {
            let bearing = -360.0 * f64::from(step) / f64::from(CIRCLE_STEPS);
            projection::to_cartesian(Haversine::destination(
                center,
                bearing,
                radius.get::<meter>(),
            ))
        })
        .collect();
    if let Some(first) = points.first().copied() {
        points.push(first);
    }

    points
}
