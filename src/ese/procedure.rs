use bevy_reflect::Reflect;
use geo::{Distance, Haversine, Point};
use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    clean_field,
    navaid::{Navaid, Navaids},
};

#[derive(Clone, Copy, Debug, Reflect, Serialize, PartialEq, Eq)]
pub enum ProcedureKind {
    #[serde(rename = "SID")]
    Sid,
    #[serde(rename = "STAR")]
    Star,
}

impl ProcedureKind {
    /// Procedure kind named by the first field of a record, if any.
    pub fn from_record(line: &str) -> Option<Self> {
        match line.split(':').next().map(clean_field).as_deref() {
            Some("SID") => Some(Self::Sid),
            Some("STAR") => Some(Self::Star),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Reflect, Serialize, PartialEq)]
pub struct Procedure {
    #[serde(rename = "type")]
    pub kind: ProcedureKind,
    pub icao: String,
    pub name: String,
    pub runway: String,
    pub points: Vec<Navaid>,
}

/// Parses `SID|STAR:<icao>:<runway>:<name>:<waypoint> <waypoint> ...`.
///
/// Empty fields are dropped before counting, a record needs five fields.
/// Waypoints missing from `navaids` are left out of `points`.
pub fn parse_procedure(line: &str, navaids: &Navaids) -> Option<Procedure> {
    let fields: Vec<String> = line
        .split(':')
        .map(clean_field)
        .filter(|field| !field.is_empty())
        .collect();
    let [kind, icao, runway, name, route, ..] = fields.as_slice() else {
        debug!("Dropping procedure with {} fields: {line}", fields.len());
        return None;
    };
    let kind = ProcedureKind::from_record(kind)?;

    let mut points: Vec<Navaid> = vec![];
    for waypoint in route.split_whitespace() {
        let resolved = match navaids.find(waypoint) {
            [] => {
                debug!("Unknown waypoint {waypoint} in {icao} {name}");
                continue;
            }
            [navaid] => navaid,
            candidates => {
                let reference = points
                    .last()
                    .map(Navaid::point)
                    .or_else(|| airport_reference(icao, navaids));
                let Some(reference) = reference else {
                    warn!("Ambiguous waypoint {waypoint} in {icao} {name} without reference point");
                    continue;
                };
                let Some(closest) = nearest(candidates, reference) else {
                    continue;
                };
                closest
            }
        };
        points.push(resolved.clone());
    }

    Some(Procedure {
        kind,
        icao: icao.clone(),
        name: name.clone(),
        runway: runway.clone(),
        points,
    })
}

fn airport_reference(icao: &str, navaids: &Navaids) -> Option<Point> {
    match navaids.find(icao) {
        [airport] => Some(airport.point()),
        _ => None,
    }
}

/// First candidate with the smallest great circle distance to `reference`.
fn nearest(candidates: &[Navaid], reference: Point) -> Option<&Navaid> {
    candidates.iter().min_by(|a, b| {
        Haversine::distance(reference, a.point())
            .total_cmp(&Haversine::distance(reference, b.point()))
    })
}
