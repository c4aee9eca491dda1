use bevy_reflect::Reflect;
use itertools::Itertools;
use serde::Serialize;
use tracing::{debug, warn};

use crate::{clean_field, coordinate, options::EseOptions};

/// Index of the first visibility point latitude.
const VISIBILITY_POINTS_START: usize = 11;

#[derive(Clone, Debug, Reflect, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub callsign: String,
    pub name: String,
    pub frequency: String,
    pub identifier: String,
    pub sector: String,
    pub sub_sector: String,
    pub facility: String,
    pub squawk_start: String,
    pub squawk_end: String,
    /// `[lat, lon]` in degrees
    pub visibility_points: Vec<[f64; 2]>,
}

/// Parses a `[POSITIONS]` record, which needs at least four fields. Fields
/// after the fourth default to empty strings when missing.
pub fn parse_position(line: &str, options: &EseOptions) -> Option<Position> {
    let fields: Vec<String> = line.split(':').map(clean_field).collect();
    if fields.len() < 4 {
        debug!("Dropping position with {} fields: {line}", fields.len());
        return None;
    }
    let field = |index: usize| fields.get(index).cloned().unwrap_or_default();

    let visibility_points = fields
        .iter()
        .skip(VISIBILITY_POINTS_START)
        .tuples()
        .filter(|(lat, lon)| !(lat.is_empty() && lon.is_empty()))
        .filter_map(
            |(lat, lon)| match coordinate::to_geographic(lat, lon) {
                Ok(point) => Some([point.y(), point.x()]),
                Err(e) => {
                    warn!("Skipping visibility point of {}: {e}", fields[0]);
                    None
                }
            },
        )
        .collect();

    let sector = field(5);
    let sub_sector = field(4);
    let facility = field(6);
    let callsign = if options.compose_callsigns {
        compose_callsign(&sector, &sub_sector, &facility)
    } else {
        field(0)
    };

    Some(Position {
        callsign,
        name: field(1),
        frequency: field(2),
        identifier: field(3),
        sector,
        sub_sector,
        facility,
        squawk_start: field(9),
        squawk_end: field(10),
        visibility_points,
    })
}

/// `sector[_subSector]_facility`
fn compose_callsign(sector: &str, sub_sector: &str, facility: &str) -> String {
    if sub_sector.is_empty() {
        format!("{sector}_{facility}")
    } else {
        format!("{sector}_{sub_sector}_{facility}")
    }
}
