//! Gate and stand records: `lat:lon:<unused>:name[:code[:priority]]`.

use std::io;

use bevy_reflect::Reflect;
use phf::phf_map;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{clean_field, clean_line, coordinate, read_to_string};

#[derive(Error, Debug)]
pub enum GateError {
    #[error("failed to read gates: {0}")]
    FileRead(#[from] io::Error),
}

pub type GateResult = Result<Vec<Gate>, GateError>;

/// Wingspan range in meters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WingSpan {
    pub min: u32,
    pub max: u32,
}

/// ICAO aerodrome reference code letters.
pub static AERODROME_CODES: phf::Map<&'static str, WingSpan> = phf_map! {
    "A" => WingSpan { min: 0, max: 15 },
    "B" => WingSpan { min: 15, max: 24 },
    "C" => WingSpan { min: 24, max: 36 },
    "D" => WingSpan { min: 36, max: 52 },
    "E" => WingSpan { min: 52, max: 65 },
    "F" => WingSpan { min: 65, max: 80 },
    "G" => WingSpan { min: 80, max: 90 },
};

pub const DEFAULT_CODE: &str = "Z";
pub const DEFAULT_MAX_WING_SPAN: u32 = 40;

#[derive(Clone, Debug, Reflect, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Gate {
    pub name: String,
    pub icao: String,
    pub lat: f64,
    pub lon: f64,
    pub code: String,
    pub max_wing_span: u32,
    pub priority: i32,
}

/// Parses a single gate record. Empty fields are dropped before counting.
pub fn parse_gate(line: &str, icao: &str) -> Option<Gate> {
    let fields: Vec<String> = line
        .split(':')
        .map(clean_field)
        .filter(|field| !field.is_empty())
        .collect();
    let [lat, lon, _, name, rest @ ..] = fields.as_slice() else {
        debug!("Dropping gate with {} fields: {line}", fields.len());
        return None;
    };

    let point = match coordinate::to_geographic(lat, lon) {
        Ok(point) => point,
        Err(e) => {
            warn!("Dropping gate {name} at {icao}: {e}");
            return None;
        }
    };

    let (code, max_wing_span) = match rest.first() {
        Some(code) => (
            code.clone(),
            AERODROME_CODES
                .get(code.as_str())
                .map_or(DEFAULT_MAX_WING_SPAN, |span| span.max),
        ),
        None => (DEFAULT_CODE.to_string(), DEFAULT_MAX_WING_SPAN),
    };
    let priority = match rest.get(1) {
        Some(priority) => priority.trim().parse().unwrap_or_else(|_| {
            warn!("Invalid priority {priority} of gate {name} at {icao}");
            0
        }),
        None => 0,
    };

    Some(Gate {
        name: name.clone(),
        icao: icao.to_string(),
        lat: point.y(),
        lon: point.x(),
        code,
        max_wing_span,
        priority,
    })
}

/// Parses a gate file of one airport, skipping blank and `;` comment lines.
pub fn parse_gates(content: &[u8], icao: &str) -> GateResult {
    let unparsed_file = read_to_string(content)?;
    Ok(unparsed_file
        .lines()
        .map(clean_line)
        .filter(|line| !line.is_empty() && !line.starts_with(';'))
        .filter_map(|line| parse_gate(&line, icao))
        .collect())
}
