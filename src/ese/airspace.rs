//! `[AIRSPACE]` records and the sector assembly they drive.
//!
//! Sectors and sector lines are spread over many records. A `SECTOR` record
//! opens a sector which collects `OWNER`, `BORDER`, `DEPAPT`, `ARRAPT`,
//! `ACTIVE` and `DISPLAY_SECTORLINE` records until the next `SECTOR` record or
//! the end of the section. `SECTORLINE`/`CIRCLE_SECTORLINE` records open a
//! sector line which collects `COORD` and `DISPLAY` records until the next one
//! is opened.

use std::collections::{HashMap, HashSet};

use bevy_reflect::Reflect;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::{
    clean_field,
    coordinate::{self, CoordinateError, CoordinateResult},
    geometry::{Circle, GeometryResult},
    navaid::Navaids,
    options::EseOptions,
    projection::CartesianPoint,
};

use super::EseContent;

static NUMERIC_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").unwrap());

#[derive(Clone, Debug, Reflect, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DisplayRule {
    pub border_id: Option<u32>,
    pub my_sector: String,
    pub other_sectors: Vec<String>,
}

impl DisplayRule {
    fn new(border_id: Option<u32>, my_sector: &str, others: &[String]) -> Self {
        Self {
            border_id,
            my_sector: my_sector.to_string(),
            other_sectors: others
                .iter()
                .filter(|other| !other.is_empty() && *other != my_sector)
                .cloned()
                .collect(),
        }
    }
}

#[derive(Clone, Debug, Reflect, Serialize, PartialEq, Eq)]
pub struct Active {
    pub icao: String,
    pub runway: String,
}

#[derive(Clone, Debug, Reflect, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Sector {
    pub name: String,
    /// owner priority, primary first
    pub owners: Vec<String>,
    /// sector line ids
    pub borders: Vec<u32>,
    pub dep_apts: Vec<String>,
    pub arr_apts: Vec<String>,
    pub actives: Vec<Active>,
    pub floor: Option<i32>,
    pub ceiling: Option<i32>,
    pub display_sector_lines: Vec<DisplayRule>,
}

impl Sector {
    fn new(name: String, floor: Option<i32>, ceiling: Option<i32>) -> Self {
        Self {
            name,
            owners: vec![],
            borders: vec![],
            dep_apts: vec![],
            arr_apts: vec![],
            actives: vec![],
            floor,
            ceiling,
            display_sector_lines: vec![],
        }
    }
}

#[derive(Clone, Debug, Reflect, Serialize, PartialEq)]
pub struct SectorLine {
    pub id: u32,
    pub points: Vec<CartesianPoint>,
    pub display: Vec<DisplayRule>,
}

#[derive(Debug)]
enum AirspaceRecord {
    SectorLine(String),
    CircleSectorLine(String, GeometryResult<Circle>),
    Coord(CoordinateResult<CartesianPoint>),
    Display(Vec<String>),
    Sector {
        name: String,
        floor: Option<i32>,
        ceiling: Option<i32>,
    },
    Owner(Vec<String>),
    Border(Vec<String>),
    DepartureAirports(Vec<String>),
    ArrivalAirports(Vec<String>),
    Active(Active),
    DisplaySectorLine {
        border: String,
        my_sector: String,
        others: Vec<String>,
    },
    Malformed(String),
    Unsupported(String),
}

fn parse_level(field: &str) -> Option<i32> {
    field.trim().parse().ok()
}

impl AirspaceRecord {
    fn parse(line: &str) -> Self {
        let fields: Vec<String> = line.split(':').map(clean_field).collect();
        let Some((keyword, rest)) = fields.split_first() else {
            return Self::Unsupported(String::new());
        };

        match (keyword.as_str(), rest) {
            ("SECTORLINE", [id, ..]) => Self::SectorLine(id.clone()),
            ("CIRCLE_SECTORLINE", [id, circle @ ..]) => Self::CircleSectorLine(
                id.clone(),
                Circle::from_fields(&circle.iter().map(String::as_str).collect::<Vec<_>>()),
            ),
            ("COORD", [lat, lon, ..]) => Self::Coord(coordinate::to_cartesian(lat, lon)),
            ("COORD", _) => Self::Coord(Err(CoordinateError::Malformed(line.to_string()))),
            ("DISPLAY", display) => Self::Display(display.to_vec()),
            ("SECTOR", [name, levels @ ..]) => Self::Sector {
                name: name.clone(),
                floor: levels.first().and_then(|level| parse_level(level)),
                ceiling: levels.get(1).and_then(|level| parse_level(level)),
            },
            ("OWNER", owners) => Self::Owner(owners.to_vec()),
            ("BORDER", borders) => Self::Border(
                borders
                    .iter()
                    .filter(|border| !border.is_empty())
                    .cloned()
                    .collect(),
            ),
            ("DEPAPT", airports) => Self::DepartureAirports(airports.to_vec()),
            ("ARRAPT", airports) => Self::ArrivalAirports(airports.to_vec()),
            ("ACTIVE", [icao, runway, ..]) => Self::Active(Active {
                icao: icao.clone(),
                runway: runway.clone(),
            }),
            ("DISPLAY_SECTORLINE", [border, my_sector, others @ ..]) => Self::DisplaySectorLine {
                border: border.clone(),
                my_sector: my_sector.clone(),
                others: others.to_vec(),
            },
            ("SECTORLINE" | "CIRCLE_SECTORLINE" | "SECTOR" | "ACTIVE" | "DISPLAY_SECTORLINE", _) => {
                Self::Malformed(keyword.clone())
            }
            _ => Self::Unsupported(keyword.clone()),
        }
    }
}

fn numeric_id(token: &str) -> Option<u32> {
    let token = token.trim();
    if NUMERIC_ID.is_match(token) {
        token.parse().ok()
    } else {
        None
    }
}

/// Numeric ids for non-numeric sector line tokens, stable for one parse.
#[derive(Debug)]
struct SyntheticIds {
    next: u32,
    assigned: HashMap<String, u32>,
}

impl SyntheticIds {
    fn new(base: u32) -> Self {
        Self {
            next: base,
            assigned: HashMap::new(),
        }
    }

    /// Id of a newly opened sector line. A token seen before keeps its id.
    fn line_id(&mut self, token: &str) -> u32 {
        if let Some(id) = numeric_id(token) {
            return id;
        }
        if let Some(id) = self.assigned.get(token) {
            return *id;
        }

        let id = self.next;
        self.next = self.next.saturating_add(1);
        self.assigned.insert(token.to_string(), id);
        trace!("Sector line {token} assigned id {id}");
        id
    }

    /// Id referenced by a border token. Tokens remapped to id 0 count as
    /// unmapped.
    fn border_id(&self, token: &str) -> Option<u32> {
        numeric_id(token).or_else(|| {
            self.assigned
                .get(token)
                .copied()
                .filter(|id| *id != 0)
        })
    }
}

/// Assembly cursor of one parse. Sectors and sector lines are appended to the
/// output as soon as they are opened and referenced by index afterwards.
#[derive(Debug)]
pub(super) struct AirspaceState<'a> {
    navaids: &'a Navaids,
    ids: SyntheticIds,
    current_sector: Option<usize>,
    current_sector_line: Option<usize>,
    sector_names: HashSet<String>,
    sector_line_ids: HashSet<u32>,
}

impl<'a> AirspaceState<'a> {
    pub(super) fn new(navaids: &'a Navaids, options: &EseOptions) -> Self {
        Self {
            navaids,
            ids: SyntheticIds::new(options.synthetic_id_base),
            current_sector: None,
            current_sector_line: None,
            sector_names: HashSet::new(),
            sector_line_ids: HashSet::new(),
        }
    }

    fn sector<'c>(&self, content: &'c mut EseContent, line: &str) -> Option<&'c mut Sector> {
        let sector = self
            .current_sector
            .and_then(|index| content.sectors.get_mut(index));
        if sector.is_none() {
            debug!("Dropping record outside of a sector: {line}");
        }
        sector
    }

    fn sector_line<'c>(
        &self,
        content: &'c mut EseContent,
        line: &str,
    ) -> Option<&'c mut SectorLine> {
        let sector_line = self
            .current_sector_line
            .and_then(|index| content.sector_lines.get_mut(index));
        if sector_line.is_none() {
            warn!("Dropping record outside of a sector line: {line}");
        }
        sector_line
    }

    fn open_sector_line(
        &mut self,
        token: &str,
        points: Vec<CartesianPoint>,
        content: &mut EseContent,
    ) {
        let id = self.ids.line_id(token);
        if !self.sector_line_ids.insert(id) {
            debug!("Duplicate sector line {id} ({token})");
        }

        content.sector_lines.push(SectorLine {
            id,
            points,
            display: vec![],
        });
        self.current_sector_line = Some(content.sector_lines.len() - 1);
    }

    fn open_sector(
        &mut self,
        name: String,
        floor: Option<i32>,
        ceiling: Option<i32>,
        content: &mut EseContent,
    ) {
        self.finalize_sector(content);
        if !self.sector_names.insert(name.clone()) {
            debug!("Duplicate sector {name}");
        }

        content.sectors.push(Sector::new(name, floor, ceiling));
        self.current_sector = Some(content.sectors.len() - 1);
    }

    /// Closes the open sector, if any. Sectors without borders are kept.
    pub(super) fn finalize_sector(&mut self, content: &EseContent) {
        if let Some(sector) = self
            .current_sector
            .take()
            .and_then(|index| content.sectors.get(index))
        {
            if sector.borders.is_empty() {
                warn!("Sector {} has no borders", sector.name);
            }
        }
    }

    pub(super) fn apply(&mut self, line: &str, content: &mut EseContent) {
        match AirspaceRecord::parse(line) {
            AirspaceRecord::SectorLine(token) => self.open_sector_line(&token, vec![], content),
            AirspaceRecord::CircleSectorLine(token, circle) => {
                let points = match circle.and_then(|circle| circle.points(self.navaids)) {
                    Ok(points) => points,
                    Err(e) => {
                        warn!("Circle sector line {token} left without points: {e}");
                        vec![]
                    }
                };
                self.open_sector_line(&token, points, content);
            }
            AirspaceRecord::Coord(point) => {
                if let Some(sector_line) = self.sector_line(content, line) {
                    match point {
                        Ok(point) => sector_line.points.push(point),
                        Err(e) => warn!("Skipping point of sector line {}: {e}", sector_line.id),
                    }
                }
            }
            AirspaceRecord::Display(fields) => {
                if let Some(sector_line) = self.sector_line(content, line) {
                    match fields.split_first() {
                        Some((my_sector, others)) => sector_line.display.push(DisplayRule::new(
                            Some(sector_line.id),
                            my_sector,
                            others,
                        )),
                        None => warn!("Malformed DISPLAY record: {line}"),
                    }
                }
            }
            AirspaceRecord::Sector {
                name,
                floor,
                ceiling,
            } => self.open_sector(name, floor, ceiling, content),
            AirspaceRecord::Owner(owners) => {
                if let Some(sector) = self.sector(content, line) {
                    sector.owners = owners;
                }
            }
            AirspaceRecord::Border(tokens) => {
                if let Some(sector) = self.sector(content, line) {
                    sector.borders = tokens
                        .iter()
                        .filter_map(|token| {
                            let id = self.ids.border_id(token);
                            if id.is_none() {
                                warn!("Unmapped border {token} in sector {}", sector.name);
                            }
                            id
                        })
                        .collect();
                }
            }
            AirspaceRecord::DepartureAirports(airports) => {
                if let Some(sector) = self.sector(content, line) {
                    sector.dep_apts = airports;
                }
            }
            AirspaceRecord::ArrivalAirports(airports) => {
                if let Some(sector) = self.sector(content, line) {
                    sector.arr_apts = airports;
                }
            }
            AirspaceRecord::Active(active) => {
                if let Some(sector) = self.sector(content, line) {
                    sector.actives.push(active);
                }
            }
            AirspaceRecord::DisplaySectorLine {
                border,
                my_sector,
                others,
            } => {
                if let Some(sector) = self.sector(content, line) {
                    let border_id = self.ids.border_id(&border);
                    if border_id.is_none() {
                        warn!("Unmapped display border {border} in sector {}", sector.name);
                    }
                    sector
                        .display_sector_lines
                        .push(DisplayRule::new(border_id, &my_sector, &others));
                }
            }
            AirspaceRecord::Malformed(keyword) => warn!("Malformed {keyword} record: {line}"),
            AirspaceRecord::Unsupported(keyword) => trace!("Ignoring {keyword} record"),
        }
    }
}
