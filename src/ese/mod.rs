//! Single pass `.ese` parser.
//!
//! Lines are cleaned, classified as section headers or colon separated
//! records and dispatched on the active section. `SID`/`STAR` records are
//! picked up in every section.

use std::{io, path::Path};

use bevy_reflect::Reflect;
use serde::Serialize;
use thiserror::Error;
use tracing::trace;

use crate::{clean_line, navaid::Navaids, options::EseOptions, read_to_string};

mod airspace;
mod position;
mod procedure;

pub use airspace::{Active, DisplayRule, Sector, SectorLine};
pub use position::{parse_position, Position};
pub use procedure::{parse_procedure, Procedure, ProcedureKind};

use airspace::AirspaceState;

#[derive(Error, Debug)]
pub enum EseError {
    #[error("failed to read .ese file: {0}")]
    FileRead(#[from] io::Error),
}

/// Everything extracted from one `.ese` file.
#[derive(Clone, Debug, Default, Reflect, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EseContent {
    pub positions: Vec<Position>,
    #[serde(rename = "procedure")]
    pub procedures: Vec<Procedure>,
    pub sectors: Vec<Sector>,
    pub sector_lines: Vec<SectorLine>,
}

pub type EseResult = Result<EseContent, EseError>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Section {
    Positions,
    Airspace,
    Other,
}

impl Section {
    fn from_header(line: &str) -> Option<Self> {
        let name = line.strip_prefix('[')?.strip_suffix(']')?;
        Some(match name {
            "POSITIONS" => Self::Positions,
            "AIRSPACE" => Self::Airspace,
            _ => Self::Other,
        })
    }
}

/// Mutable state of one parse.
struct ParseContext<'a> {
    options: &'a EseOptions,
    navaids: &'a Navaids,
    section: Section,
    airspace: AirspaceState<'a>,
    content: EseContent,
}

impl<'a> ParseContext<'a> {
    fn new(navaids: &'a Navaids, options: &'a EseOptions) -> Self {
        Self {
            options,
            navaids,
            section: Section::Other,
            airspace: AirspaceState::new(navaids, options),
            content: EseContent::default(),
        }
    }

    fn enter(&mut self, section: Section) {
        if self.section == Section::Airspace {
            self.airspace.finalize_sector(&self.content);
        }
        self.section = section;
    }

    fn line(&mut self, raw: &str) {
        let line = clean_line(raw);
        if line.is_empty() || line.starts_with(";=") {
            return;
        }
        if let Some(section) = Section::from_header(&line) {
            self.enter(section);
            return;
        }

        if ProcedureKind::from_record(&line).is_some() {
            if let Some(procedure) = parse_procedure(&line, self.navaids) {
                self.content.procedures.push(procedure);
            }
            return;
        }

        match self.section {
            Section::Positions if line.starts_with(';') => {
                trace!("Skipping commented out position: {line}");
            }
            Section::Positions => {
                if let Some(position) = parse_position(&line, self.options) {
                    self.content.positions.push(position);
                }
            }
            Section::Airspace => self.airspace.apply(&line, &mut self.content),
            Section::Other => trace!("Ignoring record outside of known sections: {line}"),
        }
    }

    fn finish(mut self) -> EseContent {
        self.airspace.finalize_sector(&self.content);
        self.content
    }
}

impl EseContent {
    /// Parses raw `.ese` bytes, UTF-8 or Windows-1252 encoded.
    pub fn parse(content: &[u8], navaids: &Navaids, options: &EseOptions) -> EseResult {
        let unparsed_file = read_to_string(content)?;
        Ok(Self::parse_str(&unparsed_file, navaids, options))
    }

    /// Malformed records are skipped with a diagnostic, parsing never fails.
    pub fn parse_str(content: &str, navaids: &Navaids, options: &EseOptions) -> Self {
        let mut context = ParseContext::new(navaids, options);
        for line in content.split('\n') {
            context.line(line);
        }

        context.finish()
    }

    pub fn from_path(
        path: impl AsRef<Path>,
        navaids: &Navaids,
        options: &EseOptions,
    ) -> EseResult {
        Self::parse(&fs_err::read(path)?, navaids, options)
    }
}

#[cfg(test)]
mod test {
    use std::path::PathBuf;

    use pretty_assertions_sorted::assert_eq_sorted;
    use serde_json::json;

    use crate::{
        navaid::{Navaid, NavaidKind, Navaids},
        options::EseOptions,
    };

    use super::{EseContent, EseError, ProcedureKind, Section};

    fn navaids() -> Navaids {
        [
            Navaid {
                name: "DM060".to_string(),
                lat: 48.3,
                lon: 11.5,
                kind: NavaidKind::Fix,
            },
            Navaid {
                name: "GIVMI".to_string(),
                lat: 48.4,
                lon: 11.2,
                kind: NavaidKind::Fix,
            },
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_section_headers() {
        assert_eq!(
            Section::from_header("[POSITIONS]"),
            Some(Section::Positions)
        );
        assert_eq!(Section::from_header("[AIRSPACE]"), Some(Section::Airspace));
        assert_eq!(Section::from_header("[airspace]"), Some(Section::Other));
        assert_eq!(Section::from_header("[SIDSSTARS]"), Some(Section::Other));
        assert_eq!(Section::from_header("[AIRSPACE"), None);
        assert_eq!(Section::from_header("SECTOR:A:0:1"), None);
    }

    #[test]
    fn test_sections() {
        let content = EseContent::parse(
            b"
;= comment line
[POSITIONS]
EDDM_ATIS:Muenchen ATIS:123.130:MX::EDDM:ATIS:::0000:0000
EDMM_ALB_CTR:Muenchen Radar:129.100:ALB:ALB:EDMM:CTR:::2354:2367:N049.02.24.501:E012.31.35.850

[AIRSPACE]
SECTORLINE:1
COORD:N049.08.17.000:E011.07.57.000
SECTOR:OPEN:0:100
[SIDSSTARS]
BORDER:1
SID:EDDM:26R:GIVMI1N:DM060 DM063 GIVMI
STAR:EDDN:28:UPALA1V
[POSITIONS]
EDDM_TWR:Muenchen Tower:118.700:MT
",
            &navaids(),
            &EseOptions::default(),
        )
        .unwrap();

        let callsigns: Vec<&str> = content
            .positions
            .iter()
            .map(|position| position.callsign.as_str())
            .collect();
        assert_eq!(callsigns, ["EDDM_ATIS", "EDMM_ALB_CTR", "EDDM_TWR"]);

        // closed by the [SIDSSTARS] header, the BORDER record is not applied
        assert_eq!(content.sectors.len(), 1);
        assert_eq!(content.sectors[0].name, "OPEN");
        assert!(content.sectors[0].borders.is_empty());
        assert_eq!(content.sector_lines.len(), 1);

        assert_eq!(content.procedures.len(), 1);
        assert_eq!(content.procedures[0].kind, ProcedureKind::Sid);
        let points: Vec<&str> = content.procedures[0]
            .points
            .iter()
            .map(|navaid| navaid.name.as_str())
            .collect();
        assert_eq!(points, ["DM060", "GIVMI"]);
    }

    #[test]
    fn test_commented_out_positions() {
        let content = EseContent::parse_str(
            "
[POSITIONS]
;EDDM_X_TWR:Old Tower:118.700:MX:X:EDDM:TWR:::2301:2307
EDDM_TWR:Muenchen Tower:118.700:MT:T:EDDM:TWR:::2301:2307
[AIRSPACE]
;SECTOR:COMMENTED:0:100
",
            &navaids(),
            &EseOptions::default(),
        );

        let callsigns: Vec<&str> = content
            .positions
            .iter()
            .map(|position| position.callsign.as_str())
            .collect();
        assert_eq!(callsigns, ["EDDM_TWR"]);
        assert!(content.sectors.is_empty());
    }

    #[test]
    fn test_procedures_in_any_section() {
        let content = EseContent::parse_str(
            "
[POSITIONS]
SID:EDDM:26R:GIVMI1N:DM060 GIVMI
[AIRSPACE]
STAR:EDDM:08L:GIVMI1A:GIVMI DM060
SECTOR:A:0:100
",
            &navaids(),
            &EseOptions::default(),
        );

        assert!(content.positions.is_empty());
        let procedures: Vec<(ProcedureKind, &str)> = content
            .procedures
            .iter()
            .map(|procedure| (procedure.kind, procedure.name.as_str()))
            .collect();
        assert_eq!(
            procedures,
            vec![
                (ProcedureKind::Sid, "GIVMI1N"),
                (ProcedureKind::Star, "GIVMI1A"),
            ]
        );
        assert_eq!(content.sectors.len(), 1);
    }

    #[test]
    fn test_fresh_state_per_parse() {
        let input = "[AIRSPACE]\nSECTORLINE:A1\nSECTORLINE:B2\n";
        let first = EseContent::parse_str(input, &Navaids::default(), &EseOptions::default());
        let second = EseContent::parse_str(input, &Navaids::default(), &EseOptions::default());

        assert_eq!(first, second);
        assert_eq!(second.sector_lines[0].id, 690);
        assert_eq!(second.sector_lines[1].id, 691);
    }

    #[test]
    fn test_encoding_artifacts() {
        let content = EseContent::parse(
            b"[AIRSPACE]\r\nSECTOR:EDMM\xb7ALB:0:105\r\nOWNER:ALB\r\n",
            &Navaids::default(),
            &EseOptions::default(),
        )
        .unwrap();
        assert_eq!(content.sectors[0].name, "EDMM\u{b7}ALB");
        assert_eq!(content.sectors[0].ceiling, Some(105));

        let content = EseContent::parse_str(
            "[AIRSPACE]\nSECTOR:EDMM\u{fffd}ALB:0:105\n",
            &Navaids::default(),
            &EseOptions::default(),
        );
        assert_eq!(content.sectors[0].name, "EDMMALB");
    }

    #[test]
    fn test_serialized_shape() {
        let content = EseContent::parse_str(
            "
[AIRSPACE]
SECTORLINE:1
SECTOR:EDMM_ALB:GND:10500
BORDER:1
DISPLAY_SECTORLINE:1:EDMM_ALB:EDMM_FRK
SID:EDDM:26R:GIVMI1N:GIVMI
",
            &navaids(),
            &EseOptions::default(),
        );

        assert_eq_sorted!(
            serde_json::to_value(&content).unwrap(),
            json!({
                "positions": [],
                "procedure": [{
                    "type": "SID",
                    "icao": "EDDM",
                    "name": "GIVMI1N",
                    "runway": "26R",
                    "points": [{"name": "GIVMI", "lat": 48.4, "lon": 11.2, "type": "fix"}]
                }],
                "sectors": [{
                    "name": "EDMM_ALB",
                    "owners": [],
                    "borders": [1],
                    "depApts": [],
                    "arrApts": [],
                    "actives": [],
                    "floor": null,
                    "ceiling": 10500,
                    "displaySectorLines": [{
                        "borderId": 1,
                        "mySector": "EDMM_ALB",
                        "otherSectors": ["EDMM_FRK"]
                    }]
                }],
                "sectorLines": [{"id": 1, "points": [], "display": []}]
            })
        );
    }

    #[test]
    fn test_fixture() {
        let navaids = Navaids::from_path(PathBuf::from("./fixtures/navaids.json")).unwrap();
        let content = EseContent::from_path(
            PathBuf::from("./fixtures/sample.ese"),
            &navaids,
            &EseOptions::default(),
        )
        .unwrap();

        assert_eq!(content.positions.len(), 4);
        assert_eq!(content.positions[3].visibility_points.len(), 2);

        let lines: Vec<(u32, usize)> = content
            .sector_lines
            .iter()
            .map(|line| (line.id, line.points.len()))
            .collect();
        assert_eq!(
            lines,
            vec![(109, 3), (152, 2), (690, 4), (691, 11), (692, 0)]
        );

        let sectors: Vec<(&str, Vec<u32>)> = content
            .sectors
            .iter()
            .map(|sector| (sector.name.as_str(), sector.borders.clone()))
            .collect();
        assert_eq!(sectors[0], ("EDMM_ALB", vec![109, 152, 690]));
        assert_eq!(sectors[1], ("EDDM_TWR", vec![691]));
        assert_eq!(sectors[2], ("EDMM_EMPTY", vec![]));

        let names: Vec<&str> = content
            .procedures
            .iter()
            .map(|procedure| procedure.name.as_str())
            .collect();
        assert_eq!(names, ["GIVMI1N", "UPALA1V"]);
        assert_eq!(
            content.procedures[0]
                .points
                .iter()
                .map(|navaid| (navaid.name.as_str(), navaid.lat))
                .collect::<Vec<_>>(),
            vec![("DM060", 48.25), ("ROKIL", 48.5)]
        );

        assert!(matches!(
            EseContent::from_path(
                PathBuf::from("./fixtures/missing.ese"),
                &navaids,
                &EseOptions::default()
            ),
            Err(EseError::FileRead(_))
        ));
    }
}
