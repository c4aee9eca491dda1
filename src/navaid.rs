use std::{io, path::Path};

use bevy_derive::{Deref, DerefMut};
use bevy_reflect::Reflect;
use geo::{point, Point};
use multimap::MultiMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NavaidError {
    #[error("failed to read navaids: {0}")]
    FileRead(#[from] io::Error),
    #[error("failed to deserialize navaids: {0}")]
    Deserialize(#[from] serde_json::Error),
}

#[derive(Clone, Copy, Debug, Reflect, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NavaidKind {
    Vor,
    Ndb,
    Fix,
    Airport,
}

/// Named reference point supplied by the navigation data extraction.
#[derive(Clone, Debug, Reflect, Serialize, Deserialize, PartialEq)]
pub struct Navaid {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(rename = "type")]
    pub kind: NavaidKind,
}

impl Navaid {
    pub fn point(&self) -> Point {
        point! { x: self.lon, y: self.lat }
    }
}

/// Navaids indexed by name, keeping every entry of reused names in input order.
#[derive(Clone, Debug, Default, Deref, DerefMut)]
pub struct Navaids(MultiMap<String, Navaid>);

impl Navaids {
    /// All navaids named exactly `name`, in input order.
    pub fn find(&self, name: &str) -> &[Navaid] {
        self.0.get_vec(name).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn from_path(path: impl AsRef<Path>) -> NavaidsResult {
        parse_navaids_json(&fs_err::read(path)?)
    }
}

impl FromIterator<Navaid> for Navaids {
    fn from_iter<I: IntoIterator<Item = Navaid>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|navaid| (navaid.name.clone(), navaid))
                .collect(),
        )
    }
}

pub type NavaidsResult = Result<Navaids, NavaidError>;

/// Parses a JSON array of `{name, lat, lon, type}` objects.
pub fn parse_navaids_json(content: &[u8]) -> NavaidsResult {
    let navaids: Vec<Navaid> = serde_json::from_slice(content)?;
    Ok(navaids.into_iter().collect())
}
