use std::{io, path::Path};

use bevy_reflect::Reflect;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OptionsError {
    #[error("failed to read parse options: {0}")]
    FileRead(#[from] io::Error),
    #[error("failed to deserialize parse options: {0}")]
    Deserialize(#[from] serde_json::Error),
}

pub type OptionsResult = Result<EseOptions, OptionsError>;

/// Settings for a single parse, fixed before the parse starts.
#[derive(Clone, Debug, Reflect, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct EseOptions {
    /// Derive position callsigns as `sector[_subSector]_facility` instead of
    /// taking the first record field verbatim.
    pub compose_callsigns: bool,
    /// First id handed out to non-numeric sector line identifiers.
    pub synthetic_id_base: u32,
}

impl Default for EseOptions {
    fn default() -> Self {
        Self {
            compose_callsigns: false,
            synthetic_id_base: 690,
        }
    }
}

impl EseOptions {
    pub fn from_json(content: &[u8]) -> OptionsResult {
        Ok(serde_json::from_slice(content)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> OptionsResult {
        Self::from_json(&fs_err::read(path)?)
    }
}
