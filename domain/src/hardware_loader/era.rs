use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// A bundle of hardware seed data for one generation of machines.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Era {
    Retro,
    RetroExtended,
    Modern,
}

#[derive(Debug, PartialEq, Eq)]
pub struct EraParseError;

impl Era {
    pub const ALL: [Era; 3] = [Era::Retro, Era::RetroExtended, Era::Modern];

    /// Canonical identifier, the value persisted in the settings table.
    pub fn as_str(&self) -> &'static str {
        match self {
            Era::Retro => "retro",
            Era::RetroExtended => "retroextended",
            Era::Modern => "modern",
        }
    }

    /// Seed file names in the order they must be applied. Later files may
    /// reference rows inserted by earlier ones.
    pub fn seed_file_names(&self) -> &'static [&'static str] {
        match self {
            Era::Retro => &["retro_hardware_2005.sql"],
            Era::RetroExtended => &[
                "retro_hardware_2005.sql",
                "retro_hardware_extended_2008.sql",
            ],
            Era::Modern => &["modern_hardware.sql"],
        }
    }

    /// Seed file paths under `seed_dir`, in application order.
    pub fn seed_files(&self, seed_dir: &Path) -> Vec<PathBuf> {
        self.seed_file_names()
            .iter()
            .map(|name| seed_dir.join(name))
            .collect()
    }

    /// Comma separated list of canonical identifiers, for log messages.
    pub fn known() -> String {
        Era::ALL
            .iter()
            .map(Era::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromStr for Era {
    type Err = EraParseError;

    fn from_str(era: &str) -> Result<Era, Self::Err> {
        match era.trim().to_lowercase().as_str() {
            "retro" => Ok(Era::Retro),
            "retroextended" | "retro-extended" | "retro_extended" => Ok(Era::RetroExtended),
            "modern" => Ok(Era::Modern),
            _ => Err(EraParseError),
        }
    }
}

impl fmt::Display for Era {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
