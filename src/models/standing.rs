//! Championship standings model.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which championship a standings table ranks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Driver,
    Constructor,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Driver => "driver",
            EntityKind::Constructor => "constructor",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    /// Accepts singular and plural forms, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "driver" | "drivers" => Ok(EntityKind::Driver),
            "constructor" | "constructors" | "team" | "teams" => Ok(EntityKind::Constructor),
            other => Err(format!(
                "unknown standings type '{}', expected 'drivers' or 'constructors'",
                other
            )),
        }
    }
}

/// One row of a driver or constructor championship table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandingEntry {
    /// 1-based rank, contiguous, never shared
    pub position: u32,

    /// Driver or constructor key
    pub key: String,

    /// Display name of the ranked entity
    pub name: String,

    /// Team last associated with a driver; `None` in constructor tables
    pub constructor: Option<String>,

    pub points: Decimal,

    pub wins: u32,

    /// Best classified finish; `None` if the entity never classified
    pub best_finish: Option<u32>,
}
