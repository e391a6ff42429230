//! Driver and constructor models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A Formula 1 driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    /// Upstream driver identifier (e.g. "max_verstappen")
    pub key: String,

    pub given_name: String,

    pub family_name: String,

    /// Three-letter code (e.g. "VER")
    pub code: Option<String>,

    /// Permanent car number
    pub permanent_number: Option<u32>,

    pub nationality: String,

    pub date_of_birth: Option<NaiveDate>,

    /// Wikipedia URL
    pub url: Option<String>,
}

impl Driver {
    pub fn new(key: String, given_name: String, family_name: String, nationality: String) -> Self {
        Self {
            key,
            given_name,
            family_name,
            code: None,
            permanent_number: None,
            nationality,
            date_of_birth: None,
            url: None,
        }
    }

    /// Full name as shown in standings.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.given_name, self.family_name)
    }
}

/// A constructor (team).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constructor {
    /// Upstream constructor identifier (e.g. "red_bull")
    pub key: String,

    pub name: String,

    pub nationality: String,

    pub url: Option<String>,
}

impl Constructor {
    pub fn new(key: String, name: String, nationality: String) -> Self {
        Self {
            key,
            name,
            nationality,
            url: None,
        }
    }
}
