//! Race, sprint and qualifying result models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{EntityId, QualifyingId, ResultId};

/// Position order assigned to results without a numeric position.
pub const UNCLASSIFIED_ORDER: u32 = 99;

/// Points-scoring session a result belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Session {
    #[default]
    Race,
    Sprint,
}

impl Session {
    pub fn as_str(&self) -> &'static str {
        match self {
            Session::Race => "race",
            Session::Sprint => "sprint",
        }
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entrant's result in a race or sprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceResult {
    /// Derived from season + round + session + driver key
    pub id: ResultId,

    pub season: u16,

    pub round: u32,

    #[serde(default)]
    pub session: Session,

    pub driver_key: String,

    pub driver_name: String,

    pub constructor_key: String,

    pub constructor_name: String,

    pub points: Decimal,

    /// Classified finishing position; `None` when retired, disqualified etc.
    pub position: Option<u32>,

    /// Upstream position text ("1", "R", "D", ...)
    pub position_text: String,

    /// Ordering key that sorts unclassified entrants last
    pub position_order: u32,

    pub grid: Option<u32>,

    pub laps: Option<u32>,

    /// e.g. "Finished", "+1 Lap", "Engine"
    pub status: String,

    /// Race time or gap text
    pub time: Option<String>,

    pub millis: Option<u64>,

    pub fastest_lap: Option<u32>,

    pub fastest_lap_rank: Option<u32>,

    pub fastest_lap_time: Option<String>,

    pub fastest_lap_speed: Option<String>,
}

impl RaceResult {
    /// Create a result with the identifying fields; everything else starts empty.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        season: u16,
        round: u32,
        session: Session,
        driver_key: String,
        driver_name: String,
        constructor_key: String,
        constructor_name: String,
        points: Decimal,
    ) -> Self {
        let id = Self::identity_id(season, round, session, &driver_key);

        Self {
            id,
            season,
            round,
            session,
            driver_key,
            driver_name,
            constructor_key,
            constructor_name,
            points,
            position: None,
            position_text: "R".to_string(),
            position_order: UNCLASSIFIED_ORDER,
            grid: None,
            laps: None,
            status: String::new(),
            time: None,
            millis: None,
            fastest_lap: None,
            fastest_lap_rank: None,
            fastest_lap_time: None,
            fastest_lap_speed: None,
        }
    }

    /// Row ID for a (season, round, session, driver) identity.
    pub fn identity_id(season: u16, round: u32, session: Session, driver_key: &str) -> ResultId {
        EntityId::generate(&[
            &season.to_string(),
            &round.to_string(),
            session.as_str(),
            driver_key,
        ])
    }

    /// Builder method to set a classified position.
    pub fn with_position(mut self, position: u32) -> Self {
        self.position = Some(position);
        self.position_text = position.to_string();
        self.position_order = position;
        self
    }

    /// Builder method to set an unclassified outcome ("R", "D", ...).
    pub fn with_unclassified(mut self, position_text: &str, position_order: u32) -> Self {
        self.position = None;
        self.position_text = position_text.to_string();
        self.position_order = position_order;
        self
    }

    /// Builder method to set status text.
    pub fn with_status(mut self, status: &str) -> Self {
        self.status = status.to_string();
        self
    }

    /// Builder method to set grid slot and laps completed.
    pub fn with_grid_and_laps(mut self, grid: u32, laps: u32) -> Self {
        self.grid = Some(grid);
        self.laps = Some(laps);
        self
    }

    pub fn is_win(&self) -> bool {
        self.position == Some(1)
    }

    pub fn is_podium(&self) -> bool {
        matches!(self.position, Some(p) if p <= 3)
    }
}

/// One entrant's qualifying result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualifyingResult {
    /// Derived from season + round + driver key
    pub id: QualifyingId,

    pub season: u16,

    pub round: u32,

    pub driver_key: String,

    pub constructor_key: String,

    pub position: u32,

    /// Car number
    pub number: Option<u32>,

    pub q1: Option<String>,

    pub q2: Option<String>,

    pub q3: Option<String>,
}

impl QualifyingResult {
    pub fn new(
        season: u16,
        round: u32,
        driver_key: String,
        constructor_key: String,
        position: u32,
    ) -> Self {
        let id = Self::identity_id(season, round, &driver_key);

        Self {
            id,
            season,
            round,
            driver_key,
            constructor_key,
            position,
            number: None,
            q1: None,
            q2: None,
            q3: None,
        }
    }

    pub fn identity_id(season: u16, round: u32, driver_key: &str) -> QualifyingId {
        EntityId::generate(&[
            &season.to_string(),
            &round.to_string(),
            "qualifying",
            driver_key,
        ])
    }

    /// Best lap across the three parts, as upstream text; Q3 beats Q2 beats Q1.
    pub fn best_time(&self) -> Option<&str> {
        self.q3
            .as_deref()
            .or(self.q2.as_deref())
            .or(self.q1.as_deref())
    }
}
