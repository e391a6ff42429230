//! Championship standings aggregation.
//!
//! Folds a season's per-race results into ranked driver or constructor
//! tables:
//! - points are summed as exact decimals
//! - ties on points are broken by wins, then by best single finish
//! - remaining ties keep the order in which entities were first seen
//!
//! Input is assumed well formed: points are summed as given and finish
//! positions are expected to be positive.

use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{EntityKind, RaceResult, Session, StandingEntry};

/// Best-finish value for an entity that never classified.
const UNCLASSIFIED_FINISH: u32 = 999;

/// One (race, entrant) row as seen by the aggregator.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRecord {
    pub driver_key: String,
    pub constructor_key: String,
    pub driver_name: String,
    pub constructor_name: String,
    pub points: Decimal,
    /// `None` for retired, disqualified or otherwise unclassified entrants
    pub finish_position: Option<u32>,
}

impl From<&RaceResult> for ResultRecord {
    /// Sprint rows keep their points but carry no finish position, so a
    /// sprint win never counts as a Grand Prix win.
    fn from(result: &RaceResult) -> Self {
        let finish_position = match result.session {
            Session::Race => result.position,
            Session::Sprint => None,
        };

        Self {
            driver_key: result.driver_key.clone(),
            constructor_key: result.constructor_key.clone(),
            driver_name: result.driver_name.clone(),
            constructor_name: result.constructor_name.clone(),
            points: result.points,
            finish_position,
        }
    }
}

/// Aggregator input for a whole season, race and sprint sessions combined.
pub fn season_records(results: &[RaceResult]) -> Vec<ResultRecord> {
    results.iter().map(ResultRecord::from).collect()
}

#[derive(Debug)]
struct Tally {
    name: String,
    constructor: Option<String>,
    points: Decimal,
    wins: u32,
    best_finish: u32,
}

impl Tally {
    fn new() -> Self {
        Self {
            name: String::new(),
            constructor: None,
            points: Decimal::ZERO,
            wins: 0,
            best_finish: UNCLASSIFIED_FINISH,
        }
    }
}

/// Rank drivers or constructors from a season's result records.
///
/// Positions are assigned `1..=n` with no shared places, even on a full
/// tie. Empty input gives an empty table.
pub fn compute_standings(results: &[ResultRecord], entity: EntityKind) -> Vec<StandingEntry> {
    let mut tallies: IndexMap<&str, Tally> = IndexMap::new();

    for record in results {
        let (key, name) = match entity {
            EntityKind::Driver => (record.driver_key.as_str(), &record.driver_name),
            EntityKind::Constructor => (record.constructor_key.as_str(), &record.constructor_name),
        };

        let tally = tallies.entry(key).or_insert_with(Tally::new);

        // Last writer wins for labels
        tally.name.clone_from(name);
        if entity == EntityKind::Driver {
            tally.constructor = Some(record.constructor_name.clone());
        }

        tally.points += record.points;
        if record.finish_position == Some(1) {
            tally.wins += 1;
        }
        let finish = record.finish_position.unwrap_or(UNCLASSIFIED_FINISH);
        tally.best_finish = tally.best_finish.min(finish);
    }

    let mut ranked: Vec<(&str, Tally)> = tallies.into_iter().collect();

    // sort_by is stable, so residual ties keep first-seen order
    ranked.sort_by(|(_, a), (_, b)| {
        b.points
            .cmp(&a.points)
            .then_with(|| b.wins.cmp(&a.wins))
            .then_with(|| a.best_finish.cmp(&b.best_finish))
    });

    ranked
        .into_iter()
        .zip(1u32..)
        .map(|((key, tally), position)| StandingEntry {
            position,
            key: key.to_string(),
            name: tally.name,
            constructor: tally.constructor,
            points: tally.points,
            wins: tally.wins,
            best_finish: (tally.best_finish < UNCLASSIFIED_FINISH).then_some(tally.best_finish),
        })
        .collect()
}

/// A single driver's season at a glance.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct DriverSeasonSummary {
    /// Grands Prix started (sprints excluded)
    pub races: u32,
    pub points: Decimal,
    pub wins: u32,
    pub podiums: u32,
    pub best_finish: Option<u32>,
    pub sprint_points: Decimal,
}

/// Summarize one driver's results. Callers pass only that driver's rows.
pub fn summarize_driver(results: &[RaceResult]) -> DriverSeasonSummary {
    let mut summary = DriverSeasonSummary::default();

    for result in results {
        summary.points += result.points;
        match result.session {
            Session::Sprint => summary.sprint_points += result.points,
            Session::Race => {
                summary.races += 1;
                if result.is_win() {
                    summary.wins += 1;
                }
                if result.is_podium() {
                    summary.podiums += 1;
                }
                if let Some(p) = result.position {
                    summary.best_finish = Some(summary.best_finish.map_or(p, |b| b.min(p)));
                }
            }
        }
    }

    summary
}
