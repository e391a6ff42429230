//! Data-access handle over the JSONL data lake.
//!
//! `F1Store` is built once at startup and handed to the API state and the
//! seeders. Upserts are insert-if-absent keyed on each entity's identity,
//! so re-running a seed leaves the lake unchanged.

use std::collections::HashSet;
use std::hash::Hash;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info};

use super::{entity_path, list_seasons, EntityType, JsonlReader, JsonlWriter, StorageConfig, StorageError};
use crate::models::{Circuit, Constructor, Driver, QualifyingResult, Race, RaceResult};

/// Counts from one upsert call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub inserted: usize,
    pub skipped: usize,
}

impl UpsertOutcome {
    pub fn merge(&mut self, other: UpsertOutcome) {
        self.inserted += other.inserted;
        self.skipped += other.skipped;
    }
}

/// Handle to the local F1 data lake.
pub struct F1Store {
    config: StorageConfig,
    /// Serializes read-modify-write cycles on the JSONL files
    write_lock: Mutex<()>,
}

impl F1Store {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            write_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    fn path(&self, entity: EntityType, season: Option<u16>) -> Result<PathBuf, StorageError> {
        entity_path(&self.config, entity, season)
    }

    fn read<T: DeserializeOwned>(
        &self,
        entity: EntityType,
        season: Option<u16>,
    ) -> Result<Vec<T>, StorageError> {
        JsonlReader::new(self.path(entity, season)?).read_all()
    }

    fn upsert<T, K, F>(
        &self,
        entity: EntityType,
        season: Option<u16>,
        incoming: Vec<T>,
        identity: F,
    ) -> Result<UpsertOutcome, StorageError>
    where
        T: Serialize + DeserializeOwned,
        K: Eq + Hash,
        F: Fn(&T) -> K,
    {
        let path = self.path(entity, season)?;
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let existing: Vec<T> = JsonlReader::new(path.clone()).read_all()?;
        let mut seen: HashSet<K> = existing.iter().map(&identity).collect();

        let mut fresh = Vec::new();
        let mut skipped = 0;
        for item in incoming {
            if seen.insert(identity(&item)) {
                fresh.push(item);
            } else {
                skipped += 1;
            }
        }

        let inserted = JsonlWriter::new(path).append_batch(&fresh)?;
        debug!(
            "Upserted {}: {} inserted, {} skipped",
            entity.filename(),
            inserted,
            skipped
        );

        Ok(UpsertOutcome { inserted, skipped })
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub fn drivers(&self) -> Result<Vec<Driver>, StorageError> {
        self.read(EntityType::Driver, None)
    }

    pub fn driver(&self, key: &str) -> Result<Option<Driver>, StorageError> {
        Ok(self.drivers()?.into_iter().find(|d| d.key == key))
    }

    pub fn constructors(&self) -> Result<Vec<Constructor>, StorageError> {
        self.read(EntityType::Constructor, None)
    }

    pub fn constructor(&self, key: &str) -> Result<Option<Constructor>, StorageError> {
        Ok(self.constructors()?.into_iter().find(|c| c.key == key))
    }

    pub fn circuits(&self) -> Result<Vec<Circuit>, StorageError> {
        self.read(EntityType::Circuit, None)
    }

    /// A season's calendar, ordered by round.
    pub fn races(&self, season: u16) -> Result<Vec<Race>, StorageError> {
        let mut races: Vec<Race> = self.read(EntityType::Race, Some(season))?;
        races.sort_by_key(|r| r.round);
        Ok(races)
    }

    pub fn race(&self, season: u16, round: u32) -> Result<Option<Race>, StorageError> {
        Ok(self.races(season)?.into_iter().find(|r| r.round == round))
    }

    /// Every race and sprint result of a season, in stored order.
    pub fn results(&self, season: u16) -> Result<Vec<RaceResult>, StorageError> {
        self.read(EntityType::Result, Some(season))
    }

    /// Results of one round: race before sprint, then by finishing order.
    pub fn race_results(&self, season: u16, round: u32) -> Result<Vec<RaceResult>, StorageError> {
        let mut results: Vec<RaceResult> = JsonlReader::new(self.path(EntityType::Result, Some(season))?)
            .read_where(|r: &RaceResult| r.round == round)?;
        results.sort_by_key(|r| (r.session, r.position_order));
        Ok(results)
    }

    /// One driver's results for a season, ordered by round.
    pub fn driver_results(&self, season: u16, driver_key: &str) -> Result<Vec<RaceResult>, StorageError> {
        let mut results: Vec<RaceResult> = JsonlReader::new(self.path(EntityType::Result, Some(season))?)
            .read_where(|r: &RaceResult| r.driver_key == driver_key)?;
        results.sort_by_key(|r| (r.round, r.session));
        Ok(results)
    }

    pub fn qualifying(&self, season: u16) -> Result<Vec<QualifyingResult>, StorageError> {
        self.read(EntityType::Qualifying, Some(season))
    }

    pub fn seasons(&self) -> Result<Vec<u16>, StorageError> {
        list_seasons(&self.config)
    }

    /// Most recent season that has at least one stored result.
    pub fn latest_season(&self) -> Result<Option<u16>, StorageError> {
        for season in self.seasons()?.into_iter().rev() {
            if JsonlReader::<RaceResult>::new(self.path(EntityType::Result, Some(season))?).count()? > 0 {
                return Ok(Some(season));
            }
        }
        Ok(None)
    }

    // ── Upserts ──────────────────────────────────────────────────────

    pub fn upsert_drivers(&self, drivers: Vec<Driver>) -> Result<UpsertOutcome, StorageError> {
        self.upsert(EntityType::Driver, None, drivers, |d: &Driver| d.key.clone())
    }

    pub fn upsert_constructors(
        &self,
        constructors: Vec<Constructor>,
    ) -> Result<UpsertOutcome, StorageError> {
        self.upsert(EntityType::Constructor, None, constructors, |c: &Constructor| {
            c.key.clone()
        })
    }

    pub fn upsert_circuits(&self, circuits: Vec<Circuit>) -> Result<UpsertOutcome, StorageError> {
        self.upsert(EntityType::Circuit, None, circuits, |c: &Circuit| c.key.clone())
    }

    /// Replace stored placeholder circuits with complete incoming rows of
    /// the same key. Returns how many rows were replaced.
    pub fn repair_circuits(&self, circuits: &[Circuit]) -> Result<usize, StorageError> {
        let complete: Vec<&Circuit> = circuits.iter().filter(|c| !c.is_placeholder()).collect();
        if complete.is_empty() {
            return Ok(0);
        }

        let path = self.path(EntityType::Circuit, None)?;
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut stored: Vec<Circuit> = JsonlReader::new(path.clone()).read_all()?;
        let mut repaired = 0;
        for row in stored.iter_mut().filter(|c| c.is_placeholder()) {
            if let Some(full) = complete.iter().find(|c| c.key == row.key) {
                *row = (*full).clone();
                repaired += 1;
            }
        }

        if repaired > 0 {
            JsonlWriter::new(path).write_all(&stored)?;
            info!("Repaired {} placeholder circuits", repaired);
        }
        Ok(repaired)
    }

    /// Insert races that are not yet in their season's calendar.
    /// Races are grouped by season so one call may span several.
    pub fn upsert_races(&self, races: Vec<Race>) -> Result<UpsertOutcome, StorageError> {
        let mut outcome = UpsertOutcome::default();
        for (season, batch) in group_by_season(races, |r| r.season) {
            outcome.merge(self.upsert(EntityType::Race, Some(season), batch, Race::identity)?);
        }
        Ok(outcome)
    }

    pub fn upsert_results(&self, results: Vec<RaceResult>) -> Result<UpsertOutcome, StorageError> {
        let mut outcome = UpsertOutcome::default();
        for (season, batch) in group_by_season(results, |r| r.season) {
            outcome.merge(self.upsert(EntityType::Result, Some(season), batch, |r: &RaceResult| {
                r.id.clone()
            })?);
        }
        Ok(outcome)
    }

    pub fn upsert_qualifying(
        &self,
        results: Vec<QualifyingResult>,
    ) -> Result<UpsertOutcome, StorageError> {
        let mut outcome = UpsertOutcome::default();
        for (season, batch) in group_by_season(results, |q| q.season) {
            outcome.merge(self.upsert(
                EntityType::Qualifying,
                Some(season),
                batch,
                |q: &QualifyingResult| q.id.clone(),
            )?);
        }
        Ok(outcome)
    }

    /// Flag a stored race as a sprint weekend. Returns false when the race
    /// is unknown or already flagged.
    pub fn mark_sprint_weekend(&self, season: u16, round: u32) -> Result<bool, StorageError> {
        let path = self.path(EntityType::Race, Some(season))?;
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut races: Vec<Race> = JsonlReader::new(path.clone()).read_all()?;
        let Some(race) = races.iter_mut().find(|r| r.round == round) else {
            return Ok(false);
        };
        if race.has_sprint {
            return Ok(false);
        }
        race.has_sprint = true;

        JsonlWriter::new(path).write_all(&races)?;
        info!("Marked {} round {} as a sprint weekend", season, round);
        Ok(true)
    }
}

/// Split items by season, keeping the order seasons first appear in.
fn group_by_season<T>(items: Vec<T>, season_of: impl Fn(&T) -> u16) -> Vec<(u16, Vec<T>)> {
    let mut groups: Vec<(u16, Vec<T>)> = Vec::new();
    for item in items {
        let season = season_of(&item);
        match groups.iter_mut().find(|(s, _)| *s == season) {
            Some((_, batch)) => batch.push(item),
            None => groups.push((season, vec![item])),
        }
    }
    groups
}
