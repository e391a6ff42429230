//! Seeding orchestrator.
//!
//! Pulls a season from the remote source and writes it into the store:
//! 1. Calendar (circuits and races)
//! 2. Race results
//! 3. Sprint results
//! 4. Qualifying, round by round
//!
//! Every write is an insert-if-absent upsert, so seeds can be re-run.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::jolpica::{F1Source, JolpicaError, RoundData, SeasonRef};
use crate::models::Circuit;
use crate::storage::{F1Store, StorageError, UpsertOutcome};

/// Rounds probed for qualifying when no limit is given.
pub const DEFAULT_MAX_ROUND: u32 = 24;

/// Errors that can occur during seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Source error: {0}")]
    Source(#[from] JolpicaError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// What to seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeedTarget {
    Calendar,
    Results,
    Sprint,
    Qualifying,
    All,
}

impl SeedTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeedTarget::Calendar => "calendar",
            SeedTarget::Results => "results",
            SeedTarget::Sprint => "sprint",
            SeedTarget::Qualifying => "qualifying",
            SeedTarget::All => "all",
        }
    }
}

impl fmt::Display for SeedTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeedTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "calendar" => Ok(SeedTarget::Calendar),
            "results" => Ok(SeedTarget::Results),
            "sprint" | "sprints" => Ok(SeedTarget::Sprint),
            "qualifying" => Ok(SeedTarget::Qualifying),
            "all" => Ok(SeedTarget::All),
            other => Err(format!(
                "unknown seed target '{}', expected calendar, results, sprint, qualifying or all",
                other
            )),
        }
    }
}

/// Outcome of one seed operation.
#[derive(Debug, Clone, Serialize)]
pub struct SeedReport {
    pub target: SeedTarget,
    pub season: u16,
    /// Primary rows received (races for the calendar, result rows otherwise)
    pub fetched: usize,
    pub inserted: usize,
    pub skipped: usize,
    /// Placeholder circuits replaced with complete rows
    pub repaired_circuits: usize,
    /// Rounds the source had no data for
    pub missing_rounds: Vec<u32>,
    pub errors: Vec<String>,
    pub duration: Duration,
}

impl SeedReport {
    fn new(target: SeedTarget, season: u16) -> Self {
        Self {
            target,
            season,
            fetched: 0,
            inserted: 0,
            skipped: 0,
            repaired_circuits: 0,
            missing_rounds: Vec::new(),
            errors: Vec::new(),
            duration: Duration::ZERO,
        }
    }

    fn record(&mut self, outcome: UpsertOutcome) {
        self.inserted += outcome.inserted;
        self.skipped += outcome.skipped;
    }

    fn finish(mut self, start: Instant) -> Self {
        self.duration = start.elapsed();
        info!(
            "Seeded {} {}: {} fetched, {} inserted, {} skipped in {:?}",
            self.season, self.target, self.fetched, self.inserted, self.skipped, self.duration
        );
        self
    }
}

/// Which rows of a round count towards the report.
#[derive(Clone, Copy)]
enum Primary {
    Races,
    Results,
    Qualifying,
}

pub struct Seeder {
    source: Arc<dyn F1Source>,
    store: Arc<F1Store>,
    dry_run: bool,
}

impl Seeder {
    pub fn new(source: Arc<dyn F1Source>, store: Arc<F1Store>) -> Self {
        Self {
            source,
            store,
            dry_run: false,
        }
    }

    /// Fetch and convert without writing anything.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Run one target; `All` yields one report per stage.
    pub async fn seed(
        &self,
        target: SeedTarget,
        season: u16,
        max_round: u32,
    ) -> Result<Vec<SeedReport>, SeedError> {
        Ok(match target {
            SeedTarget::Calendar => vec![self.seed_calendar(season).await?],
            SeedTarget::Results => vec![self.seed_results(season).await?],
            SeedTarget::Sprint => vec![self.seed_sprint(season).await?],
            SeedTarget::Qualifying => vec![self.seed_qualifying(season, max_round).await?],
            SeedTarget::All => self.seed_all(season, max_round).await?,
        })
    }

    pub async fn seed_calendar(&self, season: u16) -> Result<SeedReport, SeedError> {
        let start = Instant::now();
        let mut report = SeedReport::new(SeedTarget::Calendar, season);

        let rounds = self.source.season_calendar(SeasonRef::Year(season)).await?;
        for round in rounds {
            self.store_round(round, Primary::Races, &mut report)?;
        }

        Ok(report.finish(start))
    }

    pub async fn seed_results(&self, season: u16) -> Result<SeedReport, SeedError> {
        let start = Instant::now();
        let mut report = SeedReport::new(SeedTarget::Results, season);

        let rounds = self.source.season_results(season).await?;
        for round in rounds {
            self.store_round(round, Primary::Results, &mut report)?;
        }

        Ok(report.finish(start))
    }

    pub async fn seed_sprint(&self, season: u16) -> Result<SeedReport, SeedError> {
        let start = Instant::now();
        let mut report = SeedReport::new(SeedTarget::Sprint, season);

        let rounds = self.source.sprint_results(season).await?;
        for round in rounds {
            let identity = round.race.as_ref().map(|r| r.identity());
            self.store_round(round, Primary::Results, &mut report)?;

            if let (Some((season, number)), false) = (identity, self.dry_run) {
                self.store.mark_sprint_weekend(season, number)?;
            }
        }

        Ok(report.finish(start))
    }

    /// Qualifying is fetched per round. Rounds without data are listed in
    /// `missing_rounds`; failed rounds are logged and skipped.
    pub async fn seed_qualifying(&self, season: u16, max_round: u32) -> Result<SeedReport, SeedError> {
        let start = Instant::now();
        let mut report = SeedReport::new(SeedTarget::Qualifying, season);

        for number in 1..=max_round {
            match self.source.qualifying(season, number).await {
                Ok(Some(round)) => self.store_round(round, Primary::Qualifying, &mut report)?,
                Ok(None) => {
                    debug!("No qualifying for {} round {}", season, number);
                    report.missing_rounds.push(number);
                }
                Err(e) => {
                    warn!("Qualifying for {} round {} failed: {}", season, number, e);
                    report.errors.push(format!("round {}: {}", number, e));
                }
            }
        }

        Ok(report.finish(start))
    }

    pub async fn seed_all(&self, season: u16, max_round: u32) -> Result<Vec<SeedReport>, SeedError> {
        Ok(vec![
            self.seed_calendar(season).await?,
            self.seed_results(season).await?,
            self.seed_sprint(season).await?,
            self.seed_qualifying(season, max_round).await?,
        ])
    }

    /// Write a round's entities in dependency order: circuit, race,
    /// participants, then result rows.
    fn store_round(
        &self,
        round: RoundData,
        primary: Primary,
        report: &mut SeedReport,
    ) -> Result<(), SeedError> {
        report.fetched += match primary {
            Primary::Races => usize::from(round.race.is_some()),
            Primary::Results => round.results.len(),
            Primary::Qualifying => round.qualifying.len(),
        };

        if self.dry_run {
            return Ok(());
        }

        // A race whose circuit is unknown still gets a circuit row
        let circuit = round.circuit.or_else(|| {
            round
                .race
                .as_ref()
                .map(|race| Circuit::placeholder(&race.circuit_key))
        });
        if let Some(circuit) = circuit {
            report.repaired_circuits += self.store.repair_circuits(std::slice::from_ref(&circuit))?;
            self.store.upsert_circuits(vec![circuit])?;
        }

        let races = self.store.upsert_races(round.race.into_iter().collect())?;
        self.store.upsert_drivers(round.drivers)?;
        self.store.upsert_constructors(round.constructors)?;
        let results = self.store.upsert_results(round.results)?;
        let qualifying = self.store.upsert_qualifying(round.qualifying)?;

        report.record(match primary {
            Primary::Races => races,
            Primary::Results => results,
            Primary::Qualifying => qualifying,
        });
        Ok(())
    }
}

/// Stored data for one round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundCheck {
    pub round: u32,
    pub name: String,
    pub results: usize,
    pub qualifying: usize,
}

/// Coverage of a stored season.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyReport {
    pub season: u16,
    pub rounds: Vec<RoundCheck>,
    pub total_results: usize,
    /// Calendar rounds with no stored results
    pub missing_results: Vec<u32>,
}

pub fn verify_season(store: &F1Store, season: u16) -> Result<VerifyReport, StorageError> {
    let races = store.races(season)?;
    let results = store.results(season)?;
    let qualifying = store.qualifying(season)?;

    let rounds: Vec<RoundCheck> = races
        .iter()
        .map(|race| RoundCheck {
            round: race.round,
            name: race.name.clone(),
            results: results.iter().filter(|r| r.round == race.round).count(),
            qualifying: qualifying.iter().filter(|q| q.round == race.round).count(),
        })
        .collect();

    let missing_results = rounds
        .iter()
        .filter(|r| r.results == 0)
        .map(|r| r.round)
        .collect();

    Ok(VerifyReport {
        season,
        rounds,
        total_results: results.len(),
        missing_results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jolpica::convert::round_from_dto;
    use crate::jolpica::dto::fixtures::{QUALIFYING, RESULTS_PAGE, RESULTS_PAGE_2};
    use crate::jolpica::dto::{RaceTableBody, Response};
    use crate::jolpica::mock::MockSource;
    use crate::models::Session;
    use crate::storage::StorageConfig;
    use tempfile::TempDir;

    fn round(json: &str, session: Session) -> RoundData {
        let response: Response<RaceTableBody> = serde_json::from_str(json).unwrap();
        round_from_dto(&response.data.table.race_table.races[0], session).unwrap()
    }

    fn calendar_round() -> RoundData {
        let mut data = round(RESULTS_PAGE, Session::Race);
        data.drivers.clear();
        data.constructors.clear();
        data.results.clear();
        data
    }

    fn sprint_round() -> RoundData {
        let mut data = round(RESULTS_PAGE, Session::Race);
        data.results = data
            .results
            .into_iter()
            .map(|r| {
                let mut sprint = crate::models::RaceResult::new(
                    r.season,
                    r.round,
                    Session::Sprint,
                    r.driver_key,
                    r.driver_name,
                    r.constructor_key,
                    r.constructor_name,
                    rust_decimal::Decimal::new(8, 0),
                );
                sprint.position_order = 1;
                sprint
            })
            .collect();
        data
    }

    fn seeder(source: MockSource, temp_dir: &TempDir) -> (Seeder, Arc<F1Store>) {
        let store = Arc::new(F1Store::new(StorageConfig::new(temp_dir.path().to_path_buf())));
        (Seeder::new(Arc::new(source), store.clone()), store)
    }

    #[tokio::test]
    async fn test_seed_results_writes_round() {
        let temp_dir = TempDir::new().unwrap();
        let source = MockSource {
            results: vec![round(RESULTS_PAGE, Session::Race)],
            ..Default::default()
        };
        let (seeder, store) = seeder(source, &temp_dir);

        let report = seeder.seed_results(2024).await.unwrap();

        assert_eq!(report.fetched, 2);
        assert_eq!(report.inserted, 2);
        assert_eq!(store.results(2024).unwrap().len(), 2);
        assert_eq!(store.drivers().unwrap().len(), 2);
        assert_eq!(store.constructors().unwrap().len(), 1);
        assert_eq!(store.circuits().unwrap()[0].key, "bahrain");
        assert_eq!(store.race(2024, 1).unwrap().unwrap().name, "Bahrain Grand Prix");
    }

    #[tokio::test]
    async fn test_seed_results_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let source = MockSource {
            results: vec![round(RESULTS_PAGE, Session::Race), round(RESULTS_PAGE_2, Session::Race)],
            ..Default::default()
        };
        let (seeder, store) = seeder(source, &temp_dir);

        let first = seeder.seed_results(2024).await.unwrap();
        let second = seeder.seed_results(2024).await.unwrap();

        assert_eq!(first.inserted, 3);
        assert_eq!(second.inserted, 0);
        assert_eq!(second.skipped, 3);
        assert_eq!(store.results(2024).unwrap().len(), 3);
        assert_eq!(store.races(2024).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_seed_qualifying_skips_missing_and_failed_rounds() {
        let temp_dir = TempDir::new().unwrap();
        let mut source = MockSource::default();
        source.qualifying.insert(1, round(QUALIFYING, Session::Race));
        source.failing_rounds.insert(3);
        let (seeder, store) = seeder(source, &temp_dir);

        let report = seeder.seed_qualifying(2025, 4).await.unwrap();

        assert_eq!(report.inserted, 1);
        assert_eq!(report.missing_rounds, vec![2, 4]);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].starts_with("round 3"));
        assert_eq!(store.qualifying(2025).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_seed_sprint_marks_weekend() {
        let temp_dir = TempDir::new().unwrap();
        let source = MockSource {
            calendar: vec![calendar_round()],
            sprints: vec![sprint_round()],
            ..Default::default()
        };
        let (seeder, store) = seeder(source, &temp_dir);

        seeder.seed_calendar(2024).await.unwrap();
        assert!(!store.race(2024, 1).unwrap().unwrap().has_sprint);

        let report = seeder.seed_sprint(2024).await.unwrap();
        assert_eq!(report.inserted, 2);
        assert!(store.race(2024, 1).unwrap().unwrap().has_sprint);
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let source = MockSource {
            results: vec![round(RESULTS_PAGE, Session::Race)],
            ..Default::default()
        };
        let (seeder, store) = seeder(source, &temp_dir);
        let seeder = seeder.with_dry_run(true);

        let report = seeder.seed_results(2024).await.unwrap();

        assert_eq!(report.fetched, 2);
        assert_eq!(report.inserted, 0);
        assert!(store.results(2024).unwrap().is_empty());
        assert!(store.drivers().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_seed_all_runs_every_stage() {
        let temp_dir = TempDir::new().unwrap();
        let source = MockSource {
            calendar: vec![calendar_round()],
            results: vec![round(RESULTS_PAGE, Session::Race)],
            ..Default::default()
        };
        let (seeder, _store) = seeder(source, &temp_dir);

        let reports = seeder.seed(SeedTarget::All, 2024, 2).await.unwrap();
        let targets: Vec<SeedTarget> = reports.iter().map(|r| r.target).collect();

        assert_eq!(
            targets,
            vec![
                SeedTarget::Calendar,
                SeedTarget::Results,
                SeedTarget::Sprint,
                SeedTarget::Qualifying
            ]
        );
        assert_eq!(reports[3].missing_rounds, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_verify_season_flags_rounds_without_results() {
        let temp_dir = TempDir::new().unwrap();
        let mut second = calendar_round();
        if let Some(race) = second.race.as_mut() {
            race.round = 2;
            race.name = "Saudi Arabian Grand Prix".to_string();
        }
        let source = MockSource {
            calendar: vec![calendar_round(), second],
            results: vec![round(RESULTS_PAGE, Session::Race)],
            ..Default::default()
        };
        let (seeder, store) = seeder(source, &temp_dir);
        seeder.seed_calendar(2024).await.unwrap();
        seeder.seed_results(2024).await.unwrap();

        let report = verify_season(&store, 2024).unwrap();

        assert_eq!(report.rounds.len(), 2);
        assert_eq!(report.rounds[0].results, 2);
        assert_eq!(report.total_results, 2);
        assert_eq!(report.missing_results, vec![2]);
    }

    #[tokio::test]
    async fn test_unknown_circuit_gets_placeholder() {
        let temp_dir = TempDir::new().unwrap();
        let mut data = round(RESULTS_PAGE, Session::Race);
        data.circuit = None;
        let source = MockSource {
            results: vec![data],
            ..Default::default()
        };
        let (seeder, store) = seeder(source, &temp_dir);

        seeder.seed_results(2024).await.unwrap();

        let circuits = store.circuits().unwrap();
        assert_eq!(circuits.len(), 1);
        assert_eq!(circuits[0].name, "Bahrain");
        assert!(circuits[0].is_placeholder());
    }

    #[tokio::test]
    async fn test_calendar_seed_upgrades_placeholder_circuit() {
        let temp_dir = TempDir::new().unwrap();
        let mut data = round(RESULTS_PAGE, Session::Race);
        data.circuit = None;
        let source = MockSource {
            results: vec![data],
            calendar: vec![calendar_round()],
            ..Default::default()
        };
        let (seeder, store) = seeder(source, &temp_dir);

        seeder.seed_results(2024).await.unwrap();
        assert!(store.circuits().unwrap()[0].is_placeholder());

        let report = seeder.seed_calendar(2024).await.unwrap();

        assert_eq!(report.repaired_circuits, 1);
        let circuits = store.circuits().unwrap();
        assert_eq!(circuits.len(), 1);
        assert!(!circuits[0].is_placeholder());
        assert_eq!(circuits[0].country, "Bahrain");

        let again = seeder.seed_calendar(2024).await.unwrap();
        assert_eq!(again.repaired_circuits, 0);
    }

    #[test]
    fn test_seed_target_parsing() {
        assert_eq!("Sprint".parse::<SeedTarget>().unwrap(), SeedTarget::Sprint);
        assert_eq!("all".parse::<SeedTarget>().unwrap(), SeedTarget::All);
        assert!("laps".parse::<SeedTarget>().is_err());
    }
}
