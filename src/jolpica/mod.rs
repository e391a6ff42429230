//! Jolpica F1 API client.
//!
//! Jolpica serves the Ergast schema. Results endpoints are paged by result
//! row, so one race can be split across pages; pages are merged per round
//! before conversion.

pub mod convert;
pub mod dto;

pub use convert::{ConvertError, RoundData};

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use indexmap::IndexMap;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::fetch::{FetchError, Fetcher};
use crate::models::{Session, StandingEntry};
use dto::{RaceDto, RaceTableBody, Response, StandingsListDto, StandingsTableBody};

pub const DEFAULT_BASE_URL: &str = "https://api.jolpi.ca/ergast/f1";

/// Jolpica rejects `limit` above this.
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Error)]
pub enum JolpicaError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Conversion error: {0}")]
    Convert(#[from] ConvertError),

    #[error("Invalid endpoint {0}")]
    InvalidEndpoint(String),
}

/// A season as addressed upstream: a year, or whatever season is current.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeasonRef {
    Year(u16),
    Current,
}

impl fmt::Display for SeasonRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeasonRef::Year(year) => write!(f, "{}", year),
            SeasonRef::Current => f.write_str("current"),
        }
    }
}

impl FromStr for SeasonRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("current") {
            return Ok(SeasonRef::Current);
        }
        match s.parse::<u16>() {
            Ok(year) if (1950..=2100).contains(&year) => Ok(SeasonRef::Year(year)),
            _ => Err(format!("invalid season '{}', expected a year or 'current'", s)),
        }
    }
}

impl From<u16> for SeasonRef {
    fn from(year: u16) -> Self {
        SeasonRef::Year(year)
    }
}

/// Remote source of F1 data.
///
/// Implemented by [`JolpicaClient`]; tests substitute an in-memory source.
#[async_trait]
pub trait F1Source: Send + Sync {
    /// Calendar rounds; each carries its race and circuit only.
    async fn season_calendar(&self, season: SeasonRef) -> Result<Vec<RoundData>, JolpicaError>;

    async fn season_results(&self, season: u16) -> Result<Vec<RoundData>, JolpicaError>;

    async fn sprint_results(&self, season: u16) -> Result<Vec<RoundData>, JolpicaError>;

    /// `Ok(None)` when the round has no qualifying data (yet).
    async fn qualifying(&self, season: u16, round: u32) -> Result<Option<RoundData>, JolpicaError>;

    async fn driver_standings(&self, season: SeasonRef) -> Result<Vec<StandingEntry>, JolpicaError>;

    async fn constructor_standings(
        &self,
        season: SeasonRef,
    ) -> Result<Vec<StandingEntry>, JolpicaError>;
}

pub struct JolpicaClient {
    fetcher: Fetcher,
    base_url: String,
    page_size: u32,
}

impl JolpicaClient {
    pub fn new(fetcher: Fetcher, base_url: &str, page_size: u32) -> Self {
        Self {
            fetcher,
            base_url: base_url.trim_end_matches('/').to_string(),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// `{base}/{path}.json?limit=..&offset=..`
    fn endpoint(&self, path: &str, offset: u32) -> Result<Url, JolpicaError> {
        let raw = format!("{}/{}.json", self.base_url, path.trim_matches('/'));
        let mut url = Url::parse(&raw).map_err(|_| JolpicaError::InvalidEndpoint(raw))?;
        url.query_pairs_mut()
            .append_pair("limit", &self.page_size.to_string())
            .append_pair("offset", &offset.to_string());
        Ok(url)
    }

    /// Fetch every page of a race table and merge rows that belong to the
    /// same round.
    async fn fetch_races(&self, path: &str) -> Result<Vec<RaceDto>, JolpicaError> {
        let mut pages = Vec::new();
        let mut offset = 0;

        loop {
            let url = self.endpoint(path, offset)?;
            let response: Response<RaceTableBody> = self.fetcher.fetch_json(&url).await?;
            let total = page_counter("total", &response.data.total)?;
            // The server may cap the page below what was asked for
            let limit = page_counter("limit", &response.data.limit)?.max(1);
            let races = response.data.table.race_table.races;
            let received = races.len();
            pages.extend(races);

            offset += limit;
            debug!("{}: offset {} of {}", path, offset.min(total), total);
            if received == 0 || offset >= total {
                break;
            }
        }

        Ok(merge_race_pages(pages))
    }

    async fn fetch_standings(&self, path: &str) -> Result<Option<StandingsListDto>, JolpicaError> {
        let url = self.endpoint(path, 0)?;
        let response: Response<StandingsTableBody> = self.fetcher.fetch_json(&url).await?;
        Ok(response.data.table.standings_table.lists.into_iter().next())
    }

    async fn rounds(&self, path: &str, session: Session) -> Result<Vec<RoundData>, JolpicaError> {
        let races = self.fetch_races(path).await?;
        info!("Fetched {} races from {}", races.len(), path);
        races
            .iter()
            .map(|race| convert::round_from_dto(race, session).map_err(JolpicaError::from))
            .collect()
    }
}

#[async_trait]
impl F1Source for JolpicaClient {
    async fn season_calendar(&self, season: SeasonRef) -> Result<Vec<RoundData>, JolpicaError> {
        self.rounds(&season.to_string(), Session::Race).await
    }

    async fn season_results(&self, season: u16) -> Result<Vec<RoundData>, JolpicaError> {
        self.rounds(&format!("{}/results", season), Session::Race).await
    }

    async fn sprint_results(&self, season: u16) -> Result<Vec<RoundData>, JolpicaError> {
        self.rounds(&format!("{}/sprint", season), Session::Sprint).await
    }

    async fn qualifying(&self, season: u16, round: u32) -> Result<Option<RoundData>, JolpicaError> {
        let races = match self.fetch_races(&format!("{}/{}/qualifying", season, round)).await {
            Ok(races) => races,
            Err(JolpicaError::Fetch(FetchError::NotFound(_))) => return Ok(None),
            Err(e) => return Err(e),
        };

        match races.first() {
            Some(race) if !race.qualifying_results.is_empty() => {
                Ok(Some(convert::round_from_dto(race, Session::Race)?))
            }
            _ => Ok(None),
        }
    }

    async fn driver_standings(&self, season: SeasonRef) -> Result<Vec<StandingEntry>, JolpicaError> {
        let Some(list) = self.fetch_standings(&format!("{}/driverStandings", season)).await? else {
            return Ok(Vec::new());
        };
        list.driver_standings
            .iter()
            .zip(1u32..)
            .map(|(row, index)| convert::driver_standing_from_dto(row, index).map_err(Into::into))
            .collect()
    }

    async fn constructor_standings(
        &self,
        season: SeasonRef,
    ) -> Result<Vec<StandingEntry>, JolpicaError> {
        let Some(list) = self
            .fetch_standings(&format!("{}/constructorStandings", season))
            .await?
        else {
            return Ok(Vec::new());
        };
        list.constructor_standings
            .iter()
            .zip(1u32..)
            .map(|(row, index)| {
                convert::constructor_standing_from_dto(row, index).map_err(Into::into)
            })
            .collect()
    }
}

fn page_counter(field: &'static str, value: &str) -> Result<u32, ConvertError> {
    value.trim().parse().map_err(|_| ConvertError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

/// Merge races split across pages, keeping first-seen round order.
pub fn merge_race_pages(pages: Vec<RaceDto>) -> Vec<RaceDto> {
    let mut merged: IndexMap<(String, String), RaceDto> = IndexMap::new();

    for race in pages {
        match merged.entry((race.season.clone(), race.round.clone())) {
            indexmap::map::Entry::Occupied(mut entry) => {
                let existing = entry.get_mut();
                existing.results.extend(race.results);
                existing.sprint_results.extend(race.sprint_results);
                existing.qualifying_results.extend(race.qualifying_results);
            }
            indexmap::map::Entry::Vacant(entry) => {
                entry.insert(race);
            }
        }
    }

    merged.into_values().collect()
}
