use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::{parse_season, ApiError, Paged, Pagination, Sourced};
use crate::models::{Driver, RaceResult};
use crate::standings::{summarize_driver, DriverSeasonSummary};

#[derive(Debug, Deserialize)]
pub struct DriverListParams {
    pub nationality: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct DriverDetailParams {
    /// Defaults to the latest season with stored results
    pub season: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DriverDetail {
    #[serde(flatten)]
    pub driver: Driver,
    pub season: Option<u16>,
    pub summary: DriverSeasonSummary,
    pub results: Vec<RaceResult>,
}

pub async fn list_drivers(
    State(state): State<AppState>,
    Query(params): Query<DriverListParams>,
) -> Result<Json<Paged<Driver>>, ApiError> {
    let mut drivers = state.store.drivers()?;

    if let Some(nationality) = params.nationality.as_deref() {
        drivers.retain(|d| d.nationality.eq_ignore_ascii_case(nationality));
    }
    drivers.sort_by(|a, b| {
        a.family_name
            .cmp(&b.family_name)
            .then_with(|| a.given_name.cmp(&b.given_name))
    });

    let pagination = Pagination::new(params.page, params.page_size);
    Ok(Json(pagination.apply(drivers)))
}

pub async fn get_driver(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(params): Query<DriverDetailParams>,
) -> Result<Json<Sourced<DriverDetail>>, ApiError> {
    let driver = state
        .store
        .driver(&key)?
        .ok_or_else(|| ApiError::NotFound(format!("driver '{}'", key)))?;

    let season = match params.season.as_deref() {
        None => state.store.latest_season()?,
        Some(raw) if raw.eq_ignore_ascii_case("current") => state.store.latest_season()?,
        Some(raw) => Some(parse_season(raw)?),
    };

    let results = match season {
        Some(season) => state.store.driver_results(season, &key)?,
        None => Vec::new(),
    };

    Ok(Json(Sourced::database(DriverDetail {
        driver,
        season,
        summary: summarize_driver(&results),
        results,
    })))
}
