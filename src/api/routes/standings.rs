use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::api::state::AppState;
use crate::api::{parse_season, ApiError, Sourced};
use crate::jolpica::SeasonRef;
use crate::models::{EntityKind, StandingEntry};
use crate::standings::{compute_standings, season_records};

#[derive(Debug, Deserialize)]
pub struct StandingsParams {
    /// "drivers" (default) or "constructors"
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StandingsTable {
    /// Resolved year, or "current" when answered upstream without one
    pub season: String,
    #[serde(rename = "type")]
    pub kind: EntityKind,
    pub standings: Vec<StandingEntry>,
}

/// Championship table for a season.
///
/// Computed from stored race and sprint results. `current` resolves to the
/// latest stored season with results; seasons without stored results are
/// answered with the published upstream table.
pub async fn standings(
    State(state): State<AppState>,
    Path(year): Path<String>,
    Query(params): Query<StandingsParams>,
) -> Result<Json<Sourced<StandingsTable>>, ApiError> {
    let kind: EntityKind = match params.kind.as_deref() {
        None => EntityKind::Driver,
        Some(raw) => raw.parse().map_err(ApiError::BadRequest)?,
    };

    let season = if year.eq_ignore_ascii_case("current") {
        match state.store.latest_season()? {
            Some(season) => SeasonRef::Year(season),
            None => SeasonRef::Current,
        }
    } else {
        SeasonRef::Year(parse_season(&year)?)
    };

    if let SeasonRef::Year(season) = season {
        let results = state.store.results(season)?;
        if !results.is_empty() {
            debug!("Computing {} {} standings from {} results", season, kind, results.len());
            let table = compute_standings(&season_records(&results), kind);
            return Ok(Json(Sourced::database(StandingsTable {
                season: season.to_string(),
                kind,
                standings: table,
            })));
        }
    }

    info!("No stored results for {}, using Jolpica standings", season);
    let table = match kind {
        EntityKind::Driver => state.source.driver_standings(season).await?,
        EntityKind::Constructor => state.source.constructor_standings(season).await?,
    };

    Ok(Json(Sourced::jolpica(StandingsTable {
        season: season.to_string(),
        kind,
        standings: table,
    })))
}
