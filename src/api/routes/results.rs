use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::api::state::AppState;
use crate::api::{parse_season, ApiError, Sourced};
use crate::models::{Race, RaceResult, Session};

#[derive(Debug, Serialize)]
pub struct RaceResults {
    pub race: Option<Race>,
    pub results: Vec<RaceResult>,
    /// Empty unless the weekend had a sprint
    pub sprint: Vec<RaceResult>,
}

pub async fn race_results(
    State(state): State<AppState>,
    Path((year, round)): Path<(String, u32)>,
) -> Result<Json<Sourced<RaceResults>>, ApiError> {
    let season = parse_season(&year)?;
    let race = state.store.race(season, round)?;

    // Already ordered by session, then position_order
    let (sprint, results): (Vec<RaceResult>, Vec<RaceResult>) = state
        .store
        .race_results(season, round)?
        .into_iter()
        .partition(|r| r.session == Session::Sprint);

    if race.is_none() && results.is_empty() && sprint.is_empty() {
        return Err(ApiError::NotFound(format!(
            "results for {} round {}",
            season, round
        )));
    }

    Ok(Json(Sourced::database(RaceResults {
        race,
        results,
        sprint,
    })))
}
