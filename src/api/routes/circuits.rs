use axum::extract::State;
use axum::Json;

use crate::api::state::AppState;
use crate::api::{ApiError, Sourced};
use crate::models::Circuit;

pub async fn list_circuits(
    State(state): State<AppState>,
) -> Result<Json<Sourced<Vec<Circuit>>>, ApiError> {
    let mut circuits = state.store.circuits()?;
    circuits.sort_by(|a, b| a.country.cmp(&b.country).then_with(|| a.name.cmp(&b.name)));
    Ok(Json(Sourced::database(circuits)))
}
