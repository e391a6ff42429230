use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use crate::api::state::AppState;
use crate::api::{ApiError, Paged, Pagination, Sourced};
use crate::models::Constructor;

#[derive(Debug, Deserialize)]
pub struct ConstructorListParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

pub async fn list_constructors(
    State(state): State<AppState>,
    Query(params): Query<ConstructorListParams>,
) -> Result<Json<Paged<Constructor>>, ApiError> {
    let mut constructors = state.store.constructors()?;
    constructors.sort_by(|a, b| a.name.cmp(&b.name));

    let pagination = Pagination::new(params.page, params.page_size);
    Ok(Json(pagination.apply(constructors)))
}

pub async fn get_constructor(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<Sourced<Constructor>>, ApiError> {
    let constructor = state
        .store
        .constructor(&key)?
        .ok_or_else(|| ApiError::NotFound(format!("constructor '{}'", key)))?;

    Ok(Json(Sourced::database(constructor)))
}
