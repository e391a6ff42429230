use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use tracing::info;

use crate::api::state::AppState;
use crate::api::{parse_season, ApiError, Sourced};
use crate::jolpica::SeasonRef;
use crate::models::{Circuit, Race};

#[derive(Debug, Serialize)]
pub struct CalendarRace {
    #[serde(flatten)]
    pub race: Race,
    pub circuit: Option<Circuit>,
}

pub async fn list_seasons(
    State(state): State<AppState>,
) -> Result<Json<Sourced<Vec<u16>>>, ApiError> {
    Ok(Json(Sourced::database(state.store.seasons()?)))
}

/// Season calendar. Stored races are preferred; the remote source fills in
/// seasons that were never seeded, and always answers for `current`.
pub async fn get_season(
    State(state): State<AppState>,
    Path(year): Path<String>,
) -> Result<Json<Sourced<Vec<CalendarRace>>>, ApiError> {
    let season = if year.eq_ignore_ascii_case("current") {
        SeasonRef::Current
    } else {
        let season = parse_season(&year)?;
        let races = state.store.races(season)?;
        if !races.is_empty() {
            let circuits: HashMap<String, Circuit> = state
                .store
                .circuits()?
                .into_iter()
                .map(|c| (c.key.clone(), c))
                .collect();

            let calendar = races
                .into_iter()
                .map(|race| CalendarRace {
                    circuit: circuits.get(&race.circuit_key).cloned(),
                    race,
                })
                .collect();
            return Ok(Json(Sourced::database(calendar)));
        }
        SeasonRef::Year(season)
    };

    info!("No stored calendar for {}, asking Jolpica", season);
    let calendar: Vec<CalendarRace> = state
        .source
        .season_calendar(season)
        .await?
        .into_iter()
        .filter_map(|round| {
            round.race.map(|race| CalendarRace {
                race,
                circuit: round.circuit,
            })
        })
        .collect();

    if calendar.is_empty() {
        return Err(ApiError::NotFound(format!("season {}", season)));
    }

    Ok(Json(Sourced::jolpica(calendar)))
}

#[cfg(test)]
mod tests {
    use crate::api::build_router;
    use crate::api::test_support::{get_json, race, setup_state};
    use crate::jolpica::mock::MockSource;
    use crate::jolpica::RoundData;
    use crate::models::Circuit;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_season_from_store() {
        let tmp = tempfile::tempdir().unwrap();
        let (state, source) = setup_state(&tmp, MockSource::default());
        state
            .store
            .upsert_races(vec![race(2024, 2, "Saudi Arabian Grand Prix"), race(2024, 1, "Bahrain Grand Prix")])
            .unwrap();
        state
            .store
            .upsert_circuits(vec![Circuit::placeholder("bahrain")])
            .unwrap();

        let (status, json) = get_json(build_router(state), "/api/seasons/2024").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["source"], "database");
        assert_eq!(json["data"][0]["name"], "Bahrain Grand Prix");
        assert_eq!(json["data"][0]["circuit"]["key"], "bahrain");
        assert_eq!(json["data"][1]["round"], 2);
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_season_falls_back_to_jolpica() {
        let tmp = tempfile::tempdir().unwrap();
        let source = MockSource {
            calendar: vec![RoundData {
                race: Some(race(2025, 1, "Australian Grand Prix")),
                circuit: Some(Circuit::placeholder("albert_park")),
                ..Default::default()
            }],
            ..Default::default()
        };
        let (state, source) = setup_state(&tmp, source);

        let (status, json) = get_json(build_router(state), "/api/seasons/2025").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["source"], "jolpica");
        assert_eq!(json["data"][0]["name"], "Australian Grand Prix");
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_current_always_uses_jolpica() {
        let tmp = tempfile::tempdir().unwrap();
        let source = MockSource {
            calendar: vec![RoundData {
                race: Some(race(2025, 1, "Australian Grand Prix")),
                ..Default::default()
            }],
            ..Default::default()
        };
        let (state, source) = setup_state(&tmp, source);
        state
            .store
            .upsert_races(vec![race(2024, 1, "Bahrain Grand Prix")])
            .unwrap();

        let (_, json) = get_json(build_router(state), "/api/seasons/current").await;

        assert_eq!(json["source"], "jolpica");
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_unknown_season_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let (state, _) = setup_state(&tmp, MockSource::default());

        let (status, json) = get_json(build_router(state), "/api/seasons/1951").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_list_seasons() {
        let tmp = tempfile::tempdir().unwrap();
        let (state, _) = setup_state(&tmp, MockSource::default());
        state
            .store
            .upsert_races(vec![race(2024, 1, "Bahrain Grand Prix")])
            .unwrap();

        let (_, json) = get_json(build_router(state), "/api/seasons").await;
        assert_eq!(json["data"], serde_json::json!([2024]));
    }
}
