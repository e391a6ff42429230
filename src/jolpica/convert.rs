//! Convert Jolpica DTOs to model entities.
//!
//! This is where upstream data gets validated: required numbers that do not
//! parse are errors, optional ones become `None`.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use super::dto::{
    CircuitDto, ConstructorDto, ConstructorStandingDto, DriverDto, DriverStandingDto,
    QualifyingDto, RaceDto, ResultDto,
};
use crate::models::{
    Circuit, Constructor, Driver, QualifyingResult, Race, RaceResult, Session, StandingEntry,
    UNCLASSIFIED_ORDER,
};

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("invalid {field}: '{value}'")]
    InvalidNumber { field: &'static str, value: String },

    #[error("invalid date '{0}'")]
    InvalidDate(String),
}

/// Everything one race weekend contributes to the store.
#[derive(Debug, Clone, Default)]
pub struct RoundData {
    pub race: Option<Race>,
    pub circuit: Option<Circuit>,
    pub drivers: Vec<Driver>,
    pub constructors: Vec<Constructor>,
    pub results: Vec<RaceResult>,
    pub qualifying: Vec<QualifyingResult>,
}

fn parse_required<T: std::str::FromStr>(field: &'static str, value: &str) -> Result<T, ConvertError> {
    value.trim().parse().map_err(|_| ConvertError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

fn parse_optional<T: std::str::FromStr>(value: Option<&str>) -> Option<T> {
    value.and_then(|v| v.trim().parse().ok())
}

fn parse_date(value: &str) -> Result<NaiveDate, ConvertError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| ConvertError::InvalidDate(value.to_string()))
}

pub fn parse_points(value: &str) -> Result<Decimal, ConvertError> {
    parse_required("points", value)
}

pub fn circuit_from_dto(dto: &CircuitDto) -> Circuit {
    let Some(location) = &dto.location else {
        let mut circuit = Circuit::placeholder(&dto.circuit_id);
        circuit.name = dto.circuit_name.clone();
        circuit.url = dto.url.clone();
        return circuit;
    };

    Circuit {
        key: dto.circuit_id.clone(),
        name: dto.circuit_name.clone(),
        locality: location.locality.clone(),
        country: location.country.clone(),
        lat: parse_optional(location.lat.as_deref()),
        lng: parse_optional(location.long.as_deref()),
        url: dto.url.clone(),
    }
}

pub fn driver_from_dto(dto: &DriverDto) -> Driver {
    let mut driver = Driver::new(
        dto.driver_id.clone(),
        dto.given_name.clone(),
        dto.family_name.clone(),
        dto.nationality.clone().unwrap_or_default(),
    );
    driver.code = dto.code.clone();
    driver.permanent_number = parse_optional(dto.permanent_number.as_deref());
    driver.date_of_birth = dto
        .date_of_birth
        .as_deref()
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());
    driver.url = dto.url.clone();
    driver
}

pub fn constructor_from_dto(dto: &ConstructorDto) -> Constructor {
    let mut constructor = Constructor::new(
        dto.constructor_id.clone(),
        dto.name.clone(),
        dto.nationality.clone().unwrap_or_default(),
    );
    constructor.url = dto.url.clone();
    constructor
}

pub fn race_from_dto(dto: &RaceDto) -> Result<Race, ConvertError> {
    let mut race = Race::new(
        parse_required("season", &dto.season)?,
        parse_required("round", &dto.round)?,
        dto.race_name.clone(),
        parse_date(&dto.date)?,
        dto.circuit.circuit_id.clone(),
    );
    race.time = dto.time.clone();
    race.url = dto.url.clone();
    race.has_sprint = dto.sprint.is_some() || !dto.sprint_results.is_empty();
    Ok(race)
}

/// Convert one classified or unclassified result row.
///
/// `position` is only set when `positionText` is numeric; the upstream
/// `position` field becomes the ordering key, falling back to 99.
pub fn result_from_dto(
    season: u16,
    round: u32,
    session: Session,
    dto: &ResultDto,
) -> Result<RaceResult, ConvertError> {
    let mut result = RaceResult::new(
        season,
        round,
        session,
        dto.driver.driver_id.clone(),
        format!("{} {}", dto.driver.given_name, dto.driver.family_name),
        dto.constructor.constructor_id.clone(),
        dto.constructor.name.clone(),
        parse_points(&dto.points)?,
    );

    result = match dto.position_text.trim().parse::<u32>() {
        Ok(position) => result.with_position(position),
        Err(_) => {
            let order = parse_optional(Some(dto.position.as_str())).unwrap_or(UNCLASSIFIED_ORDER);
            result.with_unclassified(&dto.position_text, order)
        }
    };

    result.grid = parse_optional(dto.grid.as_deref());
    result.laps = parse_optional(dto.laps.as_deref());
    result.status = dto.status.clone().unwrap_or_default();

    if let Some(time) = &dto.time {
        result.time = Some(time.time.clone());
        result.millis = parse_optional(time.millis.as_deref());
    }

    if let Some(fastest) = &dto.fastest_lap {
        result.fastest_lap = parse_optional(fastest.lap.as_deref());
        result.fastest_lap_rank = parse_optional(fastest.rank.as_deref());
        result.fastest_lap_time = fastest.time.as_ref().map(|t| t.time.clone());
        result.fastest_lap_speed = fastest
            .average_speed
            .as_ref()
            .map(|s| format!("{} {}", s.speed, s.units));
    }

    Ok(result)
}

pub fn qualifying_from_dto(
    season: u16,
    round: u32,
    dto: &QualifyingDto,
) -> Result<QualifyingResult, ConvertError> {
    let mut qualifying = QualifyingResult::new(
        season,
        round,
        dto.driver.driver_id.clone(),
        dto.constructor.constructor_id.clone(),
        parse_required("qualifying position", &dto.position)?,
    );
    qualifying.number = parse_optional(dto.number.as_deref());
    qualifying.q1 = dto.q1.clone();
    qualifying.q2 = dto.q2.clone();
    qualifying.q3 = dto.q3.clone();
    Ok(qualifying)
}

/// Convert a whole race into store rows for one session.
///
/// Drivers and constructors are deduplicated by key, first seen wins.
pub fn round_from_dto(dto: &RaceDto, session: Session) -> Result<RoundData, ConvertError> {
    let race = race_from_dto(dto)?;
    let (season, round) = race.identity();

    let rows = match session {
        Session::Race => &dto.results,
        Session::Sprint => &dto.sprint_results,
    };

    let mut data = RoundData {
        circuit: Some(circuit_from_dto(&dto.circuit)),
        ..Default::default()
    };

    for row in rows {
        push_participants(&mut data, &row.driver, &row.constructor);
        data.results.push(result_from_dto(season, round, session, row)?);
    }

    for row in &dto.qualifying_results {
        push_participants(&mut data, &row.driver, &row.constructor);
        data.qualifying.push(qualifying_from_dto(season, round, row)?);
    }

    data.race = Some(race);
    Ok(data)
}

fn push_participants(data: &mut RoundData, driver: &DriverDto, constructor: &ConstructorDto) {
    if !data.drivers.iter().any(|d| d.key == driver.driver_id) {
        data.drivers.push(driver_from_dto(driver));
    }
    if !data.constructors.iter().any(|c| c.key == constructor.constructor_id) {
        data.constructors.push(constructor_from_dto(constructor));
    }
}

/// Published driver standing. Unranked rows take `fallback_position`.
pub fn driver_standing_from_dto(
    dto: &DriverStandingDto,
    fallback_position: u32,
) -> Result<StandingEntry, ConvertError> {
    Ok(StandingEntry {
        position: parse_optional(dto.position.as_deref()).unwrap_or(fallback_position),
        key: dto.driver.driver_id.clone(),
        name: format!("{} {}", dto.driver.given_name, dto.driver.family_name),
        constructor: dto.constructors.last().map(|c| c.name.clone()),
        points: parse_points(&dto.points)?,
        wins: parse_required("wins", &dto.wins)?,
        best_finish: None,
    })
}

pub fn constructor_standing_from_dto(
    dto: &ConstructorStandingDto,
    fallback_position: u32,
) -> Result<StandingEntry, ConvertError> {
    Ok(StandingEntry {
        position: parse_optional(dto.position.as_deref()).unwrap_or(fallback_position),
        key: dto.constructor.constructor_id.clone(),
        name: dto.constructor.name.clone(),
        constructor: None,
        points: parse_points(&dto.points)?,
        wins: parse_required("wins", &dto.wins)?,
        best_finish: None,
    })
}

#[cfg(test)]
mod tests {
    use super::super::dto::fixtures::*;
    use super::super::dto::{RaceTableBody, Response, StandingsTableBody};
    use super::*;
    use pretty_assertions::assert_eq;

    fn first_race(json: &str) -> RaceDto {
        let response: Response<RaceTableBody> = serde_json::from_str(json).unwrap();
        response.data.table.race_table.races[0].clone()
    }

    #[test]
    fn test_round_from_results_page() {
        let data = round_from_dto(&first_race(RESULTS_PAGE), Session::Race).unwrap();

        let race = data.race.unwrap();
        assert_eq!(race.identity(), (2024, 1));
        assert_eq!(race.date, NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
        assert!(!race.has_sprint);

        let circuit = data.circuit.unwrap();
        assert_eq!(circuit.locality, "Sakhir");
        assert_eq!(circuit.lat, Some(26.0325));

        assert_eq!(data.drivers.len(), 2);
        assert_eq!(data.constructors.len(), 1);
        assert_eq!(data.results.len(), 2);

        let winner = &data.results[0];
        assert_eq!(winner.driver_name, "Max Verstappen");
        assert_eq!(winner.points, Decimal::new(26, 0));
        assert_eq!(winner.position, Some(1));
        assert_eq!(winner.millis, Some(5504742));
        assert_eq!(winner.fastest_lap, Some(39));
        assert_eq!(winner.fastest_lap_speed.as_deref(), Some("210.383 kph"));
    }

    #[test]
    fn test_retired_result_is_unclassified() {
        let data = round_from_dto(&first_race(RESULTS_PAGE_2), Session::Race).unwrap();
        let retired = &data.results[0];

        assert_eq!(retired.position, None);
        assert_eq!(retired.position_text, "R");
        assert_eq!(retired.position_order, 20);
        assert_eq!(retired.status, "Retired");
    }

    #[test]
    fn test_sprint_session_reads_sprint_rows() {
        let mut dto = first_race(RESULTS_PAGE);
        dto.sprint_results = std::mem::take(&mut dto.results);

        let data = round_from_dto(&dto, Session::Sprint).unwrap();
        assert!(data.race.unwrap().has_sprint);
        assert!(data.results.iter().all(|r| r.session == Session::Sprint));
    }

    #[test]
    fn test_qualifying_round() {
        let data = round_from_dto(&first_race(QUALIFYING), Session::Race).unwrap();

        assert!(data.results.is_empty());
        assert_eq!(data.qualifying.len(), 1);
        assert_eq!(data.qualifying[0].number, Some(4));
        assert_eq!(data.drivers[0].code.as_deref(), Some("NOR"));
    }

    #[test]
    fn test_missing_location_gives_placeholder_circuit() {
        let mut dto = first_race(RESULTS_PAGE);
        dto.circuit.location = None;

        let circuit = circuit_from_dto(&dto.circuit);
        assert!(circuit.is_placeholder());
        assert_eq!(circuit.name, "Bahrain International Circuit");
    }

    #[test]
    fn test_bad_points_rejected() {
        let mut dto = first_race(RESULTS_PAGE);
        dto.results[0].points = "lots".to_string();

        let err = round_from_dto(&dto, Session::Race).unwrap_err();
        assert!(matches!(err, ConvertError::InvalidNumber { field: "points", .. }));
    }

    #[test]
    fn test_bad_date_rejected() {
        let mut dto = first_race(RESULTS_PAGE);
        dto.date = "02/03/2024".to_string();
        assert!(matches!(race_from_dto(&dto), Err(ConvertError::InvalidDate(_))));
    }

    #[test]
    fn test_half_points_parse_exactly() {
        assert_eq!(parse_points("12.5").unwrap(), Decimal::new(125, 1));
        assert_eq!(parse_points(" 0 ").unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_driver_standings() {
        let response: Response<StandingsTableBody> =
            serde_json::from_str(DRIVER_STANDINGS).unwrap();
        let rows = &response.data.table.standings_table.lists[0].driver_standings;

        let leader = driver_standing_from_dto(&rows[0], 1).unwrap();
        assert_eq!(leader.position, 1);
        assert_eq!(leader.wins, 9);
        assert_eq!(leader.constructor.as_deref(), Some("Red Bull"));

        let unranked = driver_standing_from_dto(&rows[1], 2).unwrap();
        assert_eq!(unranked.position, 2);
        assert_eq!(unranked.points, Decimal::ZERO);
    }
}
