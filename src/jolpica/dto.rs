//! Wire shapes of the Jolpica (Ergast-compatible) API.
//!
//! Every response is wrapped in `MRData`, and numbers arrive as strings.
//! These types mirror the JSON as-is; `convert` turns them into models.

use serde::{Deserialize, Serialize};

/// Top-level response body.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Response<T> {
    #[serde(rename = "MRData")]
    pub data: MrData<T>,
}

/// The `MRData` wrapper with paging counters and one table.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MrData<T> {
    pub limit: String,
    pub offset: String,
    pub total: String,
    #[serde(flatten)]
    pub table: T,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RaceTableBody {
    #[serde(rename = "RaceTable")]
    pub race_table: RaceTable,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RaceTable {
    pub season: Option<String>,
    pub round: Option<String>,
    #[serde(rename = "Races", default)]
    pub races: Vec<RaceDto>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StandingsTableBody {
    #[serde(rename = "StandingsTable")]
    pub standings_table: StandingsTable,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StandingsTable {
    pub season: Option<String>,
    #[serde(rename = "StandingsLists", default)]
    pub lists: Vec<StandingsListDto>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RaceDto {
    pub season: String,
    pub round: String,
    pub url: Option<String>,
    pub race_name: String,
    #[serde(rename = "Circuit")]
    pub circuit: CircuitDto,
    pub date: String,
    pub time: Option<String>,
    /// Present in calendars for sprint weekends
    #[serde(rename = "Sprint")]
    pub sprint: Option<SessionTimeDto>,
    #[serde(rename = "Results", default)]
    pub results: Vec<ResultDto>,
    #[serde(rename = "SprintResults", default)]
    pub sprint_results: Vec<ResultDto>,
    #[serde(rename = "QualifyingResults", default)]
    pub qualifying_results: Vec<QualifyingDto>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionTimeDto {
    pub date: String,
    pub time: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitDto {
    pub circuit_id: String,
    pub url: Option<String>,
    pub circuit_name: String,
    #[serde(rename = "Location")]
    pub location: Option<LocationDto>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LocationDto {
    pub lat: Option<String>,
    pub long: Option<String>,
    pub locality: String,
    pub country: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverDto {
    pub driver_id: String,
    pub permanent_number: Option<String>,
    pub code: Option<String>,
    pub url: Option<String>,
    pub given_name: String,
    pub family_name: String,
    pub date_of_birth: Option<String>,
    pub nationality: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstructorDto {
    pub constructor_id: String,
    pub url: Option<String>,
    pub name: String,
    pub nationality: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultDto {
    pub number: Option<String>,
    pub position: String,
    pub position_text: String,
    pub points: String,
    #[serde(rename = "Driver")]
    pub driver: DriverDto,
    #[serde(rename = "Constructor")]
    pub constructor: ConstructorDto,
    pub grid: Option<String>,
    pub laps: Option<String>,
    pub status: Option<String>,
    #[serde(rename = "Time")]
    pub time: Option<RaceTimeDto>,
    #[serde(rename = "FastestLap")]
    pub fastest_lap: Option<FastestLapDto>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RaceTimeDto {
    pub millis: Option<String>,
    pub time: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FastestLapDto {
    pub rank: Option<String>,
    pub lap: Option<String>,
    #[serde(rename = "Time")]
    pub time: Option<LapTimeDto>,
    #[serde(rename = "AverageSpeed")]
    pub average_speed: Option<AverageSpeedDto>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LapTimeDto {
    pub time: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AverageSpeedDto {
    pub units: String,
    pub speed: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QualifyingDto {
    pub number: Option<String>,
    pub position: String,
    #[serde(rename = "Driver")]
    pub driver: DriverDto,
    #[serde(rename = "Constructor")]
    pub constructor: ConstructorDto,
    #[serde(rename = "Q1")]
    pub q1: Option<String>,
    #[serde(rename = "Q2")]
    pub q2: Option<String>,
    #[serde(rename = "Q3")]
    pub q3: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StandingsListDto {
    pub season: String,
    pub round: String,
    #[serde(rename = "DriverStandings", default)]
    pub driver_standings: Vec<DriverStandingDto>,
    #[serde(rename = "ConstructorStandings", default)]
    pub constructor_standings: Vec<ConstructorStandingDto>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverStandingDto {
    /// Absent for drivers the upstream leaves unranked
    pub position: Option<String>,
    pub position_text: String,
    pub points: String,
    pub wins: String,
    #[serde(rename = "Driver")]
    pub driver: DriverDto,
    #[serde(rename = "Constructors", default)]
    pub constructors: Vec<ConstructorDto>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstructorStandingDto {
    pub position: Option<String>,
    pub position_text: String,
    pub points: String,
    pub wins: String,
    #[serde(rename = "Constructor")]
    pub constructor: ConstructorDto,
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Trimmed captures of real API responses.

    pub const RESULTS_PAGE: &str = r#"{
      "MRData": {
        "xmlns": "", "series": "f1", "url": "https://api.jolpi.ca/ergast/f1/2024/results/",
        "limit": "2", "offset": "0", "total": "3",
        "RaceTable": {
          "season": "2024",
          "Races": [{
            "season": "2024", "round": "1",
            "url": "https://en.wikipedia.org/wiki/2024_Bahrain_Grand_Prix",
            "raceName": "Bahrain Grand Prix",
            "Circuit": {
              "circuitId": "bahrain",
              "url": "https://en.wikipedia.org/wiki/Bahrain_International_Circuit",
              "circuitName": "Bahrain International Circuit",
              "Location": {"lat": "26.0325", "long": "50.5106", "locality": "Sakhir", "country": "Bahrain"}
            },
            "date": "2024-03-02", "time": "15:00:00Z",
            "Results": [
              {
                "number": "1", "position": "1", "positionText": "1", "points": "26",
                "Driver": {
                  "driverId": "max_verstappen", "permanentNumber": "33", "code": "VER",
                  "url": "http://en.wikipedia.org/wiki/Max_Verstappen",
                  "givenName": "Max", "familyName": "Verstappen",
                  "dateOfBirth": "1997-09-30", "nationality": "Dutch"
                },
                "Constructor": {
                  "constructorId": "red_bull", "url": "http://en.wikipedia.org/wiki/Red_Bull_Racing",
                  "name": "Red Bull", "nationality": "Austrian"
                },
                "grid": "1", "laps": "57", "status": "Finished",
                "Time": {"millis": "5504742", "time": "1:31:44.742"},
                "FastestLap": {
                  "rank": "1", "lap": "39",
                  "Time": {"time": "1:32.608"},
                  "AverageSpeed": {"units": "kph", "speed": "210.383"}
                }
              },
              {
                "number": "11", "position": "2", "positionText": "2", "points": "18",
                "Driver": {
                  "driverId": "perez", "permanentNumber": "11", "code": "PER",
                  "givenName": "Sergio", "familyName": "Pérez",
                  "dateOfBirth": "1990-01-26", "nationality": "Mexican"
                },
                "Constructor": {"constructorId": "red_bull", "name": "Red Bull", "nationality": "Austrian"},
                "grid": "5", "laps": "57", "status": "Finished",
                "Time": {"millis": "5527199", "time": "+22.457"}
              }
            ]
          }]
        }
      }
    }"#;

    pub const RESULTS_PAGE_2: &str = r#"{
      "MRData": {
        "limit": "2", "offset": "2", "total": "3",
        "RaceTable": {
          "season": "2024",
          "Races": [{
            "season": "2024", "round": "1",
            "raceName": "Bahrain Grand Prix",
            "Circuit": {
              "circuitId": "bahrain",
              "circuitName": "Bahrain International Circuit",
              "Location": {"lat": "26.0325", "long": "50.5106", "locality": "Sakhir", "country": "Bahrain"}
            },
            "date": "2024-03-02",
            "Results": [{
              "number": "2", "position": "20", "positionText": "R", "points": "0",
              "Driver": {"driverId": "sargeant", "givenName": "Logan", "familyName": "Sargeant", "nationality": "American"},
              "Constructor": {"constructorId": "williams", "name": "Williams", "nationality": "British"},
              "grid": "20", "laps": "12", "status": "Retired"
            }]
          }]
        }
      }
    }"#;

    pub const QUALIFYING: &str = r#"{
      "MRData": {
        "limit": "30", "offset": "0", "total": "1",
        "RaceTable": {
          "season": "2025", "round": "1",
          "Races": [{
            "season": "2025", "round": "1",
            "raceName": "Australian Grand Prix",
            "Circuit": {
              "circuitId": "albert_park",
              "circuitName": "Albert Park Grand Prix Circuit",
              "Location": {"lat": "-37.8497", "long": "144.968", "locality": "Melbourne", "country": "Australia"}
            },
            "date": "2025-03-16", "time": "04:00:00Z",
            "QualifyingResults": [{
              "number": "4", "position": "1",
              "Driver": {"driverId": "norris", "code": "NOR", "givenName": "Lando", "familyName": "Norris", "nationality": "British"},
              "Constructor": {"constructorId": "mclaren", "name": "McLaren", "nationality": "British"},
              "Q1": "1:15.912", "Q2": "1:15.415", "Q3": "1:15.096"
            }]
          }]
        }
      }
    }"#;

    pub const DRIVER_STANDINGS: &str = r#"{
      "MRData": {
        "limit": "30", "offset": "0", "total": "2",
        "StandingsTable": {
          "season": "2024",
          "StandingsLists": [{
            "season": "2024", "round": "24",
            "DriverStandings": [
              {
                "position": "1", "positionText": "1", "points": "437", "wins": "9",
                "Driver": {"driverId": "max_verstappen", "givenName": "Max", "familyName": "Verstappen", "nationality": "Dutch"},
                "Constructors": [{"constructorId": "red_bull", "name": "Red Bull", "nationality": "Austrian"}]
              },
              {
                "positionText": "-", "points": "0", "wins": "0",
                "Driver": {"driverId": "doohan", "givenName": "Jack", "familyName": "Doohan", "nationality": "Australian"},
                "Constructors": [{"constructorId": "alpine", "name": "Alpine F1 Team", "nationality": "French"}]
              }
            ]
          }]
        }
      }
    }"#;
}
