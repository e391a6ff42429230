//! Circuit and race calendar models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A racing circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    /// Upstream circuit identifier (e.g. "monaco")
    pub key: String,

    pub name: String,

    /// City or area
    pub locality: String,

    pub country: String,

    pub lat: Option<f64>,

    pub lng: Option<f64>,

    pub url: Option<String>,
}

impl Circuit {
    /// Minimal circuit used when a race references a circuit we have not
    /// seeded yet. A later calendar seed replaces it with the full row.
    pub fn placeholder(key: &str) -> Self {
        let mut chars = key.chars();
        let name = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        };

        Self {
            key: key.to_string(),
            name,
            locality: "Unknown".to_string(),
            country: "Unknown".to_string(),
            lat: None,
            lng: None,
            url: None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.locality == "Unknown" && self.country == "Unknown" && self.lat.is_none()
    }
}

/// A Grand Prix weekend in a season's calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Race {
    pub season: u16,

    /// 1-based round within the season
    pub round: u32,

    /// e.g. "Bahrain Grand Prix"
    pub name: String,

    pub date: NaiveDate,

    /// Race start time in UTC ("15:00:00Z"), when published
    pub time: Option<String>,

    pub circuit_key: String,

    pub url: Option<String>,

    /// Whether the weekend includes a sprint race
    #[serde(default)]
    pub has_sprint: bool,
}

impl Race {
    pub fn new(season: u16, round: u32, name: String, date: NaiveDate, circuit_key: String) -> Self {
        Self {
            season,
            round,
            name,
            date,
            time: None,
            circuit_key,
            url: None,
            has_sprint: false,
        }
    }

    /// Identity of a race within the store.
    pub fn identity(&self) -> (u16, u32) {
        (self.season, self.round)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_circuit_capitalizes_key() {
        let circuit = Circuit::placeholder("monza");
        assert_eq!(circuit.name, "Monza");
        assert_eq!(circuit.locality, "Unknown");
        assert!(circuit.is_placeholder());
    }

    #[test]
    fn test_placeholder_circuit_empty_key() {
        let circuit = Circuit::placeholder("");
        assert_eq!(circuit.name, "");
    }

    #[test]
    fn test_race_identity() {
        let race = Race::new(
            2024,
            3,
            "Australian Grand Prix".to_string(),
            NaiveDate::from_ymd_opt(2024, 3, 24).unwrap(),
            "albert_park".to_string(),
        );
        assert_eq!(race.identity(), (2024, 3));
        assert!(!race.has_sprint);
    }

    #[test]
    fn test_race_deserializes_without_sprint_flag() {
        let json = r#"{"season":2023,"round":1,"name":"Bahrain Grand Prix","date":"2023-03-05","time":null,"circuit_key":"bahrain","url":null}"#;
        let race: Race = serde_json::from_str(json).unwrap();
        assert!(!race.has_sprint);
        assert_eq!(race.circuit_key, "bahrain");
    }
}
