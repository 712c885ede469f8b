//! Records persisted by the log and the timestamp conventions they share.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::body_parts::BodyPart;

/// `recordedAt` layout. Fixed width so timestamps sort lexicographically.
pub const RECORDED_AT_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Rep count of a single set.
///
/// Stored as an integer where `0` marks a set whose reps were not counted
/// (a failure set), shown as `n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub enum Reps {
    Unspecified,
    Count(u32),
}

impl Reps {
    pub fn as_u32(self) -> u32 {
        match self {
            Reps::Unspecified => 0,
            Reps::Count(n) => n,
        }
    }
}

impl From<u32> for Reps {
    fn from(n: u32) -> Self {
        if n == 0 { Reps::Unspecified } else { Reps::Count(n) }
    }
}

impl From<Reps> for u32 {
    fn from(r: Reps) -> Self {
        r.as_u32()
    }
}

impl fmt::Display for Reps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reps::Unspecified => f.write_str("n"),
            Reps::Count(n) => write!(f, "{n}"),
        }
    }
}

/// One performed set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutEntry {
    pub id: String,
    pub body_part: BodyPart,
    pub exercise: String,
    pub weight_kg: f64,
    pub reps: Reps,
    #[serde(default)]
    pub note: String,
    pub recorded_at: String,
    /// Position of the set within the submission it came from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_order: Option<u32>,
}

/// Body weight and body-fat measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyMetric {
    pub id: String,
    pub weight: f64,
    pub body_fat_pct: f64,
    pub recorded_at: String,
}

/// Selectable exercises for one body part, in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseList {
    pub body_part: BodyPart,
    pub exercises: Vec<String>,
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub fn format_recorded_at(dt: NaiveDateTime) -> String {
    dt.format(RECORDED_AT_FORMAT).to_string()
}

/// Turn a `datetime-local` style value (`2026-02-23T10:30`) into the stored
/// layout. Anything without a `T` right after the date is returned as is.
pub fn normalize_recorded_at(value: &str) -> String {
    if value.as_bytes().get(10) == Some(&b'T') {
        format!("{} {}", &value[..10], &value[11..])
    } else {
        value.to_string()
    }
}

/// Round to one fractional digit, the precision body metrics are kept at.
pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn zero_reps_is_unspecified() {
        assert_eq!(Reps::from(0), Reps::Unspecified);
        assert_eq!(Reps::from(8), Reps::Count(8));
        assert_eq!(Reps::Unspecified.to_string(), "n");
        assert_eq!(Reps::Count(12).to_string(), "12");
    }

    #[test]
    fn workout_entry_uses_camel_case_fields() {
        let json = r#"{"id":"a","bodyPart":"胸","exercise":"ベンチプレス","weightKg":60,"reps":0,"note":"","recordedAt":"2026-02-23 10:30","setOrder":2}"#;
        let e: WorkoutEntry = serde_json::from_str(json).unwrap();
        assert_eq!(e.body_part, BodyPart::Chest);
        assert_eq!(e.weight_kg, 60.0);
        assert_eq!(e.reps, Reps::Unspecified);
        assert_eq!(e.set_order, Some(2));

        let out = serde_json::to_value(&e).unwrap();
        assert_eq!(out["reps"], 0);
        assert_eq!(out["recordedAt"], "2026-02-23 10:30");
    }

    #[test]
    fn missing_note_and_set_order_default() {
        let json = r#"{"id":"a","bodyPart":"脚","exercise":"スクワット","weightKg":100.5,"reps":5,"recordedAt":"2026-02-23 10:30"}"#;
        let e: WorkoutEntry = serde_json::from_str(json).unwrap();
        assert!(e.note.is_empty());
        assert_eq!(e.set_order, None);
        let out = serde_json::to_value(&e).unwrap();
        assert!(out.get("setOrder").is_none());
    }

    #[test]
    fn recorded_at_helpers() {
        let dt = NaiveDate::from_ymd_opt(2026, 3, 1)
            .unwrap()
            .and_hms_opt(7, 5, 0)
            .unwrap();
        assert_eq!(format_recorded_at(dt), "2026-03-01 07:05");
        assert_eq!(normalize_recorded_at("2026-03-01T07:05"), "2026-03-01 07:05");
        assert_eq!(normalize_recorded_at("2026-03-01 07:05"), "2026-03-01 07:05");
        assert_eq!(normalize_recorded_at("Tue 2026-03-01"), "Tue 2026-03-01");
        assert_eq!(normalize_recorded_at("2026-3-1T07:05"), "2026-3-1T07:05");
        assert_eq!(round_one_decimal(70.26), 70.3);
        assert_eq!(round_one_decimal(15.04), 15.0);
    }
}
