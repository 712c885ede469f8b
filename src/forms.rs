//! Input state of the body metric and workout forms.
//!
//! The views bind text fields directly to these structs; saving is only
//! offered once `can_save` holds, so building never has to report errors.

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};

use crate::body_parts::BodyPart;
use crate::models::{
    BodyMetric, Reps, WorkoutEntry, format_recorded_at, new_id, round_one_decimal,
};

fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Date and `HH:MM` time inputs shared by both forms.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedAtInput {
    pub date: NaiveDate,
    pub time: String,
}

impl RecordedAtInput {
    pub fn now() -> Self {
        Self::from_datetime(Local::now().naive_local())
    }

    pub fn from_datetime(dt: NaiveDateTime) -> Self {
        Self {
            date: dt.date(),
            time: dt.format("%H:%M").to_string(),
        }
    }

    pub fn datetime(&self) -> Option<NaiveDateTime> {
        NaiveTime::parse_from_str(self.time.trim(), "%H:%M")
            .ok()
            .map(|t| self.date.and_time(t))
    }

    pub fn recorded_at(&self) -> Option<String> {
        self.datetime().map(format_recorded_at)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BodyMetricForm {
    pub weight: String,
    pub body_fat: String,
    pub recorded_at: RecordedAtInput,
}

impl Default for BodyMetricForm {
    fn default() -> Self {
        Self {
            weight: String::new(),
            body_fat: String::new(),
            recorded_at: RecordedAtInput::now(),
        }
    }
}

impl BodyMetricForm {
    fn values(&self) -> Option<(f64, f64, String)> {
        Some((
            round_one_decimal(parse_number(&self.weight)?),
            round_one_decimal(parse_number(&self.body_fat)?),
            self.recorded_at.recorded_at()?,
        ))
    }

    pub fn can_save(&self) -> bool {
        self.values().is_some()
    }

    /// Metric for the current input, values rounded to one decimal.
    pub fn build(&self) -> Option<BodyMetric> {
        let (weight, body_fat_pct, recorded_at) = self.values()?;
        Some(BodyMetric {
            id: new_id(),
            weight,
            body_fat_pct,
            recorded_at,
        })
    }

    pub fn reset_after_save(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutForm {
    pub body_part: BodyPart,
    pub exercise: String,
    pub weight_kg: String,
    /// Rep count typed but not yet added as a set.
    pub reps: String,
    pub sets: Vec<Reps>,
    pub note: String,
    pub recorded_at: RecordedAtInput,
    pub adding_exercise: bool,
    pub new_exercise_name: String,
}

impl Default for WorkoutForm {
    fn default() -> Self {
        Self {
            body_part: BodyPart::Chest,
            exercise: String::new(),
            weight_kg: String::new(),
            reps: String::new(),
            sets: Vec::new(),
            note: String::new(),
            recorded_at: RecordedAtInput::now(),
            adding_exercise: false,
            new_exercise_name: String::new(),
        }
    }
}

impl WorkoutForm {
    /// Add the typed rep count as a set. Empty or invalid input becomes `n`.
    pub fn add_set(&mut self) {
        let reps = self.reps.trim().parse::<u32>().map(Reps::from).unwrap_or(Reps::Unspecified);
        self.sets.push(reps);
        self.reps.clear();
    }

    pub fn add_unspecified_set(&mut self) {
        self.sets.push(Reps::Unspecified);
        self.reps.clear();
    }

    pub fn remove_set(&mut self, index: usize) {
        if index < self.sets.len() {
            self.sets.remove(index);
        }
    }

    /// Switch body part and pick the first exercise of its list.
    pub fn select_body_part(&mut self, body_part: BodyPart, exercises: &[String]) {
        self.body_part = body_part;
        self.exercise = exercises.first().cloned().unwrap_or_default();
        self.adding_exercise = false;
        self.new_exercise_name.clear();
    }

    pub fn can_save(&self) -> bool {
        !self.exercise.is_empty()
            && parse_number(&self.weight_kg).is_some()
            && !self.sets.is_empty()
            && self.recorded_at.datetime().is_some()
    }

    /// One entry per set, numbered in input order and sharing the timestamp.
    pub fn build_entries(&self) -> Vec<WorkoutEntry> {
        if !self.can_save() {
            return Vec::new();
        }
        let (Some(weight_kg), Some(recorded_at)) =
            (parse_number(&self.weight_kg), self.recorded_at.recorded_at())
        else {
            return Vec::new();
        };
        let note = self.note.trim().to_string();
        self.sets
            .iter()
            .enumerate()
            .map(|(i, &reps)| WorkoutEntry {
                id: new_id(),
                body_part: self.body_part,
                exercise: self.exercise.clone(),
                weight_kg,
                reps,
                note: note.clone(),
                recorded_at: recorded_at.clone(),
                set_order: Some(i as u32),
            })
            .collect()
    }

    /// Clear the per-submission fields; body part, exercise and weight stay
    /// selected for the next set of sets.
    pub fn reset_after_save(&mut self) {
        self.sets.clear();
        self.reps.clear();
        self.note.clear();
        self.recorded_at = RecordedAtInput::now();
    }
}
