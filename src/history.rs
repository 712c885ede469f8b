// Grouping of workout history for display and training staleness checks
use chrono::{Datelike, NaiveDate, NaiveDateTime};

use crate::body_parts::BodyPart;
use crate::models::{Reps, WorkoutEntry};

/// Days without training after which a body part is flagged.
pub const STALE_AFTER_DAYS: i64 = 4;

const WEEKDAYS: [&str; 7] = ["日", "月", "火", "水", "木", "金", "土"];

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Sets sharing exercise and weight within one body-part group.
#[derive(Debug, Clone, PartialEq)]
pub struct ExerciseGroup {
    pub exercise: String,
    pub weight_kg: f64,
    pub reps: Vec<Reps>,
    pub entries: Vec<WorkoutEntry>,
    pub note: String,
}

impl ExerciseGroup {
    /// Ids of every set in the group, used to delete it as a whole.
    pub fn entry_ids(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.id.as_str()).collect()
    }

    /// Reps joined for display, e.g. `10 / 8 / n`.
    pub fn reps_label(&self) -> String {
        self.reps
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join(" / ")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BodyPartGroup {
    pub body_part: BodyPart,
    pub entries: Vec<WorkoutEntry>,
    pub exercise_groups: Vec<ExerciseGroup>,
}

/// All sets recorded on one calendar date.
#[derive(Debug, Clone, PartialEq)]
pub struct DayGroup {
    pub date: String,
    pub label: String,
    pub body_part_groups: Vec<BodyPartGroup>,
}

/// A body part that has gone unworked for too long.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaleBodyPart {
    pub body_part: BodyPart,
    /// `None` when the body part has never been trained.
    pub days_since: Option<i64>,
}

/// Date portion of a `recordedAt` value.
///
/// Takes everything before the first space, falling back to the part before a
/// `T` separator and finally to the whole string.
pub fn extract_date(recorded_at: &str) -> &str {
    for sep in [' ', 'T'] {
        if let Some((date, _)) = recorded_at.split_once(sep) {
            if !date.is_empty() {
                return date;
            }
        }
    }
    recorded_at
}

fn parse_date(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(date, "%Y/%m/%d"))
        .ok()
}

/// Render a date as `2/23（月）`. Unparseable input is returned as is.
pub fn format_date_label(date: &str) -> String {
    match parse_date(date) {
        Some(d) => format!(
            "{}/{}（{}）",
            d.month(),
            d.day(),
            WEEKDAYS[d.weekday().num_days_from_sunday() as usize]
        ),
        None => {
            log::debug!("Unparseable workout date: {date}");
            date.to_string()
        }
    }
}

/// Merge sets with the same exercise and weight.
///
/// Entries are ordered by `set_order` first, with entries lacking one placed
/// after the rest in their original order. Groups appear in the order their
/// first set does, and each keeps the first non-empty note.
pub fn group_by_exercise(entries: &[WorkoutEntry]) -> Vec<ExerciseGroup> {
    let mut sorted: Vec<&WorkoutEntry> = entries.iter().collect();
    sorted.sort_by_key(|e| (e.set_order.is_none(), e.set_order));

    let mut groups: Vec<ExerciseGroup> = Vec::new();
    for e in sorted {
        let existing = groups
            .iter()
            .position(|g| g.exercise == e.exercise && g.weight_kg == e.weight_kg);
        let idx = match existing {
            Some(idx) => idx,
            None => {
                groups.push(ExerciseGroup {
                    exercise: e.exercise.clone(),
                    weight_kg: e.weight_kg,
                    reps: Vec::new(),
                    entries: Vec::new(),
                    note: String::new(),
                });
                groups.len() - 1
            }
        };
        let g = &mut groups[idx];
        g.reps.push(e.reps);
        g.entries.push(e.clone());
        if g.note.is_empty() && !e.note.is_empty() {
            g.note = e.note.clone();
        }
    }
    groups
}

/// Arrange entries as date → body part → exercise group.
///
/// Dates are listed newest first. Body parts keep the order in which they
/// first occur among the entries of their date.
pub fn group_entries(entries: &[WorkoutEntry]) -> Vec<DayGroup> {
    let mut days: Vec<(&str, Vec<&WorkoutEntry>)> = Vec::new();
    for e in entries {
        let date = extract_date(&e.recorded_at);
        match days.iter_mut().find(|(d, _)| *d == date) {
            Some((_, list)) => list.push(e),
            None => days.push((date, vec![e])),
        }
    }
    days.sort_by(|a, b| b.0.cmp(a.0));

    days.into_iter()
        .map(|(date, day_entries)| {
            let mut parts: Vec<(BodyPart, Vec<WorkoutEntry>)> = Vec::new();
            for e in day_entries {
                match parts.iter_mut().find(|(bp, _)| *bp == e.body_part) {
                    Some((_, list)) => list.push(e.clone()),
                    None => parts.push((e.body_part, vec![e.clone()])),
                }
            }
            DayGroup {
                date: date.to_string(),
                label: format_date_label(date),
                body_part_groups: parts
                    .into_iter()
                    .map(|(body_part, entries)| {
                        let exercise_groups = group_by_exercise(&entries);
                        BodyPartGroup {
                            body_part,
                            entries,
                            exercise_groups,
                        }
                    })
                    .collect(),
            }
        })
        .collect()
}

/// Body parts not trained for [`STALE_AFTER_DAYS`] or more, plus those never
/// trained, in the order of `body_parts`.
///
/// Elapsed days are whole days between midnight of the last training date and
/// `now`. Entries whose date cannot be parsed are ignored.
pub fn compute_stale_body_parts(
    entries: &[WorkoutEntry],
    body_parts: &[BodyPart],
    now: NaiveDateTime,
) -> Vec<StaleBodyPart> {
    body_parts
        .iter()
        .filter_map(|&body_part| {
            let last = entries
                .iter()
                .filter(|e| e.body_part == body_part)
                .filter_map(|e| parse_date(extract_date(&e.recorded_at)))
                .max();
            let days_since = last
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|start| (now - start).num_milliseconds().div_euclid(MILLIS_PER_DAY));
            match days_since {
                Some(days) if days < STALE_AFTER_DAYS => None,
                _ => Some(StaleBodyPart {
                    body_part,
                    days_since,
                }),
            }
        })
        .collect()
}
