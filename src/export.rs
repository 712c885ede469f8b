use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::Write;
use std::path::Path;

use crate::models::{BodyMetric, ExerciseList, WorkoutEntry, normalize_recorded_at};
use crate::store::{Store, StoreError};

/// Full copy of the log, used to move data between devices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    pub body_metrics: Vec<BodyMetric>,
    pub workouts: Vec<WorkoutEntry>,
    pub exercises: Vec<ExerciseList>,
}

/// Number of records written by an import.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub body_metrics: usize,
    pub workouts: usize,
    pub exercise_lists: usize,
}

impl ImportSummary {
    pub fn total(&self) -> usize {
        self.body_metrics + self.workouts + self.exercise_lists
    }
}

pub fn write_csv<T: Serialize>(writer: impl Write, records: &[T]) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for r in records {
        wtr.serialize(r)?;
    }
    wtr.flush().map_err(Into::into)
}

/// Suggested file name for a backup taken on `date`.
pub fn backup_file_name(date: NaiveDate) -> String {
    format!("iron-log-backup-{}.json", date.format("%Y-%m-%d"))
}

pub fn export_backup(store: &Store) -> Result<Backup, StoreError> {
    Ok(Backup {
        body_metrics: store.all_body_metrics()?,
        workouts: store.all_workouts()?,
        exercises: store.all_exercise_lists()?,
    })
}

pub fn export_json(store: &Store) -> Result<String, StoreError> {
    Ok(serde_json::to_string(&export_backup(store)?)?)
}

pub fn export_to_file<P: AsRef<Path>>(store: &Store, path: P) -> Result<(), StoreError> {
    std::fs::write(path.as_ref(), export_json(store)?)?;
    log::info!("Exported backup to {}", path.as_ref().display());
    Ok(())
}

/// Records under `key`, or `None` when the field is missing or not an array.
fn array_field<T: DeserializeOwned>(data: &Value, key: &str) -> Result<Option<Vec<T>>, StoreError> {
    match data.get(key) {
        Some(v @ Value::Array(_)) => Ok(Some(Vec::<T>::deserialize(v)?)),
        _ => Ok(None),
    }
}

/// Upsert every record of a backup document.
///
/// Collections missing from the document are left as they are. Records are
/// matched on their id (or body part for exercise lists) and overwritten.
/// `T`-separated timestamps are rewritten to the stored layout.
pub fn import_json(store: &Store, json: &str) -> Result<ImportSummary, StoreError> {
    let data: Value = serde_json::from_str(json)?;
    let mut summary = ImportSummary::default();

    if let Some(metrics) = array_field::<BodyMetric>(&data, "bodyMetrics")? {
        for mut m in metrics.iter().cloned() {
            m.recorded_at = normalize_recorded_at(&m.recorded_at);
            store.put_body_metric(&m)?;
        }
        summary.body_metrics = metrics.len();
    }
    if let Some(workouts) = array_field::<WorkoutEntry>(&data, "workouts")? {
        for mut w in workouts.iter().cloned() {
            w.recorded_at = normalize_recorded_at(&w.recorded_at);
            store.put_workout(&w)?;
        }
        summary.workouts = workouts.len();
    }
    if let Some(lists) = array_field::<ExerciseList>(&data, "exercises")? {
        for l in &lists {
            store.put_exercise_list(l)?;
        }
        summary.exercise_lists = lists.len();
    }

    log::info!("Imported {} records", summary.total());
    Ok(summary)
}

pub fn import_from_file<P: AsRef<Path>>(store: &Store, path: P) -> Result<ImportSummary, StoreError> {
    let data = std::fs::read_to_string(path)?;
    import_json(store, &data)
}

/// Write one CSV row per set.
pub fn save_workouts_csv<P: AsRef<Path>>(path: P, entries: &[WorkoutEntry]) -> Result<(), StoreError> {
    #[derive(Serialize)]
    struct Row<'a> {
        recorded_at: &'a str,
        body_part: &'a str,
        exercise: &'a str,
        weight_kg: f64,
        reps: String,
        set_order: Option<u32>,
        note: &'a str,
    }
    let rows: Vec<Row> = entries
        .iter()
        .map(|e| Row {
            recorded_at: &e.recorded_at,
            body_part: e.body_part.label(),
            exercise: &e.exercise,
            weight_kg: e.weight_kg,
            reps: e.reps.to_string(),
            set_order: e.set_order,
            note: &e.note,
        })
        .collect();
    write_csv(std::fs::File::create(path)?, &rows)?;
    Ok(())
}
