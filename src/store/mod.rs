//! Local record store backed by SQLite.
//!
//! Holds body metrics, workout sets and the per body part exercise lists.
//! A [`Store`] is opened once and handed to whoever needs it; the schema is
//! checked and created when the handle is opened.

pub mod queries;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::{Connection, OptionalExtension, ToSql, params};
use std::path::Path;

use crate::body_parts::BodyPart;
use crate::history::ExerciseGroup;
use crate::models::{BodyMetric, ExerciseList, Reps, WorkoutEntry};
use queries::*;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("database schema version {0} is newer than this build supports")]
    UnsupportedSchema(i64),
}

pub type Result<T, E = StoreError> = std::result::Result<T, E>;

impl ToSql for BodyPart {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.label()))
    }
}

impl FromSql for BodyPart {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

impl ToSql for Reps {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_u32()))
    }
}

impl FromSql for Reps {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        u32::column_result(value).map(Reps::from)
    }
}

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        log::info!("Opening record store at {}", path.display());
        Self::init(Connection::open(path)?)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        let store = Store { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;
        if version > SCHEMA_VERSION {
            return Err(StoreError::UnsupportedSchema(version));
        }
        if version < 1 {
            self.conn.execute_batch(SCHEMA_V1)?;
            self.conn
                .pragma_update(None, "user_version", SCHEMA_VERSION)?;
            log::info!("Initialized record store schema v{SCHEMA_VERSION}");
        }
        Ok(())
    }

    fn body_metric_from_row(row: &rusqlite::Row) -> rusqlite::Result<BodyMetric> {
        Ok(BodyMetric {
            id: row.get(0)?,
            weight: row.get(1)?,
            body_fat_pct: row.get(2)?,
            recorded_at: row.get(3)?,
        })
    }

    fn workout_from_row(row: &rusqlite::Row) -> rusqlite::Result<WorkoutEntry> {
        Ok(WorkoutEntry {
            id: row.get(0)?,
            body_part: row.get(1)?,
            exercise: row.get(2)?,
            weight_kg: row.get(3)?,
            reps: row.get(4)?,
            note: row.get(5)?,
            recorded_at: row.get(6)?,
            set_order: row.get(7)?,
        })
    }

    // --- Body metrics ---

    pub fn add_body_metric(&self, metric: &BodyMetric) -> Result<()> {
        self.put_body_metric(metric)
    }

    pub fn put_body_metric(&self, metric: &BodyMetric) -> Result<()> {
        self.conn.execute(
            SQL_PUT_BODY_METRIC,
            params![
                metric.id,
                metric.weight,
                metric.body_fat_pct,
                metric.recorded_at
            ],
        )?;
        Ok(())
    }

    /// Body metrics, newest first.
    pub fn list_body_metrics(&self) -> Result<Vec<BodyMetric>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {BODY_METRIC_COLUMNS} FROM body_metrics ORDER BY recorded_at ASC, id ASC"
        ))?;
        let mut metrics = stmt
            .query_map([], Self::body_metric_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        metrics.reverse();
        Ok(metrics)
    }

    pub fn all_body_metrics(&self) -> Result<Vec<BodyMetric>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {BODY_METRIC_COLUMNS} FROM body_metrics ORDER BY id"
        ))?;
        let metrics = stmt
            .query_map([], Self::body_metric_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(metrics)
    }

    /// Removing an unknown id is not an error.
    pub fn delete_body_metric(&self, id: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM body_metrics WHERE id = ?1", params![id])?;
        Ok(())
    }

    // --- Workouts ---

    pub fn add_workout(&self, entry: &WorkoutEntry) -> Result<()> {
        self.put_workout(entry)
    }

    /// Store the sets of one submission, one row at a time in `set_order`.
    ///
    /// The writes are not transactional: when one fails, the sets written
    /// before it stay in the store and the error is returned.
    pub fn add_workout_sets(&self, entries: &[WorkoutEntry]) -> Result<usize> {
        let mut ordered: Vec<&WorkoutEntry> = entries.iter().collect();
        ordered.sort_by_key(|e| (e.set_order.is_none(), e.set_order));
        let mut written = 0;
        for entry in ordered {
            if let Err(e) = self.add_workout(entry) {
                log::error!(
                    "Saving sets stopped after {written} of {}: {e}",
                    entries.len()
                );
                return Err(e);
            }
            written += 1;
        }
        log::info!("Saved {written} sets");
        Ok(written)
    }

    pub fn put_workout(&self, entry: &WorkoutEntry) -> Result<()> {
        self.conn.execute(
            SQL_PUT_WORKOUT,
            params![
                entry.id,
                entry.body_part,
                entry.exercise,
                entry.weight_kg,
                entry.reps,
                entry.note,
                entry.recorded_at,
                entry.set_order
            ],
        )?;
        Ok(())
    }

    /// Workout sets, newest first.
    ///
    /// Rows are read along the date index in ascending order and reversed, so
    /// sets sharing a timestamp come out in reverse id order.
    pub fn list_workouts(&self) -> Result<Vec<WorkoutEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {WORKOUT_COLUMNS} FROM workouts ORDER BY recorded_at ASC, id ASC"
        ))?;
        let mut entries = stmt
            .query_map([], Self::workout_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        entries.reverse();
        Ok(entries)
    }

    pub fn all_workouts(&self) -> Result<Vec<WorkoutEntry>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {WORKOUT_COLUMNS} FROM workouts ORDER BY id"))?;
        let entries = stmt
            .query_map([], Self::workout_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Removing an unknown id is not an error.
    pub fn delete_workout(&self, id: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM workouts WHERE id = ?1", params![id])?;
        Ok(())
    }

    /// Delete every set of a grouped exercise, one after another.
    pub fn delete_exercise_group(&self, group: &ExerciseGroup) -> Result<usize> {
        let ids = group.entry_ids();
        for id in &ids {
            self.delete_workout(id)?;
        }
        Ok(ids.len())
    }

    // --- Exercise lists ---

    fn exercise_list(&self, body_part: BodyPart) -> Result<Option<Vec<String>>> {
        let json: Option<String> = self
            .conn
            .query_row(
                "SELECT exercises FROM exercise_lists WHERE body_part = ?1",
                params![body_part],
                |row| row.get(0),
            )
            .optional()?;
        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Exercises for a body part, seeding the built-in list on first access.
    pub fn list_exercises(&self, body_part: BodyPart) -> Result<Vec<String>> {
        if let Some(list) = self.exercise_list(body_part)? {
            return Ok(list);
        }
        let defaults: Vec<String> = body_part
            .default_exercises()
            .iter()
            .map(|s| s.to_string())
            .collect();
        self.put_exercise_list(&ExerciseList {
            body_part,
            exercises: defaults.clone(),
        })?;
        Ok(defaults)
    }

    /// Append a custom exercise unless it is already listed. Returns the
    /// resulting list.
    pub fn add_exercise(&self, body_part: BodyPart, name: &str) -> Result<Vec<String>> {
        let mut current = self.list_exercises(body_part)?;
        let name = name.trim();
        if name.is_empty() || current.iter().any(|e| e == name) {
            return Ok(current);
        }
        current.push(name.to_string());
        self.put_exercise_list(&ExerciseList {
            body_part,
            exercises: current.clone(),
        })?;
        log::info!("Added exercise {name} to {body_part}");
        Ok(current)
    }

    pub fn put_exercise_list(&self, list: &ExerciseList) -> Result<()> {
        self.conn.execute(
            SQL_PUT_EXERCISE_LIST,
            params![list.body_part, serde_json::to_string(&list.exercises)?],
        )?;
        Ok(())
    }

    pub fn all_exercise_lists(&self) -> Result<Vec<ExerciseList>> {
        let mut stmt = self
            .conn
            .prepare("SELECT body_part, exercises FROM exercise_lists ORDER BY body_part")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, BodyPart>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter()
            .map(|(body_part, json)| {
                Ok(ExerciseList {
                    body_part,
                    exercises: serde_json::from_str(&json)?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::group_entries;

    fn set(id: &str, reps: u32, recorded_at: &str, set_order: Option<u32>) -> WorkoutEntry {
        WorkoutEntry {
            id: id.into(),
            body_part: BodyPart::Chest,
            exercise: "ベンチプレス".into(),
            weight_kg: 60.0,
            reps: Reps::from(reps),
            note: String::new(),
            recorded_at: recorded_at.into(),
            set_order,
        }
    }

    fn metric(id: &str, weight: f64, recorded_at: &str) -> BodyMetric {
        BodyMetric {
            id: id.into(),
            weight,
            body_fat_pct: 15.2,
            recorded_at: recorded_at.into(),
        }
    }

    #[test]
    fn body_metrics_list_newest_first() {
        let store = Store::open_in_memory().unwrap();
        store.add_body_metric(&metric("a", 70.1, "2026-02-20 07:00")).unwrap();
        store.add_body_metric(&metric("b", 69.8, "2026-02-23 07:00")).unwrap();
        store.add_body_metric(&metric("c", 70.0, "2026-02-21 07:00")).unwrap();
        let ids: Vec<String> = store
            .list_body_metrics()
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec!["b", "c", "a"]);

        store.delete_body_metric("c").unwrap();
        store.delete_body_metric("missing").unwrap();
        assert_eq!(store.list_body_metrics().unwrap().len(), 2);
    }

    #[test]
    fn workouts_list_newest_first_with_id_tiebreak() {
        let store = Store::open_in_memory().unwrap();
        store.add_workout(&set("b", 8, "2026-02-21 08:00", None)).unwrap();
        store.add_workout(&set("c", 8, "2026-02-23 09:00", None)).unwrap();
        store.add_workout(&set("a", 8, "2026-02-20 07:00", None)).unwrap();
        store.add_workout(&set("d2", 8, "2026-02-22 10:00", Some(1))).unwrap();
        store.add_workout(&set("d1", 10, "2026-02-22 10:00", Some(0))).unwrap();
        let ids: Vec<String> = store
            .list_workouts()
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec!["c", "d2", "d1", "b", "a"]);
    }

    #[test]
    fn failed_set_keeps_the_ones_written_before_it() {
        let store = Store::open_in_memory().unwrap();
        store
            .conn
            .execute_batch(
                "CREATE TRIGGER reject_third_set BEFORE INSERT ON workouts
                 WHEN NEW.set_order = 2
                 BEGIN SELECT RAISE(ABORT, 'disk full'); END;",
            )
            .unwrap();
        let sets = vec![
            set("s2", 8, "2026-02-23 10:00", Some(1)),
            set("s3", 6, "2026-02-23 10:00", Some(2)),
            set("s1", 10, "2026-02-23 10:00", Some(0)),
        ];
        assert!(matches!(
            store.add_workout_sets(&sets),
            Err(StoreError::Sqlite(_))
        ));

        let mut listed: Vec<String> = store
            .list_workouts()
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        listed.sort();
        assert_eq!(listed, vec!["s1", "s2"]);

        let mut stmt = store
            .conn
            .prepare("SELECT id FROM workouts ORDER BY rowid")
            .unwrap();
        let written: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<rusqlite::Result<_>>()
            .unwrap();
        assert_eq!(written, vec!["s1", "s2"]);
    }

    #[test]
    fn workouts_round_trip_through_sqlite() {
        let store = Store::open_in_memory().unwrap();
        let mut entry = set("a", 0, "2026-02-23 10:00", None);
        entry.note = "failure".into();
        store.add_workout(&entry).unwrap();
        let listed = store.list_workouts().unwrap();
        assert_eq!(listed, vec![entry]);
        assert_eq!(listed[0].reps, Reps::Unspecified);
    }

    #[test]
    fn multi_set_submission_groups_back_together() {
        let store = Store::open_in_memory().unwrap();
        let sets = vec![
            set("s2", 8, "2026-02-23 10:00", Some(1)),
            set("s1", 10, "2026-02-23 10:00", Some(0)),
            set("s3", 0, "2026-02-23 10:00", Some(2)),
        ];
        assert_eq!(store.add_workout_sets(&sets).unwrap(), 3);
        let days = group_entries(&store.list_workouts().unwrap());
        assert_eq!(days.len(), 1);
        let group = &days[0].body_part_groups[0].exercise_groups[0];
        assert_eq!(group.reps_label(), "10 / 8 / n");
    }

    #[test]
    fn deleting_a_group_removes_all_its_sets() {
        let store = Store::open_in_memory().unwrap();
        store
            .add_workout_sets(&[
                set("s1", 10, "2026-02-23 10:00", Some(0)),
                set("s2", 8, "2026-02-23 10:00", Some(1)),
            ])
            .unwrap();
        store.add_workout(&set("other", 5, "2026-02-22 10:00", None)).unwrap();
        let days = group_entries(&store.list_workouts().unwrap());
        let group = days[0].body_part_groups[0].exercise_groups[0].clone();
        assert_eq!(store.delete_exercise_group(&group).unwrap(), 2);
        let left: Vec<String> = store
            .list_workouts()
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(left, vec!["other"]);
        store.delete_workout("s1").unwrap();
    }

    #[test]
    fn exercise_list_seeds_defaults_once() {
        let store = Store::open_in_memory().unwrap();
        assert!(store.all_exercise_lists().unwrap().is_empty());
        let list = store.list_exercises(BodyPart::Legs).unwrap();
        assert_eq!(list[0], "スクワット");
        assert_eq!(store.all_exercise_lists().unwrap().len(), 1);
    }

    #[test]
    fn add_exercise_skips_duplicates() {
        let store = Store::open_in_memory().unwrap();
        let list = store.add_exercise(BodyPart::Arms, " プリーチャーカール ").unwrap();
        assert_eq!(list.len(), 6);
        assert_eq!(list.last().map(String::as_str), Some("プリーチャーカール"));
        let again = store.add_exercise(BodyPart::Arms, "プリーチャーカール").unwrap();
        assert_eq!(again, list);
        let blank = store.add_exercise(BodyPart::Arms, "  ").unwrap();
        assert_eq!(blank, list);
        assert_eq!(store.list_exercises(BodyPart::Arms).unwrap(), list);
    }

    #[test]
    fn reopening_a_file_keeps_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("iron_log.sqlite3");
        {
            let store = Store::open(&path).unwrap();
            store.add_body_metric(&metric("a", 70.1, "2026-02-20 07:00")).unwrap();
        }
        let store = Store::open(&path).unwrap();
        assert_eq!(store.list_body_metrics().unwrap().len(), 1);
    }

    #[test]
    fn newer_schema_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("future.sqlite3");
        {
            let conn = Connection::open(&path).unwrap();
            conn.pragma_update(None, "user_version", SCHEMA_VERSION + 1).unwrap();
        }
        assert!(matches!(
            Store::open(&path),
            Err(StoreError::UnsupportedSchema(v)) if v == SCHEMA_VERSION + 1
        ));
    }
}
