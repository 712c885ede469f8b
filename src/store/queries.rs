// SQL used by the record store.
// Column lists are shared between statements so row mapping stays in one place.

/// Bumped whenever SCHEMA_V1 gains a successor.
pub const SCHEMA_VERSION: i64 = 1;

pub const SCHEMA_V1: &str = "
CREATE TABLE IF NOT EXISTS body_metrics (
    id TEXT PRIMARY KEY,
    weight REAL NOT NULL,
    body_fat_pct REAL NOT NULL,
    recorded_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS body_metrics_by_date ON body_metrics (recorded_at);

CREATE TABLE IF NOT EXISTS workouts (
    id TEXT PRIMARY KEY,
    body_part TEXT NOT NULL,
    exercise TEXT NOT NULL,
    weight_kg REAL NOT NULL,
    reps INTEGER NOT NULL DEFAULT 0,
    note TEXT NOT NULL DEFAULT '',
    recorded_at TEXT NOT NULL,
    set_order INTEGER
);
CREATE INDEX IF NOT EXISTS workouts_by_date ON workouts (recorded_at);

CREATE TABLE IF NOT EXISTS exercise_lists (
    body_part TEXT PRIMARY KEY,
    exercises TEXT NOT NULL
);
";

pub const BODY_METRIC_COLUMNS: &str = "id, weight, body_fat_pct, recorded_at";

pub const WORKOUT_COLUMNS: &str =
    "id, body_part, exercise, weight_kg, reps, note, recorded_at, set_order";

pub const SQL_PUT_BODY_METRIC: &str = "INSERT OR REPLACE INTO body_metrics
    (id, weight, body_fat_pct, recorded_at) VALUES (?1, ?2, ?3, ?4)";

pub const SQL_PUT_WORKOUT: &str = "INSERT OR REPLACE INTO workouts
    (id, body_part, exercise, weight_kg, reps, note, recorded_at, set_order)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)";

pub const SQL_PUT_EXERCISE_LIST: &str =
    "INSERT OR REPLACE INTO exercise_lists (body_part, exercises) VALUES (?1, ?2)";
