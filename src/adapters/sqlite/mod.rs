//! SQLite adapter: Implementation of ExperimentTracker.
//!
//! Each training run is stored with its params, metrics, and the
//! serialized model it produced. Runs are scoped to an experiment name so
//! several experiments can share one database file.
//!
//! # Mutex Behavior
//!
//! The connection is protected by a `Mutex`. A poisoned mutex surfaces as
//! `TrackerError::LockPoisoned` instead of a panic.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection};

use crate::ports::{ExperimentTracker, TrackedRun};

/// Error type for tracker operations.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Failed to create tracking directory {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Tracker connection lock poisoned")]
    LockPoisoned,

    #[error("Stored run {0} has a malformed timestamp")]
    Timestamp(String),
}

/// SQLite-backed experiment tracker.
pub struct SqliteTracker {
    conn: Mutex<Connection>,
    experiment: String,
}

impl SqliteTracker {
    /// Open (or create) the tracking database at `path`.
    ///
    /// # Errors
    /// Returns error if the database cannot be opened or initialized.
    pub fn new<P: AsRef<Path>>(path: P, experiment: &str) -> Result<Self, TrackerError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| TrackerError::CreateDir {
                path: parent.display().to_string(),
                source,
            })?;
        }
        Self::with_connection(Connection::open(path)?, experiment)
    }

    /// Create an in-memory tracker (for testing).
    ///
    /// # Errors
    /// Returns error if the database cannot be created.
    pub fn in_memory(experiment: &str) -> Result<Self, TrackerError> {
        Self::with_connection(Connection::open_in_memory()?, experiment)
    }

    fn with_connection(conn: Connection, experiment: &str) -> Result<Self, TrackerError> {
        let tracker = Self {
            conn: Mutex::new(conn),
            experiment: experiment.to_string(),
        };
        tracker.init_schema()?;
        Ok(tracker)
    }

    /// Name of the experiment runs are recorded under.
    #[must_use]
    pub fn experiment(&self) -> &str {
        &self.experiment
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, TrackerError> {
        self.conn.lock().map_err(|_| TrackerError::LockPoisoned)
    }

    fn init_schema(&self) -> Result<(), TrackerError> {
        let conn = self.lock()?;

        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS runs (
                id TEXT PRIMARY KEY,
                experiment TEXT NOT NULL,
                run_name TEXT NOT NULL,
                model_blob BLOB NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS params (
                run_id TEXT NOT NULL REFERENCES runs(id),
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                PRIMARY KEY (run_id, key)
            );

            CREATE TABLE IF NOT EXISTS metrics (
                run_id TEXT NOT NULL REFERENCES runs(id),
                key TEXT NOT NULL,
                value REAL NOT NULL,
                PRIMARY KEY (run_id, key)
            );

            CREATE INDEX IF NOT EXISTS idx_runs_experiment
                ON runs(experiment, created_at);
            ",
        )?;

        Ok(())
    }

    /// Number of runs recorded under the current experiment.
    ///
    /// # Errors
    /// Returns error if the query fails.
    pub fn count_runs(&self) -> Result<usize, TrackerError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM runs WHERE experiment = ?1",
            params![self.experiment],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

impl ExperimentTracker for SqliteTracker {
    type Error = TrackerError;

    fn record(
        &self,
        run_name: &str,
        params: &BTreeMap<String, String>,
        metrics: &BTreeMap<String, f64>,
        model_blob: &[u8],
    ) -> Result<String, Self::Error> {
        let id = uuid_v4();
        let created_at = chrono::Utc::now().to_rfc3339();

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        tx.execute(
            r"
            INSERT INTO runs (id, experiment, run_name, model_blob, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
            params![id, self.experiment, run_name, model_blob, created_at],
        )?;

        {
            let mut stmt =
                tx.prepare("INSERT INTO params (run_id, key, value) VALUES (?1, ?2, ?3)")?;
            for (key, value) in params {
                stmt.execute(params![id, key, value])?;
            }

            let mut stmt =
                tx.prepare("INSERT INTO metrics (run_id, key, value) VALUES (?1, ?2, ?3)")?;
            for (key, value) in metrics {
                stmt.execute(params![id, key, value])?;
            }
        }

        tx.commit()?;

        tracing::info!(
            run_id = %id,
            run_name,
            experiment = %self.experiment,
            "Recorded training run"
        );

        Ok(id)
    }

    fn list_runs(&self) -> Result<Vec<TrackedRun>, Self::Error> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r"
            SELECT id, run_name, length(model_blob), created_at
            FROM runs
            WHERE experiment = ?1
            ORDER BY created_at ASC, rowid ASC
            ",
        )?;

        let rows = stmt
            .query_map(params![self.experiment], |row| {
                let id: String = row.get(0)?;
                let run_name: String = row.get(1)?;
                let model_size: i64 = row.get(2)?;
                let created_at: String = row.get(3)?;
                Ok((id, run_name, model_size, created_at))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut params_by_run: HashMap<String, BTreeMap<String, String>> = HashMap::new();
        let mut stmt = conn.prepare(
            r"
            SELECT p.run_id, p.key, p.value
            FROM params p JOIN runs r ON r.id = p.run_id
            WHERE r.experiment = ?1
            ",
        )?;
        let param_rows = stmt.query_map(params![self.experiment], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;
        for row in param_rows {
            let (run_id, key, value) = row?;
            params_by_run.entry(run_id).or_default().insert(key, value);
        }

        let mut metrics_by_run: HashMap<String, BTreeMap<String, f64>> = HashMap::new();
        let mut stmt = conn.prepare(
            r"
            SELECT m.run_id, m.key, m.value
            FROM metrics m JOIN runs r ON r.id = m.run_id
            WHERE r.experiment = ?1
            ",
        )?;
        let metric_rows = stmt.query_map(params![self.experiment], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
            ))
        })?;
        for row in metric_rows {
            let (run_id, key, value) = row?;
            metrics_by_run.entry(run_id).or_default().insert(key, value);
        }

        rows.into_iter()
            .map(|(id, run_name, model_size, created_at)| {
                let created_at = chrono::DateTime::parse_from_rfc3339(&created_at)
                    .map(|dt| dt.with_timezone(&chrono::Utc))
                    .map_err(|_| TrackerError::Timestamp(id.clone()))?;

                Ok(TrackedRun {
                    params: params_by_run.remove(&id).unwrap_or_default(),
                    metrics: metrics_by_run.remove(&id).unwrap_or_default(),
                    experiment: self.experiment.clone(),
                    run_name,
                    model_size: model_size as usize,
                    created_at,
                    id,
                })
            })
            .collect()
    }
}

/// Generate a random UUID v4 string.
fn uuid_v4() -> String {
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha20Rng;

    let mut rng = ChaCha20Rng::from_entropy();
    let mut bytes: [u8; 16] = rng.gen();
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}
