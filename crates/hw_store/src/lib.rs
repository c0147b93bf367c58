//! `hw_store` - `DuckDB` storage layer for hwlab
//!
//! This crate provides:
//! - `DuckDB` connection management
//! - Schema migrations
//! - Record normalization for loosely-typed submissions
//! - Single and atomic bulk ingestion
//! - Ordered read queries

use chrono::Utc;
use duckdb::Connection;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, info, instrument};

pub mod migrations;
pub mod normalize;
pub mod schema;

pub use normalize::RawSample;

/// Storage errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] duckdb::Error),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// The hardware side of a sample: everything except the measured metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HardwareConfig {
    pub oem: String,
    pub board: String,
    pub platform: String,
    pub platform_vendor: String,
    pub form_factor: String,
    pub ram_gb: i64,
    pub storage_gb: i64,
    pub num_cores: i64,
    pub cpu_name: String,
    pub cpu_architecture: String,
    pub cpu_clock_speed: f64,
    pub gpu_model: String,
    pub has_touchscreen: bool,
    pub has_stylus: bool,
    pub screen_size: f64,
    pub pixel_size: String,
    pub battery_manufacturer: String,
    pub usage_group: String,
}

/// Measured or predicted performance metrics.
///
/// Benchmark scores are unbounded non-negative values; `appLaunchSpeed` and
/// `thermalThrottling` are conventionally on a 1-10 scale (not enforced at
/// rest beyond non-negativity).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    #[serde(rename = "singleCoreScore")]
    pub single_core_score: i64,
    #[serde(rename = "multiCoreScore")]
    pub multi_core_score: i64,
    #[serde(rename = "gpuScore")]
    pub gpu_score: i64,
    #[serde(rename = "appLaunchSpeed")]
    pub app_launch_speed: i64,
    #[serde(rename = "thermalThrottling")]
    pub thermal_throttling: i64,
}

/// A complete sample ready for storage: configuration plus metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HardwareSample {
    #[serde(flatten)]
    pub config: HardwareConfig,
    #[serde(flatten)]
    pub metrics: PerformanceMetrics,
}

/// One persisted sample. Immutable once created; the table is append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HardwareRecord {
    pub id: i64,
    #[serde(flatten)]
    pub sample: HardwareSample,
    pub created_at: String,
}

/// Main storage handle
pub struct HwStore {
    conn: Arc<Mutex<Connection>>,
    db_path: String,
}

/// Commit timestamp in the table's canonical text form (UTC).
fn commit_timestamp() -> String {
    Utc::now().format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

fn insert_sql() -> String {
    let placeholders = vec!["?"; 25].join(", ");
    format!(
        "INSERT INTO {} (id, {}, created_at) VALUES ({placeholders})",
        schema::tables::HARDWARE_DATA,
        schema::SAMPLE_COLUMNS,
    )
}

/// Insert one row. Callers hand in either the plain connection or an open
/// transaction (which derefs to a connection).
fn insert_one(
    conn: &Connection,
    id: i64,
    sample: &HardwareSample,
    created_at: &str,
) -> Result<(), duckdb::Error> {
    let c = &sample.config;
    let m = &sample.metrics;
    conn.execute(
        &insert_sql(),
        duckdb::params![
            id,
            c.oem,
            c.board,
            c.platform,
            c.platform_vendor,
            c.form_factor,
            c.ram_gb,
            c.storage_gb,
            c.num_cores,
            c.cpu_name,
            c.cpu_architecture,
            c.cpu_clock_speed,
            c.gpu_model,
            c.has_touchscreen,
            c.has_stylus,
            c.screen_size,
            c.pixel_size,
            c.battery_manufacturer,
            c.usage_group,
            m.single_core_score,
            m.multi_core_score,
            m.gpu_score,
            m.app_launch_speed,
            m.thermal_throttling,
            created_at,
        ],
    )?;
    Ok(())
}

fn record_from_row(row: &duckdb::Row<'_>) -> Result<HardwareRecord, duckdb::Error> {
    Ok(HardwareRecord {
        id: row.get(0)?,
        sample: HardwareSample {
            config: HardwareConfig {
                oem: row.get(1)?,
                board: row.get(2)?,
                platform: row.get(3)?,
                platform_vendor: row.get(4)?,
                form_factor: row.get(5)?,
                ram_gb: row.get(6)?,
                storage_gb: row.get(7)?,
                num_cores: row.get(8)?,
                cpu_name: row.get(9)?,
                cpu_architecture: row.get(10)?,
                cpu_clock_speed: row.get(11)?,
                gpu_model: row.get(12)?,
                has_touchscreen: row.get(13)?,
                has_stylus: row.get(14)?,
                screen_size: row.get(15)?,
                pixel_size: row.get(16)?,
                battery_manufacturer: row.get(17)?,
                usage_group: row.get(18)?,
            },
            metrics: PerformanceMetrics {
                single_core_score: row.get(19)?,
                multi_core_score: row.get(20)?,
                gpu_score: row.get(21)?,
                app_launch_speed: row.get(22)?,
                thermal_throttling: row.get(23)?,
            },
        },
        created_at: row.get(24)?,
    })
}

const SELECT_RECORD: &str = "SELECT id, oem, board, platform, platform_vendor, form_factor, \
     ram_gb, storage_gb, num_cores, cpu_name, cpu_architecture, cpu_clock_speed, gpu_model, \
     has_touchscreen, has_stylus, screen_size, pixel_size, battery_manufacturer, usage_group, \
     \"singleCoreScore\", \"multiCoreScore\", \"gpuScore\", \"appLaunchSpeed\", \"thermalThrottling\", \
     CAST(created_at AS TEXT) AS created_at FROM hardware_data";

impl HwStore {
    /// Open or create database at path
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if directory creation, database opening, pragma
    /// setup, or migration execution fails.
    #[instrument]
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        info!(path = %path.display(), "Opening DuckDB database");

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        conn.execute_batch("PRAGMA threads=4;")?;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
            db_path: path.to_string_lossy().to_string(),
        };

        store.run_migrations()?;

        Ok(store)
    }

    /// Open in-memory database (for testing)
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if in-memory database setup or migrations fail.
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
            db_path: ":memory:".to_string(),
        };

        store.run_migrations()?;

        Ok(store)
    }

    /// Run all pending migrations
    fn run_migrations(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        migrations::run_all(&conn)?;
        Ok(())
    }

    /// Get database path
    #[must_use]
    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    /// Insert one fully-populated sample, returning its assigned id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if id allocation or the insert fails.
    ///
    /// # Panics
    ///
    /// Panics if the internal database mutex is poisoned.
    pub fn insert_sample(&self, sample: &HardwareSample) -> Result<i64, StoreError> {
        let conn = self.conn.lock().unwrap();

        let next_id: i64 = conn.query_row(
            "SELECT COALESCE(MAX(id), 0) + 1 FROM hardware_data",
            [],
            |row| row.get(0),
        )?;

        insert_one(&conn, next_id, sample, &commit_timestamp())?;
        debug!(id = next_id, "Inserted hardware sample");
        Ok(next_id)
    }

    /// Insert a batch of samples as one atomic transaction.
    ///
    /// Either every sample becomes visible to subsequent reads or none do:
    /// any failure rolls the whole batch back. All rows in the batch share
    /// one commit timestamp; ids continue the existing monotonic sequence in
    /// batch order. Returns the number of rows committed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if id allocation, any insert, or the commit
    /// fails. On error no row of the batch is persisted.
    ///
    /// # Panics
    ///
    /// Panics if the internal database mutex is poisoned.
    pub fn insert_batch(&self, samples: &[HardwareSample]) -> Result<usize, StoreError> {
        if samples.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let base_id: i64 = tx.query_row(
            "SELECT COALESCE(MAX(id), 0) FROM hardware_data",
            [],
            |row| row.get(0),
        )?;

        let created_at = commit_timestamp();
        for (offset, sample) in samples.iter().enumerate() {
            insert_one(&tx, base_id + 1 + offset as i64, sample, &created_at)?;
        }

        tx.commit()?;
        info!(count = samples.len(), "Committed bulk ingest");
        Ok(samples.len())
    }

    /// All persisted records, most recently created first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if query execution or row decoding fails.
    ///
    /// # Panics
    ///
    /// Panics if the internal database mutex is poisoned.
    pub fn list_records(&self) -> Result<Vec<HardwareRecord>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let sql = format!("{SELECT_RECORD} ORDER BY created_at DESC, id DESC");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| record_from_row(row))?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    /// The `limit` most recently created records, most recent first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if query execution or row decoding fails.
    ///
    /// # Panics
    ///
    /// Panics if the internal database mutex is poisoned.
    pub fn recent_records(&self, limit: usize) -> Result<Vec<HardwareRecord>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let sql = format!("{SELECT_RECORD} ORDER BY created_at DESC, id DESC LIMIT {limit}");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| record_from_row(row))?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    /// Number of persisted records.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the count query fails.
    ///
    /// # Panics
    ///
    /// Panics if the internal database mutex is poisoned.
    pub fn count_records(&self) -> Result<i64, StoreError> {
        let conn = self.conn.lock().unwrap();
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM hardware_data", [], |row| row.get(0))?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample_named(cpu_name: &str) -> HardwareSample {
        let mut sample = RawSample::default().normalize();
        sample.config.cpu_name = cpu_name.to_string();
        sample
    }

    #[test]
    fn test_open_memory_starts_empty() {
        let store = HwStore::open_memory().unwrap();
        assert_eq!(store.count_records().unwrap(), 0);
    }

    #[test]
    fn test_insert_assigns_monotonic_ids() {
        let store = HwStore::open_memory().unwrap();
        let first = store.insert_sample(&sample_named("Tensor G3")).unwrap();
        let second = store.insert_sample(&sample_named("Dimensity 9300")).unwrap();
        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert_eq!(store.count_records().unwrap(), 2);
    }

    #[test]
    fn test_boolean_round_trip() {
        let store = HwStore::open_memory().unwrap();
        let mut sample = sample_named("Snapdragon 8 Gen 3");
        sample.config.has_touchscreen = true;
        sample.config.has_stylus = false;
        store.insert_sample(&sample).unwrap();

        let records = store.list_records().unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].sample.config.has_touchscreen);
        assert!(!records[0].sample.config.has_stylus);
    }

    #[test]
    fn test_list_records_most_recent_first() {
        let store = HwStore::open_memory().unwrap();
        for name in ["a", "b", "c"] {
            store.insert_sample(&sample_named(name)).unwrap();
        }

        let records = store.list_records().unwrap();
        let ids: Vec<i64> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
        assert_eq!(records[0].sample.config.cpu_name, "c");
    }

    #[test]
    fn test_batch_commits_all_with_fresh_ids() {
        let store = HwStore::open_memory().unwrap();
        store.insert_sample(&sample_named("existing")).unwrap();

        let batch: Vec<HardwareSample> =
            (0..5).map(|i| sample_named(&format!("cpu-{i}"))).collect();
        let count = store.insert_batch(&batch).unwrap();
        assert_eq!(count, 5);
        assert_eq!(store.count_records().unwrap(), 6);

        let mut ids: Vec<i64> = store.list_records().unwrap().iter().map(|r| r.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_batch_shares_one_commit_timestamp() {
        let store = HwStore::open_memory().unwrap();
        let batch: Vec<HardwareSample> =
            (0..3).map(|i| sample_named(&format!("cpu-{i}"))).collect();
        store.insert_batch(&batch).unwrap();

        let records = store.list_records().unwrap();
        assert_eq!(records[0].created_at, records[2].created_at);
    }

    #[test]
    fn test_batch_rolls_back_on_constraint_violation() {
        let store = HwStore::open_memory().unwrap();
        store.insert_sample(&sample_named("existing")).unwrap();

        let mut batch: Vec<HardwareSample> =
            (0..4).map(|i| sample_named(&format!("cpu-{i}"))).collect();
        // Violates the non-negative CHECK on screen_size
        batch[2].config.screen_size = -1.0;

        let result = store.insert_batch(&batch);
        assert!(result.is_err());
        assert_eq!(store.count_records().unwrap(), 1);
    }

    #[test]
    fn test_empty_batch_is_a_no_op() {
        let store = HwStore::open_memory().unwrap();
        assert_eq!(store.insert_batch(&[]).unwrap(), 0);
        assert_eq!(store.count_records().unwrap(), 0);
    }

    #[test]
    fn test_recent_records_truncates() {
        let store = HwStore::open_memory().unwrap();
        for i in 0..10 {
            store.insert_sample(&sample_named(&format!("cpu-{i}"))).unwrap();
        }

        let recent = store.recent_records(4).unwrap();
        let ids: Vec<i64> = recent.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![10, 9, 8, 7]);
    }

    #[test]
    fn test_record_serializes_flat() {
        let store = HwStore::open_memory().unwrap();
        store.insert_sample(&sample_named("Exynos 2400")).unwrap();

        let records = store.list_records().unwrap();
        let json = serde_json::to_value(&records[0]).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["cpu_name"], "Exynos 2400");
        assert_eq!(json["singleCoreScore"], 0);
        assert_eq!(json["has_touchscreen"], false);
        assert!(json["created_at"].is_string());
    }

    proptest! {
        #[test]
        fn test_sample_json_round_trip(
            oem in "[A-Za-z]{1,12}",
            ram_gb in 0i64..64,
            clock in 0.0f64..6.0,
            touch in proptest::bool::ANY,
            score in 0i64..10_000
        ) {
            let mut sample = RawSample::default().normalize();
            sample.config.oem = oem;
            sample.config.ram_gb = ram_gb;
            sample.config.cpu_clock_speed = clock;
            sample.config.has_touchscreen = touch;
            sample.metrics.single_core_score = score;

            let json = serde_json::to_string(&sample).unwrap();
            let parsed: HardwareSample = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(parsed, sample);
        }
    }
}
