//! SQLite storage gateway for logs, alerts and responses.
//!
//! Every operation opens its own connection, runs its statements and drops
//! the connection again; nothing is pooled or shared between calls. Writes
//! commit immediately. All methods are blocking and fallible; async callers
//! go through [`Storage::run`] and apply the failure policy themselves
//! (log the fault, fall back to an empty or zero value).

use rusqlite::{Connection, OptionalExtension, Row, params};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::actions::is_resolving_action;
use crate::config::StorageConfig;
use crate::error::StorageError;
use crate::types::{
    ActionOutcome, Alert, AlertStatus, DashboardStats, LogEntry, ResponseRecord, severity, source,
};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp DATETIME DEFAULT CURRENT_TIMESTAMP,
    source TEXT,
    message TEXT,
    severity TEXT
);

CREATE TABLE IF NOT EXISTS alerts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp DATETIME DEFAULT CURRENT_TIMESTAMP,
    threat_type TEXT,
    severity TEXT,
    description TEXT,
    status TEXT DEFAULT 'active'
);

CREATE TABLE IF NOT EXISTS responses (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    alert_id INTEGER,
    action TEXT,
    timestamp DATETIME DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (alert_id) REFERENCES alerts (id)
);
"#;

/// Rows inserted by [`Storage::seed_sample_logs`] into an empty database.
const SAMPLE_LOGS: [(&str, &str); 5] = [
    (source::SYSTEM, "SOC System initialized successfully"),
    (source::FIREWALL, "Normal traffic from 192.168.1.50"),
    (source::ENDPOINT, "User login successful - jane.smith"),
    (source::SYSTEM, "Antivirus definitions updated"),
    (source::FIREWALL, "VPN connection established"),
];

/// Handle to the SQLite database file. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Storage {
    path: PathBuf,
    enforce_alert_reference: bool,
}

impl Storage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            enforce_alert_reference: false,
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(&config.path).with_alert_reference_check(config.enforce_alert_reference)
    }

    /// Reject responses whose `alert_id` does not name an existing alert.
    pub fn with_alert_reference_check(mut self, enforce: bool) -> Self {
        self.enforce_alert_reference = enforce;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection, StorageError> {
        let conn = Connection::open(&self.path)?;
        // The generator and request handlers write concurrently.
        conn.busy_timeout(Duration::from_secs(5))?;
        // Bundled SQLite enforces foreign keys by default; responses may
        // reference missing alerts unless the check is switched on.
        conn.pragma_update(None, "foreign_keys", self.enforce_alert_reference)?;
        Ok(conn)
    }

    /// Run a blocking storage operation on the blocking thread pool.
    pub async fn run<T, F>(&self, op: F) -> Result<T, StorageError>
    where
        F: FnOnce(&Storage) -> Result<T, StorageError> + Send + 'static,
        T: Send + 'static,
    {
        let storage = self.clone();
        tokio::task::spawn_blocking(move || op(&storage)).await?
    }

    /// Create the three tables if they do not exist yet.
    pub fn initialize(&self) -> Result<(), StorageError> {
        let conn = self.connect()?;
        conn.execute_batch(SCHEMA)?;
        debug!(path = %self.path.display(), "Storage schema ready");
        Ok(())
    }

    /// Insert the sample logs if the `logs` table is empty. Returns the
    /// number of rows inserted.
    pub fn seed_sample_logs(&self) -> Result<usize, StorageError> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let existing: i64 = tx.query_row("SELECT COUNT(*) FROM logs", [], |row| row.get(0))?;
        if existing > 0 {
            return Ok(0);
        }
        {
            let mut stmt =
                tx.prepare("INSERT INTO logs (source, message, severity) VALUES (?1, ?2, ?3)")?;
            for (src, message) in SAMPLE_LOGS {
                stmt.execute(params![src, message, severity::INFO])?;
            }
        }
        tx.commit()?;
        Ok(SAMPLE_LOGS.len())
    }

    /// Append a log row and return its id.
    pub fn record_log(
        &self,
        source: &str,
        message: &str,
        severity: &str,
    ) -> Result<i64, StorageError> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO logs (source, message, severity) VALUES (?1, ?2, ?3)",
            params![source, message, severity],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Append an active alert and return its id.
    pub fn record_alert(
        &self,
        threat_type: &str,
        severity: &str,
        description: &str,
    ) -> Result<i64, StorageError> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO alerts (threat_type, severity, description) VALUES (?1, ?2, ?3)",
            params![threat_type, severity, description],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Append a response row and return its id.
    pub fn record_response(&self, alert_id: i64, action: &str) -> Result<i64, StorageError> {
        let conn = self.connect()?;
        if self.enforce_alert_reference {
            ensure_alert_exists(&conn, alert_id)?;
        }
        conn.execute(
            "INSERT INTO responses (alert_id, action) VALUES (?1, ?2)",
            params![alert_id, action],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Mark the alert resolved when `action` is a resolving label. Returns
    /// whether the label qualified; resolving twice is harmless.
    pub fn resolve_alert_if_blocking(&self, alert_id: i64, action: &str) -> Result<bool, StorageError> {
        if !is_resolving_action(action) {
            return Ok(false);
        }
        let conn = self.connect()?;
        mark_resolved(&conn, alert_id)?;
        Ok(true)
    }

    /// Write the outcome log, the response row and the optional resolution in
    /// a single transaction.
    pub fn record_action(
        &self,
        alert_id: i64,
        action: &str,
        message: &str,
    ) -> Result<ActionOutcome, StorageError> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;

        if self.enforce_alert_reference {
            ensure_alert_exists(&tx, alert_id)?;
        }

        tx.execute(
            "INSERT INTO logs (source, message, severity) VALUES (?1, ?2, ?3)",
            params![source::AUTOMATED_RESPONSE, message, severity::INFO],
        )?;
        let log_id = tx.last_insert_rowid();

        tx.execute(
            "INSERT INTO responses (alert_id, action) VALUES (?1, ?2)",
            params![alert_id, action],
        )?;
        let response_id = tx.last_insert_rowid();

        let resolved = is_resolving_action(action);
        if resolved {
            mark_resolved(&tx, alert_id)?;
        }

        tx.commit()?;
        Ok(ActionOutcome {
            log_id,
            response_id,
            resolved,
        })
    }

    /// Most recent logs first; rows sharing a timestamp come newest-inserted
    /// first. Rows with missing columns are skipped.
    pub fn list_recent_logs(&self, limit: usize) -> Result<Vec<LogEntry>, StorageError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT id, timestamp, source, message, severity FROM logs \
             ORDER BY timestamp DESC, id DESC LIMIT ?1",
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map([limit], log_from_row)?;
        collect_rows(rows, "logs")
    }

    /// Alerts still in the `active` state, newest first.
    pub fn list_active_alerts(&self) -> Result<Vec<Alert>, StorageError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT id, timestamp, threat_type, severity, description, status FROM alerts \
             WHERE status = 'active' ORDER BY timestamp DESC, id DESC",
        )?;
        let rows = stmt.query_map([], alert_from_row)?;
        collect_rows(rows, "alerts")
    }

    pub fn get_alert(&self, alert_id: i64) -> Result<Option<Alert>, StorageError> {
        let conn = self.connect()?;
        let alert = conn
            .query_row(
                "SELECT id, timestamp, threat_type, severity, description, status FROM alerts \
                 WHERE id = ?1",
                [alert_id],
                alert_from_row,
            )
            .optional()?;
        Ok(alert)
    }

    /// Responses recorded against an alert, oldest first.
    pub fn responses_for_alert(&self, alert_id: i64) -> Result<Vec<ResponseRecord>, StorageError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT id, alert_id, action, timestamp FROM responses \
             WHERE alert_id = ?1 ORDER BY id ASC",
        )?;
        let rows = stmt.query_map([alert_id], |row| {
            Ok(ResponseRecord {
                id: row.get(0)?,
                alert_id: row.get(1)?,
                action: row.get(2)?,
                timestamp: row.get(3)?,
            })
        })?;
        collect_rows(rows, "responses")
    }

    pub fn aggregate_stats(&self) -> Result<DashboardStats, StorageError> {
        let conn = self.connect()?;
        let count = |sql: &str| conn.query_row(sql, [], |row| row.get::<_, i64>(0));
        Ok(DashboardStats {
            active_alert_count: count("SELECT COUNT(*) FROM alerts WHERE status = 'active'")?,
            total_log_count: count("SELECT COUNT(*) FROM logs")?,
            total_alert_count: count("SELECT COUNT(*) FROM alerts")?,
            today_log_count: count(
                "SELECT COUNT(*) FROM logs WHERE date(timestamp) = date('now')",
            )?,
        })
    }

    /// Alert counts per threat type over the last 24 hours.
    pub fn threat_distribution(&self) -> Result<BTreeMap<String, i64>, StorageError> {
        self.grouped_counts(
            "SELECT threat_type, COUNT(*) FROM alerts \
             WHERE timestamp >= datetime('now', '-24 hours') \
             GROUP BY threat_type",
        )
    }

    /// Alert counts per `HH:00` bucket over the last 24 hours.
    pub fn threat_timeline(&self) -> Result<BTreeMap<String, i64>, StorageError> {
        self.grouped_counts(
            "SELECT strftime('%H:00', timestamp) AS hour, COUNT(*) FROM alerts \
             WHERE timestamp >= datetime('now', '-24 hours') \
             GROUP BY hour ORDER BY hour",
        )
    }

    fn grouped_counts(&self, sql: &str) -> Result<BTreeMap<String, i64>, StorageError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, Option<String>>(0)?, row.get::<_, i64>(1)?))
        })?;
        let mut counts = BTreeMap::new();
        for row in rows {
            if let (Some(key), count) = row? {
                counts.insert(key, count);
            }
        }
        Ok(counts)
    }
}

fn mark_resolved(conn: &Connection, alert_id: i64) -> Result<(), StorageError> {
    conn.execute(
        "UPDATE alerts SET status = ?1 WHERE id = ?2",
        params![AlertStatus::Resolved.as_str(), alert_id],
    )?;
    Ok(())
}

fn ensure_alert_exists(conn: &Connection, alert_id: i64) -> Result<(), StorageError> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM alerts WHERE id = ?1)",
        [alert_id],
        |row| row.get(0),
    )?;
    if exists {
        Ok(())
    } else {
        Err(StorageError::AlertNotFound { alert_id })
    }
}

fn log_from_row(row: &Row<'_>) -> rusqlite::Result<LogEntry> {
    Ok(LogEntry {
        id: row.get(0)?,
        timestamp: row.get(1)?,
        source: row.get(2)?,
        message: row.get(3)?,
        severity: row.get(4)?,
    })
}

fn alert_from_row(row: &Row<'_>) -> rusqlite::Result<Alert> {
    let status: String = row.get(5)?;
    Ok(Alert {
        id: row.get(0)?,
        timestamp: row.get(1)?,
        threat_type: row.get(2)?,
        severity: row.get(3)?,
        description: row.get(4)?,
        status: AlertStatus::parse(&status),
    })
}

/// Collect mapped rows, skipping rows whose columns are missing or malformed.
fn collect_rows<T>(
    rows: impl Iterator<Item = rusqlite::Result<T>>,
    table: &str,
) -> Result<Vec<T>, StorageError> {
    let mut out = Vec::new();
    for row in rows {
        match row {
            Ok(item) => out.push(item),
            Err(
                e @ (rusqlite::Error::InvalidColumnType(..)
                | rusqlite::Error::FromSqlConversionFailure(..)),
            ) => {
                warn!(table, error = %e, "Skipping malformed row");
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn make_storage() -> (TempDir, Storage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().join("soc.db"));
        storage.initialize().unwrap();
        (dir, storage)
    }

    fn raw_exec(storage: &Storage, sql: &str) {
        storage.connect().unwrap().execute_batch(sql).unwrap();
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let (_dir, storage) = make_storage();
        storage.initialize().unwrap();
        storage.initialize().unwrap();
        assert_eq!(storage.aggregate_stats().unwrap(), DashboardStats::default());
    }

    #[test]
    fn test_record_log_returns_monotonic_ids() {
        let (_dir, storage) = make_storage();
        let a = storage.record_log("SYSTEM", "first", "info").unwrap();
        let b = storage.record_log("SYSTEM", "second", "info").unwrap();
        assert!(b > a);
    }

    #[test]
    fn test_list_recent_logs_newest_first_with_tie_break() {
        let (_dir, storage) = make_storage();
        raw_exec(
            &storage,
            "INSERT INTO logs (timestamp, source, message, severity) VALUES
                ('2024-01-01 10:00:00', 'SYSTEM', 'old', 'info'),
                ('2024-01-01 12:00:00', 'SYSTEM', 'tie-a', 'info'),
                ('2024-01-01 12:00:00', 'SYSTEM', 'tie-b', 'info'),
                ('2024-01-01 11:00:00', 'SYSTEM', 'middle', 'info');",
        );
        let messages: Vec<String> = storage
            .list_recent_logs(10)
            .unwrap()
            .into_iter()
            .map(|l| l.message)
            .collect();
        assert_eq!(messages, vec!["tie-b", "tie-a", "middle", "old"]);
    }

    #[test]
    fn test_list_recent_logs_respects_limit() {
        let (_dir, storage) = make_storage();
        for i in 0..40 {
            storage
                .record_log("SYSTEM", &format!("log {i}"), "info")
                .unwrap();
        }
        let logs = storage.list_recent_logs(30).unwrap();
        assert_eq!(logs.len(), 30);
        assert_eq!(logs[0].message, "log 39");
    }

    #[test]
    fn test_list_recent_logs_skips_rows_with_missing_fields() {
        let (_dir, storage) = make_storage();
        storage.record_log("SYSTEM", "complete", "info").unwrap();
        raw_exec(
            &storage,
            "INSERT INTO logs (source, message, severity) VALUES (NULL, 'no source', 'info');",
        );
        let logs = storage.list_recent_logs(30).unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].message, "complete");
    }

    #[test]
    fn test_record_alert_starts_active() {
        let (_dir, storage) = make_storage();
        let id = storage
            .record_alert("Brute Force Attack", "high", "Multiple failed logins")
            .unwrap();
        let alert = storage.get_alert(id).unwrap().unwrap();
        assert_eq!(alert.status, AlertStatus::Active);
        assert_eq!(alert.threat_type, "Brute Force Attack");
        assert_eq!(storage.list_active_alerts().unwrap().len(), 1);
    }

    #[test]
    fn test_get_alert_missing() {
        let (_dir, storage) = make_storage();
        assert!(storage.get_alert(999).unwrap().is_none());
    }

    #[test]
    fn test_resolve_alert_if_blocking() {
        let (_dir, storage) = make_storage();
        let id = storage.record_alert("Malware Indicators", "high", "x").unwrap();

        assert!(!storage.resolve_alert_if_blocking(id, "Run Virus Scan").unwrap());
        assert_eq!(storage.get_alert(id).unwrap().unwrap().status, AlertStatus::Active);

        assert!(storage
            .resolve_alert_if_blocking(id, "Isolate Infected Computer")
            .unwrap());
        assert_eq!(storage.get_alert(id).unwrap().unwrap().status, AlertStatus::Resolved);

        // Second resolution is a no-op in effect.
        assert!(storage.resolve_alert_if_blocking(id, "Block Access").unwrap());
        assert_eq!(storage.get_alert(id).unwrap().unwrap().status, AlertStatus::Resolved);
        assert!(storage.list_active_alerts().unwrap().is_empty());
    }

    #[test]
    fn test_record_action_writes_all_rows() {
        let (_dir, storage) = make_storage();
        let id = storage.record_alert("Brute Force Attack", "high", "x").unwrap();
        let outcome = storage
            .record_action(id, "Lock Compromised Account", "User account locked")
            .unwrap();
        assert!(outcome.resolved);

        let responses = storage.responses_for_alert(id).unwrap();
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].id, outcome.response_id);
        assert_eq!(responses[0].action, "Lock Compromised Account");

        let logs = storage.list_recent_logs(1).unwrap();
        assert_eq!(logs[0].id, outcome.log_id);
        assert_eq!(logs[0].source, "AUTOMATED_RESPONSE");
        assert_eq!(logs[0].severity, "info");
        assert_eq!(storage.get_alert(id).unwrap().unwrap().status, AlertStatus::Resolved);
    }

    #[test]
    fn test_record_action_permissive_alert_reference() {
        let (_dir, storage) = make_storage();
        let outcome = storage
            .record_action(4242, "Notify HR Department", "HR notified")
            .unwrap();
        assert!(!outcome.resolved);
        assert_eq!(storage.responses_for_alert(4242).unwrap().len(), 1);
    }

    #[test]
    fn test_record_response_permissive_alert_reference() {
        let (_dir, storage) = make_storage();
        assert!(storage.record_response(0, "Unknown Action").is_ok());
        assert!(storage.record_response(99, "Run Virus Scan").is_ok());
        assert_eq!(storage.responses_for_alert(0).unwrap().len(), 1);
        assert_eq!(storage.responses_for_alert(99).unwrap().len(), 1);
    }

    #[test]
    fn test_record_action_enforced_reference_rolls_back() {
        let (_dir, storage) = make_storage();
        let storage = storage.with_alert_reference_check(true);
        let err = storage
            .record_action(4242, "Block Data Transfer", "blocked")
            .unwrap_err();
        assert!(matches!(err, StorageError::AlertNotFound { alert_id: 4242 }));
        assert!(storage.list_recent_logs(10).unwrap().is_empty());
        assert!(storage.responses_for_alert(4242).unwrap().is_empty());
    }

    #[test]
    fn test_record_response_enforced_reference() {
        let (_dir, storage) = make_storage();
        let storage = storage.with_alert_reference_check(true);
        assert!(storage.record_response(1, "Run Virus Scan").is_err());
        let id = storage.record_alert("Malware Indicators", "high", "x").unwrap();
        assert!(storage.record_response(id, "Run Virus Scan").is_ok());
    }

    #[test]
    fn test_aggregate_stats() {
        let (_dir, storage) = make_storage();
        storage.record_log("SYSTEM", "a", "info").unwrap();
        storage.record_log("SYSTEM", "b", "info").unwrap();
        raw_exec(
            &storage,
            "INSERT INTO logs (timestamp, source, message, severity)
             VALUES ('2001-01-01 00:00:00', 'SYSTEM', 'ancient', 'info');",
        );
        let first = storage.record_alert("Malware Indicators", "high", "x").unwrap();
        storage.record_alert("Data Exfiltration Attempt", "high", "y").unwrap();
        storage.resolve_alert_if_blocking(first, "Block").unwrap();

        let stats = storage.aggregate_stats().unwrap();
        assert_eq!(
            stats,
            DashboardStats {
                active_alert_count: 1,
                total_log_count: 3,
                total_alert_count: 2,
                today_log_count: 2,
            }
        );
    }

    #[test]
    fn test_threat_aggregates_ignore_old_alerts() {
        let (_dir, storage) = make_storage();
        storage.record_alert("Malware Indicators", "high", "x").unwrap();
        storage.record_alert("Malware Indicators", "high", "x").unwrap();
        storage.record_alert("Brute Force Attack", "high", "x").unwrap();
        raw_exec(
            &storage,
            "INSERT INTO alerts (timestamp, threat_type, severity, description)
             VALUES ('2001-01-01 00:00:00', 'Ancient Threat', 'high', 'old');",
        );

        let distribution = storage.threat_distribution().unwrap();
        assert_eq!(distribution.len(), 2);
        assert_eq!(distribution["Malware Indicators"], 2);
        assert_eq!(distribution["Brute Force Attack"], 1);

        let timeline = storage.threat_timeline().unwrap();
        assert_eq!(timeline.values().sum::<i64>(), 3);
        for hour in timeline.keys() {
            assert_eq!(hour.len(), 5);
            assert!(hour.ends_with(":00"));
        }
    }

    #[test]
    fn test_seed_sample_logs_only_when_empty() {
        let (_dir, storage) = make_storage();
        assert_eq!(storage.seed_sample_logs().unwrap(), 5);
        assert_eq!(storage.seed_sample_logs().unwrap(), 0);
        assert_eq!(storage.aggregate_stats().unwrap().total_log_count, 5);
    }

    #[test]
    fn test_missing_schema_is_a_fault() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().join("empty.db"));
        assert!(storage.record_log("SYSTEM", "x", "info").is_err());
        assert!(storage.list_recent_logs(30).is_err());
        assert!(storage.aggregate_stats().is_err());
    }

    #[tokio::test]
    async fn test_run_on_blocking_pool() {
        let (_dir, storage) = make_storage();
        let id = storage
            .run(|s| s.record_log("SYSTEM", "from async", "info"))
            .await
            .unwrap();
        let logs = storage.run(|s| s.list_recent_logs(5)).await.unwrap();
        assert_eq!(logs[0].id, id);
    }
}
