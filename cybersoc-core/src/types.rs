//! Core type definitions for CyberSOC.
//!
//! Defines the rows persisted by the storage gateway (logs, alerts and
//! responses) and the aggregate snapshots served to the dashboard.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Conventional severity labels. Severity is free text in storage; these are
/// the values the system itself writes.
pub mod severity {
    pub const INFO: &str = "info";
    pub const WARNING: &str = "warning";
    pub const MEDIUM: &str = "medium";
    pub const HIGH: &str = "high";
}

/// Conventional log source tags.
pub mod source {
    pub const SYSTEM: &str = "SYSTEM";
    pub const FIREWALL: &str = "FIREWALL";
    pub const ENDPOINT: &str = "ENDPOINT";
    pub const AUTOMATED_RESPONSE: &str = "AUTOMATED_RESPONSE";
}

/// A single row of the `logs` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub source: String,
    pub message: String,
    pub severity: String,
}

/// Lifecycle state of an alert. The only legal transition is
/// `Active -> Resolved`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    #[default]
    Active,
    Resolved,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Active => "active",
            AlertStatus::Resolved => "resolved",
        }
    }

    /// Parse a stored status. Unknown values are treated as active so that a
    /// hand-edited row never disappears from the active list unnoticed.
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("resolved") {
            AlertStatus::Resolved
        } else {
            AlertStatus::Active
        }
    }
}

impl std::fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single row of the `alerts` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub threat_type: String,
    pub severity: String,
    pub description: String,
    pub status: AlertStatus,
}

/// A single row of the `responses` table.
///
/// `alert_id` is a non-owning reference; it is not guaranteed to point at an
/// existing alert unless referential checks are enabled in the storage config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub id: i64,
    pub alert_id: i64,
    pub action: String,
    pub timestamp: DateTime<Utc>,
}

/// Aggregate counters backing `/api/stats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub active_alert_count: i64,
    pub total_log_count: i64,
    pub total_alert_count: i64,
    pub today_log_count: i64,
}

/// What a response action wrote to storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub log_id: i64,
    pub response_id: i64,
    /// Whether the action label was a resolving one and the alert was marked
    /// resolved.
    pub resolved: bool,
}
