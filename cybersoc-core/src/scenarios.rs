//! Threat scenario catalog and simulation.
//!
//! A scenario is a fixed bundle of log lines plus one alert. Simulating it
//! writes the log lines first (as supporting evidence) and the alert last.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{error, info};

use crate::storage::Storage;
use crate::types::{severity, source};

/// Actions offered for threat types without a dedicated list.
pub const FALLBACK_ACTIONS: [&str; 3] = ["Investigate Issue", "Block Access", "Alert Administrator"];

/// A predefined fake attack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Display name, stored as the alert's `threat_type`.
    pub name: String,
    pub severity: String,
    pub description: String,
    /// Log lines written, in order, before the alert.
    pub logs: Vec<String>,
    /// Response actions the dashboard offers for this threat.
    #[serde(default)]
    pub recommended_actions: Vec<String>,
}

impl Scenario {
    fn new(
        name: &str,
        severity: &str,
        description: &str,
        logs: &[&str],
        recommended_actions: &[&str],
    ) -> Self {
        Self {
            name: name.to_string(),
            severity: severity.to_string(),
            description: description.to_string(),
            logs: logs.iter().map(|s| s.to_string()).collect(),
            recommended_actions: recommended_actions.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Source tag for a simulated log line.
pub fn source_tag_for(message: &str) -> &'static str {
    if message.contains("login") {
        source::FIREWALL
    } else {
        source::ENDPOINT
    }
}

/// Read-only mapping from threat-type key to scenario.
#[derive(Debug, Clone)]
pub struct ScenarioCatalog {
    scenarios: BTreeMap<String, Scenario>,
}

impl Default for ScenarioCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ScenarioCatalog {
    pub fn builtin() -> Self {
        let mut scenarios = BTreeMap::new();
        scenarios.insert(
            "brute-force".to_string(),
            Scenario::new(
                "Brute Force Attack",
                severity::HIGH,
                "Multiple failed login attempts detected from IP 192.168.1.100",
                &[
                    "Failed login attempt from 192.168.1.100 - user: admin",
                    "Failed login attempt from 192.168.1.100 - user: root",
                    "Failed login attempt from 192.168.1.100 - user: administrator",
                    "AI/ML: Brute force pattern detected - 15 attempts in 2 minutes",
                ],
                &[
                    "Block Hacker's IP Address",
                    "Lock Compromised Account",
                    "Alert Security Team",
                ],
            ),
        );
        scenarios.insert(
            "insider-threat".to_string(),
            Scenario::new(
                "Insider Privilege Misuse",
                severity::MEDIUM,
                "Employee accessing sensitive files outside normal hours",
                &[
                    "User john.doe accessed /confidential/payroll.xlsx at 02:30 AM",
                    "Unusual file access pattern detected for user john.doe",
                    "AI/ML: Insider threat behavior pattern identified",
                ],
                &[
                    "Disable Employee Account",
                    "Notify HR Department",
                    "Review File Access History",
                ],
            ),
        );
        scenarios.insert(
            "data-exfiltration".to_string(),
            Scenario::new(
                "Data Exfiltration Attempt",
                severity::HIGH,
                "Large data transfer to external server detected",
                &[
                    "Large file upload detected - 2.5GB to external.server.com",
                    "USB device connected - copying sensitive files",
                    "AI/ML: Data exfiltration pattern detected - anomalous data volume",
                ],
                &[
                    "Block Data Transfer",
                    "Secure Sensitive Files",
                    "Investigate User Activity",
                ],
            ),
        );
        scenarios.insert(
            "malware".to_string(),
            Scenario::new(
                "Malware Indicators",
                severity::HIGH,
                "Suspicious process behavior and network connections",
                &[
                    "Suspicious process detected - crypto_miner.exe",
                    "Outbound connection to known malicious IP 45.33.32.156",
                    "AI/ML: Malware signature match - 95% confidence",
                ],
                &[
                    "Isolate Infected Computer",
                    "Run Virus Scan",
                    "Update Security Definitions",
                ],
            ),
        );
        Self { scenarios }
    }

    /// Built-in scenarios plus configured extras; extras win on key conflict.
    pub fn with_extra(extra: &BTreeMap<String, Scenario>) -> Self {
        let mut catalog = Self::builtin();
        catalog
            .scenarios
            .extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        catalog
    }

    pub fn lookup(&self, key: &str) -> Option<&Scenario> {
        self.scenarios.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Scenario)> {
        self.scenarios.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    /// Recommended actions for an alert's `threat_type` (scenario display
    /// name), or the generic fallback list.
    pub fn actions_for_threat(&self, threat_type: &str) -> Vec<String> {
        self.scenarios
            .values()
            .find(|s| s.name == threat_type && !s.recommended_actions.is_empty())
            .map(|s| s.recommended_actions.clone())
            .unwrap_or_else(|| FALLBACK_ACTIONS.iter().map(|s| s.to_string()).collect())
    }
}

/// Rows written by one scenario simulation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulationOutcome {
    pub log_ids: Vec<i64>,
    /// `None` when the alert could not be stored.
    pub alert_id: Option<i64>,
}

/// Write the scenario's evidence logs, then its alert.
///
/// Storage faults are logged and skipped: a failed log line does not stop the
/// remaining writes, and a failed alert leaves `alert_id` empty.
pub fn simulate(storage: &Storage, key: &str, scenario: &Scenario) -> SimulationOutcome {
    let mut outcome = SimulationOutcome::default();

    for line in &scenario.logs {
        match storage.record_log(source_tag_for(line), line, severity::WARNING) {
            Ok(id) => outcome.log_ids.push(id),
            Err(e) => error!(scenario = key, error = %e, "Failed to record scenario log"),
        }
    }

    match storage.record_alert(&scenario.name, &scenario.severity, &scenario.description) {
        Ok(id) => {
            info!(scenario = key, alert_id = id, "Simulated threat scenario");
            outcome.alert_id = Some(id);
        }
        Err(e) => error!(scenario = key, error = %e, "Failed to record scenario alert"),
    }

    outcome
}
