//! Canned response actions.
//!
//! Maps an operator-facing action label to the outcome sentence written to
//! the log. Labels outside the catalog still execute, with a generic message.

use std::collections::BTreeMap;

/// Substrings (matched case-insensitively) that make an action resolve its
/// alert.
pub const RESOLVING_KEYWORDS: [&str; 4] = ["block", "disable", "isolate", "lock"];

/// Label used when a request does not name an action.
pub const UNKNOWN_ACTION: &str = "Unknown Action";

const BUILTIN_ACTIONS: [(&str, &str); 12] = [
    (
        "Block Hacker's IP Address",
        "IP address blocked on firewall - threat neutralized",
    ),
    (
        "Lock Compromised Account",
        "User account locked and password reset required",
    ),
    (
        "Alert Security Team",
        "Security team notified via email and SMS alerts",
    ),
    (
        "Disable Employee Account",
        "Employee account disabled pending investigation",
    ),
    (
        "Notify HR Department",
        "HR department notified of potential insider threat",
    ),
    (
        "Review File Access History",
        "File access audit initiated for suspicious activity",
    ),
    (
        "Block Data Transfer",
        "External data transfer blocked - files quarantined",
    ),
    (
        "Secure Sensitive Files",
        "Sensitive files moved to secure vault with encryption",
    ),
    (
        "Investigate User Activity",
        "User activity investigation started - forensics team alerted",
    ),
    (
        "Isolate Infected Computer",
        "Computer isolated from network - malware contained",
    ),
    (
        "Run Virus Scan",
        "Full system antivirus scan initiated - estimated 15 minutes",
    ),
    (
        "Update Security Definitions",
        "Security definitions updated - 1,247 new threat signatures added",
    ),
];

/// Whether executing `action` should resolve the referenced alert.
pub fn is_resolving_action(action: &str) -> bool {
    let lowered = action.to_lowercase();
    RESOLVING_KEYWORDS
        .iter()
        .any(|keyword| lowered.contains(keyword))
}

/// Read-only mapping from action label to outcome message.
#[derive(Debug, Clone)]
pub struct ActionCatalog {
    messages: BTreeMap<String, String>,
}

impl Default for ActionCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ActionCatalog {
    /// The twelve actions offered by the dashboard.
    pub fn builtin() -> Self {
        let messages = BUILTIN_ACTIONS
            .iter()
            .map(|(label, message)| (label.to_string(), message.to_string()))
            .collect();
        Self { messages }
    }

    /// Built-in actions plus configured extras; extras win on conflict.
    pub fn with_extra(extra: &BTreeMap<String, String>) -> Self {
        let mut catalog = Self::builtin();
        catalog
            .messages
            .extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        catalog
    }

    pub fn lookup(&self, action: &str) -> Option<&str> {
        self.messages.get(action).map(String::as_str)
    }

    /// Outcome message for `action`, falling back to a generic sentence for
    /// labels outside the catalog.
    pub fn describe(&self, action: &str) -> String {
        match self.lookup(action) {
            Some(message) => message.to_string(),
            None => format!("Security action executed: {action}"),
        }
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.messages.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
