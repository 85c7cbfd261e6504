//! Background generator of benign "normal activity" logs.
//!
//! Runs as one supervised task: sleep a random interval, append one log line,
//! repeat until the cancellation token fires. Storage faults are logged and
//! the loop carries on.

use rand::Rng;
use rand::seq::SliceRandom;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::GeneratorConfig;
use crate::storage::Storage;
use crate::types::{severity, source};

/// Message pool for generated logs.
pub const NORMAL_ACTIVITY: [&str; 12] = [
    "✅ User login successful - jane.smith from office network",
    "🔒 Firewall blocked suspicious port scan from 203.45.67.89",
    "📁 File sync completed - documents folder (245 files)",
    "🌐 Outbound HTTPS connection allowed to microsoft.com",
    "🛡️ Antivirus scan completed - no threats found (15,432 files checked)",
    "💾 Backup process initiated - 2.3GB data secured",
    "🔐 VPN connection established - remote worker authenticated",
    "📊 System health check passed - all services running normally",
    "🔍 Network monitoring active - 1,247 connections tracked",
    "⚡ Security definitions updated - 45,231 new signatures added",
    "👤 User logout detected - session terminated safely",
    "🔄 Log rotation completed - archived 500MB of old logs",
];

/// Pick one message uniformly from [`NORMAL_ACTIVITY`].
pub fn pick_message<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    NORMAL_ACTIVITY
        .choose(rng)
        .copied()
        .unwrap_or(NORMAL_ACTIVITY[0])
}

#[derive(Debug, Clone)]
pub struct LogGenerator {
    storage: Storage,
    min_interval: Duration,
    max_interval: Duration,
}

impl LogGenerator {
    pub fn new(storage: Storage, config: &GeneratorConfig) -> Self {
        let min_interval = Duration::from_millis(config.min_interval_ms);
        let max_interval = Duration::from_millis(config.max_interval_ms.max(config.min_interval_ms));
        Self {
            storage,
            min_interval,
            max_interval,
        }
    }

    /// Spawn the generator loop onto the current runtime.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }

    /// Generate logs until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) {
        info!(
            min_ms = self.min_interval.as_millis() as u64,
            max_ms = self.max_interval.as_millis() as u64,
            "Background log generator started"
        );

        loop {
            let delay = self.next_delay();
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
            self.emit_once().await;
        }

        info!("Background log generator stopped");
    }

    /// Write one generated log line. Returns the new row id, or `None` when
    /// the write failed.
    pub async fn emit_once(&self) -> Option<i64> {
        let message = pick_message(&mut rand::thread_rng());
        let result = self
            .storage
            .run(move |s| s.record_log(source::SYSTEM, message, severity::INFO))
            .await;
        match result {
            Ok(id) => {
                debug!(log_id = id, "Generated background log");
                Some(id)
            }
            Err(e) => {
                error!(error = %e, "Background log generator failed to write");
                None
            }
        }
    }

    fn next_delay(&self) -> Duration {
        if self.min_interval == self.max_interval {
            return self.min_interval;
        }
        rand::thread_rng().gen_range(self.min_interval..=self.max_interval)
    }
}
