//! # CyberSOC Core
//!
//! Core library for the CyberSOC mock security operations center.
//! Provides the SQLite storage gateway, the threat scenario and response
//! action catalogs, the background log generator, simulated dashboard
//! metrics, configuration, and the axum HTTP gateway.

pub mod actions;
pub mod config;
pub mod error;
pub mod gateway;
pub mod generator;
pub mod metrics;
pub mod scenarios;
pub mod storage;
pub mod types;

// Re-export commonly used types at the crate root.
pub use actions::{ActionCatalog, is_resolving_action};
pub use config::{SocConfig, load_config};
pub use error::{Result, SocError, StorageError};
pub use gateway::{AppContext, gateway_router};
pub use generator::LogGenerator;
pub use metrics::{FixedMetrics, MetricsSource, RandomMetrics, SyntheticMetrics};
pub use scenarios::{Scenario, ScenarioCatalog};
pub use storage::Storage;
pub use types::{ActionOutcome, Alert, AlertStatus, DashboardStats, LogEntry, ResponseRecord};
