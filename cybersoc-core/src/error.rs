//! Error types for the CyberSOC core.
//!
//! Uses `thiserror` for public API error types with structured error variants
//! covering storage, configuration, and view rendering.

/// Top-level error type for the CyberSOC core library.
#[derive(Debug, thiserror::Error)]
pub enum SocError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("View error: {0}")]
    View(#[from] ViewError),
}

/// Errors from the SQLite storage gateway.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Storage task failed: {message}")]
    Task { message: String },

    #[error("Alert not found: {alert_id}")]
    AlertNotFound { alert_id: i64 },
}

impl From<tokio::task::JoinError> for StorageError {
    fn from(err: tokio::task::JoinError) -> Self {
        StorageError::Task {
            message: err.to_string(),
        }
    }
}

/// Errors from the configuration system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Configuration load error: {0}")]
    Load(#[from] Box<figment::Error>),
}

/// Errors from rendering the HTML views.
#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error("Template registration failed: {0}")]
    Template(#[from] Box<handlebars::TemplateError>),

    #[error("Render failed: {0}")]
    Render(#[from] handlebars::RenderError),
}

/// A type alias for results using the top-level `SocError`.
pub type Result<T> = std::result::Result<T, SocError>;
