//! Error types for the heatmap engine.

use thiserror::Error;

/// Result type alias using HeatmapError.
pub type HeatmapResult<T> = Result<T, HeatmapError>;

/// Primary error type for heatmap operations.
#[derive(Debug, Error)]
pub enum HeatmapError {
    // === Construction Errors ===
    #[error("Plugin '{0}' not found. Maybe it was not registered.")]
    PluginNotFound(String),

    #[error("Invalid configuration value for '{field}': {message}")]
    InvalidConfig { field: String, message: String },

    // === Data Errors ===
    #[error("Invalid data point: {0}")]
    InvalidPoint(String),

    // === Rendering Errors ===
    #[error("Image encoding failed: {0}")]
    Encoding(String),

    // === Event Errors ===
    #[error("Event handler failed: {0}")]
    Handler(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl HeatmapError {
    /// Build an `InvalidConfig` error for a named field.
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        HeatmapError::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Whether the error was raised while building an engine.
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            HeatmapError::PluginNotFound(_) | HeatmapError::InvalidConfig { .. }
        )
    }
}

impl From<std::io::Error> for HeatmapError {
    fn from(err: std::io::Error) -> Self {
        HeatmapError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for HeatmapError {
    fn from(err: serde_json::Error) -> Self {
        HeatmapError::invalid_config("json", err.to_string())
    }
}
