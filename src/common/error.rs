//! Error types for ltv_unicycle

use thiserror::Error;

/// Main error type for controller construction and its tooling
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Invalid parameter (cost weights, timestep, velocity range, ...)
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    /// Numerical computation failed (Riccati solve, matrix inversion, etc.)
    #[error("Numerical error: {0}")]
    NumericalError(String),
    /// Configuration file could not be parsed
    #[error("Config error: {0}")]
    ConfigError(#[from] toml::de::Error),
    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    /// Visualization error
    #[error("Visualization error: {0}")]
    VisualizationError(String),
}

/// Result type alias for controller operations
pub type ControlResult<T> = Result<T, ControllerError>;
