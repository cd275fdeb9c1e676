// src/error.rs

/// Errors raised while validating plot input, laying out panels or writing figures.
#[derive(Debug, thiserror::Error)]
pub enum PlotError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Missing required column '{0}'")]
    MissingColumn(String),

    #[error("Series '{0}' has no data points")]
    EmptySeries(String),

    #[error("Length mismatch for '{name}': expected {expected} values, found {found}")]
    LengthMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("Timestamp index is not strictly increasing at row {0}")]
    NonMonotonicIndex(usize),

    #[error("{required} panels required but the grid only holds {capacity}")]
    GridCapacity { required: usize, capacity: usize },

    #[error("Panel index {index} out of range for a figure with {capacity} panels")]
    PanelOutOfRange { index: usize, capacity: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Render error: {0}")]
    Render(String),
}

pub type Result<T> = std::result::Result<T, PlotError>;
