use thiserror::Error;

use crate::domain::RangeError;

#[derive(Error, Debug)]
pub enum AppError {
    /// The only condition the engine rejects outright; everything else
    /// degrades to a neutral result.
    #[error("Invalid date range: {0}")]
    InvalidDateRange(#[from] RangeError),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid month key: {0}")]
    InvalidMonthKey(String),

    #[error("Input error: {0}")]
    Input(#[from] anyhow::Error),
}
