use crate::lifecycle::WorkerState;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, WorkerError>;

/// Delivery worker error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WorkerError {
    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid lifecycle transition from {from:?} to {to:?}")]
    InvalidTransition { from: WorkerState, to: WorkerState },

    #[error("Failed to display notification: {0}")]
    Display(String),
}

impl From<reqwest::Error> for WorkerError {
    fn from(err: reqwest::Error) -> Self {
        WorkerError::Network(err.to_string())
    }
}
