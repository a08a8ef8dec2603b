//! Correlation errors.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CorrelationError {
    /// Nothing was fulfilled for `key` before the deadline.
    #[error("No acknowledgement for {key} within {waited:?}")]
    Timeout { key: String, waited: Duration },
}

impl CorrelationError {
    /// The correlation key the error refers to.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Timeout { key, .. } => key,
        }
    }
}
