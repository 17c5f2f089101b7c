use std::time::Duration;

use thiserror::Error;

/// Everything a relay session can fail with.
///
/// `InvalidCandidate` is recovered inside the loop and never returned from it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RelayError {
    #[error("signaling channel failed: {0}")]
    Channel(String),
    #[error("negotiation failed: {0}")]
    Negotiation(String),
    #[error("invalid remote candidate: {0}")]
    InvalidCandidate(String),
    #[error("peer connection not connected after {0:?}")]
    Timeout(Duration),
}

impl RelayError {
    pub(crate) fn negotiation(err: impl std::fmt::Display) -> Self {
        Self::Negotiation(err.to_string())
    }
}
