use std::time::Duration;

use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::catalog::League;

/// Failure of a single upstream request, or of a whole refresh cycle.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FeedError {
    /// Malformed request parameters. Never retried automatically.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("upstream returned HTTP {0}")]
    UpstreamStatus(u16),

    /// Payload did not match the expected shape; the request's data is discarded.
    #[error("failed to decode payload: {0}")]
    Decode(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(String),

    /// Superseded by a newer refresh cycle.
    #[error("refresh cancelled")]
    Cancelled,

    #[error("{league} request failed: {source}")]
    League {
        league: League,
        #[source]
        source: Box<FeedError>,
    },
}

impl FeedError {
    pub fn for_league(league: League, err: FeedError) -> Self {
        match err {
            FeedError::Cancelled => FeedError::Cancelled,
            already @ FeedError::League { .. } => already,
            other => FeedError::League {
                league,
                source: Box::new(other),
            },
        }
    }

    /// Timeouts and transport failures count as upstream-status failures.
    pub fn is_upstream(&self) -> bool {
        match self {
            FeedError::UpstreamStatus(_) | FeedError::Timeout(_) | FeedError::Transport(_) => {
                true
            }
            FeedError::League { source, .. } => source.is_upstream(),
            _ => false,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, FeedError::Cancelled)
    }
}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            // reqwest does not report the configured limit back
            FeedError::Timeout(Duration::ZERO)
        } else if err.is_decode() {
            FeedError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            FeedError::UpstreamStatus(status.as_u16())
        } else if err.is_builder() {
            FeedError::InvalidRequest(err.to_string())
        } else {
            FeedError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FeedError {
    fn from(err: serde_json::Error) -> Self {
        FeedError::Decode(err.to_string())
    }
}

impl Serialize for FeedError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
