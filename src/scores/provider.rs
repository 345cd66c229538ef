use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use super::payload::{Leaderboard, Scoreboard};
use crate::calendar::DateRange;
use crate::catalog::LeagueRequest;
use crate::error::FeedError;

/// Trait that every sports data source must implement.
#[async_trait]
pub trait ScoreSource: Send + Sync {
    /// Scoreboard for one (sport, league) pair over `range`.
    async fn scoreboard(
        &self,
        request: LeagueRequest,
        range: &DateRange,
    ) -> Result<Scoreboard, FeedError>;

    /// Leaderboard for one golf tournament.
    async fn leaderboard(&self, tournament_id: &str) -> Result<Leaderboard, FeedError>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}

/// Run `fut` with an upper bound; expiry is reported as `FeedError::Timeout`.
pub async fn with_timeout<T, F>(limit: Duration, fut: F) -> Result<T, FeedError>
where
    F: Future<Output = Result<T, FeedError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(FeedError::Timeout(limit)),
    }
}
