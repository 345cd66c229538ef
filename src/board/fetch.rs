use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::{join_all, try_join_all};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{bucket, golf, DayGroup};
use crate::calendar::{DateRange, DayCalendar};
use crate::catalog::{Catalog, League, LeagueRequest, Sport};
use crate::error::FeedError;
use crate::scores::{with_timeout, ScoreSource};

/// What one failing league request does to the rest of its batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Keep every league that succeeded; report the rest as failures.
    #[default]
    Partial,
    /// Abort the whole run on the first failure.
    AllOrNothing,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeagueFailure {
    pub league: League,
    pub error: FeedError,
}

/// Per-league timing for one orchestrator run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeagueTiming {
    pub league: League,
    pub elapsed_ms: u64,
    pub items: usize,
    pub error: Option<FeedError>,
}

/// Unordered union of every league's day groups for one run.
#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    pub groups: Vec<DayGroup>,
    pub failures: Vec<LeagueFailure>,
    pub timings: Vec<LeagueTiming>,
}

impl FetchOutcome {
    pub fn failed_leagues(&self) -> HashSet<League> {
        self.failures.iter().map(|f| f.league).collect()
    }
}

struct LeagueResult {
    league: League,
    result: Result<Vec<DayGroup>, FeedError>,
    elapsed: Duration,
}

/// Fans one request per catalog league out to the score source and collects
/// the bucketed results.
pub struct Orchestrator {
    source: Arc<dyn ScoreSource>,
    catalog: Catalog,
    calendar: DayCalendar,
    policy: FailurePolicy,
    request_timeout: Duration,
}

impl Orchestrator {
    pub fn new(
        source: Arc<dyn ScoreSource>,
        catalog: Catalog,
        calendar: DayCalendar,
        policy: FailurePolicy,
        request_timeout: Duration,
    ) -> Self {
        Orchestrator {
            source,
            catalog,
            calendar,
            policy,
            request_timeout,
        }
    }

    pub fn calendar(&self) -> DayCalendar {
        self.calendar
    }

    /// Fetch every catalog league for `range` concurrently.
    ///
    /// Cancelling `cancel` drops every outstanding request, including golf
    /// leaderboard fan-outs, and returns `FeedError::Cancelled`.
    pub async fn fetch_all(
        &self,
        range: &DateRange,
        cancel: &CancellationToken,
    ) -> Result<FetchOutcome, FeedError> {
        let requests = self.catalog.requests_for(range);
        let skipped = self.catalog.requests().len() - requests.len();
        if skipped > 0 {
            debug!("{}: skipping {} dark league(s)", range, skipped);
        }
        info!(
            "Fetching {} league(s) from {} for {}",
            requests.len(),
            self.source.name(),
            range
        );

        let work = async {
            match self.policy {
                FailurePolicy::Partial => Ok(join_all(
                    requests.iter().map(|req| self.fetch_league(*req, range)),
                )
                .await),
                FailurePolicy::AllOrNothing => {
                    try_join_all(requests.iter().map(|req| async move {
                        let res = self.fetch_league(*req, range).await;
                        match res.result {
                            Err(e) => Err(FeedError::for_league(res.league, e)),
                            Ok(_) => Ok(res),
                        }
                    }))
                    .await
                }
            }
        };

        let results = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FeedError::Cancelled),
            results = work => results?,
        };

        let mut outcome = FetchOutcome::default();
        for res in results {
            let elapsed_ms = u64::try_from(res.elapsed.as_millis()).unwrap_or(u64::MAX);
            match res.result {
                Ok(groups) => {
                    outcome.timings.push(LeagueTiming {
                        league: res.league,
                        elapsed_ms,
                        items: groups.iter().map(|g| g.items.len()).sum(),
                        error: None,
                    });
                    outcome.groups.extend(groups);
                }
                Err(e) => {
                    warn!("{} fetch failed: {}", res.league, e);
                    outcome.timings.push(LeagueTiming {
                        league: res.league,
                        elapsed_ms,
                        items: 0,
                        error: Some(e.clone()),
                    });
                    outcome.failures.push(LeagueFailure {
                        league: res.league,
                        error: e,
                    });
                }
            }
        }
        outcome.timings.sort_by_key(|t| t.league.rank());
        Ok(outcome)
    }

    async fn fetch_league(&self, request: LeagueRequest, range: &DateRange) -> LeagueResult {
        let started = Instant::now();
        let result = self.league_groups(request, range).await;
        LeagueResult {
            league: request.league,
            result,
            elapsed: started.elapsed(),
        }
    }

    async fn league_groups(
        &self,
        request: LeagueRequest,
        range: &DateRange,
    ) -> Result<Vec<DayGroup>, FeedError> {
        let board = with_timeout(
            self.request_timeout,
            self.source.scoreboard(request, range),
        )
        .await?;

        if request.sport == Sport::Golf {
            golf::expand(
                self.source.as_ref(),
                request.league,
                &board.events,
                self.calendar,
                self.request_timeout,
            )
            .await
        } else {
            Ok(bucket::bucket(request.league, &board.events, self.calendar))
        }
    }
}
