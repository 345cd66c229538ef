use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{Board, FetchOutcome, LeagueFailure, LeagueTiming, Orchestrator, Signature};
use crate::calendar::{week_window, DateRange};
use crate::error::FeedError;

/// Clock used to decide what "today" is.
pub type NowFn = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub fn system_clock() -> NowFn {
    Arc::new(Utc::now)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshMode {
    /// Full window minus today, replace, then today-only merge.
    ColdStart,
    Today,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshReport {
    pub mode: RefreshMode,
    pub published: bool,
    pub signature: Option<Signature>,
    pub failures: Vec<LeagueFailure>,
}

/// Two-phase refresh policy on top of the orchestrator and the board.
///
/// Today is only ever written by the narrow refresh: a full-window run drops
/// its own today groups and carries the board's current ones over, so a slow
/// week fetch cannot rewind a live game.
pub struct Refresher {
    orchestrator: Orchestrator,
    board: Arc<Board>,
    window_days: u32,
    selected: RwLock<NaiveDate>,
    timings: RwLock<Vec<LeagueTiming>>,
    now: NowFn,
}

impl Refresher {
    pub fn new(
        orchestrator: Orchestrator,
        board: Arc<Board>,
        window_days: u32,
        selected: Option<NaiveDate>,
        now: NowFn,
    ) -> Self {
        let today = orchestrator.calendar().day_of(now());
        Refresher {
            orchestrator,
            board,
            window_days,
            selected: RwLock::new(selected.unwrap_or(today)),
            timings: RwLock::new(Vec::new()),
            now,
        }
    }

    pub fn board(&self) -> &Arc<Board> {
        &self.board
    }

    pub fn today(&self) -> NaiveDate {
        self.orchestrator.calendar().day_of((self.now)())
    }

    /// Picks the week the next cold start targets.
    pub async fn set_selected_date(&self, date: NaiveDate) {
        *self.selected.write().await = date;
    }

    pub async fn selected_date(&self) -> NaiveDate {
        *self.selected.read().await
    }

    /// Per-league timings of the most recent orchestrator run.
    pub async fn timings(&self) -> Vec<LeagueTiming> {
        self.timings.read().await.clone()
    }

    pub async fn cold_start(
        &self,
        cancel: &CancellationToken,
    ) -> Result<RefreshReport, FeedError> {
        self.run(RefreshMode::ColdStart, cancel).await
    }

    pub async fn refresh_today(
        &self,
        cancel: &CancellationToken,
    ) -> Result<RefreshReport, FeedError> {
        self.run(RefreshMode::Today, cancel).await
    }

    async fn run(
        &self,
        mode: RefreshMode,
        cancel: &CancellationToken,
    ) -> Result<RefreshReport, FeedError> {
        self.board.begin_cycle();
        let result = match mode {
            RefreshMode::ColdStart => self.full_window(cancel).await,
            RefreshMode::Today => self.today_only(cancel).await,
        };
        self.board
            .finish_cycle(result.as_ref().map(|r| r.failures.as_slice()));
        result
    }

    /// Replace the selected week minus today, then merge today. A failed week
    /// fetch still lets today through; the week's error is what the cycle
    /// reports.
    async fn full_window(
        &self,
        cancel: &CancellationToken,
    ) -> Result<RefreshReport, FeedError> {
        let today = self.today();
        let range = week_window(self.selected_date().await, self.window_days);
        info!("Cold start: loading {} (today is {})", range, today);

        let week = match self.orchestrator.fetch_all(&range, cancel).await {
            Ok(mut outcome) => {
                self.record_timings(&mut outcome).await;
                let retained = outcome.failed_leagues();

                self.board.mark_applying();
                let applied = self.board.replace(
                    outcome.groups,
                    &range,
                    &BTreeSet::from([today]),
                    &retained,
                    cancel,
                )?;
                Ok((applied, outcome.failures))
            }
            Err(e) if e.is_cancelled() => return Err(e),
            Err(e) => {
                warn!("Week {} failed, refreshing today anyway: {}", range, e);
                Err(e)
            }
        };

        let mut report = self.today_only(cancel).await?;
        let (replaced, mut failures) = week?;
        report.mode = RefreshMode::ColdStart;
        report.published |= replaced.is_published();
        failures.append(&mut report.failures);
        report.failures = failures;
        if self.board.snapshot().is_empty() {
            warn!("Cold start for {} left the board empty", range);
        }
        Ok(report)
    }

    async fn today_only(
        &self,
        cancel: &CancellationToken,
    ) -> Result<RefreshReport, FeedError> {
        let today = self.today();
        self.board.mark_fetching();

        let mut outcome = self
            .orchestrator
            .fetch_all(&DateRange::Day(today), cancel)
            .await?;
        self.record_timings(&mut outcome).await;
        let retained = outcome.failed_leagues();

        let stray = outcome.groups.iter().filter(|g| g.day != today).count();
        if stray > 0 {
            debug!("Discarding {} group(s) bucketed outside {}", stray, today);
        }

        self.board.mark_applying();
        let applied = self.board.merge(
            outcome.groups,
            &BTreeSet::from([today]),
            &retained,
            cancel,
        )?;

        Ok(RefreshReport {
            mode: RefreshMode::Today,
            published: applied.is_published(),
            signature: self.board.signature(),
            failures: outcome.failures,
        })
    }

    async fn record_timings(&self, outcome: &mut FetchOutcome) {
        *self.timings.write().await = std::mem::take(&mut outcome.timings);
    }
}
