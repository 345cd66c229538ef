//! Merge Engine: owns the published snapshot and its signature.
//!
//! The snapshot channel only fires when the signature gate lets a candidate
//! through. Cycle status (loading flag, phase, last error) lives on its own
//! channel and changes on every cycle.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::signature::signature;
use super::{DayGroup, LeagueFailure, Signature, Snapshot};
use crate::calendar::DateRange;
use crate::catalog::League;
use crate::error::FeedError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CyclePhase {
    #[default]
    Idle,
    Fetching,
    Applying,
    /// Last cycle failed; cleared when the next cycle starts.
    Failed,
}

/// Result of a gated apply that was not cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Published(Signature),
    /// Candidate hashed equal to the published snapshot and was discarded.
    Unchanged,
}

impl Applied {
    pub fn is_published(&self) -> bool {
        matches!(self, Applied::Published(_))
    }
}

/// Last published snapshot with its signature. `None` until the first publish.
#[derive(Debug, Clone, Default)]
pub struct Published {
    pub snapshot: Arc<Snapshot>,
    pub signature: Option<Signature>,
}

#[derive(Debug, Clone, Default)]
struct CycleStatus {
    phase: CyclePhase,
    active: usize,
    last_error: Option<FeedError>,
    failures: Vec<LeagueFailure>,
}

/// Everything the presentation layer observes, as one consistent read.
#[derive(Debug, Clone, Serialize)]
pub struct BoardView {
    pub snapshot: Arc<Snapshot>,
    pub signature: Option<Signature>,
    pub is_loading: bool,
    pub phase: CyclePhase,
    pub last_error: Option<FeedError>,
    pub failures: Vec<LeagueFailure>,
}

/// Candidate for a full-window replace.
///
/// Fresh groups on `excluded_days` are dropped and the current groups for
/// those days are carried over, so the narrow refresh stays their only
/// writer. Leagues in `retained` keep their current groups inside `range`;
/// anything outside the fetched window goes.
pub fn replaced(
    current: &Snapshot,
    fresh: Vec<DayGroup>,
    range: &DateRange,
    excluded_days: &BTreeSet<NaiveDate>,
    retained: &HashSet<League>,
) -> Snapshot {
    let kept = current
        .groups()
        .iter()
        .filter(|g| {
            excluded_days.contains(&g.day)
                || (retained.contains(&g.league) && range.contains(g.day))
        })
        .cloned();
    let incoming = fresh
        .into_iter()
        .filter(|g| !excluded_days.contains(&g.day))
        .map(Arc::new);
    Snapshot::from_groups(kept.chain(incoming))
}

/// Candidate for a day-scoped merge.
///
/// Current groups on `days` are removed (unless their league is in
/// `retained`) and fresh groups for those days spliced in. Fresh groups for
/// any other day are discarded. Groups on untouched days are shared with
/// `current`, not copied.
pub fn merged(
    current: &Snapshot,
    fresh: Vec<DayGroup>,
    days: &BTreeSet<NaiveDate>,
    retained: &HashSet<League>,
) -> Snapshot {
    let kept = current
        .groups()
        .iter()
        .filter(|g| !days.contains(&g.day) || retained.contains(&g.league))
        .cloned();
    let incoming = fresh
        .into_iter()
        .filter(|g| days.contains(&g.day))
        .map(Arc::new);
    Snapshot::from_groups(kept.chain(incoming))
}

pub struct Board {
    published: watch::Sender<Published>,
    status: watch::Sender<CycleStatus>,
    leaders: usize,
}

impl Board {
    /// `leaders` is the number of golf leaders that feed the signature.
    pub fn new(leaders: usize) -> Self {
        let (published, _) = watch::channel(Published::default());
        let (status, _) = watch::channel(CycleStatus::default());
        Board {
            published,
            status,
            leaders,
        }
    }

    /// Receiver that wakes only on an actual publish.
    #[allow(dead_code)] // push-style readers; the HTTP surface reads `current`
    pub fn subscribe(&self) -> watch::Receiver<Published> {
        self.published.subscribe()
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.published.borrow().snapshot)
    }

    pub fn signature(&self) -> Option<Signature> {
        self.published.borrow().signature
    }

    pub fn current(&self) -> BoardView {
        let published = self.published.borrow().clone();
        let status = self.status.borrow();
        BoardView {
            snapshot: published.snapshot,
            signature: published.signature,
            is_loading: status.active > 0,
            phase: status.phase,
            last_error: status.last_error.clone(),
            failures: status.failures.clone(),
        }
    }

    pub fn replace(
        &self,
        fresh: Vec<DayGroup>,
        range: &DateRange,
        excluded_days: &BTreeSet<NaiveDate>,
        retained: &HashSet<League>,
        cancel: &CancellationToken,
    ) -> Result<Applied, FeedError> {
        self.apply("replace", cancel, |current| {
            replaced(current, fresh, range, excluded_days, retained)
        })
    }

    pub fn merge(
        &self,
        fresh: Vec<DayGroup>,
        days: &BTreeSet<NaiveDate>,
        retained: &HashSet<League>,
        cancel: &CancellationToken,
    ) -> Result<Applied, FeedError> {
        self.apply("merge", cancel, |current| {
            merged(current, fresh, days, retained)
        })
    }

    /// Build a candidate from the current snapshot and publish it if its
    /// signature differs. The cancellation check runs under the channel's
    /// write lock, so nothing is applied once `cancel` has fired.
    fn apply<F>(
        &self,
        op: &str,
        cancel: &CancellationToken,
        build: F,
    ) -> Result<Applied, FeedError>
    where
        F: FnOnce(&Snapshot) -> Snapshot,
    {
        let mut outcome = Err(FeedError::Cancelled);
        self.published.send_if_modified(|published| {
            if cancel.is_cancelled() {
                return false;
            }
            let candidate = build(&published.snapshot);
            let sig = signature(&candidate, self.leaders);
            if published.signature == Some(sig) {
                outcome = Ok(Applied::Unchanged);
                return false;
            }
            published.snapshot = Arc::new(candidate);
            published.signature = Some(sig);
            outcome = Ok(Applied::Published(sig));
            true
        });

        match &outcome {
            Ok(Applied::Published(sig)) => {
                let published = self.published.borrow();
                info!(
                    "{}: published {} group(s), {} live, signature {:?}",
                    op,
                    published.snapshot.len(),
                    published.snapshot.live_count(),
                    sig
                )
            }
            Ok(Applied::Unchanged) => debug!("{}: content unchanged, nothing published", op),
            Err(_) => debug!("{}: cycle superseded, discarded", op),
        }
        outcome
    }

    pub fn begin_cycle(&self) {
        self.status.send_modify(|s| {
            s.active += 1;
            s.phase = CyclePhase::Fetching;
        });
    }

    pub fn mark_fetching(&self) {
        self.status.send_modify(|s| s.phase = CyclePhase::Fetching);
    }

    pub fn mark_applying(&self) {
        self.status.send_modify(|s| s.phase = CyclePhase::Applying);
    }

    /// Close a cycle. Cancelled cycles leave the recorded error untouched.
    pub fn finish_cycle(&self, result: Result<&[LeagueFailure], &FeedError>) {
        self.status.send_modify(|s| {
            s.active = s.active.saturating_sub(1);
            match result {
                Ok(failures) => {
                    s.failures = failures.to_vec();
                    s.last_error = failures
                        .last()
                        .map(|f| FeedError::for_league(f.league, f.error.clone()));
                    if s.active == 0 {
                        s.phase = CyclePhase::Idle;
                    }
                }
                Err(e) if e.is_cancelled() => {
                    if s.active == 0 && s.phase != CyclePhase::Failed {
                        s.phase = CyclePhase::Idle;
                    }
                }
                Err(e) => {
                    error!("Refresh cycle failed: {}", e);
                    s.last_error = Some(e.clone());
                    s.phase = CyclePhase::Failed;
                }
            }
        });
    }
}
