use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::NaiveDate;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{RefreshReport, Refresher};
use crate::error::FeedError;

#[derive(Default)]
struct Tokens {
    ticker: Option<CancellationToken>,
    in_flight: Option<CancellationToken>,
}

/// Drives the refresher on a fixed interval and on demand.
///
/// At most one refresh is live at a time: starting a new one cancels the
/// previous one, whoever started it.
pub struct Poller {
    refresher: Arc<Refresher>,
    tokens: Mutex<Tokens>,
}

impl Poller {
    pub fn new(refresher: Arc<Refresher>) -> Arc<Self> {
        Arc::new(Poller {
            refresher,
            tokens: Mutex::new(Tokens::default()),
        })
    }

    pub fn refresher(&self) -> &Arc<Refresher> {
        &self.refresher
    }

    fn tokens(&self) -> MutexGuard<'_, Tokens> {
        self.tokens.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start the periodic today-only refresh. The first tick fires after one
    /// full `interval`; a cold start is expected to have seeded the board.
    /// Calling `start` again replaces the running ticker.
    pub fn start(self: &Arc<Self>, interval: Duration) {
        let ticker = CancellationToken::new();
        if let Some(old) = self.tokens().ticker.replace(ticker.clone()) {
            old.cancel();
        }
        info!("Poller started (interval={:?})", interval);

        let poller = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            interval.tick().await;

            loop {
                tokio::select! {
                    biased;
                    _ = ticker.cancelled() => break,
                    _ = interval.tick() => {}
                }
                let cancel = poller.supersede(Some(&ticker));
                let refresher = Arc::clone(&poller.refresher);
                tokio::spawn(async move {
                    if let Err(e) = refresher.refresh_today(&cancel).await {
                        debug!("Scheduled refresh ended: {}", e);
                    }
                });
            }
            debug!("Poller ticker exited");
        });
    }

    /// Stop ticking and cancel whatever refresh is in flight.
    pub fn stop(&self) {
        let mut tokens = self.tokens();
        if let Some(ticker) = tokens.ticker.take() {
            ticker.cancel();
        }
        if let Some(in_flight) = tokens.in_flight.take() {
            in_flight.cancel();
        }
        info!("Poller stopped");
    }

    /// Today-only refresh, superseding any refresh in flight.
    pub async fn refresh_now(&self) -> Result<RefreshReport, FeedError> {
        let cancel = self.supersede(None);
        self.refresher.refresh_today(&cancel).await
    }

    /// Full-window cold start for the selected week, superseding any refresh
    /// in flight.
    pub async fn reload_window(&self) -> Result<RefreshReport, FeedError> {
        let cancel = self.supersede(None);
        self.refresher.cold_start(&cancel).await
    }

    pub async fn set_selected_date(&self, date: NaiveDate) -> Result<RefreshReport, FeedError> {
        info!("Selected date set to {}", date);
        self.refresher.set_selected_date(date).await;
        self.reload_window().await
    }

    /// Cancel the in-flight refresh and hand out the token for its successor.
    /// Ticker-started refreshes hang off the ticker token so `stop` reaches
    /// them even if they register after it ran.
    fn supersede(&self, parent: Option<&CancellationToken>) -> CancellationToken {
        let next = match parent {
            Some(parent) => parent.child_token(),
            None => CancellationToken::new(),
        };
        if let Some(previous) = self.tokens().in_flight.replace(next.clone()) {
            previous.cancel();
        }
        next
    }
}
