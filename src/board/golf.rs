use std::collections::BTreeMap;
use std::time::Duration;

use chrono::NaiveDate;
use futures_util::future::try_join_all;
use tracing::debug;

use super::bucket::group_days;
use super::{ContentItem, DayGroup, GolfResult};
use crate::calendar::{parse_event_time, DayCalendar};
use crate::catalog::League;
use crate::error::FeedError;
use crate::scores::payload::RawEvent;
use crate::scores::{with_timeout, ScoreSource};

/// Expand a golf league's tournament list into leaderboard results.
///
/// One leaderboard request per tournament that has an id and a parseable
/// date, all issued concurrently. Results are bucketed by the tournament's
/// day. Any single leaderboard failure fails the whole expansion.
pub async fn expand(
    source: &dyn ScoreSource,
    league: League,
    tournaments: &[RawEvent],
    calendar: DayCalendar,
    request_timeout: Duration,
) -> Result<Vec<DayGroup>, FeedError> {
    let targets: Vec<(String, NaiveDate)> = tournaments
        .iter()
        .filter_map(|t| {
            let id = t.id.as_deref().map(str::trim).filter(|id| !id.is_empty())?;
            let start = t.date.as_deref().and_then(parse_event_time)?;
            Some((id.to_string(), calendar.day_of(start)))
        })
        .collect();

    if targets.len() < tournaments.len() {
        debug!(
            "{}: skipping {} tournament(s) without id or date",
            league,
            tournaments.len() - targets.len()
        );
    }

    let fetches = targets.iter().map(|(id, day)| async move {
        let board = with_timeout(request_timeout, source.leaderboard(id)).await?;
        let items: Vec<ContentItem> = board
            .events
            .iter()
            .map(|ev| ContentItem::Golf(GolfResult::from_leaderboard(ev)))
            .collect();
        Ok::<_, FeedError>((*day, items))
    });
    let leaderboards = try_join_all(fetches).await?;

    let mut days: BTreeMap<NaiveDate, Vec<ContentItem>> = BTreeMap::new();
    for (day, items) in leaderboards {
        days.entry(day).or_default().extend(items);
    }
    Ok(group_days(league, days))
}
