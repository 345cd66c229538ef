//! The aggregated scoreboard: day-bucketed league groups and the published
//! snapshot the presentation layer reads.
//!
//! Data flow for one refresh cycle:
//! ```text
//!  Poller ─▶ Refresher ─▶ Orchestrator ─┬─▶ bucket (per league)
//!                                       └─▶ golf::expand (golf leagues)
//!                         ◀── Vec<DayGroup> ──┘
//!            Refresher ─▶ Board::replace / Board::merge ─▶ signature gate ─▶ watch
//! ```

pub mod bucket;
pub mod fetch;
pub mod golf;
pub mod merge;
pub mod poller;
pub mod refresh;
pub mod signature;

#[cfg(test)]
pub(crate) mod testing;

pub use fetch::{FailurePolicy, FetchOutcome, LeagueFailure, LeagueTiming, Orchestrator};
pub use merge::Board;
pub use poller::Poller;
pub use refresh::{system_clock, RefreshReport, Refresher};
pub use signature::Signature;

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::catalog::League;
use crate::scores::payload::{GolfEvent, RawCompetitor, RawEvent, RawStatusType};

/// Lifecycle of a contest, from the upstream `state` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventState {
    Scheduled,
    InProgress,
    Final,
    Unknown,
}

impl EventState {
    pub fn from_raw(state: Option<&str>) -> Self {
        match state {
            Some(s) if s.starts_with("pre") => EventState::Scheduled,
            Some(s) if s.starts_with("in") => EventState::InProgress,
            Some(s) if s.starts_with("post") => EventState::Final,
            _ => EventState::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventState::Scheduled => "pre",
            EventState::InProgress => "in",
            EventState::Final => "post",
            EventState::Unknown => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamLine {
    pub abbreviation: String,
    pub name: String,
    /// Blank until the contest has started.
    pub score: Option<String>,
}

/// A single scheduled, live or finished contest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameEvent {
    pub id: String,
    pub short_name: String,
    pub start: DateTime<Utc>,
    pub state: EventState,
    /// e.g. "4:12 - 3rd", "Final", "7:30 PM EST"
    pub status_detail: String,
    pub display_clock: Option<String>,
    pub postponed: bool,
    pub home: TeamLine,
    pub away: TeamLine,
}

impl GameEvent {
    pub fn from_raw(raw: &RawEvent, start: DateTime<Utc>) -> Self {
        let status_type = raw
            .status
            .as_ref()
            .and_then(|s| s.status_type.clone())
            .unwrap_or_default();
        let scheduled = status_type
            .description
            .as_deref()
            .map_or(true, |d| d.starts_with("Scheduled"));
        let competitors = raw
            .competitions
            .as_ref()
            .and_then(|c| c.first())
            .map(|c| c.competitors.as_slice())
            .unwrap_or_default();

        GameEvent {
            id: raw.id.clone().unwrap_or_default(),
            short_name: raw
                .short_name
                .clone()
                .or_else(|| raw.name.clone())
                .unwrap_or_default(),
            start,
            state: EventState::from_raw(status_type.state.as_deref()),
            status_detail: status_type.short_detail.clone().unwrap_or_default(),
            display_clock: raw.status.as_ref().and_then(|s| s.display_clock.clone()),
            postponed: is_postponed(&status_type),
            // home is listed first, away last
            home: team_line(competitors.first(), scheduled),
            away: team_line(competitors.last(), scheduled),
        }
    }
}

fn is_postponed(status: &RawStatusType) -> bool {
    status
        .detail
        .as_deref()
        .is_some_and(|d| d.starts_with("Postponed"))
}

fn team_line(competitor: Option<&RawCompetitor>, scheduled: bool) -> TeamLine {
    let Some(c) = competitor else {
        return TeamLine {
            abbreviation: String::new(),
            name: String::new(),
            score: None,
        };
    };
    let team = c.team.clone().unwrap_or_default();
    let athlete = c.athlete.clone().unwrap_or_default();
    TeamLine {
        abbreviation: team.abbreviation.unwrap_or_default(),
        name: team
            .short_display_name
            .or(team.display_name)
            .or(athlete.display_name)
            .unwrap_or_default(),
        score: if scheduled { None } else { c.score.clone() },
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GolfLeader {
    pub name: String,
    /// Relative to par, e.g. "-12" or "E"
    pub score: String,
    pub position: Option<String>,
    pub thru: Option<String>,
}

/// One tournament round's leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GolfResult {
    pub id: String,
    pub name: String,
    pub short_name: String,
    pub state: EventState,
    pub status_detail: String,
    /// Ordered best first.
    pub players: Vec<GolfLeader>,
}

impl GolfResult {
    pub fn from_leaderboard(event: &GolfEvent) -> Self {
        let status_type = event
            .status
            .as_ref()
            .and_then(|s| s.status_type.clone())
            .unwrap_or_default();
        let players = event
            .players()
            .into_iter()
            .map(|p| GolfLeader {
                name: p
                    .athlete
                    .as_ref()
                    .and_then(|a| a.display_name.clone())
                    .unwrap_or_default(),
                score: p
                    .score
                    .as_ref()
                    .and_then(|s| s.display_value.clone())
                    .unwrap_or_default(),
                position: p
                    .status
                    .as_ref()
                    .and_then(|s| s.position.as_ref())
                    .and_then(|pos| pos.display_name.clone()),
                thru: p.status.as_ref().and_then(|s| s.display_thru.clone()),
            })
            .collect();

        GolfResult {
            id: event.id.clone().unwrap_or_default(),
            name: event.name.clone().unwrap_or_default(),
            short_name: event.short_name.clone().unwrap_or_default(),
            state: EventState::from_raw(status_type.state.as_deref()),
            status_detail: status_type
                .short_detail
                .or(status_type.description)
                .unwrap_or_default(),
            players,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentItem {
    Game(GameEvent),
    Golf(GolfResult),
}

impl ContentItem {
    pub fn id(&self) -> &str {
        match self {
            ContentItem::Game(g) => &g.id,
            ContentItem::Golf(g) => &g.id,
        }
    }

    pub fn state(&self) -> EventState {
        match self {
            ContentItem::Game(g) => g.state,
            ContentItem::Golf(g) => g.state,
        }
    }
}

/// Everything one league has on one display day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayGroup {
    pub day: NaiveDate,
    pub league: League,
    pub items: Vec<ContentItem>,
}

impl DayGroup {
    pub fn new(day: NaiveDate, league: League, items: Vec<ContentItem>) -> Self {
        DayGroup { day, league, items }
    }

    /// Sort key: day ascending, then league rank.
    pub fn sort_key(&self) -> (NaiveDate, usize, League) {
        (self.day, self.league.rank(), self.league)
    }

    /// Append `other`'s items, skipping ids already present.
    pub fn union(&mut self, other: &DayGroup) {
        let mut seen: HashSet<String> = self
            .items
            .iter()
            .map(|i| i.id().to_string())
            .filter(|id| !id.is_empty())
            .collect();
        for item in &other.items {
            let id = item.id();
            if id.is_empty() || seen.insert(id.to_string()) {
                self.items.push(item.clone());
            }
        }
    }
}

/// The ordered set of day groups visible to readers.
///
/// Invariants: at most one group per (day, league); groups sorted by day then
/// league rank. Groups are shared by `Arc` so a merge that does not touch a
/// day hands the very same group to the next snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    groups: Vec<Arc<DayGroup>>,
}

impl Snapshot {
    pub fn from_groups<I>(groups: I) -> Self
    where
        I: IntoIterator<Item = Arc<DayGroup>>,
    {
        let mut keyed: BTreeMap<(NaiveDate, usize, League), Arc<DayGroup>> = BTreeMap::new();
        for group in groups {
            match keyed.entry(group.sort_key()) {
                Entry::Vacant(slot) => {
                    slot.insert(group);
                }
                Entry::Occupied(mut slot) => {
                    Arc::make_mut(slot.get_mut()).union(&group);
                }
            }
        }
        Snapshot {
            groups: keyed.into_values().collect(),
        }
    }

    pub fn groups(&self) -> &[Arc<DayGroup>] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Items currently in progress, across all groups.
    pub fn live_count(&self) -> usize {
        self.groups
            .iter()
            .flat_map(|g| g.items.iter())
            .filter(|i| i.state() == EventState::InProgress)
            .count()
    }
}
