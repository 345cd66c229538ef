//! Shared fixtures for board tests: an in-memory score source and small
//! payload builders.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::{json, Value};
use tokio::sync::Semaphore;

use super::{ContentItem, DayGroup, EventState, GameEvent, Snapshot, TeamLine};
use crate::calendar::DateRange;
use crate::catalog::{League, LeagueRequest};
use crate::error::FeedError;
use crate::scores::payload::{Leaderboard, Scoreboard};
use crate::scores::ScoreSource;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn game_item(id: &str, state: &str, home: &str, away: &str) -> ContentItem {
    let score = |s: &str| if s.is_empty() { None } else { Some(s.to_string()) };
    ContentItem::Game(GameEvent {
        id: id.to_string(),
        short_name: format!("AWY @ HOM {}", id),
        start: Utc.with_ymd_and_hms(2026, 2, 9, 19, 0, 0).unwrap(),
        state: EventState::from_raw(Some(state)),
        status_detail: state.to_string(),
        display_clock: None,
        postponed: false,
        home: TeamLine {
            abbreviation: "HOM".into(),
            name: "Home".into(),
            score: score(home),
        },
        away: TeamLine {
            abbreviation: "AWY".into(),
            name: "Away".into(),
            score: score(away),
        },
    })
}

impl Snapshot {
    pub fn group(&self, day: NaiveDate, league: League) -> Option<&Arc<DayGroup>> {
        self.groups().iter().find(|g| g.day == day && g.league == league)
    }
}

/// Raw scoreboard event JSON. `state` is "pre" | "in" | "post".
pub fn raw_event(id: &str, date: &str, state: &str, home: &str, away: &str) -> Value {
    let description = match state {
        "pre" => "Scheduled",
        "in" => "In Progress",
        _ => "Final",
    };
    json!({
        "id": id,
        "date": date,
        "shortName": format!("AWY @ HOM {}", id),
        "status": { "type": { "state": state, "description": description, "shortDetail": description } },
        "competitions": [{ "competitors": [
            { "homeAway": "home", "score": home, "team": { "abbreviation": "HOM", "shortDisplayName": "Home" } },
            { "homeAway": "away", "score": away, "team": { "abbreviation": "AWY", "shortDisplayName": "Away" } }
        ]}]
    })
}

pub fn scoreboard(events: Vec<Value>) -> Scoreboard {
    serde_json::from_value(json!({ "events": events })).unwrap()
}

/// Leaderboard JSON with one event and the given (name, score) players in order.
pub fn leaderboard(id: &str, state: &str, players: &[(&str, &str)]) -> Leaderboard {
    let competitors: Vec<Value> = players
        .iter()
        .enumerate()
        .map(|(i, (name, score))| {
            json!({
                "sortOrder": i + 1,
                "athlete": { "displayName": name },
                "score": { "displayValue": score }
            })
        })
        .collect();
    serde_json::from_value(json!({
        "events": [{
            "id": id,
            "name": format!("Tournament {}", id),
            "shortName": format!("T{}", id),
            "status": { "type": { "state": state, "description": "Round 2" } },
            "competitions": [{ "competitors": competitors }]
        }]
    }))
    .unwrap()
}

/// In-memory score source. Responses are keyed by league and the request's
/// date range string; unknown keys answer with an empty scoreboard.
#[derive(Default)]
pub struct FakeSource {
    scoreboards: Mutex<HashMap<(League, String), Result<Scoreboard, FeedError>>>,
    leaderboards: Mutex<HashMap<String, Result<Leaderboard, FeedError>>>,
    calls: Mutex<Vec<String>>,
    delay: Option<Duration>,
    leaderboard_delay: Option<Duration>,
    day_gate: Option<Arc<Semaphore>>,
}

impl FakeSource {
    pub fn new() -> Self {
        FakeSource::default()
    }

    /// Every call sleeps for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Only leaderboard calls sleep; scoreboards answer at once.
    pub fn with_leaderboard_delay(mut self, delay: Duration) -> Self {
        self.leaderboard_delay = Some(delay);
        self
    }

    /// Single-day scoreboard calls wait for a permit from `gate`.
    pub fn with_day_gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.day_gate = Some(gate);
        self
    }

    pub fn set_scoreboard(
        &self,
        league: League,
        range: &str,
        board: Result<Scoreboard, FeedError>,
    ) {
        self.scoreboards
            .lock()
            .unwrap()
            .insert((league, range.to_string()), board);
    }

    pub fn set_leaderboard(&self, id: &str, board: Result<Leaderboard, FeedError>) {
        self.leaderboards
            .lock()
            .unwrap()
            .insert(id.to_string(), board);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, league: League) -> usize {
        let prefix = format!("scoreboard {} ", league.slug());
        self.calls().iter().filter(|c| c.starts_with(&prefix)).count()
    }
}

#[async_trait]
impl ScoreSource for FakeSource {
    fn name(&self) -> &str {
        "fake"
    }

    async fn scoreboard(
        &self,
        request: LeagueRequest,
        range: &DateRange,
    ) -> Result<Scoreboard, FeedError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("scoreboard {} {}", request.league.slug(), range));
        if let (Some(gate), Some(_)) = (&self.day_gate, range.single_day()) {
            gate.acquire().await.unwrap().forget();
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.scoreboards
            .lock()
            .unwrap()
            .get(&(request.league, range.to_string()))
            .cloned()
            .unwrap_or_else(|| Ok(scoreboard(vec![])))
    }

    async fn leaderboard(&self, tournament_id: &str) -> Result<Leaderboard, FeedError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("leaderboard {}", tournament_id));
        if let Some(delay) = self.delay.or(self.leaderboard_delay) {
            tokio::time::sleep(delay).await;
        }
        self.leaderboards
            .lock()
            .unwrap()
            .get(tournament_id)
            .cloned()
            .unwrap_or_else(|| Err(FeedError::UpstreamStatus(404)))
    }
}
