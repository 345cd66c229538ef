//! Scoreboard / leaderboard wire types.
//!
//! Only the fields the board displays are declared; everything else in the
//! payload is ignored. Almost every field is optional because the upstream
//! omits keys freely between sports and event states.

use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, Deserialize)]
pub struct Scoreboard {
    pub events: Vec<RawEvent>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
    pub id: Option<String>,
    /// UTC start time, e.g. `2026-02-09T19:00Z`
    pub date: Option<String>,
    pub name: Option<String>,
    pub short_name: Option<String>,
    pub status: Option<RawStatus>,
    pub competitions: Option<Vec<RawCompetition>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStatus {
    pub display_clock: Option<String>,
    #[serde(rename = "type")]
    pub status_type: Option<RawStatusType>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStatusType {
    /// "pre" | "in" | "post"
    pub state: Option<String>,
    pub description: Option<String>,
    pub detail: Option<String>,
    pub short_detail: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCompetition {
    #[serde(default)]
    pub competitors: Vec<RawCompetitor>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCompetitor {
    /// Sent as a string, e.g. "3"
    pub score: Option<String>,
    pub team: Option<RawTeam>,
    pub athlete: Option<RawAthlete>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTeam {
    pub abbreviation: Option<String>,
    pub display_name: Option<String>,
    pub short_display_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAthlete {
    pub display_name: Option<String>,
}

// ── Golf leaderboard ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct Leaderboard {
    pub events: Vec<GolfEvent>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GolfEvent {
    pub id: Option<String>,
    pub name: Option<String>,
    pub short_name: Option<String>,
    pub status: Option<RawStatus>,
    /// Arrives either as a flat list or nested one level deep.
    #[serde(default, deserialize_with = "flatten_competitions")]
    pub competitions: Vec<GolfCompetition>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GolfCompetition {
    #[serde(default)]
    pub competitors: Vec<GolfCompetitor>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GolfCompetitor {
    pub sort_order: Option<i64>,
    pub athlete: Option<RawAthlete>,
    pub score: Option<GolfScore>,
    pub status: Option<GolfCompetitorStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GolfScore {
    pub display_value: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GolfCompetitorStatus {
    pub display_thru: Option<String>,
    pub position: Option<GolfPosition>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GolfPosition {
    pub display_name: Option<String>,
}

impl GolfEvent {
    /// Every competitor across all competitions, in leaderboard order.
    pub fn players(&self) -> Vec<&GolfCompetitor> {
        let mut players: Vec<&GolfCompetitor> = self
            .competitions
            .iter()
            .flat_map(|c| c.competitors.iter())
            .collect();
        players.sort_by_key(|p| p.sort_order.unwrap_or(0));
        players
    }
}

/// Accept `[Competition]` or `[[Competition]]`; anything else decodes as empty.
fn flatten_competitions<'de, D>(deserializer: D) -> Result<Vec<GolfCompetition>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Shape {
        Flat(Vec<GolfCompetition>),
        Nested(Vec<Vec<GolfCompetition>>),
    }

    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match serde_json::from_value::<Shape>(value) {
        Ok(Shape::Flat(list)) => list,
        Ok(Shape::Nested(lists)) => lists.into_iter().flatten().collect(),
        Err(_) => Vec::new(),
    })
}
