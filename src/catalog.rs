//! Static league catalog: which (sport, league) pairs are queried, how they
//! rank on screen, and which days a league is known to be dark.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Weekday};
use serde::{Serialize, Serializer};

use crate::calendar::DateRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Sport {
    Baseball,
    Basketball,
    Football,
    Hockey,
    Golf,
    Soccer,
    Tennis,
    Mma,
    Racing,
}

impl Sport {
    /// Path segment used by the scoreboard API.
    pub fn slug(&self) -> &'static str {
        match self {
            Sport::Baseball => "baseball",
            Sport::Basketball => "basketball",
            Sport::Football => "football",
            Sport::Hockey => "hockey",
            Sport::Golf => "golf",
            Sport::Soccer => "soccer",
            Sport::Tennis => "tennis",
            Sport::Mma => "mma",
            Sport::Racing => "racing",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum League {
    Mlb,
    Nba,
    Ncaam,
    Wnba,
    Nfl,
    Ncaaf,
    Nhl,
    Mls,
    PremierLeague,
    LaLiga,
    Bundesliga,
    SerieA,
    Ligue1,
    UefaChampions,
    Pga,
    Liv,
    AtpWta,
    Ufc,
    F1,
}

/// Display rank table: a league's position here is its secondary sort key
/// within a day.
const RANK_TABLE: [League; 19] = [
    League::Bundesliga,
    League::UefaChampions,
    League::PremierLeague,
    League::F1,
    League::Liv,
    League::LaLiga,
    League::Ligue1,
    League::Mlb,
    League::Mls,
    League::Nba,
    League::Ncaaf,
    League::Ncaam,
    League::Nfl,
    League::Nhl,
    League::Pga,
    League::SerieA,
    League::AtpWta,
    League::Ufc,
    League::Wnba,
];

impl League {
    pub const ALL: [League; 19] = [
        League::Mlb,
        League::Nba,
        League::Ncaam,
        League::Wnba,
        League::Nfl,
        League::Ncaaf,
        League::Nhl,
        League::Mls,
        League::PremierLeague,
        League::LaLiga,
        League::Bundesliga,
        League::SerieA,
        League::Ligue1,
        League::UefaChampions,
        League::Pga,
        League::Liv,
        League::AtpWta,
        League::Ufc,
        League::F1,
    ];

    /// Path segment used by the scoreboard API.
    pub fn slug(&self) -> &'static str {
        match self {
            League::Mlb => "mlb",
            League::Nba => "nba",
            League::Ncaam => "mens-college-basketball",
            League::Wnba => "wnba",
            League::Nfl => "nfl",
            League::Ncaaf => "college-football",
            League::Nhl => "nhl",
            League::Mls => "usa.1",
            League::PremierLeague => "eng.1",
            League::LaLiga => "esp.1",
            League::Bundesliga => "ger.1",
            League::SerieA => "ita.1",
            League::Ligue1 => "fra.1",
            League::UefaChampions => "uefa.champions",
            League::Pga => "pga",
            League::Liv => "liv",
            League::AtpWta => "all",
            League::Ufc => "ufc",
            League::F1 => "f1",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            League::Mlb => "MLB",
            League::Nba => "NBA",
            League::Ncaam => "NCAAM",
            League::Wnba => "WNBA",
            League::Nfl => "NFL",
            League::Ncaaf => "NCAAF",
            League::Nhl => "NHL",
            League::Mls => "MLS",
            League::PremierLeague => "EPL",
            League::LaLiga => "La Liga",
            League::Bundesliga => "Bundesliga",
            League::SerieA => "Serie A",
            League::Ligue1 => "Ligue 1",
            League::UefaChampions => "Champions League",
            League::Pga => "PGA",
            League::Liv => "LIVGolf",
            League::AtpWta => "Tennis",
            League::Ufc => "UFC",
            League::F1 => "F1",
        }
    }

    pub fn sport(&self) -> Sport {
        match self {
            League::Mlb => Sport::Baseball,
            League::Nba | League::Ncaam | League::Wnba => Sport::Basketball,
            League::Nfl | League::Ncaaf => Sport::Football,
            League::Nhl => Sport::Hockey,
            League::Mls
            | League::PremierLeague
            | League::LaLiga
            | League::Bundesliga
            | League::SerieA
            | League::Ligue1
            | League::UefaChampions => Sport::Soccer,
            League::Pga | League::Liv => Sport::Golf,
            League::AtpWta => Sport::Tennis,
            League::Ufc => Sport::Mma,
            League::F1 => Sport::Racing,
        }
    }

    /// Secondary sort key within a day; lower sorts first.
    pub fn rank(&self) -> usize {
        RANK_TABLE
            .iter()
            .position(|l| l == self)
            .unwrap_or(RANK_TABLE.len())
    }

    /// Extra query parameters the scoreboard endpoint needs for this league.
    /// College leagues are restricted to the top division.
    pub fn extra_query(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            League::Ncaam => &[("groups", "50")],
            League::Ncaaf => &[("groups", "80")],
            _ => &[],
        }
    }
}

impl fmt::Display for League {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl Serialize for League {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.display_name())
    }
}

impl FromStr for League {
    type Err = String;

    /// Accepts the API slug or the display name, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        League::ALL
            .into_iter()
            .find(|l| l.slug() == wanted || l.display_name().to_lowercase() == wanted)
            .ok_or_else(|| format!("unknown league {:?}", s))
    }
}

/// One upstream scoreboard query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LeagueRequest {
    pub sport: Sport,
    pub league: League,
}

impl LeagueRequest {
    pub fn new(league: League) -> Self {
        LeagueRequest {
            sport: league.sport(),
            league,
        }
    }
}

/// Days on which a league has no fixtures and a single-day query is not
/// worth issuing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleException {
    pub league: League,
    pub dark_days: Vec<Weekday>,
}

impl ScheduleException {
    pub fn default_table() -> Vec<ScheduleException> {
        vec![ScheduleException {
            league: League::Pga,
            dark_days: vec![Weekday::Mon],
        }]
    }
}

/// Whether the request for `league` over `range` should not be issued.
///
/// Only single-day ranges are ever skipped; a multi-day range always
/// includes at least one day worth fetching.
pub fn should_skip(league: League, range: &DateRange, exceptions: &[ScheduleException]) -> bool {
    let Some(day) = range.single_day() else {
        return false;
    };
    let weekday = day.weekday();
    exceptions
        .iter()
        .any(|ex| ex.league == league && ex.dark_days.contains(&weekday))
}

/// The set of leagues polled each cycle, plus their schedule exceptions.
#[derive(Debug, Clone)]
pub struct Catalog {
    requests: Vec<LeagueRequest>,
    exceptions: Vec<ScheduleException>,
}

impl Default for Catalog {
    fn default() -> Self {
        Catalog::new(
            &[
                League::Mlb,
                League::Nba,
                League::Ncaam,
                League::Wnba,
                League::Nfl,
                League::Ncaaf,
                League::Nhl,
                League::Pga,
                League::Liv,
            ],
            ScheduleException::default_table(),
        )
    }
}

impl Catalog {
    pub fn new(leagues: &[League], exceptions: Vec<ScheduleException>) -> Self {
        let mut requests: Vec<LeagueRequest> = Vec::with_capacity(leagues.len());
        for league in leagues {
            let req = LeagueRequest::new(*league);
            if !requests.contains(&req) {
                requests.push(req);
            }
        }
        Catalog {
            requests,
            exceptions,
        }
    }

    /// Parse a list of league keys (slug or display name).
    pub fn from_keys<S: AsRef<str>>(keys: &[S]) -> Result<Self, String> {
        let leagues = keys
            .iter()
            .map(|k| k.as_ref().parse::<League>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Catalog::new(&leagues, ScheduleException::default_table()))
    }

    pub fn requests(&self) -> &[LeagueRequest] {
        &self.requests
    }

    /// Requests to issue for `range`, with dark-day leagues removed.
    pub fn requests_for(&self, range: &DateRange) -> Vec<LeagueRequest> {
        self.requests
            .iter()
            .filter(|req| !should_skip(req.league, range, &self.exceptions))
            .copied()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(y: i32, m: u32, d: u32) -> DateRange {
        DateRange::Day(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn test_rank_table_covers_every_league() {
        for league in League::ALL {
            assert!(league.rank() < RANK_TABLE.len(), "{} has no rank", league);
        }
        assert!(League::Mlb.rank() < League::Nba.rank());
        assert!(League::Nba.rank() < League::Pga.rank());
    }

    #[test]
    fn test_parse_league_keys() {
        assert_eq!("nba".parse::<League>().unwrap(), League::Nba);
        assert_eq!("mens-college-basketball".parse::<League>().unwrap(), League::Ncaam);
        assert_eq!("LIVGolf".parse::<League>().unwrap(), League::Liv);
        assert!("cricket".parse::<League>().is_err());
    }

    #[test]
    fn test_default_catalog_sports() {
        let catalog = Catalog::default();
        assert_eq!(catalog.requests().len(), 9);
        let golf: Vec<_> = catalog
            .requests()
            .iter()
            .filter(|r| r.sport == Sport::Golf)
            .map(|r| r.league)
            .collect();
        assert_eq!(golf, vec![League::Pga, League::Liv]);
    }

    #[test]
    fn test_skip_pga_on_monday_single_day() {
        let exceptions = ScheduleException::default_table();
        // 2026-02-09 is a Monday
        assert!(should_skip(League::Pga, &day(2026, 2, 9), &exceptions));
        assert!(!should_skip(League::Pga, &day(2026, 2, 10), &exceptions));
        assert!(!should_skip(League::Nba, &day(2026, 2, 9), &exceptions));
    }

    #[test]
    fn test_skip_never_applies_to_spans() {
        let exceptions = ScheduleException::default_table();
        let span = DateRange::parse("20260208-20260214").unwrap();
        assert!(!should_skip(League::Pga, &span, &exceptions));
    }

    #[test]
    fn test_skip_table_is_extensible() {
        let exceptions = vec![ScheduleException {
            league: League::Nfl,
            dark_days: vec![Weekday::Tue, Weekday::Wed],
        }];
        assert!(should_skip(League::Nfl, &day(2026, 2, 10), &exceptions));
        assert!(should_skip(League::Nfl, &day(2026, 2, 11), &exceptions));
        assert!(!should_skip(League::Pga, &day(2026, 2, 9), &exceptions));
    }

    #[test]
    fn test_requests_for_drops_dark_leagues() {
        let catalog = Catalog::default();
        let monday = catalog.requests_for(&day(2026, 2, 9));
        assert_eq!(monday.len(), 8);
        assert!(monday.iter().all(|r| r.league != League::Pga));
    }

    #[test]
    fn test_catalog_deduplicates() {
        let catalog = Catalog::from_keys(&["nba", "NBA", "nhl"]).unwrap();
        assert_eq!(catalog.requests().len(), 2);
    }
}
