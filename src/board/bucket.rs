use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::warn;

use super::{ContentItem, DayGroup, GameEvent};
use crate::calendar::{parse_event_time, DayCalendar};
use crate::catalog::League;
use crate::scores::payload::RawEvent;

/// Group a league's events by display day.
///
/// Events keep their arrival order within a day. Events whose timestamp is
/// missing or unparseable are dropped.
pub fn bucket(league: League, events: &[RawEvent], calendar: DayCalendar) -> Vec<DayGroup> {
    let mut days: BTreeMap<NaiveDate, Vec<ContentItem>> = BTreeMap::new();

    for event in events {
        let Some(start) = event.date.as_deref().and_then(parse_event_time) else {
            warn!(
                "{}: dropping event {:?} with unparseable date {:?}",
                league, event.id, event.date
            );
            continue;
        };
        days.entry(calendar.day_of(start))
            .or_default()
            .push(ContentItem::Game(GameEvent::from_raw(event, start)));
    }

    group_days(league, days)
}

pub(crate) fn group_days(
    league: League,
    days: BTreeMap<NaiveDate, Vec<ContentItem>>,
) -> Vec<DayGroup> {
    days.into_iter()
        .map(|(day, items)| DayGroup::new(day, league, items))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::testing::{date, raw_event, scoreboard};

    #[test]
    fn test_bucket_groups_by_day_in_arrival_order() {
        let board = scoreboard(vec![
            raw_event("b", "2026-02-09T23:00Z", "pre", "", ""),
            raw_event("a", "2026-02-10T19:00Z", "pre", "", ""),
            raw_event("c", "2026-02-09T18:00Z", "post", "3", "1"),
        ]);
        let groups = bucket(League::Nba, &board.events, DayCalendar::utc());

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].day, date(2026, 2, 9));
        assert_eq!(groups[0].league, League::Nba);
        let ids: Vec<_> = groups[0].items.iter().map(|i| i.id()).collect();
        assert_eq!(ids, vec!["b", "c"]);
        assert_eq!(groups[1].day, date(2026, 2, 10));
    }

    #[test]
    fn test_bucket_drops_unparseable_dates() {
        let bad = raw_event("x", "sometime", "pre", "", "");
        let mut missing = raw_event("y", "", "pre", "", "");
        missing.as_object_mut().unwrap().remove("date");
        let board = scoreboard(vec![
            bad,
            missing,
            raw_event("ok", "2026-02-09T19:00Z", "in", "1", "0"),
        ]);
        let groups = bucket(League::Nhl, &board.events, DayCalendar::utc());
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].items.len(), 1);
        assert_eq!(groups[0].items[0].id(), "ok");
    }

    #[test]
    fn test_bucket_uses_local_calendar_day() {
        // Late tip-off on the 9th in US Eastern is the 10th in UTC
        let board = scoreboard(vec![raw_event("late", "2026-02-10T01:30Z", "in", "20", "18")]);
        let eastern = DayCalendar::from_offset_minutes(-5 * 60).unwrap();
        let groups = bucket(League::Nba, &board.events, eastern);
        assert_eq!(groups[0].day, date(2026, 2, 9));
    }

    #[test]
    fn test_bucket_empty() {
        assert!(bucket(League::Mlb, &[], DayCalendar::utc()).is_empty());
    }
}
