//! Calendar arithmetic for the scoreboard: request date ranges, event
//! timestamp parsing and day bucketing.
//!
//! Upstream timestamps are always UTC. Day boundaries are computed in the
//! configured display calendar (host local time unless a fixed offset is set).

use std::fmt;

use chrono::{
    DateTime, Datelike, Days, FixedOffset, Local, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc,
};

use crate::error::FeedError;

const RANGE_DAY_FORMAT: &str = "%Y%m%d";

/// Dates covered by one scoreboard request: `YYYYMMDD` or `YYYYMMDD-YYYYMMDD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateRange {
    Day(NaiveDate),
    Span { start: NaiveDate, end: NaiveDate },
}

impl DateRange {
    pub fn span(start: NaiveDate, end: NaiveDate) -> Result<Self, FeedError> {
        if end < start {
            return Err(FeedError::InvalidRequest(format!(
                "date range ends before it starts: {}-{}",
                start.format(RANGE_DAY_FORMAT),
                end.format(RANGE_DAY_FORMAT)
            )));
        }
        Ok(DateRange::Span { start, end })
    }

    pub fn parse(raw: &str) -> Result<Self, FeedError> {
        let raw = raw.trim();
        let parse_day = |s: &str| {
            NaiveDate::parse_from_str(s, RANGE_DAY_FORMAT)
                .map_err(|e| FeedError::InvalidRequest(format!("bad date {:?}: {}", s, e)))
        };
        match raw.split_once('-') {
            None if raw.len() == 8 => Ok(DateRange::Day(parse_day(raw)?)),
            Some((start, end)) if start.len() == 8 && end.len() == 8 => {
                DateRange::span(parse_day(start)?, parse_day(end)?)
            }
            _ => Err(FeedError::InvalidRequest(format!(
                "expected YYYYMMDD or YYYYMMDD-YYYYMMDD, got {:?}",
                raw
            ))),
        }
    }

    /// The day of a single-day range. Spans return `None` even when they
    /// cover one day.
    pub fn single_day(&self) -> Option<NaiveDate> {
        match self {
            DateRange::Day(day) => Some(*day),
            DateRange::Span { .. } => None,
        }
    }

    pub fn start(&self) -> NaiveDate {
        match self {
            DateRange::Day(day) => *day,
            DateRange::Span { start, .. } => *start,
        }
    }

    pub fn end(&self) -> NaiveDate {
        match self {
            DateRange::Day(day) => *day,
            DateRange::Span { end, .. } => *end,
        }
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start() <= day && day <= self.end()
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end();
        self.start().iter_days().take_while(move |d| *d <= end)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateRange::Day(day) => write!(f, "{}", day.format(RANGE_DAY_FORMAT)),
            DateRange::Span { start, end } => write!(
                f,
                "{}-{}",
                start.format(RANGE_DAY_FORMAT),
                end.format(RANGE_DAY_FORMAT)
            ),
        }
    }
}

/// Full-window range: `days` consecutive days starting on the Sunday of the
/// week that contains `selected`.
pub fn week_window(selected: NaiveDate, days: u32) -> DateRange {
    let back = u64::from(selected.weekday().num_days_from_sunday());
    let start = selected.checked_sub_days(Days::new(back)).unwrap_or(selected);
    let end = start
        .checked_add_days(Days::new(u64::from(days.max(1) - 1)))
        .unwrap_or(start);
    DateRange::Span { start, end }
}

/// Calendar used to turn an instant into a display day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayCalendar {
    Local,
    Fixed(FixedOffset),
}

impl DayCalendar {
    pub fn utc() -> Self {
        DayCalendar::Fixed(FixedOffset::east_opt(0).unwrap_or_else(|| Utc.fix()))
    }

    pub fn from_offset_minutes(minutes: i32) -> Option<Self> {
        FixedOffset::east_opt(minutes.checked_mul(60)?).map(DayCalendar::Fixed)
    }

    /// Calendar day (local midnight) that `instant` falls on.
    pub fn day_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        match self {
            DayCalendar::Local => instant.with_timezone(&Local).date_naive(),
            DayCalendar::Fixed(offset) => instant.with_timezone(offset).date_naive(),
        }
    }
}

/// Parse an upstream event timestamp. The feed normally sends
/// `2026-02-09T19:00Z`; second precision and full RFC 3339 are accepted too.
pub fn parse_event_time(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    for format in ["%Y-%m-%dT%H:%MZ", "%Y-%m-%dT%H:%M:%SZ"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
