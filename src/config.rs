use std::time::Duration;

use anyhow::Context;
use chrono::NaiveDate;
use clap::Parser;

use crate::board::signature::DEFAULT_LEADERS;
use crate::board::FailurePolicy;
use crate::calendar::DayCalendar;
use crate::catalog::Catalog;

/// Multi-league live scoreboard feed
#[derive(Parser, Debug, Clone)]
#[command(name = "sideline-feed", version, about)]
pub struct Config {
    /// Sports data API base URL (scoreboard and golf leaderboard endpoints)
    #[arg(
        long,
        env = "SCORES_API_BASE_URL",
        default_value = "https://site.api.espn.com/apis/site/v2/sports"
    )]
    pub api_base_url: String,

    /// Scoreboard API listen address
    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8080")]
    pub listen_addr: String,

    /// Today-only refresh interval in seconds
    #[arg(long, env = "POLL_INTERVAL_SECS", default_value = "30")]
    pub poll_interval_secs: u64,

    /// Per-request upstream timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "30")]
    pub request_timeout_secs: u64,

    /// Days covered by a full-window refresh, starting on Sunday
    #[arg(long, env = "WINDOW_DAYS", default_value = "7")]
    pub window_days: u32,

    /// Leagues to follow, comma-separated (e.g. "nba,nhl,pga"). Empty = built-in set
    #[arg(long, env = "LEAGUES", value_delimiter = ',')]
    pub leagues: Vec<String>,

    /// What a failing league does to the rest of its refresh
    #[arg(long, env = "FAILURE_POLICY", value_enum, default_value_t = FailurePolicy::Partial)]
    pub failure_policy: FailurePolicy,

    /// Golf leaders per leaderboard that count towards change detection
    #[arg(long, env = "SIGNATURE_LEADERS", default_value_t = DEFAULT_LEADERS)]
    pub signature_leaders: usize,

    /// Fixed UTC offset (minutes) for day bucketing; host local time if unset
    #[arg(long, env = "UTC_OFFSET_MINUTES", allow_hyphen_values = true)]
    pub utc_offset_minutes: Option<i32>,

    /// Date (YYYY-MM-DD) whose week the first full-window refresh loads; today if unset
    #[arg(long, env = "SELECTED_DATE")]
    pub selected_date: Option<NaiveDate>,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.poll_interval_secs == 0 {
            anyhow::bail!("poll_interval_secs must be positive");
        }
        if self.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be positive");
        }
        if !(1..=31).contains(&self.window_days) {
            anyhow::bail!("window_days must be between 1 and 31");
        }
        if !(1..=10).contains(&self.signature_leaders) {
            anyhow::bail!("signature_leaders must be between 1 and 10");
        }
        if let Some(minutes) = self.utc_offset_minutes {
            if minutes.unsigned_abs() > 18 * 60 {
                anyhow::bail!("utc_offset_minutes must be within ±18 hours");
            }
        }
        self.catalog()?;
        Ok(())
    }

    pub fn catalog(&self) -> anyhow::Result<Catalog> {
        let keys: Vec<&str> = self
            .leagues
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .collect();
        if keys.is_empty() {
            return Ok(Catalog::default());
        }
        Catalog::from_keys(&keys)
            .map_err(anyhow::Error::msg)
            .context("Invalid --leagues")
    }

    pub fn calendar(&self) -> anyhow::Result<DayCalendar> {
        match self.utc_offset_minutes {
            None => Ok(DayCalendar::Local),
            Some(minutes) => DayCalendar::from_offset_minutes(minutes)
                .with_context(|| format!("Invalid UTC offset: {} minutes", minutes)),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::League;

    fn parse(args: &[&str]) -> Config {
        let mut argv = vec!["sideline-feed"];
        argv.extend_from_slice(args);
        Config::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = parse(&[]);
        config.validate().unwrap();
        assert_eq!(config.poll_interval(), Duration::from_secs(30));
        assert_eq!(config.window_days, 7);
        assert_eq!(config.failure_policy, FailurePolicy::Partial);
        assert_eq!(config.calendar().unwrap(), DayCalendar::Local);
        assert_eq!(config.catalog().unwrap().requests().len(), 9);
        assert_eq!(config.signature_leaders, DEFAULT_LEADERS);
    }

    #[test]
    fn test_league_list_and_policy() {
        let config = parse(&[
            "--leagues",
            "nba, nhl,PGA",
            "--failure-policy",
            "all-or-nothing",
            "--utc-offset-minutes",
            "-300",
            "--selected-date",
            "2026-02-09",
        ]);
        config.validate().unwrap();
        let leagues: Vec<_> = config
            .catalog()
            .unwrap()
            .requests()
            .iter()
            .map(|r| r.league)
            .collect();
        assert_eq!(leagues, vec![League::Nba, League::Nhl, League::Pga]);
        assert_eq!(config.failure_policy, FailurePolicy::AllOrNothing);
        assert_eq!(
            config.calendar().unwrap(),
            DayCalendar::from_offset_minutes(-300).unwrap()
        );
        assert_eq!(config.selected_date, NaiveDate::from_ymd_opt(2026, 2, 9));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(parse(&["--poll-interval-secs", "0"]).validate().is_err());
        assert!(parse(&["--window-days", "40"]).validate().is_err());
        assert!(parse(&["--signature-leaders", "0"]).validate().is_err());
        assert!(parse(&["--utc-offset-minutes", "1200"]).validate().is_err());
        assert!(parse(&["--utc-offset-minutes", "-2147483648"]).validate().is_err());
        parse(&["--utc-offset-minutes", "-1080"]).validate().unwrap();
        assert!(parse(&["--leagues", "nba,cricket"]).validate().is_err());
    }
}
