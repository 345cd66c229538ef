use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use super::payload::{Leaderboard, Scoreboard};
use super::provider::ScoreSource;
use crate::calendar::DateRange;
use crate::catalog::{LeagueRequest, Sport};
use crate::error::FeedError;

pub const DEFAULT_BASE_URL: &str = "https://site.api.espn.com/apis/site/v2/sports";

/// Score source backed by the public ESPN site API (no key required).
pub struct EspnClient {
    http: Client,
    /// Base URL for overriding in tests
    base_url: String,
    timeout: Duration,
}

impl EspnClient {
    pub fn new(base_url: Option<&str>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(EspnClient {
            http,
            base_url: base_url
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            timeout,
        })
    }

    pub fn scoreboard_url(
        &self,
        request: LeagueRequest,
        range: &DateRange,
    ) -> Result<Url, FeedError> {
        let raw = format!(
            "{}/{}/{}/scoreboard",
            self.base_url,
            request.sport.slug(),
            request.league.slug()
        );
        let mut url = Url::parse(&raw)
            .map_err(|e| FeedError::InvalidRequest(format!("{}: {}", raw, e)))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("dates", &range.to_string());
            for (key, value) in request.league.extra_query() {
                query.append_pair(key, value);
            }
        }
        Ok(url)
    }

    pub fn leaderboard_url(&self, tournament_id: &str) -> Result<Url, FeedError> {
        if tournament_id.trim().is_empty() {
            return Err(FeedError::InvalidRequest("empty tournament id".into()));
        }
        let raw = format!("{}/{}/leaderboard", self.base_url, Sport::Golf.slug());
        let mut url = Url::parse(&raw)
            .map_err(|e| FeedError::InvalidRequest(format!("{}: {}", raw, e)))?;
        url.query_pairs_mut().append_pair("event", tournament_id);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FeedError> {
        debug!("GET {}", url);

        let resp = self.http.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FeedError::Timeout(self.timeout)
            } else {
                FeedError::from(e)
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FeedError::UpstreamStatus(status.as_u16()));
        }

        let body = resp.bytes().await.map_err(FeedError::from)?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl ScoreSource for EspnClient {
    fn name(&self) -> &str {
        "ESPN"
    }

    async fn scoreboard(
        &self,
        request: LeagueRequest,
        range: &DateRange,
    ) -> Result<Scoreboard, FeedError> {
        let url = self.scoreboard_url(request, range)?;
        self.get_json(url).await
    }

    async fn leaderboard(&self, tournament_id: &str) -> Result<Leaderboard, FeedError> {
        let url = self.leaderboard_url(tournament_id)?;
        self.get_json(url).await
    }
}
