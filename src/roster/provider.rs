//! Roster providers: where raw team records come from.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

use super::types::ProviderRecord;
use crate::config::{espn_teams_url, PROVIDER_TIMEOUT_SECS};

/// Source of roster records.
///
/// Each call is one attempt; retries and caching live in the roster cache.
/// Errors should keep the underlying `reqwest::Error` in their chain so the
/// retry policy can see HTTP status codes.
#[async_trait]
pub trait RosterProvider: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    async fn fetch_roster(&self) -> Result<Vec<ProviderRecord>>;
}

// === ESPN ===

#[derive(Debug, Deserialize)]
struct EspnTeamsResponse {
    #[serde(default)]
    sports: Vec<EspnSport>,
}

#[derive(Debug, Deserialize)]
struct EspnSport {
    #[serde(default)]
    leagues: Vec<EspnLeague>,
}

#[derive(Debug, Deserialize)]
struct EspnLeague {
    #[serde(default)]
    teams: Vec<EspnTeamEntry>,
}

#[derive(Debug, Deserialize)]
struct EspnTeamEntry {
    team: EspnTeam,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EspnTeam {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    short_display_name: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    abbreviation: Option<String>,
}

impl From<EspnTeam> for ProviderRecord {
    fn from(team: EspnTeam) -> Self {
        let non_empty = |s: &Option<String>| s.as_ref().filter(|v| !v.trim().is_empty()).cloned();
        ProviderRecord {
            display_name: non_empty(&team.short_display_name).or_else(|| non_empty(&team.display_name)),
            entity_id: team.id.unwrap_or_default(),
            abbreviation: team.abbreviation,
            location: team.location,
            nickname: team.name,
            full_name: team.display_name,
        }
    }
}

/// Flatten an ESPN `teams` payload (`sports[].leagues[].teams[].team`)
pub fn parse_espn_teams(body: &str) -> Result<Vec<ProviderRecord>> {
    let response: EspnTeamsResponse =
        serde_json::from_str(body).context("Failed to parse ESPN teams response")?;

    Ok(response
        .sports
        .into_iter()
        .flat_map(|sport| sport.leagues)
        .flat_map(|league| league.teams)
        .map(|entry| ProviderRecord::from(entry.team))
        .collect())
}

/// Live roster from ESPN's public site API
pub struct EspnRosterProvider {
    http: reqwest::Client,
    url: String,
}

impl EspnRosterProvider {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(PROVIDER_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }

    /// Provider for ESPN_TEAMS_URL or the Division I default
    pub fn from_env() -> Result<Self> {
        Self::new(espn_teams_url())
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RosterProvider for EspnRosterProvider {
    fn name(&self) -> &str {
        "espn"
    }

    async fn fetch_roster(&self) -> Result<Vec<ProviderRecord>> {
        debug!("Fetching ESPN roster from: {}", self.url);

        let resp = self
            .http
            .get(&self.url)
            .send()
            .await
            .context("ESPN roster request failed")?
            .error_for_status()
            .context("ESPN roster request rejected")?;

        let body = resp.text().await.context("Failed to read ESPN response body")?;
        let records = parse_espn_teams(&body)?;

        info!("Fetched {} teams from ESPN", records.len());
        Ok(records)
    }
}

// === Local file ===

/// Roster read from a JSON array of [`ProviderRecord`] on disk
pub struct FileRosterProvider {
    path: PathBuf,
}

impl FileRosterProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RosterProvider for FileRosterProvider {
    fn name(&self) -> &str {
        "file"
    }

    async fn fetch_roster(&self) -> Result<Vec<ProviderRecord>> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read roster file {}", self.path.display()))?;
        let records: Vec<ProviderRecord> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse roster file {}", self.path.display()))?;

        debug!(
            "Loaded {} roster records from {}",
            records.len(),
            self.path.display()
        );
        Ok(records)
    }
}
