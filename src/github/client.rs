//! GitHub REST client for the repository issues endpoint.

use super::{Issue, IssueFilter, IssueSource, IssueState, SourceError};
use crate::monitor::RepoRef;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://api.github.com";
const DEFAULT_USER_AGENT: &str = concat!("issue-net/", env!("CARGO_PKG_VERSION"));
const API_VERSION: &str = "2022-11-28";

/// Connection settings for [`GitHubClient`].
#[derive(Debug, Clone)]
pub struct GitHubClientConfig {
    /// Personal access token.
    pub token: String,
    /// Base URL (defaults to `https://api.github.com`).
    pub base_url: String,
    /// Page size requested per call (GitHub caps this at 100).
    pub per_page: u8,
    pub timeout: Duration,
    pub user_agent: String,
}

impl GitHubClientConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            per_page: 100,
            timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }

    /// Set a custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_per_page(mut self, per_page: u8) -> Self {
        self.per_page = per_page.clamp(1, 100);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// [`IssueSource`] backed by `GET /repos/{owner}/{repo}/issues`.
pub struct GitHubClient {
    config: GitHubClientConfig,
    client: reqwest::Client,
}

impl GitHubClient {
    /// Build a client.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP client cannot be constructed.
    pub fn new(config: GitHubClientConfig) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| SourceError::Http(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    fn issues_url(&self, repo: &RepoRef) -> String {
        format!(
            "{}/repos/{}/{}/issues",
            self.config.base_url.trim_end_matches('/'),
            repo.owner,
            repo.repo
        )
    }

    fn query_params(&self, filter: &IssueFilter) -> Vec<(&'static str, String)> {
        let mut params = Vec::with_capacity(5);
        if let Some(since) = filter.since {
            params.push(("since", since.to_rfc3339_opts(SecondsFormat::Secs, true)));
        }
        match filter.assigned {
            Some(true) => params.push(("assignee", "*".to_owned())),
            Some(false) => params.push(("assignee", "none".to_owned())),
            None => {}
        }
        params.push((
            "state",
            filter.state.unwrap_or_default().as_str().to_owned(),
        ));
        if let Some(labels) = filter.labels.as_ref().filter(|l| !l.is_empty()) {
            params.push(("labels", labels.join(",")));
        }
        params.push(("per_page", self.config.per_page.to_string()));
        params
    }
}

#[async_trait]
impl IssueSource for GitHubClient {
    async fn fetch_issues(
        &self,
        repo: &RepoRef,
        filter: &IssueFilter,
    ) -> Result<Vec<Issue>, SourceError> {
        let response = self
            .client
            .get(self.issues_url(repo))
            .query(&self.query_params(filter))
            .bearer_auth(&self.config.token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .send()
            .await
            .map_err(|e| SourceError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: Vec<IssuePayload> = response
            .json()
            .await
            .map_err(|e| SourceError::Decode(e.to_string()))?;
        debug!(repo = %repo, count = payload.len(), "fetched issues");

        Ok(payload.into_iter().map(Issue::from).collect())
    }
}

#[derive(Debug, Deserialize)]
struct IssuePayload {
    number: u64,
    title: String,
    html_url: String,
    created_at: DateTime<Utc>,
    state: IssueState,
    #[serde(default)]
    user: Option<UserPayload>,
    #[serde(default)]
    labels: Vec<LabelPayload>,
}

#[derive(Debug, Deserialize)]
struct UserPayload {
    login: String,
}

/// GitHub returns label objects, but accepts and sometimes echoes bare names.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LabelPayload {
    Named { name: Option<String> },
    Plain(String),
}

impl From<IssuePayload> for Issue {
    fn from(p: IssuePayload) -> Self {
        Self {
            number: p.number,
            author: p
                .user
                .map(|u| u.login)
                .unwrap_or_else(|| "unknown".to_owned()),
            title: p.title,
            url: p.html_url,
            created_at: p.created_at,
            labels: p
                .labels
                .into_iter()
                .map(|l| match l {
                    LabelPayload::Named { name } => name.unwrap_or_default(),
                    LabelPayload::Plain(name) => name,
                })
                .collect(),
            state: p.state,
        }
    }
}
