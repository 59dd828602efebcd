//! Issue source: fetches new issues for a repository.
//!
//! [`IssueSource`] is the seam the polling tasks call through;
//! [`GitHubClient`] is the REST implementation.

pub mod client;

pub use client::{GitHubClient, GitHubClientConfig};

use crate::monitor::RepoRef;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Issue open/closed state as reported by GitHub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Open,
    Closed,
}

/// State selector for an issue query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateFilter {
    #[default]
    Open,
    Closed,
    All,
}

impl StateFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::All => "all",
        }
    }
}

/// Query filter for [`IssueSource::fetch_issues`].
///
/// `since` is never persisted with a monitor; the polling task fills it
/// from the monitor's checkpoint on every cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueFilter {
    #[serde(default, skip_serializing)]
    pub since: Option<DateTime<Utc>>,
    /// `Some(true)`: any assignee. `Some(false)`: unassigned only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<StateFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
}

impl IssueFilter {
    /// Copy of this filter bounded below by `since`.
    pub fn with_since(&self, since: DateTime<Utc>) -> Self {
        Self {
            since: Some(since),
            ..self.clone()
        }
    }
}

/// A single issue returned by the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub author: String,
    pub title: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub labels: Vec<String>,
    pub state: IssueState,
}

/// Errors from an issue source. Absorbed by the polling task.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Transport-level failure.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The API answered with a non-success status.
    #[error("GitHub API returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
}

/// Contract for anything that can list new issues of a repository.
#[async_trait]
pub trait IssueSource: Send + Sync {
    async fn fetch_issues(
        &self,
        repo: &RepoRef,
        filter: &IssueFilter,
    ) -> Result<Vec<Issue>, SourceError>;
}
