//! GitHub repository locators.

use std::fmt;
use url::Url;

/// Parsed `owner/repo` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// Parse a GitHub repository URL.
    ///
    /// Accepts `http(s)://[www.]github.com/<owner>/<repo>[/...]` and the
    /// scheme-less `github.com/<owner>/<repo>`. Returns `None` for any other
    /// host or when either segment is missing.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let parsed = if trimmed.contains("://") {
            Url::parse(trimmed).ok()?
        } else {
            Url::parse(&format!("https://{trimmed}")).ok()?
        };

        if !matches!(parsed.scheme(), "http" | "https") {
            return None;
        }
        let host = parsed.host_str()?.to_ascii_lowercase();
        if host != "github.com" && host != "www.github.com" {
            return None;
        }

        let mut segments = parsed.path_segments()?.filter(|s| !s.is_empty());
        let owner = segments.next()?;
        let repo = segments.next()?;
        let repo = repo.strip_suffix(".git").unwrap_or(repo);
        if repo.is_empty() {
            return None;
        }
        Some(Self::new(owner, repo))
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}
