//! Discord channel notifier over the REST API.

use crate::github::Issue;
use crate::monitor::RepoRef;
use crate::notify::{Notifier, format_issue_message};
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";

/// Connection settings for [`DiscordNotifier`].
#[derive(Debug, Clone)]
pub struct DiscordNotifierConfig {
    pub bot_token: String,
    /// REST base URL (defaults to `https://discord.com/api/v10`).
    pub api_base_url: String,
    pub timeout: Duration,
}

impl DiscordNotifierConfig {
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            api_base_url: DEFAULT_API_BASE.to_owned(),
            timeout: Duration::from_secs(15),
        }
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}

/// Posts issue batches to a Discord channel through the REST API.
pub struct DiscordNotifier {
    bot_token: String,
    api_base_url: String,
    client: reqwest::Client,
}

impl DiscordNotifier {
    pub fn new(config: &DiscordNotifierConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            bot_token: config.bot_token.clone(),
            api_base_url: config.api_base_url.trim_end_matches('/').to_owned(),
            client,
        })
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    fn id(&self) -> &'static str {
        "discord"
    }

    async fn send(
        &self,
        destination: &str,
        issues: &[Issue],
        repo: &RepoRef,
    ) -> anyhow::Result<()> {
        if self.bot_token.trim().is_empty() {
            anyhow::bail!("discord bot token is empty");
        }

        let url = format!("{}/channels/{destination}/messages", self.api_base_url);
        let body = json!({
            "content": format_issue_message(issues, repo)
        });
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bot {}", self.bot_token))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("discord send failed ({status}): {body}");
        }
        Ok(())
    }
}
