//! issue-net daemon.
//!
//! Loads configuration, opens the monitor store, resumes every monitor that
//! was running when the process last exited and polls until Ctrl-C.

use anyhow::Context;
use issue_net::config::{DISCORD_TOKEN_ENV, GITHUB_TOKEN_ENV};
use issue_net::notify::{DiscordNotifier, LogNotifier, Notifier};
use issue_net::{GitHubClient, IssueNetConfig, MonitorManager, SqliteMonitorStore};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; real deployments set the environment directly.
    dotenv::dotenv().ok();

    let config_path = IssueNetConfig::default_config_path();
    let config = IssueNetConfig::load_or_default(&config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    let _log_guard = issue_net::logging::init(&config.logging)?;
    info!(version = env!("CARGO_PKG_VERSION"), config = %config_path.display(), "issue-net starting");

    let db_path = config.database.resolved_path();
    let store = Arc::new(SqliteMonitorStore::open(&db_path)?);
    info!(path = %db_path.display(), "monitor store opened");

    let github_token = std::env::var(GITHUB_TOKEN_ENV)
        .ok()
        .filter(|t| !t.trim().is_empty())
        .with_context(|| format!("{GITHUB_TOKEN_ENV} is not set"))?;
    let source = Arc::new(GitHubClient::new(config.github.client_config(github_token))?);

    let notifier: Arc<dyn Notifier> = match std::env::var(DISCORD_TOKEN_ENV) {
        Ok(token) if !token.trim().is_empty() => Arc::new(DiscordNotifier::new(
            &config.discord.notifier_config(token),
        )?),
        _ => {
            warn!("{DISCORD_TOKEN_ENV} is not set, notifications will only be logged");
            Arc::new(LogNotifier)
        }
    };

    let manager = MonitorManager::new(store, source, notifier)
        .with_poll_interval(config.monitor.poll_interval());

    let report = manager.recover().await?;
    for (name, reason) in &report.skipped {
        warn!(monitor = %name, %reason, "monitor not resumed");
    }

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    info!("shutdown requested");

    manager.shutdown().await;
    info!("issue-net stopped");
    Ok(())
}
