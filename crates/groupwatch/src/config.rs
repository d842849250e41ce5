// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use clap::Parser;

/// What the watcher does when the membership list cannot be fetched.
///
/// - `Skip`: abandon the cycle and keep the previous snapshot.
/// - `TreatAsEmpty`: a non-success status counts as an empty group, so the
///   snapshot is overwritten with nothing and the next good fetch announces
///   everyone again.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum FetchFailurePolicy {
    #[default]
    Skip,
    TreatAsEmpty,
}

impl std::fmt::Display for FetchFailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Skip => f.write_str("skip"),
            Self::TreatAsEmpty => f.write_str("treat-as-empty"),
        }
    }
}

impl std::str::FromStr for FetchFailurePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "treat-as-empty" | "empty" => Ok(Self::TreatAsEmpty),
            other => anyhow::bail!("invalid fetch failure policy: {other}"),
        }
    }
}

/// Announces new group members to a Discord webhook.
#[derive(Debug, Clone, Parser)]
#[command(name = "groupwatch", version, about)]
pub struct WatchConfig {
    /// Session cookie (`.ROBLOSECURITY` value) for authenticated calls.
    #[arg(long, env = "ROBLOSECURITY", hide_env_values = true)]
    pub cookie: Option<String>,

    /// Group whose membership is polled.
    #[arg(long, env = "GROUP_ID")]
    pub group_id: Option<String>,

    /// Discord webhook that receives one embed per new member.
    #[arg(long, env = "DISCORD_WEBHOOK", hide_env_values = true)]
    pub webhook_url: Option<String>,

    /// Seconds to sleep between membership polls.
    #[arg(long, default_value_t = 60, env = "GROUPWATCH_POLL_INTERVAL_SECS")]
    pub poll_interval_secs: u64,

    /// Behavior on a failed membership fetch: skip or treat-as-empty.
    #[arg(long, default_value = "skip", env = "GROUPWATCH_ON_FETCH_FAILURE")]
    pub on_fetch_failure: String,

    /// Per-request timeout in seconds. Unset means requests never time out.
    #[arg(long, env = "GROUPWATCH_REQUEST_TIMEOUT_SECS")]
    pub request_timeout_secs: Option<u64>,

    /// User-Agent sent on API calls.
    #[arg(long, default_value = "RobloxBot (groupwatch)", env = "GROUPWATCH_USER_AGENT")]
    pub user_agent: String,

    /// Base URL of the auth service (token bootstrap).
    #[arg(long, default_value = "https://auth.roblox.com", env = "GROUPWATCH_AUTH_URL")]
    pub auth_url: String,

    /// Base URL of the groups service (membership list).
    #[arg(long, default_value = "https://groups.roblox.com", env = "GROUPWATCH_GROUPS_URL")]
    pub groups_url: String,

    /// Base URL of the users service (profile lookup).
    #[arg(long, default_value = "https://users.roblox.com", env = "GROUPWATCH_USERS_URL")]
    pub users_url: String,

    /// Headshot image endpoint used for embed thumbnails.
    #[arg(
        long,
        default_value = "https://www.roblox.com/headshot-thumbnail/image",
        env = "GROUPWATCH_THUMBNAIL_URL"
    )]
    pub thumbnail_url: String,

    /// Log filter directive (e.g. `info`, `groupwatch=debug`).
    #[arg(long, default_value = "info", env = "GROUPWATCH_LOG_LEVEL")]
    pub log_level: String,

    /// Log output format: text or json.
    #[arg(long, default_value = "text", env = "GROUPWATCH_LOG_FORMAT")]
    pub log_format: String,
}

impl WatchConfig {
    /// Validate the configuration, reporting every missing required setting at once.
    pub fn validate(&self) -> anyhow::Result<()> {
        let missing: Vec<&str> = [
            ("ROBLOSECURITY", &self.cookie),
            ("GROUP_ID", &self.group_id),
            ("DISCORD_WEBHOOK", &self.webhook_url),
        ]
        .into_iter()
        .filter(|(_, value)| non_blank(value).is_none())
        .map(|(name, _)| name)
        .collect();
        if !missing.is_empty() {
            anyhow::bail!("missing required setting {}", missing.join(", "));
        }

        if self.poll_interval_secs == 0 {
            anyhow::bail!("--poll-interval-secs must be greater than zero");
        }
        if self.request_timeout_secs == Some(0) {
            anyhow::bail!("--request-timeout-secs must be greater than zero when set");
        }

        for (flag, url) in [
            ("--webhook-url", self.webhook_url()?),
            ("--auth-url", self.auth_url.as_str()),
            ("--groups-url", self.groups_url.as_str()),
            ("--users-url", self.users_url.as_str()),
            ("--thumbnail-url", self.thumbnail_url.as_str()),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                anyhow::bail!("{flag} must be an http(s) URL, got {url:?}");
            }
        }

        self.fetch_failure_policy()?;

        match self.log_format.as_str() {
            "text" | "json" => {}
            other => anyhow::bail!("invalid log format: {other} (expected text or json)"),
        }

        Ok(())
    }

    pub fn cookie(&self) -> anyhow::Result<&str> {
        required(&self.cookie, "ROBLOSECURITY")
    }

    pub fn group_id(&self) -> anyhow::Result<&str> {
        required(&self.group_id, "GROUP_ID")
    }

    pub fn webhook_url(&self) -> anyhow::Result<&str> {
        required(&self.webhook_url, "DISCORD_WEBHOOK")
    }

    pub fn fetch_failure_policy(&self) -> anyhow::Result<FetchFailurePolicy> {
        self.on_fetch_failure.parse()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn required<'a>(value: &'a Option<String>, name: &str) -> anyhow::Result<&'a str> {
    non_blank(value).ok_or_else(|| anyhow::anyhow!("missing required setting {name}"))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
