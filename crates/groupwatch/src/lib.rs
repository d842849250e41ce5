// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Groupwatch: polls a group's member list and announces new members to a
//! Discord webhook.

pub mod client;
pub mod config;
pub mod error;
pub mod members;
pub mod notify;
pub mod profile;
pub mod snapshot;
pub mod watch;

#[cfg(test)]
pub(crate) mod test_support;

use tokio_util::sync::CancellationToken;

use crate::config::WatchConfig;
use crate::watch::Watcher;

/// Run the watcher until `shutdown` is cancelled.
pub async fn run(config: WatchConfig, shutdown: CancellationToken) -> anyhow::Result<()> {
    let watcher = Watcher::from_config(&config)?;
    let policy = config.fetch_failure_policy()?;
    let group_id = config.group_id()?;
    tracing::info!(
        group_id = %group_id,
        interval_secs = config.poll_interval_secs,
        on_fetch_failure = %policy,
        "groupwatch starting"
    );
    watcher.run(shutdown).await
}
