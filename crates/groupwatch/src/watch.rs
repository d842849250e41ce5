// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The poll loop: fetch membership, diff against the snapshot, announce joins.
//!
//! Everything runs on the caller's task, one request at a time. A slow
//! profile lookup or webhook delays the rest of the cycle and the next poll.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::client::ApiClient;
use crate::config::{FetchFailurePolicy, WatchConfig};
use crate::members::fetch_members;
use crate::notify::{Delivery, Notifier};
use crate::profile::fetch_profile;
use crate::snapshot::{MemberId, MemberSet, Snapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Initializing,
    SteadyState,
}

/// What one completed cycle did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Size of the membership list fetched this cycle.
    pub fetched: usize,
    /// Members not in the previous snapshot, ascending.
    pub new_members: Vec<MemberId>,
    pub notified: usize,
    pub rejected: usize,
    pub missing_profiles: usize,
    /// This cycle set the first baseline; nothing was announced.
    pub baseline: bool,
}

/// Owns the client, the notifier, and the membership snapshot.
pub struct Watcher {
    client: ApiClient,
    notifier: Notifier,
    group_id: String,
    policy: FetchFailurePolicy,
    interval: Duration,
    phase: Phase,
    /// `None` until a membership fetch has succeeded (or been coerced to empty).
    snapshot: Option<Snapshot>,
}

impl Watcher {
    pub fn new(
        client: ApiClient,
        notifier: Notifier,
        group_id: impl Into<String>,
        policy: FetchFailurePolicy,
        interval: Duration,
    ) -> Self {
        Self {
            client,
            notifier,
            group_id: group_id.into(),
            policy,
            interval,
            phase: Phase::Initializing,
            snapshot: None,
        }
    }

    pub fn from_config(config: &WatchConfig) -> anyhow::Result<Self> {
        Ok(Self::new(
            ApiClient::from_config(config)?,
            Notifier::from_config(config)?,
            config.group_id()?,
            config.fetch_failure_policy()?,
            config.poll_interval(),
        ))
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Current baseline, if one has been established.
    pub fn known(&self) -> Option<&MemberSet> {
        self.snapshot.as_ref().map(Snapshot::known)
    }

    /// Refresh the security token and take the initial membership snapshot.
    ///
    /// Under [`FetchFailurePolicy::Skip`] a failed initial fetch defers the
    /// baseline to the first successful cycle. Under `TreatAsEmpty` a
    /// non-success status starts from an empty baseline and any other failure
    /// is returned.
    pub async fn initialize(&mut self) -> anyhow::Result<()> {
        self.client.refresh_security_token().await;

        match fetch_members(&self.client, &self.group_id).await {
            Ok(current) => self.set_baseline(current),
            Err(e) if e.is_status() && self.policy == FetchFailurePolicy::TreatAsEmpty => {
                self.set_baseline(MemberSet::new());
            }
            Err(e) if self.policy == FetchFailurePolicy::Skip => {
                tracing::error!(err = %e, "initial membership fetch failed, baseline deferred");
            }
            Err(e) => return Err(e.into()),
        }

        self.phase = Phase::SteadyState;
        Ok(())
    }

    fn set_baseline(&mut self, current: MemberSet) {
        tracing::info!(group_id = %self.group_id, members = current.len(), "tracking members");
        self.snapshot = Some(Snapshot::new(current));
    }

    /// Run one poll: fetch, diff, announce, then advance the snapshot.
    ///
    /// On `Err` the snapshot is left untouched, so members announced before
    /// the failure are announced again next cycle.
    pub async fn run_cycle(&mut self) -> anyhow::Result<CycleReport> {
        let current = match fetch_members(&self.client, &self.group_id).await {
            Ok(current) => current,
            Err(e) if e.is_status() && self.policy == FetchFailurePolicy::TreatAsEmpty => {
                MemberSet::new()
            }
            Err(e) => return Err(e.into()),
        };

        let Some(snapshot) = self.snapshot.as_mut() else {
            let report =
                CycleReport { fetched: current.len(), baseline: true, ..CycleReport::default() };
            self.set_baseline(current);
            return Ok(report);
        };

        let mut report = CycleReport {
            fetched: current.len(),
            new_members: snapshot.delta(&current),
            ..CycleReport::default()
        };

        for &id in &report.new_members {
            let Some(profile) = fetch_profile(&self.client, id).await? else {
                report.missing_profiles += 1;
                continue;
            };
            match self.notifier.notify(&profile).await? {
                Delivery::Accepted => report.notified += 1,
                Delivery::Rejected { .. } => report.rejected += 1,
            }
        }

        snapshot.replace(current);
        Ok(report)
    }

    /// Initialize, then poll every interval until `shutdown` is cancelled.
    ///
    /// Cycle failures are logged and never end the loop. Only an
    /// initialization error is returned.
    pub async fn run(mut self, shutdown: CancellationToken) -> anyhow::Result<()> {
        tokio::select! {
            _ = shutdown.cancelled() => return Ok(()),
            result = self.initialize() => result?,
        }

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }

            let outcome = tokio::select! {
                _ = shutdown.cancelled() => break,
                outcome = self.run_cycle() => outcome,
            };
            match outcome {
                Ok(report) if report.new_members.is_empty() => {
                    tracing::debug!(members = report.fetched, "no new members");
                }
                Ok(report) => {
                    tracing::info!(
                        members = report.fetched,
                        new = report.new_members.len(),
                        notified = report.notified,
                        rejected = report.rejected,
                        missing_profiles = report.missing_profiles,
                        "cycle complete"
                    );
                }
                Err(e) => {
                    tracing::error!(err = %format!("{e:#}"), "cycle abandoned, snapshot kept");
                }
            }
        }

        tracing::info!("shutting down");
        Ok(())
    }
}

#[cfg(test)]
#[path = "watch_tests.rs"]
mod tests;
