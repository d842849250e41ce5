// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Discord webhook delivery: one embed per new member.

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::client::http_client;
use crate::config::WatchConfig;
use crate::error::{Endpoint, FetchError};
use crate::profile::MemberProfile;
use crate::snapshot::MemberId;

pub const EMBED_TITLE: &str = "🎉 New Group Member!";
pub const EMBED_COLOR: u32 = 0x00FF00;
pub const EMBED_FOOTER: &str = "Roblox Group Join Bot";
const THUMBNAIL_SIZE: u32 = 420;

/// Webhook request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub color: u32,
    pub thumbnail: EmbedImage,
    pub footer: EmbedFooter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedImage {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedFooter {
    pub text: String,
}

/// Outcome of a delivery attempt that reached the webhook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// `204 No Content`.
    Accepted,
    /// Any other status. Logged and dropped; never retried.
    Rejected { status: u16 },
}

/// Posts new-member embeds to a single webhook.
pub struct Notifier {
    http: Client,
    webhook_url: String,
    thumbnail_url: String,
}

impl Notifier {
    pub fn new(http: Client, webhook_url: impl Into<String>, thumbnail_url: impl Into<String>) -> Self {
        Self { http, webhook_url: webhook_url.into(), thumbnail_url: thumbnail_url.into() }
    }

    pub fn from_config(config: &WatchConfig) -> anyhow::Result<Self> {
        let http = http_client(config.request_timeout(), None)?;
        Ok(Self::new(http, config.webhook_url()?, config.thumbnail_url.as_str()))
    }

    /// Headshot image URL for `id`.
    pub fn thumbnail_for(&self, id: MemberId) -> String {
        format!(
            "{}?userId={id}&width={THUMBNAIL_SIZE}&height={THUMBNAIL_SIZE}&format=png",
            self.thumbnail_url
        )
    }

    pub fn build_payload(&self, profile: &MemberProfile) -> WebhookPayload {
        let embed = Embed {
            title: EMBED_TITLE.to_owned(),
            description: format!(
                "**{}** (`{}`) has joined the Roblox group!",
                profile.name, profile.id
            ),
            color: EMBED_COLOR,
            thumbnail: EmbedImage { url: self.thumbnail_for(profile.id) },
            footer: EmbedFooter { text: EMBED_FOOTER.to_owned() },
        };
        WebhookPayload { embeds: vec![embed] }
    }

    /// Send one embed announcing `profile`.
    ///
    /// Any status other than 204 is logged with the response body and reported
    /// as [`Delivery::Rejected`]. Only transport failures are errors.
    pub async fn notify(&self, profile: &MemberProfile) -> Result<Delivery, FetchError> {
        let payload = self.build_payload(profile);
        let resp = self
            .http
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await
            .map_err(FetchError::transport(Endpoint::Webhook))?;

        let status = resp.status();
        if status == StatusCode::NO_CONTENT {
            tracing::info!(user = %profile.name, user_id = profile.id, "sent webhook");
            return Ok(Delivery::Accepted);
        }

        let body = resp.text().await.unwrap_or_default();
        tracing::error!(
            user_id = profile.id,
            status = status.as_u16(),
            body = %body,
            "failed to send webhook"
        );
        Ok(Delivery::Rejected { status: status.as_u16() })
    }
}

#[cfg(test)]
#[path = "notify_tests.rs"]
mod tests;
