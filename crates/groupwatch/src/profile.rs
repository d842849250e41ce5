// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::error::{Endpoint, FetchError};
use crate::snapshot::MemberId;

/// Public profile of one member, fetched on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberProfile {
    pub id: MemberId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

pub fn profile_url(users_base: &str, id: MemberId) -> String {
    format!("{users_base}/v1/users/{id}")
}

/// Look up a member's profile. Unauthenticated.
///
/// Returns `Ok(None)` when the service answers with a non-success status.
pub async fn fetch_profile(
    client: &ApiClient,
    id: MemberId,
) -> Result<Option<MemberProfile>, FetchError> {
    let url = profile_url(&client.endpoints().users, id);
    let resp = client
        .http()
        .get(url)
        .send()
        .await
        .map_err(FetchError::transport(Endpoint::Profile))?;

    let status = resp.status();
    if !status.is_success() {
        tracing::warn!(user_id = id, status = status.as_u16(), "failed to get user info");
        return Ok(None);
    }

    let body = resp.bytes().await.map_err(FetchError::transport(Endpoint::Profile))?;
    let profile = serde_json::from_slice(&body).map_err(FetchError::decode(Endpoint::Profile))?;
    Ok(Some(profile))
}

#[cfg(test)]
#[path = "profile_tests.rs"]
mod tests;
