// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Group membership listing.

use serde::Deserialize;

use crate::client::ApiClient;
use crate::error::{Endpoint, FetchError};
use crate::snapshot::{MemberId, MemberSet};

/// Members requested per call. Only the first page is ever read.
pub const PAGE_LIMIT: u32 = 100;

#[derive(Debug, Deserialize)]
struct GroupUsersPage {
    #[serde(default)]
    data: Vec<GroupUserEntry>,
}

#[derive(Debug, Deserialize)]
struct GroupUserEntry {
    user: GroupUser,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroupUser {
    user_id: MemberId,
}

pub fn members_url(groups_base: &str, group_id: &str) -> String {
    format!("{groups_base}/v1/groups/{group_id}/users?limit={PAGE_LIMIT}&sortOrder=Asc")
}

/// Extract member identifiers from a group users page.
pub fn parse_members(body: &str) -> Result<MemberSet, FetchError> {
    let page: GroupUsersPage =
        serde_json::from_str(body).map_err(FetchError::decode(Endpoint::Members))?;
    Ok(page.data.into_iter().map(|entry| entry.user.user_id).collect())
}

/// Fetch the current member set of `group_id` (authenticated, single page).
///
/// A non-success status is logged and returned as [`FetchError::Status`] so
/// the caller can tell a failed fetch from an empty group.
pub async fn fetch_members(client: &ApiClient, group_id: &str) -> Result<MemberSet, FetchError> {
    let url = members_url(&client.endpoints().groups, group_id);
    let resp = client
        .authed(client.http().get(url))
        .send()
        .await
        .map_err(FetchError::transport(Endpoint::Members))?;

    let status = resp.status();
    let body = resp.text().await.map_err(FetchError::transport(Endpoint::Members))?;
    if !status.is_success() {
        tracing::error!(group_id, status = status.as_u16(), "failed to fetch group members");
        return Err(FetchError::Status { endpoint: Endpoint::Members, status: status.as_u16(), body });
    }

    parse_members(&body)
}

#[cfg(test)]
#[path = "members_tests.rs"]
mod tests;
