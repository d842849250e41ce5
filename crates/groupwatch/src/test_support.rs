// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process stand-in for the auth, groups, users, and webhook services.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use crate::client::{http_client, ApiClient, Endpoints, CSRF_HEADER};
use crate::config::FetchFailurePolicy;
use crate::notify::Notifier;
use crate::snapshot::MemberId;
use crate::watch::Watcher;

pub const TEST_COOKIE: &str = "test-cookie";
pub const TEST_GROUP: &str = "4242";

/// Scripted responses. Scripts advance one entry per call and repeat the
/// last entry once exhausted.
pub struct MockApi {
    pub csrf_token: Option<String>,
    pub member_pages: Vec<(u16, String)>,
    pub profiles: HashMap<MemberId, (u16, String)>,
    pub webhook_statuses: Vec<u16>,
}

impl Default for MockApi {
    fn default() -> Self {
        Self {
            csrf_token: Some("csrf-1".to_owned()),
            member_pages: vec![members_page(&[])],
            profiles: HashMap::new(),
            webhook_statuses: vec![204],
        }
    }
}

/// A `200` group users page listing `ids`.
pub fn members_page(ids: &[MemberId]) -> (u16, String) {
    let data: Vec<serde_json::Value> = ids
        .iter()
        .map(|id| {
            serde_json::json!({
                "user": { "userId": id, "username": format!("user{id}"), "displayName": format!("User {id}") },
                "role": { "id": 1, "name": "Member", "rank": 1 }
            })
        })
        .collect();
    (200, serde_json::json!({ "previousPageCursor": null, "nextPageCursor": null, "data": data }).to_string())
}

impl MockApi {
    pub fn members(mut self, pages: Vec<(u16, String)>) -> Self {
        self.member_pages = pages;
        self
    }

    pub fn profile(mut self, id: MemberId, name: &str) -> Self {
        let body = serde_json::json!({
            "description": "",
            "created": "2020-01-01T00:00:00.000Z",
            "isBanned": false,
            "hasVerifiedBadge": false,
            "id": id,
            "name": name,
            "displayName": name,
        });
        self.profiles.insert(id, (200, body.to_string()));
        self
    }

    pub fn raw_profile(mut self, id: MemberId, status: u16, body: &str) -> Self {
        self.profiles.insert(id, (status, body.to_owned()));
        self
    }

    pub fn webhook(mut self, statuses: Vec<u16>) -> Self {
        self.webhook_statuses = statuses;
        self
    }

    pub fn no_csrf_token(mut self) -> Self {
        self.csrf_token = None;
        self
    }

    pub async fn spawn(self) -> anyhow::Result<MockServer> {
        let shared = Arc::new(Shared { script: self, recorded: Recorded::default() });
        let app = Router::new()
            .route("/v2/logout", post(logout))
            .route("/v1/groups/{group_id}/users", get(group_users))
            .route("/v1/users/{id}", get(user))
            .route("/webhook", post(webhook))
            .with_state(Arc::clone(&shared));

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });
        Ok(MockServer { addr, shared })
    }
}

/// What the mock saw.
#[derive(Default)]
pub struct Recorded {
    pub logout_calls: AtomicU32,
    pub member_calls: AtomicUsize,
    pub webhook_calls: AtomicUsize,
    pub member_requests: Mutex<Vec<MemberRequest>>,
    /// Requested id and the cookie header it carried, if any.
    pub profile_requests: Mutex<Vec<(MemberId, Option<String>)>>,
    pub webhooks: Mutex<Vec<serde_json::Value>>,
}

#[derive(Debug, Clone)]
pub struct MemberRequest {
    pub group_id: String,
    pub query: HashMap<String, String>,
    pub cookie: Option<String>,
    pub csrf: Option<String>,
}

struct Shared {
    script: MockApi,
    recorded: Recorded,
}

pub struct MockServer {
    pub addr: SocketAddr,
    shared: Arc<Shared>,
}

impl MockServer {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn webhook_url(&self) -> String {
        format!("{}/webhook", self.base_url())
    }

    pub fn thumbnail_url(&self) -> String {
        format!("{}/headshot", self.base_url())
    }

    pub fn recorded(&self) -> &Recorded {
        &self.shared.recorded
    }

    pub fn client(&self) -> anyhow::Result<ApiClient> {
        let http = http_client(Some(Duration::from_secs(5)), Some("groupwatch-tests"))?;
        Ok(ApiClient::new(http, TEST_COOKIE, Endpoints::single(&self.base_url())))
    }

    pub fn notifier(&self) -> anyhow::Result<Notifier> {
        let http = http_client(Some(Duration::from_secs(5)), None)?;
        Ok(Notifier::new(http, self.webhook_url(), self.thumbnail_url()))
    }

    pub fn watcher(&self, policy: FetchFailurePolicy) -> anyhow::Result<Watcher> {
        Ok(Watcher::new(self.client()?, self.notifier()?, TEST_GROUP, policy, Duration::from_millis(20)))
    }

    pub async fn webhooks(&self) -> Vec<serde_json::Value> {
        self.shared.recorded.webhooks.lock().await.clone()
    }

    pub async fn profile_lookups(&self) -> Vec<MemberId> {
        self.shared.recorded.profile_requests.lock().await.iter().map(|(id, _)| *id).collect()
    }

    pub async fn member_requests(&self) -> Vec<MemberRequest> {
        self.shared.recorded.member_requests.lock().await.clone()
    }
}

/// A URL nothing is listening on.
pub async fn unreachable_url() -> anyhow::Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(format!("http://{addr}"))
}

fn scripted<T: Clone>(script: &[T], idx: usize, fallback: T) -> T {
    script.get(idx).or_else(|| script.last()).cloned().unwrap_or(fallback)
}

fn status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_owned)
}

async fn logout(State(shared): State<Arc<Shared>>) -> Response {
    shared.recorded.logout_calls.fetch_add(1, Ordering::Relaxed);
    let mut resp = (StatusCode::FORBIDDEN, "Token Validation Failed").into_response();
    if let Some(token) = shared.script.csrf_token.as_deref() {
        if let Ok(value) = HeaderValue::from_str(token) {
            resp.headers_mut().insert(CSRF_HEADER, value);
        }
    }
    resp
}

async fn group_users(
    State(shared): State<Arc<Shared>>,
    Path(group_id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> (StatusCode, String) {
    shared.recorded.member_requests.lock().await.push(MemberRequest {
        group_id,
        query,
        cookie: header(&headers, "cookie"),
        csrf: header(&headers, CSRF_HEADER),
    });
    let idx = shared.recorded.member_calls.fetch_add(1, Ordering::Relaxed);
    let (code, body) = scripted(&shared.script.member_pages, idx, members_page(&[]));
    (status(code), body)
}

async fn user(
    State(shared): State<Arc<Shared>>,
    Path(id): Path<MemberId>,
    headers: HeaderMap,
) -> (StatusCode, String) {
    shared.recorded.profile_requests.lock().await.push((id, header(&headers, "cookie")));
    match shared.script.profiles.get(&id) {
        Some((code, body)) => (status(*code), body.clone()),
        None => (StatusCode::NOT_FOUND, r#"{"errors":[{"code":3,"message":"The user id is invalid."}]}"#.to_owned()),
    }
}

async fn webhook(
    State(shared): State<Arc<Shared>>,
    Json(payload): Json<serde_json::Value>,
) -> (StatusCode, String) {
    shared.recorded.webhooks.lock().await.push(payload);
    let idx = shared.recorded.webhook_calls.fetch_add(1, Ordering::Relaxed);
    let code = scripted(&shared.script.webhook_statuses, idx, 204);
    if code == 204 {
        (StatusCode::NO_CONTENT, String::new())
    } else {
        (status(code), r#"{"message": "webhook unavailable", "code": 0}"#.to_owned())
    }
}
