// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;

/// Outbound call sites, used to label per-call failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    TokenBootstrap,
    Members,
    Profile,
    Webhook,
}

impl Endpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TokenBootstrap => "TOKEN_BOOTSTRAP",
            Self::Members => "MEMBERS",
            Self::Profile => "PROFILE",
            Self::Webhook => "WEBHOOK",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single outbound call that did not produce usable data.
///
/// `Status` is the recoverable "remote said no" case. `Transport` and
/// `Decode` are unexpected and abandon the poll cycle they happen in.
#[derive(Debug)]
pub enum FetchError {
    Status { endpoint: Endpoint, status: u16, body: String },
    Transport { endpoint: Endpoint, source: reqwest::Error },
    Decode { endpoint: Endpoint, source: serde_json::Error },
}

impl FetchError {
    pub fn transport(endpoint: Endpoint) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| Self::Transport { endpoint, source }
    }

    pub fn decode(endpoint: Endpoint) -> impl FnOnce(serde_json::Error) -> Self {
        move |source| Self::Decode { endpoint, source }
    }

    pub fn endpoint(&self) -> Endpoint {
        match self {
            Self::Status { endpoint, .. }
            | Self::Transport { endpoint, .. }
            | Self::Decode { endpoint, .. } => *endpoint,
        }
    }

    /// HTTP status for `Status` failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_status(&self) -> bool {
        matches!(self, Self::Status { .. })
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status { endpoint, status, body } if body.is_empty() => {
                write!(f, "{endpoint}: HTTP {status}")
            }
            Self::Status { endpoint, status, body } => {
                write!(f, "{endpoint}: HTTP {status}: {body}")
            }
            Self::Transport { endpoint, source } => write!(f, "{endpoint}: request failed: {source}"),
            Self::Decode { endpoint, source } => write!(f, "{endpoint}: invalid response: {source}"),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Status { .. } => None,
            Self::Transport { source, .. } => Some(source),
            Self::Decode { source, .. } => Some(source),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
