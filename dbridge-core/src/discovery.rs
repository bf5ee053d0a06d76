//! Debug session discovery
//!
//! Once the inspector announces its address, a well-known HTTP endpoint on
//! that address lists the debuggable sessions as JSON.

use std::time::Duration;

use serde::Deserialize;

use crate::announce::DebugAddress;
use crate::error::{LaunchError, Result};

/// One debuggable target as reported by `GET /json`. Everything beyond the
/// two URLs is ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDescriptor {
    pub devtools_frontend_url: String,
    pub web_socket_debugger_url: String,
}

/// How to pick a session when the endpoint reports several.
///
/// The endpoint gives no ordering guarantee, so `First` is positional, not a
/// priority choice. Kept as an explicit strategy so match-by-title variants
/// can slot in later.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SelectionStrategy {
    #[default]
    First,
}

impl SelectionStrategy {
    pub fn select(self, sessions: Vec<SessionDescriptor>) -> Result<SessionDescriptor> {
        match self {
            SelectionStrategy::First => {
                sessions.into_iter().next().ok_or(LaunchError::NoSessions)
            }
        }
    }
}

/// Fetches session descriptors from a discovered debug address.
pub struct Discoverer {
    client: reqwest::Client,
    strategy: SelectionStrategy,
}

impl Discoverer {
    pub fn new(strategy: SelectionStrategy) -> Self {
        Self {
            client: reqwest::Client::builder()
                .no_proxy()
                .timeout(Duration::from_secs(5))
                .build()
                .expect("Failed to build HTTP client"),
            strategy,
        }
    }

    /// Fetch `/json` from the debug address and select one session.
    pub async fn discover(&self, address: &DebugAddress) -> Result<SessionDescriptor> {
        let url = format!("http://{address}/json");
        tracing::debug!(%url, "fetching session list");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.as_u16() != 200 {
            return Err(LaunchError::Discovery {
                status: status.as_u16(),
                body,
            });
        }

        let sessions: Vec<SessionDescriptor> =
            serde_json::from_str(&body).map_err(|_| LaunchError::Discovery {
                status: status.as_u16(),
                body: format!("no structured data in response: {body}"),
            })?;

        self.strategy.select(sessions)
    }
}

impl Default for Discoverer {
    fn default() -> Self {
        Self::new(SelectionStrategy::default())
    }
}
