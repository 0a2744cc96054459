//! Poll-mode feed source.
//!
//! Periodically fetches the latest batch from the remote proxy and dispatches
//! the newest item at most once per real event by tracking the last-dispatched
//! id. A health check against `/status` gates whether polling starts at all.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::domain::{Outcome, OutcomeId};
use crate::error::{FeedError, Result};
use crate::feed::messages::{RecentOutcomesResponse, SimulateResponse};
use crate::feed::{FeedEvent, OutcomeStream};

/// HTTP client for the feed proxy's REST surface.
#[derive(Debug, Clone)]
pub struct FeedApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl FeedApiClient {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    /// `GET /status`. Any 2xx JSON body counts as healthy; anything else
    /// means the source is unavailable.
    pub async fn check_status(&self) -> Result<()> {
        let response = self
            .http
            .get(self.url("status"))
            .send()
            .await
            .map_err(|e| FeedError::SourceUnavailable(format!("status check failed: {e}")))?;

        if !response.status().is_success() {
            return Err(FeedError::SourceUnavailable(format!(
                "status check returned {}",
                response.status()
            ))
            .into());
        }

        // Body only needs to be decodable JSON
        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| FeedError::SourceUnavailable(format!("status body unreadable: {e}")))?;
        Ok(())
    }

    /// `GET /recent-outcomes`, newest first.
    ///
    /// Entries that fail to convert are logged and dropped individually; the
    /// rest of the batch is preserved.
    pub async fn recent_outcomes(&self) -> Result<Vec<Outcome>> {
        let response: RecentOutcomesResponse = self
            .http
            .get(self.url("recent-outcomes"))
            .send()
            .await
            .map_err(|e| FeedError::Transient(format!("fetch failed: {e}")))?
            .json()
            .await
            .map_err(|e| FeedError::Protocol(format!("undecodable batch: {e}")))?;

        if !response.success {
            let reason = response.error.unwrap_or_else(|| "unspecified".to_string());
            return Err(FeedError::Transient(format!("source reported failure: {reason}")).into());
        }

        let outcomes = response
            .data
            .into_iter()
            .filter_map(|dto| match Outcome::try_from(dto) {
                Ok(outcome) => Some(outcome),
                Err(e) => {
                    warn!(error = %e, "Dropping malformed batch entry");
                    None
                }
            })
            .collect();
        Ok(outcomes)
    }

    /// `POST /simulate-new-outcome`: manually inject one test event at the
    /// source. The returned outcome flows through the same dedup/notify path
    /// as real events.
    pub async fn simulate_new_outcome(&self) -> Result<Outcome> {
        let response: SimulateResponse = self
            .http
            .post(self.url("simulate-new-outcome"))
            .send()
            .await
            .map_err(|e| FeedError::Transient(format!("simulate failed: {e}")))?
            .json()
            .await
            .map_err(|e| FeedError::Protocol(format!("undecodable simulate response: {e}")))?;

        if !response.success {
            let reason = response.error.unwrap_or_else(|| "unspecified".to_string());
            return Err(FeedError::Transient(format!("simulate rejected: {reason}")).into());
        }

        let dto = response
            .data
            .ok_or_else(|| FeedError::Protocol("simulate response without data".to_string()))?;
        Ok(Outcome::try_from(dto)?)
    }
}

/// Periodic-fetch source over [`FeedApiClient`].
pub struct PollSource {
    client: FeedApiClient,
    interval: Duration,
    last_dispatched: Option<OutcomeId>,
    /// Initial batch replayed oldest-first so history ordering holds.
    backlog: VecDeque<Outcome>,
}

impl PollSource {
    #[must_use]
    pub fn new(client: FeedApiClient, interval: Duration) -> Self {
        Self {
            client,
            interval,
            last_dispatched: None,
            backlog: VecDeque::new(),
        }
    }
}

#[async_trait]
impl OutcomeStream for PollSource {
    async fn connect(&mut self) -> Result<()> {
        // The health check gates polling entirely
        self.client.check_status().await?;

        let initial = self.client.recent_outcomes().await?;
        info!(count = initial.len(), "Seeded initial outcome batch");

        if let Some(newest) = initial.first() {
            self.last_dispatched = Some(newest.id.clone());
        }
        self.backlog = initial.into_iter().rev().collect();
        Ok(())
    }

    async fn next_event(&mut self) -> Option<FeedEvent> {
        if let Some(outcome) = self.backlog.pop_front() {
            return Some(FeedEvent::Outcome(outcome));
        }

        loop {
            sleep(self.interval).await;

            match self.client.recent_outcomes().await {
                Ok(batch) => {
                    let Some(newest) = batch.into_iter().next() else {
                        debug!("Poll returned an empty batch");
                        continue;
                    };
                    // Same newest id as last time means no new round
                    if self.last_dispatched.as_ref() == Some(&newest.id) {
                        continue;
                    }
                    self.last_dispatched = Some(newest.id.clone());
                    return Some(FeedEvent::Outcome(newest));
                }
                Err(e) => {
                    // Transient by definition: the next tick retries
                    warn!(error = %e, "Poll fetch failed");
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "poll"
    }
}
