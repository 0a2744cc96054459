//! A scripted [`OutcomeStream`] for driving the ingestor in tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{FeedError, Result};
use crate::feed::{FeedEvent, OutcomeStream};

/// Feed source that replays a scripted sequence of connect results and
/// events.
///
/// Connects succeed by default once the scripted results run out; call
/// [`failing_connects_when_exhausted`](Self::failing_connects_when_exhausted)
/// to fail instead. After the event script is exhausted the stream pends
/// forever, which keeps the ingest task parked between assertions.
pub struct ScriptedFeed {
    connect_results: VecDeque<Result<()>>,
    fail_when_exhausted: bool,
    events: VecDeque<FeedEvent>,
    connect_count: Arc<AtomicU32>,
}

impl ScriptedFeed {
    #[must_use]
    pub fn new() -> Self {
        Self {
            connect_results: VecDeque::new(),
            fail_when_exhausted: false,
            events: VecDeque::new(),
            connect_count: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Script the results of successive `connect` calls, consumed in order.
    #[must_use]
    pub fn with_connect_results(mut self, results: Vec<Result<()>>) -> Self {
        self.connect_results = results.into();
        self
    }

    /// Every connect fails.
    #[must_use]
    pub fn failing_connects(self) -> Self {
        self.failing_connects_when_exhausted()
    }

    /// Connects fail once the scripted results are used up.
    #[must_use]
    pub fn failing_connects_when_exhausted(mut self) -> Self {
        self.fail_when_exhausted = true;
        self
    }

    /// Script the events returned by successive `next_event` calls.
    #[must_use]
    pub fn with_events(mut self, events: Vec<FeedEvent>) -> Self {
        self.events = events.into();
        self
    }

    /// Shared counter of `connect` calls, for asserting reconnect behaviour.
    #[must_use]
    pub fn connect_count(&self) -> Arc<AtomicU32> {
        self.connect_count.clone()
    }
}

impl Default for ScriptedFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OutcomeStream for ScriptedFeed {
    async fn connect(&mut self) -> Result<()> {
        self.connect_count.fetch_add(1, Ordering::SeqCst);
        match self.connect_results.pop_front() {
            Some(result) => result,
            None if self.fail_when_exhausted => {
                Err(FeedError::SourceUnavailable("scripted connect failure".to_string()).into())
            }
            None => Ok(()),
        }
    }

    async fn next_event(&mut self) -> Option<FeedEvent> {
        match self.events.pop_front() {
            Some(event) => Some(event),
            // Park forever so the ingest task idles once the script ends
            None => std::future::pending().await,
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
