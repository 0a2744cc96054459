//! The feed ingestor.
//!
//! Wraps any [`OutcomeStream`] with the full acquisition lifecycle:
//! `Disconnected -> Connecting -> Connected -> Reconnecting -> Connected |
//! Degraded`. Reconnect delays grow linearly (`base_delay × attempt`) up to a
//! bounded attempt count; past the cap the ingestor switches to the synthetic
//! generator and reports itself as degraded, never as live. Arriving outcomes
//! are deduplicated through the history buffer and fanned out to subscribers
//! in registration order, with per-subscriber failures isolated.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::config::ReconnectConfig;
use crate::domain::{HistoryBuffer, Outcome};
use crate::error::Result;
use crate::feed::synthetic::SyntheticGenerator;
use crate::feed::{ConnectionState, FeedEvent, FeedStatus, OutcomeStream};

/// A registered subscriber. Errors are logged per-callback and never block
/// fan-out to later subscribers.
pub type OutcomeCallback = Box<dyn Fn(&Outcome) -> anyhow::Result<()> + Send + Sync>;

/// State shared between the ingestor handle and its background task.
struct Shared {
    history: Arc<RwLock<HistoryBuffer>>,
    subscribers: Mutex<Vec<OutcomeCallback>>,
    status: Mutex<FeedStatus>,
}

impl Shared {
    fn set_state(&self, state: ConnectionState, attempts: u32) {
        *self.status.lock() = FeedStatus {
            state,
            reconnect_attempts: attempts,
        };
    }

    /// Push an outcome through dedup, history, and subscriber fan-out.
    fn dispatch(&self, outcome: Outcome) {
        let inserted = self.history.write().push(outcome.clone());
        if !inserted {
            debug!(id = %outcome.id, "Duplicate outcome ignored");
            return;
        }

        info!(
            id = %outcome.id,
            roll = outcome.roll,
            category = %outcome.category(),
            "New outcome"
        );

        let subscribers = self.subscribers.lock();
        for (index, callback) in subscribers.iter().enumerate() {
            // One failing subscriber must never starve the rest
            match panic::catch_unwind(AssertUnwindSafe(|| callback(&outcome))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!(subscriber = index, error = %e, "Subscriber returned an error");
                }
                Err(_) => {
                    warn!(subscriber = index, "Subscriber panicked");
                }
            }
        }
    }
}

/// Acquires outcomes from a feed source and owns the connection lifecycle.
pub struct FeedIngestor {
    shared: Arc<Shared>,
    config: ReconnectConfig,
    task: Option<JoinHandle<()>>,
}

impl FeedIngestor {
    #[must_use]
    pub fn new(history: Arc<RwLock<HistoryBuffer>>, config: ReconnectConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                history,
                subscribers: Mutex::new(Vec::new()),
                status: Mutex::new(FeedStatus::disconnected()),
            }),
            config,
            task: None,
        }
    }

    /// Begin acquisition from the given source. Idempotent while running.
    ///
    /// # Errors
    ///
    /// Surfaces the source's connect error when it is unreachable at start
    /// time; the ingestor does not silently enter degraded mode on a failed
    /// start.
    pub async fn start(&mut self, mut stream: Box<dyn OutcomeStream>) -> Result<()> {
        if self.task.is_some() {
            debug!("Ingestor already started");
            return Ok(());
        }

        self.shared.set_state(ConnectionState::Connecting, 0);
        if let Err(e) = stream.connect().await {
            self.shared.set_state(ConnectionState::Disconnected, 0);
            return Err(e);
        }
        self.shared.set_state(ConnectionState::Connected, 0);
        info!(source = stream.name(), "Feed connected");

        let shared = self.shared.clone();
        let config = self.config.clone();
        self.task = Some(tokio::spawn(run_loop(stream, shared, config)));
        Ok(())
    }

    /// Stop acquisition: abort the ingest task (cancelling any pending poll
    /// or backoff timers), clear the subscriber list, and reset to
    /// disconnected.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.shared.subscribers.lock().clear();
        self.shared.set_state(ConnectionState::Disconnected, 0);
        info!("Feed ingestor stopped");
    }

    /// Register a subscriber for new outcomes. Fan-out is synchronous and
    /// ordered by registration.
    pub fn on_outcome<F>(&self, callback: F)
    where
        F: Fn(&Outcome) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.shared.subscribers.lock().push(Box::new(callback));
    }

    /// Inject a single outcome through the same dedup/notify path as feed
    /// events (used for manually simulated rounds).
    pub fn inject(&self, outcome: Outcome) {
        self.shared.dispatch(outcome);
    }

    /// Current connection state and reconnect attempt count.
    #[must_use]
    pub fn status(&self) -> FeedStatus {
        *self.shared.status.lock()
    }
}

impl Drop for FeedIngestor {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// The background acquisition loop.
async fn run_loop(mut stream: Box<dyn OutcomeStream>, shared: Arc<Shared>, config: ReconnectConfig) {
    let mut attempts: u32 = 0;

    loop {
        let disconnect_reason = match stream.next_event().await {
            Some(FeedEvent::Outcome(outcome)) => {
                shared.dispatch(outcome);
                continue;
            }
            Some(FeedEvent::Disconnected { reason }) => reason,
            None => "stream ended".to_string(),
        };

        warn!(reason = %disconnect_reason, "Feed connection lost");

        // Reconnect with linearly growing delay until the attempt cap
        loop {
            attempts += 1;
            if attempts > config.max_attempts {
                run_degraded(&shared, &config, attempts - 1).await;
                return;
            }

            shared.set_state(ConnectionState::Reconnecting, attempts);
            let delay = config.base_delay() * attempts;
            info!(
                attempt = attempts,
                max_attempts = config.max_attempts,
                delay_ms = delay.as_millis(),
                "Reconnecting after delay"
            );
            sleep(delay).await;

            match stream.connect().await {
                Ok(()) => {
                    info!("Reconnected to feed");
                    attempts = 0;
                    shared.set_state(ConnectionState::Connected, 0);
                    break;
                }
                Err(e) => {
                    warn!(error = %e, attempt = attempts, "Reconnect attempt failed");
                }
            }
        }
    }
}

/// Synthetic fallback after reconnect attempts are exhausted. Emits weighted
/// random outcomes on a fixed period until the ingestor is stopped. The
/// status stays degraded for the whole time; this is never reported as a
/// live connection.
async fn run_degraded(shared: &Arc<Shared>, config: &ReconnectConfig, attempts: u32) {
    error!(
        attempts,
        "Reconnect attempts exhausted, switching to synthetic outcomes"
    );
    shared.set_state(ConnectionState::Degraded, attempts);

    let mut generator = SyntheticGenerator::new(StdRng::from_entropy());
    let mut ticker = tokio::time::interval(config.synthetic_period());
    // First tick fires immediately; skip it so emission matches the period
    ticker.tick().await;

    loop {
        ticker.tick().await;
        shared.dispatch(generator.next_outcome());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::ConnectionState;
    use crate::testkit::feed::ScriptedFeed;
    use chrono::Utc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn fast_config() -> ReconnectConfig {
        ReconnectConfig {
            base_delay_ms: 1,
            max_attempts: 3,
            synthetic_period_secs: 1,
        }
    }

    fn outcome(id: &str, roll: u8) -> Outcome {
        Outcome::new(id, Utc::now(), roll)
    }

    fn new_ingestor() -> (FeedIngestor, Arc<RwLock<HistoryBuffer>>) {
        let history = Arc::new(RwLock::new(HistoryBuffer::new()));
        let ingestor = FeedIngestor::new(history.clone(), fast_config());
        (ingestor, history)
    }

    #[tokio::test]
    async fn outcomes_flow_into_history_and_subscribers() {
        let (mut ingestor, history) = new_ingestor();
        let seen = Arc::new(AtomicU32::new(0));
        let seen_clone = seen.clone();
        ingestor.on_outcome(move |_| {
            seen_clone.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let feed = ScriptedFeed::new().with_events(vec![
            FeedEvent::Outcome(outcome("a", 1)),
            FeedEvent::Outcome(outcome("b", 2)),
        ]);
        ingestor.start(Box::new(feed)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(history.read().len(), 2);
        assert_eq!(seen.load(Ordering::SeqCst), 2);
        assert_eq!(ingestor.status().state, ConnectionState::Connected);
    }

    #[tokio::test]
    async fn duplicate_outcomes_notify_once() {
        let (mut ingestor, history) = new_ingestor();
        let seen = Arc::new(AtomicU32::new(0));
        let seen_clone = seen.clone();
        ingestor.on_outcome(move |_| {
            seen_clone.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let feed = ScriptedFeed::new().with_events(vec![
            FeedEvent::Outcome(outcome("same", 1)),
            FeedEvent::Outcome(outcome("same", 1)),
        ]);
        ingestor.start(Box::new(feed)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(history.read().len(), 1);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failing_subscriber_does_not_block_later_ones() {
        let (mut ingestor, _history) = new_ingestor();
        let seen = Arc::new(AtomicU32::new(0));

        ingestor.on_outcome(|_| anyhow::bail!("subscriber is broken"));
        ingestor.on_outcome(|_| panic!("subscriber panics"));
        let seen_clone = seen.clone();
        ingestor.on_outcome(move |_| {
            seen_clone.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let feed =
            ScriptedFeed::new().with_events(vec![FeedEvent::Outcome(outcome("a", 1))]);
        ingestor.start(Box::new(feed)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unreachable_source_fails_start_explicitly() {
        let (mut ingestor, _history) = new_ingestor();

        let feed = ScriptedFeed::new().failing_connects();
        let result = ingestor.start(Box::new(feed)).await;

        assert!(result.is_err());
        assert_eq!(ingestor.status().state, ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn reconnects_after_disconnect() {
        let (mut ingestor, history) = new_ingestor();

        let feed = ScriptedFeed::new().with_events(vec![
            FeedEvent::Disconnected {
                reason: "server closed".to_string(),
            },
            FeedEvent::Outcome(outcome("after-reconnect", 5)),
        ]);
        let connects = feed.connect_count();
        ingestor.start(Box::new(feed)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(connects.load(Ordering::SeqCst) >= 2);
        assert_eq!(history.read().len(), 1);
        let status = ingestor.status();
        assert_eq!(status.state, ConnectionState::Connected);
        // A successful reconnect resets the attempt count immediately
        assert_eq!(status.reconnect_attempts, 0);
    }

    #[tokio::test]
    async fn exhausted_reconnects_enter_degraded_mode() {
        let history = Arc::new(RwLock::new(HistoryBuffer::new()));
        let config = ReconnectConfig {
            base_delay_ms: 1,
            max_attempts: 2,
            synthetic_period_secs: 1,
        };
        let mut ingestor = FeedIngestor::new(history.clone(), config);

        // First connect succeeds, every reconnect fails
        let feed = ScriptedFeed::new()
            .with_connect_results(vec![Ok(())])
            .failing_connects_when_exhausted()
            .with_events(vec![FeedEvent::Disconnected {
                reason: "gone".to_string(),
            }]);
        ingestor.start(Box::new(feed)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;

        let status = ingestor.status();
        assert_eq!(status.state, ConnectionState::Degraded);
        assert!(!status.state.is_live());
        assert_eq!(status.reconnect_attempts, 2);
    }

    #[tokio::test]
    async fn stop_clears_subscribers_and_state() {
        let (mut ingestor, _history) = new_ingestor();
        ingestor.on_outcome(|_| Ok(()));

        let feed = ScriptedFeed::new();
        ingestor.start(Box::new(feed)).await.unwrap();
        ingestor.stop();

        assert_eq!(ingestor.status().state, ConnectionState::Disconnected);
        assert!(ingestor.shared.subscribers.lock().is_empty());
    }

    #[tokio::test]
    async fn start_is_idempotent() {
        let (mut ingestor, _history) = new_ingestor();

        ingestor.start(Box::new(ScriptedFeed::new())).await.unwrap();
        // Second start is a no-op, not an error
        ingestor.start(Box::new(ScriptedFeed::new())).await.unwrap();
    }

    #[tokio::test]
    async fn injected_outcomes_use_the_same_path() {
        let (ingestor, history) = new_ingestor();
        let seen = Arc::new(AtomicU32::new(0));
        let seen_clone = seen.clone();
        ingestor.on_outcome(move |_| {
            seen_clone.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        ingestor.inject(outcome("manual", 3));
        ingestor.inject(outcome("manual", 3));

        assert_eq!(history.read().len(), 1);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }
}
