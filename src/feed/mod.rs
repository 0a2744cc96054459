//! Feed acquisition: sources, wire messages, and the reconnecting ingestor.
//!
//! A source implements [`OutcomeStream`] and yields [`FeedEvent`]s; the
//! [`FeedIngestor`](ingestor::FeedIngestor) wraps any source with linear
//! reconnect backoff, degraded-mode fallback, deduplicated history writes,
//! and isolated subscriber fan-out.

pub mod ingestor;
pub mod messages;
pub mod poll;
pub mod push;
pub mod synthetic;

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::Outcome;
use crate::error::Result;

pub use ingestor::{FeedIngestor, OutcomeCallback};
pub use poll::{FeedApiClient, PollSource};
pub use push::PushSource;
pub use synthetic::SyntheticGenerator;

/// Connection lifecycle of the ingestor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    /// Reconnect attempts are exhausted; outcomes are synthetic. Never
    /// reported as a live connection.
    Degraded,
}

impl ConnectionState {
    /// Whether the source is live (not simulated, not offline).
    #[must_use]
    pub const fn is_live(self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Whether the source should be treated as offline for alerting.
    #[must_use]
    pub const fn is_offline(self) -> bool {
        matches!(self, Self::Disconnected | Self::Degraded)
    }
}

/// Snapshot of the ingestor's connection state and attempt count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeedStatus {
    pub state: ConnectionState,
    pub reconnect_attempts: u32,
}

impl FeedStatus {
    #[must_use]
    pub const fn disconnected() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            reconnect_attempts: 0,
        }
    }
}

/// An event produced by a feed source.
#[derive(Debug, Clone)]
pub enum FeedEvent {
    /// A new round outcome arrived.
    Outcome(Outcome),
    /// The connection was lost; the ingestor decides whether to reconnect.
    Disconnected { reason: String },
}

/// A source of round outcomes.
///
/// Implementations handle their own transport (WebSocket push, HTTP poll) and
/// protocol parsing. Malformed payloads are logged and dropped inside the
/// source without surfacing an event; transport loss surfaces as
/// [`FeedEvent::Disconnected`].
#[async_trait]
pub trait OutcomeStream: Send {
    /// Establish the connection (and, for poll sources, pass the health
    /// check and seed the initial batch).
    ///
    /// # Errors
    ///
    /// Returns an error when the source is unreachable; at start time the
    /// ingestor surfaces this to the caller instead of silently degrading.
    async fn connect(&mut self) -> Result<()>;

    /// Wait for the next feed event. Returns `None` when the stream is
    /// permanently closed.
    async fn next_event(&mut self) -> Option<FeedEvent>;

    /// Source name for logging.
    fn name(&self) -> &'static str;
}

/// Forward the trait through boxed trait objects so the ingestor can hold
/// `Box<dyn OutcomeStream>`.
#[async_trait]
impl OutcomeStream for Box<dyn OutcomeStream> {
    async fn connect(&mut self) -> Result<()> {
        (**self).connect().await
    }

    async fn next_event(&mut self) -> Option<FeedEvent> {
        (**self).next_event().await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
