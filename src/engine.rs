//! The top-level engine facade.
//!
//! Owns the history buffer, the feed ingestor, and the analysis pipeline, and
//! exposes the operations consumers call: analyze the current window, project
//! forward signals, derive alerts, and read descriptive statistics. All reads
//! are pure derivations over the shared history; only the ingestor writes.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use crate::alert::{self, Alert};
use crate::config::{Config, FeedMode};
use crate::domain::{Category, HistoryBuffer, Outcome};
use crate::error::Result;
use crate::feed::{
    FeedApiClient, FeedIngestor, FeedStatus, OutcomeStream, PollSource, PushSource,
};
use crate::fusion::{Fusion, FusionEngine};
use crate::signal::{Signal, SignalScheduler};

/// How many recent outcomes the run scan inspects.
const RUN_SCAN_WINDOW: usize = 15;

/// Minimum length for a run to be reported.
const MIN_RUN_LENGTH: usize = 2;

/// Maximum number of runs reported.
const MAX_RUNS: usize = 5;

/// Per-category share of the retained history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CategoryShare {
    pub count: usize,
    /// Share of the total in percent; `0.0` when the history is empty.
    pub percentage: f64,
}

/// Descriptive statistics over the retained history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Statistics {
    pub total: usize,
    pub primary: CategoryShare,
    pub secondary: CategoryShare,
    pub neutral: CategoryShare,
}

/// A completed run of same-category outcomes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Run {
    pub category: Category,
    pub length: usize,
    /// Timestamp of the run's most recent outcome. The upstream scan
    /// reported the oldest boundary element under this name; here the field
    /// carries the time the run actually ended.
    pub ended_at: DateTime<Utc>,
}

/// Engine over one configured feed.
pub struct Engine {
    config: Config,
    history: Arc<RwLock<HistoryBuffer>>,
    ingestor: FeedIngestor,
    fusion: FusionEngine,
    scheduler: SignalScheduler,
    rng: Mutex<StdRng>,
    api: FeedApiClient,
}

impl Engine {
    #[must_use]
    pub fn new(config: Config) -> Self {
        let history = Arc::new(RwLock::new(HistoryBuffer::new()));
        let ingestor = FeedIngestor::new(history.clone(), config.reconnect.clone());
        let fusion = FusionEngine::new(config.fusion.strategy);
        let scheduler = SignalScheduler::new(
            config.signals.interval(),
            config.signals.override_probability,
        );
        let api = FeedApiClient::new(config.feed.api_url.clone());

        Self {
            config,
            history,
            ingestor,
            fusion,
            scheduler,
            rng: Mutex::new(StdRng::from_entropy()),
            api,
        }
    }

    /// Start acquisition using the source selected by the feed mode.
    ///
    /// # Errors
    ///
    /// Fails when the source is unreachable at start time.
    pub async fn start(&mut self) -> Result<()> {
        let source: Box<dyn OutcomeStream> = match self.config.feed.mode {
            FeedMode::Push => Box::new(PushSource::new(self.config.feed.ws_url.clone())),
            FeedMode::Poll => Box::new(PollSource::new(
                self.api.clone(),
                self.config.feed.poll_interval(),
            )),
        };
        self.start_with_source(source).await
    }

    /// Start acquisition from an explicit source, bypassing mode selection.
    pub async fn start_with_source(&mut self, source: Box<dyn OutcomeStream>) -> Result<()> {
        self.ingestor.start(source).await
    }

    /// Stop acquisition and drop all registered subscribers.
    pub fn stop(&mut self) {
        self.ingestor.stop();
    }

    /// Register a subscriber for newly ingested outcomes.
    pub fn on_outcome<F>(&self, callback: F)
    where
        F: Fn(&Outcome) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.ingestor.on_outcome(callback);
    }

    /// Current connection state and reconnect attempt count.
    #[must_use]
    pub fn status(&self) -> FeedStatus {
        self.ingestor.status()
    }

    /// Snapshot of the retained history, most-recent-first.
    #[must_use]
    pub fn history(&self) -> Vec<Outcome> {
        self.history.read().all()
    }

    /// Run the detector bank over the current window and fuse the votes.
    #[must_use]
    pub fn analyze(&self) -> Fusion {
        let history = self.history.read();
        self.fusion.analyze(&history)
    }

    /// Project `n` forward signals from the current analysis.
    #[must_use]
    pub fn generate_signals(&self, n: usize) -> Vec<Signal> {
        let fusion = self.analyze();
        let mut rng = self.rng.lock();
        self.scheduler.generate(&mut *rng, &fusion, n, Utc::now())
    }

    /// Derive the current alert list from history, feed state, and analysis.
    ///
    /// Fusion and the streak/gale scans read the same history snapshot under
    /// one guard, so an ingest write cannot land between them.
    #[must_use]
    pub fn alerts(&self) -> Vec<Alert> {
        let history = self.history.read();
        let fusion = self.fusion.analyze(&history);
        alert::evaluate(&history, self.status().state, &fusion)
    }

    /// Per-category counts and percentages over the retained history.
    #[must_use]
    pub fn statistics(&self) -> Statistics {
        let all = self.history.read().all();
        let total = all.len();

        let count_of = |category: Category| {
            let count = all
                .iter()
                .filter(|outcome| outcome.category() == category)
                .count();
            let percentage = if total == 0 {
                0.0
            } else {
                count as f64 / total as f64 * 100.0
            };
            CategoryShare { count, percentage }
        };

        Statistics {
            total,
            primary: count_of(Category::Primary),
            secondary: count_of(Category::Secondary),
            neutral: count_of(Category::Neutral),
        }
    }

    /// Completed same-category runs of length two or more among the most
    /// recent outcomes, newest run first. The run containing the newest
    /// outcome is reported only once an older entry bounds it; the oldest
    /// group in the window is always left open.
    #[must_use]
    pub fn recent_runs(&self) -> Vec<Run> {
        let recent = self.history.read().window(RUN_SCAN_WINDOW);

        let mut runs = Vec::new();
        let mut start = 0;
        for i in 1..recent.len() {
            if recent[i].category() == recent[start].category() {
                continue;
            }
            let length = i - start;
            if length >= MIN_RUN_LENGTH {
                runs.push(Run {
                    category: recent[start].category(),
                    length,
                    ended_at: recent[start].occurred_at,
                });
                if runs.len() == MAX_RUNS {
                    break;
                }
            }
            start = i;
        }
        runs
    }

    /// Ask the source to fabricate one new round, then route the returned
    /// outcome through the same dedup and notification path as live events.
    ///
    /// # Errors
    ///
    /// Surfaces transport failures and rejections from the source.
    pub async fn simulate_new_outcome(&self) -> Result<Outcome> {
        let outcome = self.api.simulate_new_outcome().await?;
        self.ingestor.inject(outcome.clone());
        Ok(outcome)
    }

    /// Reseed the signal RNG for reproducible projections in tests.
    #[cfg(any(test, feature = "testkit"))]
    pub fn seed_rng(&mut self, seed: u64) {
        *self.rng.lock() = StdRng::seed_from_u64(seed);
    }

    /// Inject one outcome directly, bypassing the feed source.
    #[cfg(any(test, feature = "testkit"))]
    pub fn inject(&self, outcome: Outcome) {
        self.ingestor.inject(outcome);
    }
}
