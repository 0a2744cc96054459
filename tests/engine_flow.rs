//! End-to-end engine scenarios over a scripted feed source.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use streakcast::alert::AlertKind;
use streakcast::config::{Config, ReconnectConfig};
use streakcast::domain::Category;
use streakcast::feed::{ConnectionState, FeedEvent};
use streakcast::testkit::{outcome_at, outcomes_from_rolls, ScriptedFeed};
use streakcast::Engine;
use tokio_test::assert_ok;

fn events_from_rolls(rolls: &[u8]) -> Vec<FeedEvent> {
    outcomes_from_rolls(rolls)
        .into_iter()
        .map(FeedEvent::Outcome)
        .collect()
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(100)).await;
}

#[tokio::test]
async fn ingests_analyzes_and_projects() {
    let mut engine = Engine::new(Config::default());

    // Chronological: S S P P P P, a trailing run of four primaries
    let feed = ScriptedFeed::new().with_events(events_from_rolls(&[2, 4, 1, 3, 5, 7]));
    tokio_test::assert_ok!(engine.start_with_source(Box::new(feed)).await);
    settle().await;

    assert_eq!(engine.history().len(), 6);
    assert_eq!(engine.status().state, ConnectionState::Connected);

    let fusion = engine.analyze();
    assert_eq!(fusion.predicted, Some(Category::Secondary));
    assert!(fusion.confidence > 0);

    let signals = engine.generate_signals(5);
    assert_eq!(signals.len(), 5);
    assert!(signals
        .windows(2)
        .all(|pair| pair[0].scheduled_at < pair[1].scheduled_at));

    let alerts = engine.alerts();
    assert!(alerts.iter().any(|a| a.kind == AlertKind::LongStreak));
    assert!(alerts.iter().all(|a| a.kind != AlertKind::SourceOffline));

    // The high-confidence alert carries the same prediction the analysis
    // over this window produces
    let high = alerts
        .iter()
        .find(|a| a.kind == AlertKind::HighConfidence)
        .unwrap();
    assert_eq!(high.related_category, fusion.predicted);
    assert_eq!(high.related_confidence, Some(fusion.confidence));

    let stats = engine.statistics();
    assert_eq!(stats.total, 6);
    assert_eq!(stats.primary.count, 4);
    assert_eq!(stats.secondary.count, 2);
}

#[tokio::test]
async fn duplicate_feed_events_are_ingested_once() {
    let mut engine = Engine::new(Config::default());
    let notified = Arc::new(AtomicU32::new(0));
    let notified_clone = notified.clone();
    engine.on_outcome(move |_| {
        notified_clone.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    let repeated = outcome_at("round-1", 7, 0);
    let feed = ScriptedFeed::new().with_events(vec![
        FeedEvent::Outcome(repeated.clone()),
        FeedEvent::Outcome(repeated),
        FeedEvent::Outcome(outcome_at("round-2", 2, 1)),
    ]);
    engine.start_with_source(Box::new(feed)).await.unwrap();
    settle().await;

    assert_eq!(engine.history().len(), 2);
    assert_eq!(notified.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn exhausted_reconnects_degrade_and_alert() {
    let mut config = Config::default();
    config.reconnect = ReconnectConfig {
        base_delay_ms: 1,
        max_attempts: 2,
        synthetic_period_secs: 1,
    };
    let mut engine = Engine::new(config);

    let feed = ScriptedFeed::new()
        .with_connect_results(vec![Ok(())])
        .failing_connects_when_exhausted()
        .with_events(vec![FeedEvent::Disconnected {
            reason: "upstream gone".to_string(),
        }]);
    engine.start_with_source(Box::new(feed)).await.unwrap();
    settle().await;

    let status = engine.status();
    assert_eq!(status.state, ConnectionState::Degraded);
    assert!(!status.state.is_live());

    // Offline supersedes everything else
    let alerts = engine.alerts();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].kind, AlertKind::SourceOffline);

    // The synthetic generator keeps outcomes flowing on its period
    tokio::time::sleep(Duration::from_millis(1300)).await;
    assert!(!engine.history().is_empty());
    assert_eq!(engine.status().state, ConnectionState::Degraded);
}

#[tokio::test]
async fn unreachable_source_fails_start() {
    let mut engine = Engine::new(Config::default());

    let feed = ScriptedFeed::new().failing_connects();
    let result = engine.start_with_source(Box::new(feed)).await;

    assert!(result.is_err());
    assert_eq!(engine.status().state, ConnectionState::Disconnected);
}

#[tokio::test]
async fn stop_resets_to_disconnected() {
    let mut engine = Engine::new(Config::default());

    let feed = ScriptedFeed::new().with_events(events_from_rolls(&[1, 2, 1]));
    engine.start_with_source(Box::new(feed)).await.unwrap();
    settle().await;
    engine.stop();

    assert_eq!(engine.status().state, ConnectionState::Disconnected);
    // History survives a stop; only acquisition halts
    assert_eq!(engine.history().len(), 3);
}
