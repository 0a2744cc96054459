//! streakcast: pattern analysis over a round-based categorical outcome feed.
//!
//! The crate ingests round outcomes from a remote feed (push over WebSocket
//! or poll over HTTP), keeps a bounded rolling history, runs a bank of
//! pattern detectors over it, fuses their votes into one ranked prediction,
//! projects that prediction onto forward signal slots, and derives
//! human-facing alerts.
//!
//! [`Engine`] is the main entry point; everything underneath is usable on its
//! own (the detector bank and [`fusion::FusionEngine`] are pure functions
//! over outcome windows).

pub mod alert;
pub mod config;
pub mod detector;
pub mod domain;
pub mod engine;
pub mod error;
pub mod feed;
pub mod fusion;
pub mod signal;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;

pub use config::Config;
pub use engine::Engine;
pub use error::{Error, Result};
