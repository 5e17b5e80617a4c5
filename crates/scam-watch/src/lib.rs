//! Crowdsourced business reporting with a composite scam score.
//!
//! Reports flow in through [`reports::ScamWatchService`], which persists them via injected
//! stores and keeps each business's cached score in step with [`scoring::ScamScoreCalculator`].

pub mod config;
pub mod error;
pub mod reports;
pub mod scoring;
pub mod telemetry;
