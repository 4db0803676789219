//! Configuration-driven priority scoring and badge classification.
//!
//! [`scoring`] holds the engine. [`ingest`] and [`report`] are thin CSV
//! adapters around it, and the remaining modules carry process concerns
//! shared by the command line and HTTP service.

pub mod error;
pub mod ingest;
pub mod report;
pub mod scoring;
pub mod settings;
pub mod telemetry;

pub use scoring::{
    ConfigError, Entity, FieldValue, RuleHit, ScoreResult, ScoringConfig, ScoringEngine,
};
