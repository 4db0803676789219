//! Rule evaluation and badge classification.
//!
//! A [`ScoringConfig`] is loaded and validated once, then shared read-only by
//! every evaluation. Each entity produces exactly one [`RuleHit`] per
//! configured rule, a total equal to the sum of those hits, and a badge.

mod aggregate;
mod badge;
mod config;
mod engine;
mod entity;
mod loader;
mod rules;

#[cfg(test)]
mod tests;

pub use aggregate::aggregate;
pub use badge::{classify, UnclassifiedScoreError};
pub use config::{
    BadgeRange, Bin, BinRule, BooleanRule, CategoricalRule, ConditionalPenaltyRule, ConfigError,
    Rule, RuleDef, RuleKind, ScoringConfig,
};
pub use engine::{evaluate, evaluate_entity, EvaluationIssue, ScoreResult, UNCLASSIFIED};
pub use entity::{Entity, FieldValue};
pub use loader::DocumentFormat;
pub use rules::{
    evaluate_bins, evaluate_flag, evaluate_membership, evaluate_penalty, evaluate_rule, RuleHit,
    TypeMismatch,
};

use std::sync::Arc;

/// Stateless evaluator bound to one validated configuration.
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    config: Arc<ScoringConfig>,
}

impl ScoringEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self::from_shared(Arc::new(config))
    }

    pub fn from_shared(config: Arc<ScoringConfig>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn score(&self, entity: &Entity) -> ScoreResult {
        evaluate_entity(&self.config, entity)
    }

    /// Scores a batch; with the `parallel` feature the work is spread across
    /// the rayon pool while keeping input order.
    pub fn score_all(&self, entities: &[Entity]) -> Vec<ScoreResult> {
        #[cfg(feature = "parallel")]
        {
            engine::evaluate_parallel(&self.config, entities)
        }
        #[cfg(not(feature = "parallel"))]
        {
            evaluate(&self.config, entities)
        }
    }

    /// Fields the rules read that are absent from a dataset's column list.
    pub fn missing_columns<'a, S>(&'a self, columns: &[S]) -> Vec<&'a str>
    where
        S: AsRef<str>,
    {
        self.config
            .referenced_fields()
            .into_iter()
            .filter(|field| !columns.iter().any(|column| column.as_ref() == *field))
            .collect()
    }
}
