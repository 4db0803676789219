use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::aggregate::aggregate;
use super::badge::{classify, UnclassifiedScoreError};
use super::config::ScoringConfig;
use super::entity::Entity;
use super::rules::{evaluate_rule, RuleHit, TypeMismatch};

pub const UNCLASSIFIED: &str = "Unclassified";

/// Per-entity error isolated during evaluation; the batch carries on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EvaluationIssue {
    #[error(transparent)]
    TypeMismatch(TypeMismatch),
    #[error(transparent)]
    UnclassifiedScore(UnclassifiedScoreError),
}

/// Scored entity with its full audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub entity_id: String,
    pub total_score: f64,
    pub hits: Vec<RuleHit>,
    /// `None` when the score falls in no configured range.
    pub badge: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<EvaluationIssue>,
}

impl ScoreResult {
    pub fn badge_label(&self) -> &str {
        self.badge.as_deref().unwrap_or(UNCLASSIFIED)
    }

    pub fn is_degraded(&self) -> bool {
        !self.issues.is_empty()
    }

    pub fn hit(&self, rule_name: &str) -> Option<&RuleHit> {
        self.hits.iter().find(|hit| hit.rule_name == rule_name)
    }
}

/// Runs every configured rule against `entity`, in configuration order.
pub fn evaluate_entity(config: &ScoringConfig, entity: &Entity) -> ScoreResult {
    let mut issues = Vec::new();
    let hits: Vec<RuleHit> = config
        .rules()
        .iter()
        .map(|rule| match evaluate_rule(rule, entity) {
            Ok(hit) => hit,
            Err(mismatch) => {
                warn!(entity = %entity.id, error = %mismatch, "rule skipped for entity");
                let hit = RuleHit::type_mismatch(&mismatch);
                issues.push(EvaluationIssue::TypeMismatch(mismatch));
                hit
            }
        })
        .collect();

    let total_score = aggregate(&hits);
    let badge = match classify(total_score, config.badges()) {
        Ok(name) => Some(name.to_string()),
        Err(error) => {
            warn!(entity = %entity.id, score = total_score, "score matches no badge range");
            issues.push(EvaluationIssue::UnclassifiedScore(error));
            None
        }
    };

    debug!(
        entity = %entity.id,
        score = total_score,
        badge = badge.as_deref().unwrap_or(UNCLASSIFIED),
        "entity scored"
    );

    ScoreResult {
        entity_id: entity.id.clone(),
        total_score,
        hits,
        badge,
        issues,
    }
}

/// One result per entity, in input order.
pub fn evaluate(config: &ScoringConfig, entities: &[Entity]) -> Vec<ScoreResult> {
    entities
        .iter()
        .map(|entity| evaluate_entity(config, entity))
        .collect()
}

#[cfg(feature = "parallel")]
pub fn evaluate_parallel(config: &ScoringConfig, entities: &[Entity]) -> Vec<ScoreResult> {
    use rayon::prelude::*;

    entities
        .par_iter()
        .map(|entity| evaluate_entity(config, entity))
        .collect()
}
