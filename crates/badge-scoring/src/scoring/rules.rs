use serde::{Deserialize, Serialize};

use super::config::{
    BinRule, BooleanRule, CategoricalRule, ConditionalPenaltyRule, Rule, RuleDef,
};
use super::entity::{Entity, FieldValue};

pub(crate) const MISSING_FIELD: &str = "missing field";

/// Outcome of one rule against one entity. Non-matching hits are recorded
/// with zero points so the breakdown always covers every configured rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleHit {
    pub rule_name: String,
    pub matched: bool,
    pub points: f64,
    pub reason: String,
}

impl RuleHit {
    fn matched(rule: &Rule, points: f64, reason: String) -> Self {
        Self {
            rule_name: rule.name.clone(),
            matched: true,
            points,
            reason,
        }
    }

    fn unmatched(rule: &Rule, reason: String) -> Self {
        Self {
            rule_name: rule.name.clone(),
            matched: false,
            points: 0.0,
            reason,
        }
    }

    pub(crate) fn type_mismatch(error: &TypeMismatch) -> Self {
        Self {
            rule_name: error.rule.clone(),
            matched: false,
            points: 0.0,
            reason: format!("type mismatch: expected {}, found {}", error.expected, error.found),
        }
    }
}

/// A field's runtime type disagrees with what the rule reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("rule '{rule}' expected {expected} in field '{field}' but found {found}")]
pub struct TypeMismatch {
    pub rule: String,
    pub field: String,
    pub expected: String,
    pub found: String,
}

impl TypeMismatch {
    fn new(rule: &Rule, expected: &str, found: &FieldValue) -> Self {
        Self {
            rule: rule.name.clone(),
            field: rule.field.clone(),
            expected: expected.to_string(),
            found: found.type_name().to_string(),
        }
    }
}

/// Dispatches to the evaluator for the rule's kind.
pub fn evaluate_rule(rule: &Rule, entity: &Entity) -> Result<RuleHit, TypeMismatch> {
    match &rule.def {
        RuleDef::Bin(def) => evaluate_bins(rule, def, entity),
        RuleDef::Boolean(def) => evaluate_flag(rule, def, entity),
        RuleDef::Categorical(def) => evaluate_membership(rule, def, entity),
        RuleDef::ConditionalPenalty(def) => evaluate_penalty(rule, def, entity),
    }
}

/// Awards the points of the first bin, in stored order, whose threshold the
/// value meets or exceeds.
pub fn evaluate_bins(rule: &Rule, def: &BinRule, entity: &Entity) -> Result<RuleHit, TypeMismatch> {
    let value = match entity.get(&rule.field) {
        None => return Ok(RuleHit::unmatched(rule, MISSING_FIELD.to_string())),
        Some(FieldValue::Number(value)) => *value,
        Some(other) => return Err(TypeMismatch::new(rule, "number", other)),
    };

    let hit = def
        .bins
        .iter()
        .find(|bin| value >= bin.threshold)
        .map(|bin| {
            RuleHit::matched(
                rule,
                bin.points,
                format!("{}={} meets threshold {}", rule.field, value, bin.threshold),
            )
        })
        .unwrap_or_else(|| {
            RuleHit::unmatched(
                rule,
                format!("{}={} meets no threshold", rule.field, value),
            )
        });

    Ok(hit)
}

pub fn evaluate_flag(
    rule: &Rule,
    def: &BooleanRule,
    entity: &Entity,
) -> Result<RuleHit, TypeMismatch> {
    match entity.get(&rule.field) {
        None => Ok(RuleHit::unmatched(rule, MISSING_FIELD.to_string())),
        Some(FieldValue::Boolean(true)) => Ok(RuleHit::matched(
            rule,
            def.points,
            format!("{} is true", rule.field),
        )),
        Some(FieldValue::Boolean(false)) => {
            Ok(RuleHit::unmatched(rule, format!("{} is false", rule.field)))
        }
        Some(other) => Err(TypeMismatch::new(rule, "boolean", other)),
    }
}

/// Case-sensitive exact membership test.
pub fn evaluate_membership(
    rule: &Rule,
    def: &CategoricalRule,
    entity: &Entity,
) -> Result<RuleHit, TypeMismatch> {
    match entity.get(&rule.field) {
        None => Ok(RuleHit::unmatched(rule, MISSING_FIELD.to_string())),
        Some(FieldValue::Text(value)) if def.values.contains(value) => Ok(RuleHit::matched(
            rule,
            def.points,
            format!("{}={} is listed", rule.field, value),
        )),
        Some(FieldValue::Text(value)) => Ok(RuleHit::unmatched(
            rule,
            format!("{}={} is not listed", rule.field, value),
        )),
        Some(other) => Err(TypeMismatch::new(rule, "text", other)),
    }
}

/// Penalizes unless the flag is explicitly true; absence counts as false.
pub fn evaluate_penalty(
    rule: &Rule,
    def: &ConditionalPenaltyRule,
    entity: &Entity,
) -> Result<RuleHit, TypeMismatch> {
    match entity.get(&rule.field) {
        None => Ok(RuleHit::matched(
            rule,
            def.points,
            format!("{} missing, treated as false", rule.field),
        )),
        Some(FieldValue::Boolean(false)) => Ok(RuleHit::matched(
            rule,
            def.points,
            format!("{} is false", rule.field),
        )),
        Some(FieldValue::Boolean(true)) => {
            Ok(RuleHit::unmatched(rule, format!("{} is true", rule.field)))
        }
        Some(other) => Err(TypeMismatch::new(rule, "boolean", other)),
    }
}
