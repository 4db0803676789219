use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Validated, read-only rule set shared by every evaluation.
///
/// Rules and badges keep their declaration order: rules drive the breakdown
/// order of each result, badges drive first-match classification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoringConfig {
    rules: Vec<Rule>,
    badges: Vec<BadgeRange>,
}

impl ScoringConfig {
    pub fn new(rules: Vec<Rule>, badges: Vec<BadgeRange>) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        for rule in &rules {
            if !seen.insert(rule.name.as_str()) {
                return Err(ConfigError::DuplicateRule(rule.name.clone()));
            }
            rule.validate()?;
        }

        let mut seen = HashSet::new();
        for badge in &badges {
            if !seen.insert(badge.name.as_str()) {
                return Err(ConfigError::DuplicateBadge(badge.name.clone()));
            }
            badge.validate()?;
        }

        Ok(Self { rules, badges })
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.name == name)
    }

    pub fn badges(&self) -> &[BadgeRange] {
        &self.badges
    }

    /// Entity fields read by at least one rule, in rule order and without repeats.
    pub fn referenced_fields(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.rules
            .iter()
            .map(|rule| rule.field.as_str())
            .filter(|field| seen.insert(*field))
            .collect()
    }
}

/// A configured rule bound to the entity field it reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub def: RuleDef,
}

impl Rule {
    pub fn new(name: impl Into<String>, field: impl Into<String>, def: RuleDef) -> Self {
        Self {
            name: name.into(),
            field: field.into(),
            description: None,
            def,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let non_finite = |what: String| ConfigError::NonFinite {
            location: format!("rule '{}' {what}", self.name),
        };

        match &self.def {
            RuleDef::Bin(rule) => {
                if rule.bins.is_empty() {
                    return Err(ConfigError::EmptyBins {
                        rule: self.name.clone(),
                    });
                }
                for (index, bin) in rule.bins.iter().enumerate() {
                    if !bin.threshold.is_finite() {
                        return Err(non_finite(format!("bin {index} threshold")));
                    }
                    if !bin.points.is_finite() {
                        return Err(non_finite(format!("bin {index} points")));
                    }
                }
            }
            RuleDef::Boolean(BooleanRule { points })
            | RuleDef::Categorical(CategoricalRule { points, .. })
            | RuleDef::ConditionalPenalty(ConditionalPenaltyRule { points }) => {
                if !points.is_finite() {
                    return Err(non_finite("points".to_string()));
                }
            }
        }

        Ok(())
    }
}

/// Closed set of rule shapes understood by the evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleDef {
    Bin(BinRule),
    Boolean(BooleanRule),
    Categorical(CategoricalRule),
    ConditionalPenalty(ConditionalPenaltyRule),
}

impl RuleDef {
    pub fn kind(&self) -> RuleKind {
        match self {
            RuleDef::Bin(_) => RuleKind::Bin,
            RuleDef::Boolean(_) => RuleKind::Boolean,
            RuleDef::Categorical(_) => RuleKind::Categorical,
            RuleDef::ConditionalPenalty(_) => RuleKind::ConditionalPenalty,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Bin,
    Boolean,
    Categorical,
    ConditionalPenalty,
}

impl RuleKind {
    pub fn label(self) -> &'static str {
        match self {
            RuleKind::Bin => "bin",
            RuleKind::Boolean => "boolean",
            RuleKind::Categorical => "categorical",
            RuleKind::ConditionalPenalty => "conditional_penalty",
        }
    }
}

/// Threshold ladder, checked in stored order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinRule {
    pub bins: Vec<Bin>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bin {
    pub threshold: f64,
    pub points: f64,
}

impl Bin {
    pub fn new(threshold: f64, points: f64) -> Self {
        Self { threshold, points }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BooleanRule {
    pub points: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalRule {
    pub values: BTreeSet<String>,
    pub points: f64,
}

/// Applies `points` when the bound flag is false or absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalPenaltyRule {
    pub points: f64,
}

/// Named inclusive score range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BadgeRange {
    pub name: String,
    pub min: f64,
    pub max: f64,
}

impl BadgeRange {
    pub fn new(name: impl Into<String>, min: f64, max: f64) -> Self {
        Self {
            name: name.into(),
            min,
            max,
        }
    }

    pub fn contains(&self, score: f64) -> bool {
        self.min <= score && score <= self.max
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(ConfigError::NonFinite {
                location: format!("badge '{}' bounds", self.name),
            });
        }
        if self.max < self.min {
            return Err(ConfigError::InvalidBadgeRange {
                badge: self.name.clone(),
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// Reasons a configuration document is rejected before any entity is scored.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read scoring configuration {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed YAML scoring configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("malformed JSON scoring configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error(
        "rule '{rule}' matches no rule kind (expected one of `bins`, `true`, `values`, `when_false_has_manager`)"
    )]
    UnrecognizedRule { rule: String },
    #[error("rule '{rule}' mixes keys of several rule kinds: {}", .keys.join(", "))]
    AmbiguousRule {
        rule: String,
        keys: Vec<&'static str>,
    },
    #[error("rule '{rule}' is missing required key `{key}`")]
    MissingKey { rule: String, key: &'static str },
    #[error("rule '{rule}' does not accept key `{key}`")]
    UnexpectedKey { rule: String, key: &'static str },
    #[error("bin rule '{rule}' has an empty bin list")]
    EmptyBins { rule: String },
    #[error("{location} must be a finite number")]
    NonFinite { location: String },
    #[error("duplicate rule name '{0}'")]
    DuplicateRule(String),
    #[error("duplicate badge name '{0}'")]
    DuplicateBadge(String),
    #[error("badge '{badge}' has max {max} below min {min}")]
    InvalidBadgeRange { badge: String, min: f64, max: f64 },
}
