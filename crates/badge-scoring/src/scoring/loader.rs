use std::collections::BTreeSet;
use std::fmt;
use std::marker::PhantomData;
use std::path::Path;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use tracing::debug;

use super::config::{
    BadgeRange, Bin, BinRule, BooleanRule, CategoricalRule, ConditionalPenaltyRule, ConfigError,
    Rule, RuleDef, ScoringConfig,
};

/// Serialization format of a configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Json,
}

impl DocumentFormat {
    /// `.json` files are JSON; everything else is read as YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Yaml,
        }
    }
}

impl ScoringConfig {
    /// Parses and validates a raw configuration document.
    pub fn load(raw: &str, format: DocumentFormat) -> Result<Self, ConfigError> {
        let document: RawDocument = match format {
            DocumentFormat::Yaml => serde_yaml::from_str(raw)?,
            DocumentFormat::Json => serde_json::from_str(raw)?,
        };

        let rules = document
            .rules
            .0
            .into_iter()
            .map(|(name, raw)| raw.resolve(name))
            .collect::<Result<Vec<_>, _>>()?;

        let badges = document
            .badges
            .0
            .into_iter()
            .map(|(name, raw)| BadgeRange::new(name, raw.min, raw.max))
            .collect();

        let config = ScoringConfig::new(rules, badges)?;
        debug!(
            rules = config.rules().len(),
            badges = config.badges().len(),
            "scoring configuration validated"
        );
        Ok(config)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigError> {
        Self::load(raw, DocumentFormat::Yaml)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        Self::load(raw, DocumentFormat::Json)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::load(&raw, DocumentFormat::from_path(path))
    }
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    rules: OrderedTable<RawRule>,
    badges: OrderedTable<RawBadge>,
}

/// Mapping kept as a list so declaration order and repeated keys survive parsing.
#[derive(Debug)]
struct OrderedTable<T>(Vec<(String, T)>);

impl<'de, T> Deserialize<'de> for OrderedTable<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct TableVisitor<T>(PhantomData<T>);

        impl<'de, T> Visitor<'de> for TableVisitor<T>
        where
            T: Deserialize<'de>,
        {
            type Value = OrderedTable<T>;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a mapping of names to definitions")
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(OrderedTable(Vec::new()))
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, T>()? {
                    entries.push(entry);
                }
                Ok(OrderedTable(entries))
            }
        }

        deserializer.deserialize_map(TableVisitor(PhantomData))
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRule {
    #[serde(default)]
    field: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    bins: Option<Vec<(f64, f64)>>,
    #[serde(default, rename = "true")]
    when_true: Option<f64>,
    #[serde(default)]
    values: Option<Vec<String>>,
    #[serde(default)]
    points: Option<f64>,
    #[serde(default)]
    when_false_has_manager: Option<f64>,
}

impl RawRule {
    fn resolve(self, name: String) -> Result<Rule, ConfigError> {
        let mut indicators = Vec::new();
        if self.bins.is_some() {
            indicators.push("bins");
        }
        if self.when_true.is_some() {
            indicators.push("true");
        }
        if self.values.is_some() {
            indicators.push("values");
        }
        if self.when_false_has_manager.is_some() {
            indicators.push("when_false_has_manager");
        }

        match indicators.len() {
            0 => return Err(ConfigError::UnrecognizedRule { rule: name }),
            1 => {}
            _ => {
                return Err(ConfigError::AmbiguousRule {
                    rule: name,
                    keys: indicators,
                })
            }
        }

        if self.points.is_some() && self.values.is_none() {
            return Err(ConfigError::UnexpectedKey {
                rule: name,
                key: "points",
            });
        }

        let field = self
            .field
            .or_else(|| self.when_false_has_manager.map(|_| MANAGER_FLAG.to_string()))
            .or_else(|| legacy_field(&name).map(str::to_string))
            .unwrap_or_else(|| name.clone());

        let def = if let Some(bins) = self.bins {
            RuleDef::Bin(BinRule {
                bins: bins
                    .into_iter()
                    .map(|(threshold, points)| Bin::new(threshold, points))
                    .collect(),
            })
        } else if let Some(points) = self.when_true {
            RuleDef::Boolean(BooleanRule { points })
        } else if let Some(values) = self.values {
            let points = self.points.ok_or_else(|| ConfigError::MissingKey {
                rule: name.clone(),
                key: "points",
            })?;
            RuleDef::Categorical(CategoricalRule {
                values: values.into_iter().collect::<BTreeSet<_>>(),
                points,
            })
        } else if let Some(points) = self.when_false_has_manager {
            RuleDef::ConditionalPenalty(ConditionalPenaltyRule { points })
        } else {
            return Err(ConfigError::UnrecognizedRule { rule: name });
        };

        Ok(Rule {
            name,
            field,
            description: self.description,
            def,
        })
    }
}

const MANAGER_FLAG: &str = "has_account_manager";

/// Field bindings for rule names whose column differs from the rule name in
/// existing configuration files.
fn legacy_field(rule_name: &str) -> Option<&'static str> {
    match rule_name {
        "strategic_region" => Some("region"),
        "missing_account_manager" => Some(MANAGER_FLAG),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawBadge {
    min: f64,
    max: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::config::RuleKind;

    const SAMPLE: &str = r#"
rules:
  sales_units:
    bins: [[500, 8], [300, 6], [100, 4], [0, -1]]
  revenue:
    bins: [[100000, 6], [50000, 4], [0, 0]]
  visited_last_year:
    true: 1
  strategic_region:
    values: ["APAC", "EMEA", "NAM"]
    points: 2
  missing_account_manager:
    when_false_has_manager: -2
badges:
  top: { min: 18, max: 28 }
  medium: { min: 13, max: 17 }
  low: { min: 0, max: 12 }
"#;

    #[test]
    fn loads_every_rule_kind_in_declaration_order() {
        let config = ScoringConfig::from_yaml_str(SAMPLE).expect("sample loads");

        let kinds: Vec<_> = config
            .rules()
            .iter()
            .map(|rule| (rule.name.as_str(), rule.def.kind()))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("sales_units", RuleKind::Bin),
                ("revenue", RuleKind::Bin),
                ("visited_last_year", RuleKind::Boolean),
                ("strategic_region", RuleKind::Categorical),
                ("missing_account_manager", RuleKind::ConditionalPenalty),
            ]
        );

        let names: Vec<_> = config.badges().iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["top", "medium", "low"]);
    }

    #[test]
    fn binds_legacy_rule_names_to_their_columns() {
        let config = ScoringConfig::from_yaml_str(SAMPLE).expect("sample loads");

        assert_eq!(config.rule("strategic_region").expect("rule").field, "region");
        assert_eq!(
            config.rule("missing_account_manager").expect("rule").field,
            "has_account_manager"
        );
        assert_eq!(config.rule("sales_units").expect("rule").field, "sales_units");
    }

    #[test]
    fn explicit_field_overrides_default_binding() {
        let config = ScoringConfig::from_yaml_str(
            "rules:\n  tier_one:\n    field: tier\n    values: [gold]\n    points: 3\nbadges: {}\n",
        )
        .expect("loads");
        assert_eq!(config.rule("tier_one").expect("rule").field, "tier");
    }

    #[test]
    fn keeps_ascending_bins_in_the_given_order() {
        let config =
            ScoringConfig::from_yaml_str("rules:\n  revenue:\n    bins: [[0, 1], [100, 5]]\nbadges: {}\n")
                .expect("loads");

        match &config.rule("revenue").expect("rule").def {
            RuleDef::Bin(rule) => {
                assert_eq!(rule.bins, vec![Bin::new(0.0, 1.0), Bin::new(100.0, 5.0)]);
            }
            other => panic!("expected bin rule, got {other:?}"),
        }
    }

    #[test]
    fn rejects_rules_without_a_kind() {
        let error = ScoringConfig::from_yaml_str("rules:\n  mystery: {}\nbadges: {}\n")
            .expect_err("shape rejected");
        assert!(matches!(error, ConfigError::UnrecognizedRule { rule } if rule == "mystery"));
    }

    #[test]
    fn rejects_rules_mixing_kinds() {
        let error = ScoringConfig::from_yaml_str(
            "rules:\n  mixed:\n    bins: [[0, 1]]\n    values: [a]\n    points: 1\nbadges: {}\n",
        )
        .expect_err("mixed rule rejected");

        match error {
            ConfigError::AmbiguousRule { rule, keys } => {
                assert_eq!(rule, "mixed");
                assert_eq!(keys, vec!["bins", "values"]);
            }
            other => panic!("expected ambiguous rule, got {other:?}"),
        }
    }

    #[test]
    fn rejects_categorical_rule_without_points() {
        let error = ScoringConfig::from_yaml_str("rules:\n  region:\n    values: [EMEA]\nbadges: {}\n")
            .expect_err("points required");
        assert!(matches!(error, ConfigError::MissingKey { key: "points", .. }));
    }

    #[test]
    fn rejects_stray_points_key() {
        let error =
            ScoringConfig::from_yaml_str("rules:\n  visited:\n    true: 1\n    points: 2\nbadges: {}\n")
                .expect_err("stray points rejected");
        assert!(matches!(error, ConfigError::UnexpectedKey { key: "points", .. }));
    }

    #[test]
    fn rejects_unknown_rule_keys() {
        let error = ScoringConfig::from_yaml_str("rules:\n  revenue:\n    bin: [[0, 1]]\nbadges: {}\n")
            .expect_err("typo rejected");
        assert!(matches!(error, ConfigError::Yaml(_)));
    }

    #[test]
    fn rejects_empty_bins() {
        let error = ScoringConfig::from_yaml_str("rules:\n  revenue:\n    bins: []\nbadges: {}\n")
            .expect_err("empty bins rejected");
        assert!(matches!(error, ConfigError::EmptyBins { .. }));
    }

    #[test]
    fn rejects_duplicate_rule_names_in_json() {
        let error = ScoringConfig::from_json_str(
            r#"{"rules": {"revenue": {"bins": [[0, 1]]}, "revenue": {"true": 2}}, "badges": {}}"#,
        )
        .expect_err("duplicate rejected");
        assert!(matches!(error, ConfigError::DuplicateRule(name) if name == "revenue"));
    }

    #[test]
    fn rejects_duplicate_badge_names() {
        let error = ScoringConfig::from_json_str(
            r#"{"rules": {}, "badges": {"low": {"min": 0, "max": 5}, "low": {"min": 6, "max": 9}}}"#,
        )
        .expect_err("duplicate badge rejected");
        assert!(matches!(error, ConfigError::DuplicateBadge(name) if name == "low"));
    }

    #[test]
    fn rejects_inverted_badges() {
        let error = ScoringConfig::from_yaml_str("rules: {}\nbadges:\n  top: { min: 20, max: 10 }\n")
            .expect_err("inverted badge rejected");
        assert!(matches!(error, ConfigError::InvalidBadgeRange { .. }));
    }

    #[test]
    fn json_and_yaml_documents_agree() {
        let yaml = ScoringConfig::from_yaml_str(SAMPLE).expect("yaml loads");
        let json = ScoringConfig::from_json_str(
            r#"{
                "rules": {
                    "sales_units": {"bins": [[500, 8], [300, 6], [100, 4], [0, -1]]},
                    "revenue": {"bins": [[100000, 6], [50000, 4], [0, 0]]},
                    "visited_last_year": {"true": 1},
                    "strategic_region": {"values": ["APAC", "EMEA", "NAM"], "points": 2},
                    "missing_account_manager": {"when_false_has_manager": -2}
                },
                "badges": {
                    "top": {"min": 18, "max": 28},
                    "medium": {"min": 13, "max": 17},
                    "low": {"min": 0, "max": 12}
                }
            }"#,
        )
        .expect("json loads");

        assert_eq!(yaml, json);
    }

    #[test]
    fn from_path_reports_missing_files() {
        let error = ScoringConfig::from_path("./does-not-exist.yml").expect_err("io error");
        assert!(matches!(error, ConfigError::Io { .. }));
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(DocumentFormat::from_path(Path::new("rules.JSON")), DocumentFormat::Json);
        assert_eq!(DocumentFormat::from_path(Path::new("scoring.yml")), DocumentFormat::Yaml);
        assert_eq!(DocumentFormat::from_path(Path::new("scoring")), DocumentFormat::Yaml);
    }
}
