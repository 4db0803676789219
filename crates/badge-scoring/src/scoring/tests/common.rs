use crate::scoring::{Entity, FieldValue, ScoringConfig, ScoringEngine};

pub(super) const STANDARD_RULES: &str = r#"
rules:
  sales_units:
    bins: [[500, 8], [300, 6], [100, 4], [0, -1]]
  revenue:
    bins: [[100000, 6], [50000, 4], [10000, 2], [0, 0]]
  new_clients:
    bins: [[10, 4], [5, 2], [0, 0]]
  repeat_orders:
    bins: [[20, 4], [10, 2], [0, 0]]
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

pub(super) fn scoring_config() -> ScoringConfig {
    ScoringConfig::from_yaml_str(STANDARD_RULES).expect("standard rules load")
}

pub(super) fn scoring_engine() -> ScoringEngine {
    ScoringEngine::new(scoring_config())
}

/// Account that clears every top threshold.
pub(super) fn flagship_account(id: &str) -> Entity {
    Entity::new(id)
        .with_field("sales_units", 620.0)
        .with_field("revenue", 140_000.0)
        .with_field("new_clients", 12.0)
        .with_field("repeat_orders", 25.0)
        .with_field("visited_last_year", true)
        .with_field("region", "EMEA")
        .with_field("has_account_manager", true)
}

/// Account that earns nothing but penalties.
pub(super) fn dormant_account(id: &str) -> Entity {
    Entity::new(id)
        .with_field("sales_units", 20.0)
        .with_field("revenue", 0.0)
        .with_field("new_clients", 0.0)
        .with_field("repeat_orders", 0.0)
        .with_field("visited_last_year", false)
        .with_field("region", "LATAM")
        .with_field("has_account_manager", false)
}

pub(super) fn with_field(mut entity: Entity, name: &str, value: FieldValue) -> Entity {
    entity.insert(name, value);
    entity
}

pub(super) fn without_field(mut entity: Entity, name: &str) -> Entity {
    entity.fields.remove(name);
    entity
}
