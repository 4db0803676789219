use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::scoring::{BadgeRange, ScoreResult, UNCLASSIFIED};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadgeCount {
    pub badge: String,
    pub count: usize,
}

/// Results per badge, in configured badge order, with unclassified last.
///
/// Serializes as a JSON object whose keys keep that order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BadgeDistribution {
    pub counts: Vec<BadgeCount>,
}

impl BadgeDistribution {
    pub fn from_results(badges: &[BadgeRange], results: &[ScoreResult]) -> Self {
        let mut counts: Vec<BadgeCount> = badges
            .iter()
            .map(|badge| BadgeCount {
                badge: badge.name.clone(),
                count: 0,
            })
            .collect();
        let mut unclassified = 0;

        for result in results {
            match result.badge.as_deref() {
                Some(name) => match counts.iter_mut().find(|entry| entry.badge == name) {
                    Some(entry) => entry.count += 1,
                    None => counts.push(BadgeCount {
                        badge: name.to_string(),
                        count: 1,
                    }),
                },
                None => unclassified += 1,
            }
        }

        if unclassified > 0 {
            counts.push(BadgeCount {
                badge: UNCLASSIFIED.to_string(),
                count: unclassified,
            });
        }

        Self { counts }
    }

    pub fn count(&self, badge: &str) -> usize {
        self.counts
            .iter()
            .find(|entry| entry.badge == badge)
            .map(|entry| entry.count)
            .unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.iter().map(|entry| entry.count).sum()
    }
}

impl Serialize for BadgeDistribution {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.counts.len()))?;
        for entry in &self.counts {
            map.serialize_entry(&entry.badge, &entry.count)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(badge: Option<&str>) -> ScoreResult {
        ScoreResult {
            entity_id: "x".to_string(),
            total_score: 0.0,
            hits: Vec::new(),
            badge: badge.map(str::to_string),
            issues: Vec::new(),
        }
    }

    #[test]
    fn counts_in_badge_order_with_unclassified_last() {
        let badges = vec![
            BadgeRange::new("top", 18.0, 28.0),
            BadgeRange::new("medium", 13.0, 17.0),
            BadgeRange::new("low", 0.0, 12.0),
        ];
        let results = vec![
            result(Some("low")),
            result(None),
            result(Some("top")),
            result(Some("low")),
        ];

        let distribution = BadgeDistribution::from_results(&badges, &results);

        assert_eq!(distribution.count("low"), 2);
        assert_eq!(distribution.count("medium"), 0);
        assert_eq!(distribution.count(UNCLASSIFIED), 1);
        assert_eq!(distribution.total(), 4);
        assert_eq!(
            serde_json::to_string(&distribution).expect("serializes"),
            r#"{"top":1,"medium":0,"low":2,"Unclassified":1}"#
        );
    }

    #[test]
    fn omits_unclassified_when_everything_classifies() {
        let badges = vec![BadgeRange::new("low", 0.0, 12.0)];
        let distribution = BadgeDistribution::from_results(&badges, &[result(Some("low"))]);
        assert_eq!(
            serde_json::to_string(&distribution).expect("serializes"),
            r#"{"low":1}"#
        );
    }
}
