use super::rules::RuleHit;

/// Sums every hit's points, zero-point hits included, in breakdown order.
pub fn aggregate(hits: &[RuleHit]) -> f64 {
    hits.iter().fold(0.0, |total, hit| total + hit.points)
}
