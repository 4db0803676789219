use serde::{Deserialize, Serialize};

use super::config::BadgeRange;

/// The score falls outside every configured badge range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("score {score} falls outside every configured badge range")]
pub struct UnclassifiedScoreError {
    pub score: f64,
}

/// Returns the first declared badge whose inclusive range contains `score`.
///
/// Overlaps resolve to the earlier declaration. Gaps and overflow are errors
/// instead of a nearest-badge fallback.
pub fn classify(score: f64, badges: &[BadgeRange]) -> Result<&str, UnclassifiedScoreError> {
    badges
        .iter()
        .find(|badge| badge.contains(score))
        .map(|badge| badge.name.as_str())
        .ok_or(UnclassifiedScoreError { score })
}
