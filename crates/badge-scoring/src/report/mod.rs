//! Tabular export and run summaries for scored entities.

mod distribution;
mod export;

pub use distribution::{BadgeCount, BadgeDistribution};
pub use export::{rule_hits_summary, write_csv, write_csv_to_path, ExportOptions};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to write results: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode results as CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("{results} results cannot be paired with {entities} entities")]
    LengthMismatch { entities: usize, results: usize },
}
