//! CSV ingestion of entity records.

mod parser;

use crate::scoring::Entity;
use std::io::Read;
use std::path::Path;
use tracing::debug;

pub const DEFAULT_ID_COLUMN: &str = "entity_id";

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to read entity data: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid entity CSV data: {0}")]
    Csv(#[from] csv::Error),
}

/// Entities read from a tabular source, with the source column order.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityTable {
    pub id_column: String,
    pub headers: Vec<String>,
    pub entities: Vec<Entity>,
}

impl EntityTable {
    pub fn from_path<P: AsRef<Path>>(path: P, id_column: &str) -> Result<Self, IngestError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, id_column)
    }

    /// Reads a headed CSV. Rows without a usable id fall back to their
    /// 1-based row number.
    pub fn from_reader<R: Read>(reader: R, id_column: &str) -> Result<Self, IngestError> {
        let table = parser::parse_table(reader, id_column)?;
        debug!(
            rows = table.entities.len(),
            columns = table.headers.len(),
            "entity table loaded"
        );

        Ok(Self {
            id_column: id_column.to_string(),
            headers: table.headers,
            entities: table.entities,
        })
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.headers.iter().any(|header| header == name)
    }
}
