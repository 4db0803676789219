use std::io::Write;
use std::path::Path;

use tracing::info;

use super::ExportError;
use crate::ingest::EntityTable;
use crate::scoring::ScoreResult;

const RESULT_COLUMNS: [&str; 3] = ["badge", "score", "rule_hits"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    pub name_column: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            name_column: "name".to_string(),
        }
    }
}

/// Compact audit string of matched hits, e.g. `sales_units+6 | missing_account_manager-2`.
pub fn rule_hits_summary(result: &ScoreResult) -> String {
    result
        .hits
        .iter()
        .filter(|hit| hit.matched)
        .map(|hit| format!("{}{:+}", hit.rule_name, hit.points))
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Writes id, name, badge, score and rule hits first, then the remaining
/// input columns in their original order.
pub fn write_csv<W: Write>(
    writer: W,
    table: &EntityTable,
    results: &[ScoreResult],
    options: &ExportOptions,
) -> Result<(), ExportError> {
    if table.entities.len() != results.len() {
        return Err(ExportError::LengthMismatch {
            entities: table.entities.len(),
            results: results.len(),
        });
    }

    let include_name = table.has_column(&options.name_column);
    let rest: Vec<&str> = table
        .headers
        .iter()
        .map(String::as_str)
        .filter(|header| {
            *header != table.id_column
                && !(include_name && *header == options.name_column)
                && !RESULT_COLUMNS.contains(header)
        })
        .collect();

    let mut header = vec![table.id_column.as_str()];
    if include_name {
        header.push(options.name_column.as_str());
    }
    header.extend(RESULT_COLUMNS);
    header.extend(rest.iter().copied());

    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(&header)?;

    for (entity, result) in table.entities.iter().zip(results) {
        let cell = |column: &str| {
            entity
                .fields
                .get(column)
                .map(|value| value.to_string())
                .unwrap_or_default()
        };

        let mut row = vec![result.entity_id.clone()];
        if include_name {
            row.push(cell(options.name_column.as_str()));
        }
        row.push(result.badge_label().to_string());
        row.push(result.total_score.to_string());
        row.push(rule_hits_summary(result));
        row.extend(rest.iter().map(|column| cell(*column)));

        csv_writer.write_record(&row)?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Creates parent directories as needed before writing.
pub fn write_csv_to_path<P: AsRef<Path>>(
    path: P,
    table: &EntityTable,
    results: &[ScoreResult],
    options: &ExportOptions,
) -> Result<(), ExportError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let file = std::fs::File::create(path)?;
    write_csv(file, table, results, options)?;
    info!(path = %path.display(), rows = results.len(), "results written");
    Ok(())
}
