use crate::scoring::{Entity, FieldValue};
use std::io::Read;

pub(crate) struct ParsedTable {
    pub(crate) headers: Vec<String>,
    pub(crate) entities: Vec<Entity>,
}

pub(crate) fn parse_table<R: Read>(reader: R, id_column: &str) -> Result<ParsedTable, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(|header| header.trim_start_matches('\u{feff}').to_string())
        .collect();
    let id_index = headers.iter().position(|header| header == id_column);

    let mut entities = Vec::new();
    for (row, record) in csv_reader.records().enumerate() {
        let record = record?;
        let id = id_index
            .and_then(|index| record.get(index))
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| (row + 1).to_string());

        let mut entity = Entity::new(id);
        for (index, (header, cell)) in headers.iter().zip(record.iter()).enumerate() {
            if Some(index) != id_index {
                entity.insert(header.clone(), parse_cell(cell));
            }
        }
        entities.push(entity);
    }

    Ok(ParsedTable { headers, entities })
}

/// Types a raw cell: missing markers, booleans, finite numbers, then text.
fn parse_cell(raw: &str) -> FieldValue {
    let value = raw.trim();
    if value.is_empty() || MISSING_MARKERS.iter().any(|m| value.eq_ignore_ascii_case(m)) {
        return FieldValue::Null;
    }
    if value.eq_ignore_ascii_case("true") {
        return FieldValue::Boolean(true);
    }
    if value.eq_ignore_ascii_case("false") {
        return FieldValue::Boolean(false);
    }
    match value.parse::<f64>() {
        Ok(number) if number.is_finite() => FieldValue::Number(number),
        _ => FieldValue::Text(value.to_string()),
    }
}

const MISSING_MARKERS: [&str; 4] = ["nan", "null", "na", "n/a"];

#[cfg(test)]
pub(crate) fn parse_cell_for_tests(raw: &str) -> FieldValue {
    parse_cell(raw)
}
