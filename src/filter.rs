use crate::classify::ColumnClassification;
use crate::data::Table;
use crate::error::ConfigError;
use std::collections::HashSet;

/// A single `column == value` row filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFilter {
    pub column: String,
    pub value: String,
}

impl RowFilter {
    /// Parse `COLUMN=VALUE`. Only the first `=` separates; the value may contain more.
    pub fn parse(input: &str) -> Result<Self, ConfigError> {
        match input.split_once('=') {
            Some((column, value)) if !column.trim().is_empty() => Ok(RowFilter {
                column: column.trim().to_string(),
                value: value.to_string(),
            }),
            _ => Err(ConfigError::MalformedFilter(input.to_string())),
        }
    }
}

/// Non-null distinct values of a text column, in order of first appearance.
pub fn distinct_values(table: &Table, column: &str) -> Vec<String> {
    let Some(values) = table.texts(column) else {
        return Vec::new();
    };
    let mut seen = HashSet::new();
    values
        .iter()
        .flatten()
        .filter(|v| seen.insert(v.as_str()))
        .cloned()
        .collect()
}

/// Keep only the rows whose categorical `column` equals `value`.
///
/// Returns a new table; the input is not modified. A value that never occurs yields
/// a table with zero rows.
pub fn filter_rows(
    table: &Table,
    classification: &ColumnClassification,
    filter: &RowFilter,
) -> Result<Table, ConfigError> {
    if table.column(&filter.column).is_none() {
        return Err(ConfigError::UnknownColumn(filter.column.clone()));
    }
    if !classification.is_categorical(&filter.column) {
        return Err(ConfigError::NotCategorical(filter.column.clone()));
    }

    let values = table
        .texts(&filter.column)
        .ok_or_else(|| ConfigError::NotCategorical(filter.column.clone()))?;

    let keep: Vec<usize> = values
        .iter()
        .enumerate()
        .filter(|(_, v)| v.as_deref() == Some(filter.value.as_str()))
        .map(|(i, _)| i)
        .collect();

    log::info!(
        "filter {} = {} keeps {} of {} rows",
        filter.column,
        filter.value,
        keep.len(),
        table.row_count()
    );
    Ok(table.take_rows(&keep))
}
