//! Turns an uploaded byte stream into a [`Table`].

use crate::config::LoadOptions;
use crate::data::{Cell, Column, ColumnData, Table};
use crate::error::LoadError;
use calamine::{open_workbook_auto_from_rs, Data, DataType, Reader};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::io::Cursor;
use std::path::Path;

/// Tokens read as a null cell in delimited text.
const NULL_TOKENS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "null", "NULL", "None", "#N/A", "<NA>",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Input format, chosen from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Csv,
    Spreadsheet,
    Json,
}

impl FileKind {
    pub fn from_name(name: &str) -> Result<Self, LoadError> {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "csv" => Ok(FileKind::Csv),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(FileKind::Spreadsheet),
            "json" => Ok(FileKind::Json),
            _ => Err(LoadError::UnsupportedFormat(name.to_string())),
        }
    }
}

/// Load a table from a file on disk. Dispatch by extension.
pub fn load_file(path: &Path, options: &LoadOptions) -> Result<Table, LoadError> {
    let bytes = std::fs::read(path)?;
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    load_bytes(name, &bytes, options)
}

/// Load a table from uploaded bytes, using `name` to pick the format.
pub fn load_bytes(name: &str, bytes: &[u8], options: &LoadOptions) -> Result<Table, LoadError> {
    let table = match FileKind::from_name(name)? {
        FileKind::Csv => read_csv(bytes, options)?,
        FileKind::Spreadsheet => read_spreadsheet(bytes)?,
        FileKind::Json => {
            let value: serde_json::Value =
                serde_json::from_slice(bytes).map_err(|e| LoadError::Json(e.to_string()))?;
            Table::from_json(&value)?
        }
    };

    if table.columns().is_empty() {
        return Err(LoadError::Empty);
    }

    for column in table.columns() {
        log::debug!("column '{}': {:?}", column.name, column.data.value_type());
    }
    log::info!(
        "loaded '{}' ({} rows x {} columns)",
        name,
        table.row_count(),
        table.columns().len()
    );
    Ok(table)
}

/// Read delimited text. The first record is the header.
pub fn read_csv(bytes: &[u8], options: &LoadOptions) -> Result<Table, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.is_empty() {
        return Err(LoadError::Empty);
    }

    let mut raw: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
    for record in reader.records() {
        let record = record?;
        for (column, field) in raw.iter_mut().zip(record.iter()) {
            column.push(if is_null_token(field) {
                None
            } else {
                Some(field.to_string())
            });
        }
    }

    Ok(Table::new(
        headers
            .into_iter()
            .zip(raw)
            .map(|(name, values)| Column::new(name, infer_text_column(values, options)))
            .collect(),
    ))
}

fn is_null_token(field: &str) -> bool {
    NULL_TOKENS.contains(&field.trim())
}

/// Pick the narrowest type every non-null value parses as.
fn infer_text_column(values: Vec<Option<String>>, options: &LoadOptions) -> ColumnData {
    let present = || values.iter().flatten();

    if present().all(|v| v.trim().parse::<f64>().is_ok()) {
        return ColumnData::Number(
            values
                .iter()
                .map(|v| v.as_ref().and_then(|s| parse_number(s)))
                .collect(),
        );
    }

    if present().all(|v| parse_bool(v).is_some()) {
        return ColumnData::Bool(
            values.iter().map(|v| v.as_deref().and_then(parse_bool)).collect(),
        );
    }

    if options.infer_datetimes && present().all(|v| parse_datetime(v).is_some()) {
        return ColumnData::DateTime(
            values.iter().map(|v| v.as_deref().and_then(parse_datetime)).collect(),
        );
    }

    ColumnData::Text(values)
}

/// Infinities parse as f64 but are treated like NaN, i.e. missing.
fn parse_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Parse an ISO-like date or date-time. Dates become midnight.
pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(value, format) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Read the first worksheet of a workbook. The first row is the header.
pub fn read_spreadsheet(bytes: &[u8]) -> Result<Table, LoadError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| LoadError::Spreadsheet(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| LoadError::Spreadsheet("No sheets found in workbook".to_string()))?
        .map_err(|e| LoadError::Spreadsheet(e.to_string()))?;

    let mut rows = range.rows();
    let header_row = rows.next().ok_or(LoadError::Empty)?;
    let headers: Vec<String> = header_row
        .iter()
        .enumerate()
        .map(|(i, cell)| match cell {
            Data::Empty => format!("Unnamed: {}", i),
            other => other.to_string(),
        })
        .collect();

    let mut cells: Vec<Vec<Cell>> = vec![Vec::new(); headers.len()];
    for row in rows {
        for (column, cell) in cells.iter_mut().zip(row.iter()) {
            column.push(decode_cell(cell));
        }
    }

    Ok(Table::new(
        headers
            .into_iter()
            .zip(cells)
            .map(|(name, cells)| Column::new(name, ColumnData::from_cells(cells)))
            .collect(),
    ))
}

fn decode_cell(cell: &Data) -> Cell {
    match cell {
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) if f.is_finite() => Cell::Number(*f),
        Data::Float(_) => Cell::Null,
        Data::String(s) if is_null_token(s) => Cell::Null,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(_) | Data::DateTimeIso(_) => {
            cell.as_datetime().map_or(Cell::Null, Cell::DateTime)
        }
        Data::DurationIso(s) => Cell::Text(s.clone()),
        // error cells and blanks
        _ => Cell::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ValueType;

    fn load_csv(text: &str) -> Table {
        load_bytes("data.csv", text.as_bytes(), &LoadOptions::default()).unwrap()
    }

    fn type_of(table: &Table, name: &str) -> ValueType {
        table.column(name).unwrap().data.value_type()
    }

    #[test]
    fn test_file_kind_from_name() {
        assert_eq!(FileKind::from_name("a.csv").unwrap(), FileKind::Csv);
        assert_eq!(FileKind::from_name("A.XLSX").unwrap(), FileKind::Spreadsheet);
        assert_eq!(FileKind::from_name("a.json").unwrap(), FileKind::Json);
        assert!(matches!(
            FileKind::from_name("a.txt"),
            Err(LoadError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_csv_type_inference() {
        let table = load_csv(
            "region,sales,when,flag\n\
             A,10,2024-01-01,true\n\
             B,2.5,2024-01-02 10:30:00,False\n",
        );
        assert_eq!(type_of(&table, "region"), ValueType::Text);
        assert_eq!(type_of(&table, "sales"), ValueType::Number);
        assert_eq!(type_of(&table, "when"), ValueType::DateTime);
        assert_eq!(type_of(&table, "flag"), ValueType::Bool);
        assert_eq!(table.numbers("sales").unwrap(), &[Some(10.0), Some(2.5)]);
    }

    #[test]
    fn test_csv_null_tokens() {
        let table = load_csv("n,s\n1,x\nNA,\n,NaN\n3,y\n");
        assert_eq!(table.numbers("n").unwrap(), &[Some(1.0), None, None, Some(3.0)]);
        assert_eq!(
            table.texts("s").unwrap(),
            &[Some("x".to_string()), None, None, Some("y".to_string())]
        );
    }

    #[test]
    fn test_csv_infinities_load_as_null() {
        let table = load_csv("v\n1\ninf\n-inf\n2\n");
        assert_eq!(type_of(&table, "v"), ValueType::Number);
        assert_eq!(table.numbers("v").unwrap(), &[Some(1.0), None, None, Some(2.0)]);
    }

    #[test]
    fn test_csv_duplicate_headers_renamed() {
        let table = load_csv("x,x\n1,a\n2,b\n");
        assert_eq!(type_of(&table, "x"), ValueType::Number);
        assert_eq!(type_of(&table, "x.1"), ValueType::Text);

        let classes = crate::classify::classify(&table);
        assert_eq!(classes.numeric, vec!["x"]);
        assert_eq!(classes.categorical, vec!["x.1"]);
    }

    #[test]
    fn test_csv_mixed_column_is_text() {
        let table = load_csv("v\n1\nabc\n3\n");
        assert_eq!(type_of(&table, "v"), ValueType::Text);
    }

    #[test]
    fn test_csv_datetime_inference_can_be_disabled() {
        let options = LoadOptions { infer_datetimes: false };
        let table = load_bytes("d.csv", b"d\n2024-01-01\n", &options).unwrap();
        assert_eq!(type_of(&table, "d"), ValueType::Text);
    }

    #[test]
    fn test_csv_ragged_rows_fail() {
        let result = load_bytes("bad.csv", b"a,b\n1,2\n3\n", &LoadOptions::default());
        assert!(matches!(result, Err(LoadError::Csv(_))));
    }

    #[test]
    fn test_csv_empty_input() {
        let result = load_bytes("empty.csv", b"", &LoadOptions::default());
        assert!(matches!(result, Err(LoadError::Empty)));
    }

    #[test]
    fn test_csv_header_only() {
        let table = load_csv("x,y\n");
        assert_eq!(table.row_count(), 0);
        assert_eq!(table.columns().len(), 2);
    }

    #[test]
    fn test_parse_datetime_formats() {
        assert!(parse_datetime("2024-03-01").is_some());
        assert!(parse_datetime("2024/03/01").is_some());
        assert!(parse_datetime("2024-03-01T12:00:00").is_some());
        assert!(parse_datetime("2024-03-01 12:00").is_some());
        assert!(parse_datetime("2024-03-01T12:00:00+02:00").is_some());
        assert!(parse_datetime("March 1st").is_none());
        assert!(parse_datetime("42").is_none());
    }

    #[test]
    fn test_invalid_spreadsheet_bytes() {
        let result = load_bytes("broken.xlsx", b"not a workbook", &LoadOptions::default());
        assert!(matches!(result, Err(LoadError::Spreadsheet(_))));
    }

    #[test]
    fn test_json_input() {
        let table = load_bytes(
            "rows.json",
            br#"[{"a": 1, "b": "x"}, {"a": 2, "b": "y"}]"#,
            &LoadOptions::default(),
        )
        .unwrap();
        assert_eq!(table.numbers("a").unwrap(), &[Some(1.0), Some(2.0)]);
    }
}
