use crate::error::LoadError;
use chrono::NaiveDateTime;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt::Write as _;

/// Semantic type of a column, as reported by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Text,
    Number,
    DateTime,
    Bool,
}

/// One homogeneous column of optional values. `None` is a null cell.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Text(Vec<Option<String>>),
    Number(Vec<Option<f64>>),
    DateTime(Vec<Option<NaiveDateTime>>),
    Bool(Vec<Option<bool>>),
}

/// A single decoded cell before its column type is known.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Number(f64),
    Text(String),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl Cell {
    fn render(&self) -> Option<String> {
        match self {
            Cell::Null => None,
            Cell::Number(n) => Some(n.to_string()),
            Cell::Text(s) => Some(s.clone()),
            Cell::Bool(b) => Some(if *b { "True" } else { "False" }.to_string()),
            Cell::DateTime(dt) => Some(dt.to_string()),
        }
    }
}

impl ColumnData {
    /// Build a column from decoded cells. A column whose non-null cells all share one
    /// type takes that type; anything mixed falls back to text. All-null is numeric.
    pub fn from_cells(cells: Vec<Cell>) -> Self {
        let mut kinds = cells.iter().filter_map(|c| match c {
            Cell::Null => None,
            Cell::Number(_) => Some(ValueType::Number),
            Cell::Text(_) => Some(ValueType::Text),
            Cell::Bool(_) => Some(ValueType::Bool),
            Cell::DateTime(_) => Some(ValueType::DateTime),
        });

        let first = kinds.next();
        let uniform = match first {
            Some(kind) => kinds.all(|k| k == kind).then_some(kind),
            None => Some(ValueType::Number),
        };

        match uniform {
            Some(ValueType::Number) => ColumnData::Number(
                cells
                    .into_iter()
                    .map(|c| match c {
                        Cell::Number(n) if n.is_finite() => Some(n),
                        _ => None,
                    })
                    .collect(),
            ),
            Some(ValueType::Bool) => ColumnData::Bool(
                cells
                    .into_iter()
                    .map(|c| match c {
                        Cell::Bool(b) => Some(b),
                        _ => None,
                    })
                    .collect(),
            ),
            Some(ValueType::DateTime) => ColumnData::DateTime(
                cells
                    .into_iter()
                    .map(|c| match c {
                        Cell::DateTime(dt) => Some(dt),
                        _ => None,
                    })
                    .collect(),
            ),
            Some(ValueType::Text) | None => {
                ColumnData::Text(cells.iter().map(Cell::render).collect())
            }
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnData::Text(v) => v.len(),
            ColumnData::Number(v) => v.len(),
            ColumnData::DateTime(v) => v.len(),
            ColumnData::Bool(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            ColumnData::Text(_) => ValueType::Text,
            ColumnData::Number(_) => ValueType::Number,
            ColumnData::DateTime(_) => ValueType::DateTime,
            ColumnData::Bool(_) => ValueType::Bool,
        }
    }

    /// Gather the given rows into a new column, in the given order.
    pub fn take(&self, indices: &[usize]) -> ColumnData {
        fn pick<T: Clone>(values: &[Option<T>], indices: &[usize]) -> Vec<Option<T>> {
            indices.iter().map(|&i| values[i].clone()).collect()
        }
        match self {
            ColumnData::Text(v) => ColumnData::Text(pick(v, indices)),
            ColumnData::Number(v) => ColumnData::Number(pick(v, indices)),
            ColumnData::DateTime(v) => ColumnData::DateTime(pick(v, indices)),
            ColumnData::Bool(v) => ColumnData::Bool(pick(v, indices)),
        }
    }

    /// Cell as shown in the data preview.
    pub fn display(&self, row: usize) -> String {
        match self {
            ColumnData::Text(v) => v[row].clone().unwrap_or_else(|| "None".to_string()),
            ColumnData::Number(v) => v[row].map_or_else(|| "NaN".to_string(), |n| n.to_string()),
            ColumnData::DateTime(v) => v[row].map_or_else(|| "NaT".to_string(), |d| d.to_string()),
            ColumnData::Bool(v) => v[row].map_or_else(
                || "None".to_string(),
                |b| if b { "True" } else { "False" }.to_string(),
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self { name: name.into(), data }
    }
}

/// An in-memory table: ordered named columns of equal length.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    /// Repeated names are renamed `name.1`, `name.2`, ... so every column stays addressable.
    pub fn new(mut columns: Vec<Column>) -> Self {
        debug_assert!(
            columns.windows(2).all(|w| w[0].data.len() == w[1].data.len()),
            "all columns must have the same row count"
        );
        dedupe_names(&mut columns);
        Self { columns }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, |c| c.data.len())
    }

    pub fn numbers(&self, name: &str) -> Option<&[Option<f64>]> {
        match self.column(name).map(|c| &c.data) {
            Some(ColumnData::Number(v)) => Some(v),
            _ => None,
        }
    }

    pub fn texts(&self, name: &str) -> Option<&[Option<String>]> {
        match self.column(name).map(|c| &c.data) {
            Some(ColumnData::Text(v)) => Some(v),
            _ => None,
        }
    }

    pub fn datetimes(&self, name: &str) -> Option<&[Option<NaiveDateTime>]> {
        match self.column(name).map(|c| &c.data) {
            Some(ColumnData::DateTime(v)) => Some(v),
            _ => None,
        }
    }

    /// New table holding only the given rows. `self` is left untouched.
    pub fn take_rows(&self, indices: &[usize]) -> Table {
        Table {
            columns: self
                .columns
                .iter()
                .map(|c| Column::new(c.name.clone(), c.data.take(indices)))
                .collect(),
        }
    }

    /// Create a Table from a JSON array of objects. Headers come from the first object.
    pub fn from_json(value: &Value) -> Result<Self, LoadError> {
        let array = value
            .as_array()
            .ok_or_else(|| LoadError::Json("input data must be an array of objects".into()))?;

        let first_obj = array
            .first()
            .ok_or(LoadError::Empty)?
            .as_object()
            .ok_or_else(|| LoadError::Json("items in array must be objects".into()))?;

        let headers: Vec<String> = first_obj.keys().cloned().collect();
        let mut cells: Vec<Vec<Cell>> = vec![Vec::with_capacity(array.len()); headers.len()];

        for item in array {
            let obj = item
                .as_object()
                .ok_or_else(|| LoadError::Json("items in array must be objects".into()))?;

            for (header, column) in headers.iter().zip(cells.iter_mut()) {
                let cell = match obj.get(header) {
                    Some(Value::String(s)) => Cell::Text(s.clone()),
                    Some(Value::Number(n)) => n.as_f64().map_or(Cell::Null, Cell::Number),
                    Some(Value::Bool(b)) => Cell::Bool(*b),
                    Some(Value::Null) | None => Cell::Null,
                    _ => {
                        return Err(LoadError::Json(format!(
                            "unsupported value type for field '{}'",
                            header
                        )))
                    }
                };
                column.push(cell);
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

    /// Plain-text rendering of the first `n` rows, index column first.
    pub fn format_preview(&self, n: usize) -> String {
        const MAX_CELL: usize = 24;
        let rows = n.min(self.row_count());

        let clip = |s: String| -> String {
            if s.chars().count() > MAX_CELL {
                let mut cut: String = s.chars().take(MAX_CELL - 3).collect();
                cut.push_str("...");
                cut
            } else {
                s
            }
        };

        let mut grid: Vec<Vec<String>> = Vec::with_capacity(self.columns.len() + 1);
        let mut index = vec![String::new()];
        index.extend((0..rows).map(|r| r.to_string()));
        grid.push(index);
        for column in &self.columns {
            let mut cells = vec![clip(column.name.clone())];
            cells.extend((0..rows).map(|r| clip(column.data.display(r))));
            grid.push(cells);
        }

        let widths: Vec<usize> = grid
            .iter()
            .map(|col| col.iter().map(|s| s.chars().count()).max().unwrap_or(0))
            .collect();

        let mut out = String::new();
        for row in 0..=rows {
            let line: Vec<String> = grid
                .iter()
                .zip(&widths)
                .map(|(col, &w)| format!("{:>w$}", col[row], w = w))
                .collect();
            let _ = writeln!(out, "{}", line.join("  ").trim_end());
        }
        let _ = write!(out, "[{} rows x {} columns]", self.row_count(), self.columns.len());
        out
    }
}

fn dedupe_names(columns: &mut [Column]) {
    let mut used: HashSet<String> = HashSet::with_capacity(columns.len());
    for column in columns.iter_mut() {
        if used.insert(column.name.clone()) {
            continue;
        }
        let mut suffix = 1;
        let renamed = loop {
            let candidate = format!("{}.{}", column.name, suffix);
            if !used.contains(&candidate) {
                break candidate;
            }
            suffix += 1;
        };
        log::debug!("duplicate column '{}' renamed to '{}'", column.name, renamed);
        used.insert(renamed.clone());
        column.name = renamed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_cells_uniform_numbers() {
        let data = ColumnData::from_cells(vec![Cell::Number(1.0), Cell::Null, Cell::Number(3.5)]);
        assert_eq!(data, ColumnData::Number(vec![Some(1.0), None, Some(3.5)]));
    }

    #[test]
    fn test_from_cells_mixed_falls_back_to_text() {
        let data = ColumnData::from_cells(vec![Cell::Number(1.0), Cell::Text("x".into())]);
        assert_eq!(
            data,
            ColumnData::Text(vec![Some("1".to_string()), Some("x".to_string())])
        );
    }

    #[test]
    fn test_from_cells_infinite_numbers_are_null() {
        let data = ColumnData::from_cells(vec![
            Cell::Number(f64::INFINITY),
            Cell::Number(2.0),
            Cell::Number(f64::NEG_INFINITY),
        ]);
        assert_eq!(data, ColumnData::Number(vec![None, Some(2.0), None]));
    }

    #[test]
    fn test_duplicate_names_get_suffixes() {
        let table = Table::new(vec![
            Column::new("x", ColumnData::Number(vec![Some(1.0)])),
            Column::new("x", ColumnData::Text(vec![Some("a".into())])),
            Column::new("x", ColumnData::Number(vec![Some(2.0)])),
        ]);
        let names: Vec<&str> = table.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["x", "x.1", "x.2"]);
        assert_eq!(table.texts("x.1").unwrap(), &[Some("a".to_string())]);
    }

    #[test]
    fn test_from_cells_all_null_is_numeric() {
        let data = ColumnData::from_cells(vec![Cell::Null, Cell::Null]);
        assert_eq!(data.value_type(), ValueType::Number);
    }

    #[test]
    fn test_from_json() {
        let value = json!([
            {"region": "A", "sales": 10, "active": true},
            {"region": "B", "sales": null, "active": false}
        ]);
        let table = Table::from_json(&value).unwrap();
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.numbers("sales").unwrap(), &[Some(10.0), None]);
        assert_eq!(
            table.texts("region").unwrap(),
            &[Some("A".to_string()), Some("B".to_string())]
        );
        assert_eq!(
            table.column("active").unwrap().data.value_type(),
            ValueType::Bool
        );
    }

    #[test]
    fn test_from_json_not_array() {
        let result = Table::from_json(&json!({"a": 1}));
        assert!(matches!(result, Err(LoadError::Json(_))));
    }

    #[test]
    fn test_from_json_empty_array() {
        let result = Table::from_json(&json!([]));
        assert!(matches!(result, Err(LoadError::Empty)));
    }

    #[test]
    fn test_take_rows_leaves_source_untouched() {
        let table = Table::new(vec![Column::new(
            "n",
            ColumnData::Number(vec![Some(1.0), Some(2.0), Some(3.0)]),
        )]);
        let picked = table.take_rows(&[2, 0]);
        assert_eq!(picked.numbers("n").unwrap(), &[Some(3.0), Some(1.0)]);
        assert_eq!(table.row_count(), 3);
    }

    #[test]
    fn test_format_preview() {
        let table = Table::new(vec![
            Column::new("region", ColumnData::Text(vec![Some("A".into()), None])),
            Column::new("sales", ColumnData::Number(vec![Some(10.0), None])),
        ]);
        let preview = table.format_preview(5);
        assert!(preview.contains("region"));
        assert!(preview.contains("None"));
        assert!(preview.contains("NaN"));
        assert!(preview.ends_with("[2 rows x 2 columns]"));
    }
}
