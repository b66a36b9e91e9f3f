use crate::data::{Table, ValueType};

/// Column names partitioned by semantic type, in table order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColumnClassification {
    pub categorical: Vec<String>,
    pub numeric: Vec<String>,
    pub datetime: Vec<String>,
}

impl ColumnClassification {
    pub fn is_categorical(&self, name: &str) -> bool {
        self.categorical.iter().any(|c| c == name)
    }

    pub fn is_numeric(&self, name: &str) -> bool {
        self.numeric.iter().any(|c| c == name)
    }

    pub fn is_datetime(&self, name: &str) -> bool {
        self.datetime.iter().any(|c| c == name)
    }
}

/// Classify every column by its declared value type. Bool columns belong to no set.
pub fn classify(table: &Table) -> ColumnClassification {
    let mut classification = ColumnClassification::default();
    for column in table.columns() {
        let bucket = match column.data.value_type() {
            ValueType::Text => &mut classification.categorical,
            ValueType::Number => &mut classification.numeric,
            ValueType::DateTime => &mut classification.datetime,
            ValueType::Bool => continue,
        };
        bucket.push(column.name.clone());
    }
    classification
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Column, ColumnData};

    fn make_table() -> Table {
        Table::new(vec![
            Column::new("region", ColumnData::Text(vec![Some("A".into())])),
            Column::new("sales", ColumnData::Number(vec![Some(1.0)])),
            Column::new("flag", ColumnData::Bool(vec![Some(true)])),
            Column::new("when", ColumnData::DateTime(vec![None])),
            Column::new("units", ColumnData::Number(vec![None])),
        ])
    }

    #[test]
    fn test_classify_partitions_by_type() {
        let classes = classify(&make_table());
        assert_eq!(classes.categorical, vec!["region"]);
        assert_eq!(classes.numeric, vec!["sales", "units"]);
        assert_eq!(classes.datetime, vec!["when"]);
        assert!(!classes.is_categorical("flag"));
        assert!(!classes.is_numeric("flag"));
    }

    #[test]
    fn test_classify_is_idempotent() {
        let table = make_table();
        assert_eq!(classify(&table), classify(&table));
    }

    #[test]
    fn test_classify_empty_table() {
        let classes = classify(&Table::default());
        assert_eq!(classes, ColumnClassification::default());
    }
}
