// Short text observations that accompany a generated chart

use crate::data::Table;
use crate::ir::{ChartKind, ResolvedSelection};
use crate::stats::describe;

pub const HEATMAP_INSIGHT: &str = "This heatmap highlights relationships between numeric features. \
Values near +1 or -1 show strong correlations.";

/// Insight lines for the charts produced by `selection`.
pub fn insights(kind: ChartKind, table: &Table, selection: &ResolvedSelection) -> Vec<String> {
    match kind {
        ChartKind::Pie => {
            let (Some(column), Some(group)) = (
                selection.numeric_columns.first(),
                selection.group_column.as_deref(),
            ) else {
                return Vec::new();
            };
            vec![format!(
                "Pie chart shows proportional distribution of {} across {}.",
                column, group
            )]
        }
        ChartKind::Heatmap => vec![HEATMAP_INSIGHT.to_string()],
        ChartKind::Bar | ChartKind::Line | ChartKind::Histogram => selection
            .numeric_columns
            .iter()
            .filter_map(|column| Some(column_insight(column, table.numbers(column)?)))
            .collect(),
    }
}

fn column_insight(column: &str, values: &[Option<f64>]) -> String {
    let stats = describe(column, values);
    if stats.count == 0 {
        return format!("For {}, there are no values to summarise.", column);
    }
    let trend = if stats.mean > stats.median { "increasing" } else { "stable" };
    format!(
        "For {}, average value is {:.2}, median is {:.2}, data shows a {} trend overall.",
        column, stats.mean, stats.median, trend
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Column, ColumnData};

    fn selection(kind: ChartKind, numeric: &[&str]) -> ResolvedSelection {
        ResolvedSelection {
            kind,
            group_column: Some("region".into()),
            numeric_columns: numeric.iter().map(|c| c.to_string()).collect(),
            datetime_column: None,
        }
    }

    fn table() -> Table {
        Table::new(vec![
            Column::new(
                "region",
                ColumnData::Text(vec![Some("A".into()), Some("B".into()), Some("B".into())]),
            ),
            Column::new("sales", ColumnData::Number(vec![Some(1.0), Some(2.0), Some(9.0)])),
            Column::new("flat", ColumnData::Number(vec![Some(5.0), Some(5.0), Some(5.0)])),
            Column::new("gone", ColumnData::Number(vec![None, None, None])),
        ])
    }

    #[test]
    fn test_bar_insight_text() {
        let lines = insights(ChartKind::Bar, &table(), &selection(ChartKind::Bar, &["sales", "flat"]));
        assert_eq!(
            lines,
            vec![
                "For sales, average value is 4.00, median is 2.00, data shows a increasing trend overall.",
                "For flat, average value is 5.00, median is 5.00, data shows a stable trend overall.",
            ]
        );
    }

    #[test]
    fn test_insight_matches_describe() {
        let table = table();
        let stats = describe("sales", table.numbers("sales").unwrap());
        let line = &insights(ChartKind::Histogram, &table, &selection(ChartKind::Histogram, &["sales"]))[0];
        assert!(line.contains(&format!("average value is {:.2}", stats.mean)));
        assert!(line.contains(&format!("median is {:.2}", stats.median)));
    }

    #[test]
    fn test_empty_column_insight() {
        let lines = insights(ChartKind::Line, &table(), &selection(ChartKind::Line, &["gone"]));
        assert_eq!(lines, vec!["For gone, there are no values to summarise."]);
    }

    #[test]
    fn test_pie_and_heatmap_insights() {
        let table = table();
        let pie = insights(ChartKind::Pie, &table, &selection(ChartKind::Pie, &["sales", "flat"]));
        assert_eq!(pie, vec!["Pie chart shows proportional distribution of sales across region."]);

        let heatmap = insights(ChartKind::Heatmap, &table, &selection(ChartKind::Heatmap, &["sales", "flat"]));
        assert_eq!(heatmap, vec![HEATMAP_INSIGHT.to_string()]);
    }
}
