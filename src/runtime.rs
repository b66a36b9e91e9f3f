// Chart dispatch: selection -> chart plans -> rendered PNGs

use crate::classify::ColumnClassification;
use crate::config::RenderOptions;
use crate::data::Table;
use crate::error::ConfigError;
use crate::graph::Canvas;
use crate::ir::{ChartData, ChartKind, ChartPlan, RenderedChart, ResolvedSelection, Selection};
use crate::transform;
use anyhow::{Context, Result};

/// Validate a selection against the table and fill in the defaults
/// (first categorical, first numeric, first datetime column).
pub fn resolve_selection(
    table: &Table,
    classes: &ColumnClassification,
    selection: &Selection,
) -> Result<ResolvedSelection, ConfigError> {
    let check = |name: &str, ok: bool, err: fn(String) -> ConfigError| {
        if table.column(name).is_none() {
            Err(ConfigError::UnknownColumn(name.to_string()))
        } else if !ok {
            Err(err(name.to_string()))
        } else {
            Ok(())
        }
    };

    let kind = selection.kind;

    let group_column = match kind {
        ChartKind::Pie | ChartKind::Bar => {
            let column = match &selection.group_column {
                Some(c) => c.clone(),
                None => classes
                    .categorical
                    .first()
                    .cloned()
                    .ok_or(ConfigError::NoCategoricalColumn)?,
            };
            check(&column, classes.is_categorical(&column), ConfigError::NotCategorical)?;
            Some(column)
        }
        _ => None,
    };

    let datetime_column = match kind {
        ChartKind::Line => {
            let column = match &selection.datetime_column {
                Some(c) => c.clone(),
                None => classes
                    .datetime
                    .first()
                    .cloned()
                    .ok_or(ConfigError::NoDatetimeColumn)?,
            };
            check(&column, classes.is_datetime(&column), ConfigError::NotDatetime)?;
            Some(column)
        }
        _ => None,
    };

    let numeric_columns = if kind == ChartKind::Heatmap {
        // the heatmap always spans every numeric column
        if classes.numeric.len() < 2 {
            return Err(ConfigError::TooFewNumericColumns(classes.numeric.len()));
        }
        classes.numeric.clone()
    } else {
        let columns = if selection.numeric_columns.is_empty() {
            classes.numeric.iter().take(1).cloned().collect::<Vec<_>>()
        } else {
            selection.numeric_columns.clone()
        };
        if columns.is_empty() {
            return Err(ConfigError::NoNumericColumns);
        }
        for column in &columns {
            check(column, classes.is_numeric(column), ConfigError::NotNumeric)?;
        }
        columns
    };

    Ok(ResolvedSelection {
        kind,
        group_column,
        numeric_columns,
        datetime_column,
    })
}

/// Compute the data of every chart the selection asks for: one per numeric column,
/// or a single plan for the heatmap.
pub fn plan_charts(
    table: &Table,
    selection: &ResolvedSelection,
    bins: usize,
) -> Result<Vec<ChartPlan>, ConfigError> {
    let numbers = |name: &str| {
        table
            .numbers(name)
            .ok_or_else(|| ConfigError::NotNumeric(name.to_string()))
    };

    let mut plans = Vec::new();
    match selection.kind {
        ChartKind::Pie | ChartKind::Bar => {
            let group = selection
                .group_column
                .as_deref()
                .ok_or(ConfigError::NoCategoricalColumn)?;
            let keys = table
                .texts(group)
                .ok_or_else(|| ConfigError::NotCategorical(group.to_string()))?;

            for column in &selection.numeric_columns {
                let groups = transform::group_sum(keys, numbers(column)?);

                let plan = if selection.kind == ChartKind::Pie {
                    if groups.iter().any(|g| g.1 < 0.0) {
                        return Err(ConfigError::NegativePieValues(column.clone()));
                    }
                    let (labels, values) = groups.into_iter().unzip();
                    ChartPlan {
                        kind: ChartKind::Pie,
                        title: format!("{} distribution across {}", column, group),
                        x_label: None,
                        y_label: None,
                        column: Some(column.clone()),
                        data: ChartData::Pie { labels, values },
                    }
                } else {
                    let (categories, values) =
                        transform::sort_descending(groups).into_iter().unzip();
                    ChartPlan {
                        kind: ChartKind::Bar,
                        title: format!("{} sum by {}", column, group),
                        x_label: Some(group.to_string()),
                        y_label: Some(format!("Sum of {}", column)),
                        column: Some(column.clone()),
                        data: ChartData::Bar { categories, values },
                    }
                };
                plans.push(plan);
            }
        }
        ChartKind::Histogram => {
            for column in &selection.numeric_columns {
                plans.push(ChartPlan {
                    kind: ChartKind::Histogram,
                    title: format!("Histogram of {}", column),
                    x_label: None,
                    y_label: Some("Frequency".to_string()),
                    column: Some(column.clone()),
                    data: ChartData::Histogram {
                        bins: transform::histogram_bins(numbers(column)?, bins),
                    },
                });
            }
        }
        ChartKind::Line => {
            let time = selection
                .datetime_column
                .as_deref()
                .ok_or(ConfigError::NoDatetimeColumn)?;
            let times = table
                .datetimes(time)
                .ok_or_else(|| ConfigError::NotDatetime(time.to_string()))?;

            for column in &selection.numeric_columns {
                plans.push(ChartPlan {
                    kind: ChartKind::Line,
                    title: format!("{} over time ({})", column, time),
                    x_label: Some(time.to_string()),
                    y_label: Some(column.clone()),
                    column: Some(column.clone()),
                    data: ChartData::Line {
                        segments: transform::line_segments(times, numbers(column)?),
                    },
                });
            }
        }
        ChartKind::Heatmap => {
            let columns = selection
                .numeric_columns
                .iter()
                .map(|c| numbers(c))
                .collect::<Result<Vec<_>, _>>()?;
            plans.push(ChartPlan {
                kind: ChartKind::Heatmap,
                title: "Correlation Heatmap".to_string(),
                x_label: None,
                y_label: None,
                column: None,
                data: ChartData::Heatmap {
                    labels: selection.numeric_columns.clone(),
                    matrix: transform::correlation_matrix(&columns),
                },
            });
        }
    }

    log::debug!("planned {} {} chart(s)", plans.len(), selection.kind);
    Ok(plans)
}

/// Draw one plan and encode it as PNG.
pub fn render_plan(plan: &ChartPlan, options: &RenderOptions) -> Result<RenderedChart> {
    let (width, height) = options.size_or(plan.kind.default_size());
    let mut canvas = Canvas::new(width, height, options.theme.resolve());

    match &plan.data {
        data if data.is_empty() => canvas.draw_empty(plan)?,
        ChartData::Pie { labels, values } => canvas.draw_pie(&plan.title, labels, values)?,
        ChartData::Bar { categories, values } => canvas.draw_bars(plan, categories, values)?,
        ChartData::Histogram { bins } => canvas.draw_histogram(plan, bins)?,
        ChartData::Line { segments } => canvas.draw_line(plan, segments)?,
        ChartData::Heatmap { labels, matrix } => {
            canvas.draw_heatmap(&plan.title, labels, matrix)?
        }
    }

    let (png, width, height) = canvas
        .render(options.padding)
        .with_context(|| format!("Failed to render '{}'", plan.title))?;

    Ok(RenderedChart {
        kind: plan.kind,
        title: plan.title.clone(),
        column: plan.column.clone(),
        width,
        height,
        png,
    })
}

pub fn render_plans(plans: &[ChartPlan], options: &RenderOptions) -> Result<Vec<RenderedChart>> {
    plans.iter().map(|p| render_plan(p, options)).collect()
}
