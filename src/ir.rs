use chrono::NaiveDateTime;
use std::fmt;

// =============================================================================
// Selection
// =============================================================================

/// The chart kinds the dispatcher knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ChartKind {
    Pie,
    Bar,
    Histogram,
    Line,
    #[value(alias = "correlation")]
    Heatmap,
}

impl ChartKind {
    /// Natural figure size in pixels (100 px per inch).
    pub fn default_size(self) -> (u32, u32) {
        match self {
            ChartKind::Pie => (500, 500),
            ChartKind::Bar | ChartKind::Line => (800, 400),
            ChartKind::Histogram => (600, 400),
            ChartKind::Heatmap => (800, 600),
        }
    }

    /// Short name used in output file names.
    pub fn slug(self) -> &'static str {
        match self {
            ChartKind::Pie => "pie",
            ChartKind::Bar => "bar",
            ChartKind::Histogram => "histogram",
            ChartKind::Line => "line",
            ChartKind::Heatmap => "heatmap",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ChartKind::Pie => "Pie Chart",
            ChartKind::Bar => "Bar Chart",
            ChartKind::Histogram => "Histogram",
            ChartKind::Line => "Line Chart",
            ChartKind::Heatmap => "Correlation Heatmap",
        };
        f.write_str(label)
    }
}

/// The user's choices for one generate action. Unset fields fall back to defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub kind: ChartKind,
    pub group_column: Option<String>,
    pub numeric_columns: Vec<String>,
    pub datetime_column: Option<String>,
}

impl Selection {
    pub fn new(kind: ChartKind) -> Self {
        Self {
            kind,
            group_column: None,
            numeric_columns: Vec::new(),
            datetime_column: None,
        }
    }

    pub fn group_by(mut self, column: impl Into<String>) -> Self {
        self.group_column = Some(column.into());
        self
    }

    pub fn numeric(mut self, columns: &[&str]) -> Self {
        self.numeric_columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn over_time(mut self, column: impl Into<String>) -> Self {
        self.datetime_column = Some(column.into());
        self
    }
}

/// A selection validated against the table, with defaults filled in.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSelection {
    pub kind: ChartKind,
    pub group_column: Option<String>,
    pub numeric_columns: Vec<String>,
    pub datetime_column: Option<String>,
}

// =============================================================================
// Chart plans
// =============================================================================

/// Everything needed to draw one chart, computed from the table.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartPlan {
    pub kind: ChartKind,
    pub title: String,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    /// Numeric column plotted; None for the heatmap.
    pub column: Option<String>,
    pub data: ChartData,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartData {
    /// Wedges in category order.
    Pie { labels: Vec<String>, values: Vec<f64> },
    /// Bars in drawing order.
    Bar { categories: Vec<String>, values: Vec<f64> },
    Histogram { bins: Vec<HistogramBin> },
    /// Runs of consecutive points; the line is broken between runs.
    Line { segments: Vec<Vec<(NaiveDateTime, f64)>> },
    /// Square matrix, `matrix[i][j]` is corr(labels[i], labels[j]).
    Heatmap { labels: Vec<String>, matrix: Vec<Vec<f64>> },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

impl ChartData {
    /// True when there is nothing to draw.
    pub fn is_empty(&self) -> bool {
        match self {
            ChartData::Pie { values, .. } => values.iter().all(|v| *v == 0.0),
            ChartData::Bar { categories, .. } => categories.is_empty(),
            ChartData::Histogram { bins } => bins.iter().all(|b| b.count == 0),
            ChartData::Line { segments } => segments.iter().all(|s| s.is_empty()),
            ChartData::Heatmap { labels, .. } => labels.is_empty(),
        }
    }
}

/// A chart encoded as PNG.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedChart {
    pub kind: ChartKind,
    pub title: String,
    pub column: Option<String>,
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
}

impl RenderedChart {
    /// File name for the inline copy of this chart, e.g. `bar-sales.png`.
    pub fn file_name(&self) -> String {
        match &self.column {
            Some(column) => {
                let safe: String = column
                    .chars()
                    .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
                    .collect();
                format!("{}-{}.png", self.kind.slug(), safe)
            }
            None => format!("{}.png", self.kind.slug()),
        }
    }
}
