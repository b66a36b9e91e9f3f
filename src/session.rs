//! One user's working state: the uploaded table, the active filter and the
//! most recently rendered chart.

use crate::classify::{classify, ColumnClassification};
use crate::config::Config;
use crate::data::Table;
use crate::error::{ConfigError, LoadError};
use crate::filter::{distinct_values, filter_rows, RowFilter};
use crate::insight::insights;
use crate::ir::{RenderedChart, Selection};
use crate::loader;
use crate::runtime;
use crate::stats::{describe, Describe};
use anyhow::Result;
use std::path::Path;

/// Charts and insight lines from one generate action.
#[derive(Debug, Clone)]
pub struct Generated {
    pub charts: Vec<RenderedChart>,
    pub insights: Vec<String>,
}

/// A loaded dataset with its classification. The filtered view and the
/// current chart are replaced, never merged.
#[derive(Debug, Default)]
pub struct Session {
    config: Config,
    source: Option<String>,
    data: Option<Table>,
    view: Option<Table>,
    classification: ColumnClassification,
    filter: Option<RowFilter>,
    current: Option<RenderedChart>,
}

impl Session {
    pub fn new(config: Config) -> Self {
        Session {
            config,
            ..Default::default()
        }
    }

    /// Replace the dataset with an uploaded file. The filter and current chart are reset.
    pub fn upload(&mut self, name: &str, bytes: &[u8]) -> Result<(), LoadError> {
        let table = loader::load_bytes(name, bytes, &self.config.load)?;
        self.install(name, table);
        Ok(())
    }

    pub fn load_file(&mut self, path: &Path) -> Result<(), LoadError> {
        let table = loader::load_file(path, &self.config.load)?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        self.install(&name, table);
        Ok(())
    }

    fn install(&mut self, name: &str, table: Table) {
        self.classification = classify(&table);
        log::debug!("classified columns: {:?}", self.classification);
        self.source = Some(name.to_string());
        self.data = Some(table);
        self.view = None;
        self.filter = None;
        self.current = None;
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// The table charts are drawn from: the filtered view if a filter is active.
    pub fn table(&self) -> Option<&Table> {
        self.view.as_ref().or(self.data.as_ref())
    }

    pub fn classification(&self) -> &ColumnClassification {
        &self.classification
    }

    pub fn filter(&self) -> Option<&RowFilter> {
        self.filter.as_ref()
    }

    /// Restrict later charts to rows matching `filter`. Always applied to the full
    /// dataset, so a second filter replaces the first.
    pub fn apply_filter(&mut self, filter: RowFilter) -> Result<(), ConfigError> {
        let data = self.data.as_ref().ok_or(ConfigError::NoTable)?;
        let view = filter_rows(data, &self.classification, &filter)?;
        self.classification = classify(&view);
        self.view = Some(view);
        self.filter = Some(filter);
        Ok(())
    }

    /// Values a filter on `column` can take, from the unfiltered dataset.
    pub fn filter_values(&self, column: &str) -> Vec<String> {
        self.data
            .as_ref()
            .map(|data| distinct_values(data, column))
            .unwrap_or_default()
    }

    pub fn clear_filter(&mut self) {
        self.view = None;
        self.filter = None;
    }

    /// Describe rows for `columns`, or for the first numeric column when empty.
    pub fn summary(&self, columns: &[String]) -> Result<Vec<Describe>, ConfigError> {
        let table = self.table().ok_or(ConfigError::NoTable)?;
        let columns: Vec<String> = if columns.is_empty() {
            self.classification.numeric.iter().take(1).cloned().collect()
        } else {
            columns.to_vec()
        };
        if columns.is_empty() {
            return Err(ConfigError::NoNumericColumns);
        }

        columns
            .iter()
            .map(|name| {
                if table.column(name).is_none() {
                    return Err(ConfigError::UnknownColumn(name.clone()));
                }
                let values = table
                    .numbers(name)
                    .ok_or_else(|| ConfigError::NotNumeric(name.clone()))?;
                Ok(describe(name, values))
            })
            .collect()
    }

    /// Build every chart the selection asks for. The last one becomes the current chart.
    ///
    /// Configuration problems come back as a [`ConfigError`] inside the `anyhow::Error`
    /// and leave the session unchanged.
    pub fn generate(&mut self, selection: &Selection) -> Result<Generated> {
        let table = self.table().ok_or(ConfigError::NoTable)?;
        let resolved = runtime::resolve_selection(table, &self.classification, selection)?;
        let plans = runtime::plan_charts(table, &resolved, self.config.render.bins)?;
        let charts = runtime::render_plans(&plans, &self.config.render)?;
        let insights = insights(resolved.kind, table, &resolved);

        if let Some(last) = charts.last() {
            self.current = Some(last.clone());
        }
        log::info!("generated {} {} chart(s)", charts.len(), resolved.kind);
        Ok(Generated { charts, insights })
    }

    /// The most recently rendered chart, if any.
    pub fn current_chart(&self) -> Option<&RenderedChart> {
        self.current.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ChartKind;

    const SALES: &[u8] = b"region,sales,units\nA,10,1\nA,20,2\nB,30,3\nB,40,5\n";

    fn session() -> Session {
        let mut session = Session::new(Config::default());
        session.upload("sales.csv", SALES).unwrap();
        session
    }

    #[test]
    fn test_upload_classifies() {
        let session = session();
        assert_eq!(session.source(), Some("sales.csv"));
        assert_eq!(session.classification().categorical, vec!["region"]);
        assert_eq!(session.classification().numeric, vec!["sales", "units"]);
        assert!(session.current_chart().is_none());
    }

    #[test]
    fn test_upload_rejects_unknown_extension() {
        let mut session = Session::new(Config::default());
        assert!(matches!(
            session.upload("notes.txt", b"a,b\n1,2\n"),
            Err(LoadError::UnsupportedFormat(_))
        ));
        assert!(session.table().is_none());
    }

    #[test]
    fn test_filter_replaces_previous_filter() {
        let mut session = session();
        session.apply_filter(RowFilter::parse("region=A").unwrap()).unwrap();
        assert_eq!(session.table().unwrap().row_count(), 2);
        session.apply_filter(RowFilter::parse("region=B").unwrap()).unwrap();
        assert_eq!(session.table().unwrap().row_count(), 2);
        assert_eq!(session.table().unwrap().numbers("sales").unwrap()[0], Some(30.0));
        assert_eq!(session.filter_values("region"), vec!["A", "B"]);
        session.clear_filter();
        assert_eq!(session.table().unwrap().row_count(), 4);
    }

    #[test]
    fn test_summary_defaults_to_first_numeric() {
        let session = session();
        let rows = session.summary(&[]).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].column, "sales");
        assert_eq!(rows[0].mean, 25.0);
        assert_eq!(
            session.summary(&["region".to_string()]),
            Err(ConfigError::NotNumeric("region".into()))
        );
    }

    #[test]
    fn test_generate_sets_current_to_last_chart() {
        let mut session = session();
        let generated = session
            .generate(&Selection::new(ChartKind::Bar).numeric(&["sales", "units"]))
            .unwrap();
        assert_eq!(generated.charts.len(), 2);
        assert_eq!(generated.insights.len(), 2);
        let current = session.current_chart().unwrap();
        assert_eq!(current.column.as_deref(), Some("units"));
    }

    #[test]
    fn test_config_error_keeps_session_usable() {
        let mut session = session();
        session.generate(&Selection::new(ChartKind::Histogram)).unwrap();

        let err = session.generate(&Selection::new(ChartKind::Line)).unwrap_err();
        assert_eq!(err.downcast_ref::<ConfigError>(), Some(&ConfigError::NoDatetimeColumn));
        assert_eq!(session.current_chart().unwrap().kind, ChartKind::Histogram);

        assert!(session.generate(&Selection::new(ChartKind::Pie)).is_ok());
        assert_eq!(session.current_chart().unwrap().kind, ChartKind::Pie);
    }

    #[test]
    fn test_infinite_cells_render() {
        let mut session = Session::new(Config::default());
        session
            .upload("p.csv", b"d,v\n2024-01-01,1\n2024-01-02,inf\n2024-01-03,2\n")
            .unwrap();
        let generated = session.generate(&Selection::new(ChartKind::Line)).unwrap();
        assert_eq!(generated.charts.len(), 1);

        session.upload("q.csv", b"k,v\na,inf\nb,-inf\na,1\n").unwrap();
        let generated = session.generate(&Selection::new(ChartKind::Bar)).unwrap();
        assert_eq!(generated.charts.len(), 1);
    }

    #[test]
    fn test_duplicate_headers_stay_addressable() {
        let mut session = Session::new(Config::default());
        session.upload("dup.csv", b"x,x\n1,a\n2,b\n").unwrap();
        assert_eq!(session.classification().numeric, vec!["x"]);
        assert_eq!(session.classification().categorical, vec!["x.1"]);
        assert!(session
            .generate(&Selection::new(ChartKind::Bar).group_by("x.1").numeric(&["x"]))
            .is_ok());
    }

    #[test]
    fn test_generate_without_upload() {
        let mut session = Session::new(Config::default());
        let err = session.generate(&Selection::new(ChartKind::Bar)).unwrap_err();
        assert_eq!(err.downcast_ref::<ConfigError>(), Some(&ConfigError::NoTable));
    }
}
