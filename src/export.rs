use crate::ir::RenderedChart;
use crate::session::Session;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Fixed name of the downloadable copy of the current chart.
pub const EXPORT_FILE_NAME: &str = "chart.png";

/// Write the session's current chart to `dir/chart.png`.
/// Returns `None` without touching the filesystem when nothing has been rendered.
pub fn export_current(session: &Session, dir: &Path) -> Result<Option<PathBuf>> {
    let Some(chart) = session.current_chart() else {
        return Ok(None);
    };
    let path = dir.join(EXPORT_FILE_NAME);
    write_png(chart, &path)?;
    Ok(Some(path))
}

/// Write each chart under its own name (`bar-sales.png`, `heatmap.png`, ...).
pub fn write_charts(charts: &[RenderedChart], dir: &Path) -> Result<Vec<PathBuf>> {
    charts
        .iter()
        .map(|chart| {
            let path = dir.join(chart.file_name());
            write_png(chart, &path)?;
            Ok(path)
        })
        .collect()
}

fn write_png(chart: &RenderedChart, path: &Path) -> Result<()> {
    std::fs::write(path, &chart.png)
        .with_context(|| format!("Failed to write '{}'", path.display()))?;
    log::info!(
        "wrote {} ({}x{}) to {}",
        chart.title,
        chart.width,
        chart.height,
        path.display()
    );
    Ok(())
}
