//! Descriptive statistics over nullable numeric columns.

use std::fmt::Write as _;

/// The `describe` row for one numeric column. Quantiles use linear interpolation.
#[derive(Debug, Clone, PartialEq)]
pub struct Describe {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

/// Summarise the non-null values of a column. Statistics of an empty column are NaN;
/// `std` needs at least two values.
pub fn describe(column: &str, values: &[Option<f64>]) -> Describe {
    let mut sorted: Vec<f64> = values.iter().flatten().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let count = sorted.len();
    let (min, max) = match (sorted.first(), sorted.last()) {
        (Some(&lo), Some(&hi)) => (lo, hi),
        _ => (f64::NAN, f64::NAN),
    };

    Describe {
        column: column.to_string(),
        count,
        mean: mean(&sorted),
        std: sample_std(&sorted),
        min,
        q25: percentile(&sorted, 0.25),
        median: percentile(&sorted, 0.50),
        q75: percentile(&sorted, 0.75),
        max,
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn sample_std(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let variance = values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (n - 1) as f64;
    variance.sqrt()
}

/// Quantile `q` in [0, 1] of ascending `sorted` data, interpolating between the two
/// nearest ranks. NaN when empty.
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    let Some(&last) = sorted.last() else {
        return f64::NAN;
    };
    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let below = position.floor() as usize;
    match sorted.get(below + 1) {
        Some(&next) => {
            let base = sorted[below];
            base + (next - base) * position.fract()
        }
        None => last,
    }
}

/// Pearson correlation over the rows where both values are present and finite.
/// NaN with fewer than two complete rows or when either side has zero variance.
pub fn pearson(a: &[Option<f64>], b: &[Option<f64>]) -> f64 {
    let pairs: Vec<(f64, f64)> = a
        .iter()
        .zip(b)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .collect();

    if pairs.len() < 2 {
        return f64::NAN;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for &(x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return f64::NAN;
    }
    (cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0)
}

/// Transposed describe table: one row per column.
pub fn format_describe(rows: &[Describe]) -> String {
    let name_width = rows
        .iter()
        .map(|r| r.column.chars().count())
        .max()
        .unwrap_or(0)
        .max(6);

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<name_width$} {:>8} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12}",
        "", "count", "mean", "std", "min", "25%", "50%", "75%", "max",
    );
    for r in rows {
        let _ = writeln!(
            out,
            "{:<name_width$} {:>8} {:>12.4} {:>12.4} {:>12.4} {:>12.4} {:>12.4} {:>12.4} {:>12.4}",
            r.column, r.count, r.mean, r.std, r.min, r.q25, r.median, r.q75, r.max,
        );
    }
    out
}
