use crate::ir::HistogramBin;
use crate::stats::pearson;
use chrono::NaiveDateTime;
use std::collections::BTreeMap;

/// Sum `values` per distinct non-null `keys` value, keys in ascending order.
///
/// Rows with a null key are dropped. Null and non-finite values count as zero, so a
/// group whose values are all missing still appears with a sum of 0.
pub fn group_sum(keys: &[Option<String>], values: &[Option<f64>]) -> Vec<(String, f64)> {
    let mut groups: BTreeMap<&str, f64> = BTreeMap::new();
    for (key, value) in keys.iter().zip(values) {
        if let Some(key) = key {
            let value = value.filter(|v| v.is_finite()).unwrap_or(0.0);
            *groups.entry(key.as_str()).or_insert(0.0) += value;
        }
    }
    groups.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

/// Order groups by sum, largest first. Ties keep their key order.
pub fn sort_descending(mut groups: Vec<(String, f64)>) -> Vec<(String, f64)> {
    groups.sort_by(|a, b| b.1.total_cmp(&a.1));
    groups
}

/// Equal-width bins over [min, max] of the non-null values. The last bin is closed.
pub fn histogram_bins(values: &[Option<f64>], bin_count: usize) -> Vec<HistogramBin> {
    let data: Vec<f64> = values.iter().flatten().copied().filter(|v| v.is_finite()).collect();
    if data.is_empty() || bin_count == 0 {
        return Vec::new();
    }

    let mut min = data.iter().fold(f64::INFINITY, |a, &b| a.min(b));
    let mut max = data.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
    if min == max {
        min -= 0.5;
        max += 0.5;
    }
    let width = (max - min) / bin_count as f64;

    let mut counts = vec![0usize; bin_count];
    for v in data {
        let idx = (((v - min) / width).floor() as usize).min(bin_count - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            start: min + i as f64 * width,
            end: if i + 1 == bin_count { max } else { min + (i + 1) as f64 * width },
            count,
        })
        .collect()
}

/// Line segments of (time, value) in time order.
///
/// Rows without a time are skipped. A missing or non-finite value breaks the line,
/// so each returned segment is a run of consecutive present values.
pub fn line_segments(
    times: &[Option<NaiveDateTime>],
    values: &[Option<f64>],
) -> Vec<Vec<(NaiveDateTime, f64)>> {
    let mut rows: Vec<(NaiveDateTime, Option<f64>)> = times
        .iter()
        .zip(values)
        .filter_map(|(t, v)| Some(((*t)?, v.filter(|v| v.is_finite()))))
        .collect();
    rows.sort_by_key(|row| row.0);

    let mut segments = Vec::new();
    let mut current = Vec::new();
    for (time, value) in rows {
        match value {
            Some(v) => current.push((time, v)),
            None if !current.is_empty() => segments.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

/// Pairwise-complete Pearson matrix. Symmetric by construction.
pub fn correlation_matrix(columns: &[&[Option<f64>]]) -> Vec<Vec<f64>> {
    let n = columns.len();
    let mut matrix = vec![vec![f64::NAN; n]; n];
    for i in 0..n {
        for j in i..n {
            let r = if i == j {
                // 1 unless the column is constant or too short
                let r = pearson(columns[i], columns[i]);
                if r.is_nan() { r } else { 1.0 }
            } else {
                pearson(columns[i], columns[j])
            };
            matrix[i][j] = r;
            matrix[j][i] = r;
        }
    }
    matrix
}
