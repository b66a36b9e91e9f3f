use crate::ir::{ChartPlan, HistogramBin};
use crate::theme::{category_color, diverging_color, ResolvedText, ResolvedTheme};
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime};
use image::ImageEncoder;
use plotters::chart::MeshStyle;
use plotters::coord::ranged1d::Ranged;
use plotters::element::Pie;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

/// Width of the color bar strip next to the heatmap
const COLOR_BAR_WIDTH: u32 = 110;

/// A single-figure RGB canvas. One chart is drawn per canvas.
pub struct Canvas {
    buffer: Vec<u8>,
    width: u32,
    height: u32,
    theme: ResolvedTheme,
}

impl Canvas {
    pub fn new(width: u32, height: u32, theme: ResolvedTheme) -> Self {
        Canvas {
            buffer: vec![0u8; (width * height * 3) as usize],
            width,
            height,
            theme,
        }
    }

    /// Caption and an empty panel with a "No data" message.
    pub fn draw_empty(&mut self, plan: &ChartPlan) -> Result<()> {
        let theme = &self.theme;
        let root = BitMapBackend::with_buffer(&mut self.buffer, (self.width, self.height))
            .into_drawing_area();
        root.fill(&theme.plot_background).context("Failed to fill background")?;

        let area = root
            .titled(&plan.title, text_style(&theme.plot_title))
            .context("Failed to draw title")?;
        area.fill(&theme.panel_background).context("Failed to fill panel")?;

        let (w, h) = area.dim_in_pixel();
        area.draw(&Text::new(
            "No data",
            (w as i32 / 2, h as i32 / 2),
            text_style(&theme.axis_text).pos(Pos::new(HPos::Center, VPos::Center)),
        ))
        .context("Failed to draw message")?;

        root.present().context("Failed to present drawing")?;
        Ok(())
    }

    /// Pie with percentage labels, starting at twelve o'clock.
    pub fn draw_pie(&mut self, title: &str, labels: &[String], values: &[f64]) -> Result<()> {
        if labels.len() != values.len() {
            anyhow::bail!(
                "Labels and values must have the same length (labels: {}, values: {})",
                labels.len(),
                values.len()
            );
        }

        let theme = &self.theme;
        let root = BitMapBackend::with_buffer(&mut self.buffer, (self.width, self.height))
            .into_drawing_area();
        root.fill(&theme.plot_background).context("Failed to fill background")?;

        let area = root
            .titled(title, text_style(&theme.plot_title))
            .context("Failed to draw title")?;

        let (w, h) = area.dim_in_pixel();
        let center = (w as i32 / 2, h as i32 / 2);
        let radius = w.min(h) as f64 * 0.35;
        let colors: Vec<RGBColor> = (0..values.len()).map(category_color).collect();

        let mut pie = Pie::new(&center, &radius, values, &colors, labels);
        pie.start_angle(-90.0);
        pie.label_style(text_style(&theme.axis_text));
        pie.percentages(
            (theme.axis_text.family.as_str(), (radius * 0.09).max(10.0))
                .into_font()
                .color(&WHITE),
        );
        area.draw(&pie).context("Failed to draw pie")?;

        root.present().context("Failed to present drawing")?;
        Ok(())
    }

    /// Vertical bars in the given order, one per category.
    pub fn draw_bars(&mut self, plan: &ChartPlan, categories: &[String], values: &[f64]) -> Result<()> {
        if categories.len() != values.len() {
            anyhow::bail!(
                "Categories and values must have the same length (categories: {}, values: {})",
                categories.len(),
                values.len()
            );
        }
        if categories.is_empty() {
            anyhow::bail!("Cannot create bar chart with no data");
        }

        let theme = &self.theme;
        let root = BitMapBackend::with_buffer(&mut self.buffer, (self.width, self.height))
            .into_drawing_area();
        root.fill(&theme.plot_background).context("Failed to fill background")?;

        let n = categories.len() as i32;
        let y_range = value_range(values.iter().copied().chain([0.0]));

        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .caption(&plan.title, text_style(&theme.plot_title))
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d((0..n).into_segmented(), y_range)
            .context("Failed to build chart")?;

        chart
            .plotting_area()
            .fill(&theme.panel_background)
            .context("Failed to fill panel")?;

        let category_label = |x: &SegmentValue<i32>| match x {
            SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => categories
                .get(*i as usize)
                .cloned()
                .unwrap_or_default(),
            SegmentValue::Last => String::new(),
        };

        let mut mesh = chart.configure_mesh();
        apply_theme(&mut mesh, theme);
        mesh.disable_x_mesh()
            .x_labels(categories.len())
            .x_label_formatter(&category_label)
            .x_desc(plan.x_label.as_deref().unwrap_or(""))
            .y_desc(plan.y_label.as_deref().unwrap_or(""))
            .draw()
            .context("Failed to draw mesh")?;

        let color = category_color(0);
        chart
            .draw_series(values.iter().enumerate().map(|(i, &v)| {
                let i = i as i32;
                let mut bar = Rectangle::new(
                    [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), v)],
                    color.filled(),
                );
                bar.set_margin(0, 0, 8, 8);
                bar
            }))
            .context("Failed to draw bars")?;

        root.present().context("Failed to present drawing")?;
        Ok(())
    }

    pub fn draw_histogram(&mut self, plan: &ChartPlan, bins: &[HistogramBin]) -> Result<()> {
        let (Some(first), Some(last)) = (bins.first(), bins.last()) else {
            anyhow::bail!("Cannot create histogram with no bins");
        };

        let theme = &self.theme;
        let root = BitMapBackend::with_buffer(&mut self.buffer, (self.width, self.height))
            .into_drawing_area();
        root.fill(&theme.plot_background).context("Failed to fill background")?;

        let max_count = bins.iter().map(|b| b.count).max().unwrap_or(0) as f64;
        let x_range = first.start..last.end;
        let y_range = 0.0..(max_count * 1.05).max(1.0);

        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .caption(&plan.title, text_style(&theme.plot_title))
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x_range, y_range)
            .context("Failed to build chart")?;

        chart
            .plotting_area()
            .fill(&theme.panel_background)
            .context("Failed to fill panel")?;

        let mut mesh = chart.configure_mesh();
        apply_theme(&mut mesh, theme);
        mesh.y_desc(plan.y_label.as_deref().unwrap_or(""))
            .draw()
            .context("Failed to draw mesh")?;

        let fill = category_color(0);
        chart
            .draw_series(bins.iter().map(|b| {
                Rectangle::new([(b.start, 0.0), (b.end, b.count as f64)], fill.filled())
            }))
            .context("Failed to draw bins")?;
        chart
            .draw_series(bins.iter().filter(|b| b.count > 0).map(|b| {
                Rectangle::new(
                    [(b.start, 0.0), (b.end, b.count as f64)],
                    theme.plot_background.stroke_width(1),
                )
            }))
            .context("Failed to draw bin edges")?;

        root.present().context("Failed to present drawing")?;
        Ok(())
    }

    /// Line with circle markers against a time axis, broken between segments.
    pub fn draw_line(&mut self, plan: &ChartPlan, segments: &[Vec<(NaiveDateTime, f64)>]) -> Result<()> {
        if segments.iter().all(|s| s.is_empty()) {
            anyhow::bail!("Cannot create line chart with no data points");
        }

        let theme = &self.theme;
        let root = BitMapBackend::with_buffer(&mut self.buffer, (self.width, self.height))
            .into_drawing_area();
        root.fill(&theme.plot_background).context("Failed to fill background")?;

        let runs: Vec<Vec<(f64, f64)>> = segments
            .iter()
            .map(|segment| {
                segment
                    .iter()
                    .map(|(t, v)| (t.and_utc().timestamp_millis() as f64, *v))
                    .collect()
            })
            .collect();
        let x_range = padded_range(runs.iter().flatten().map(|p| p.0));
        let y_range = padded_range(runs.iter().flatten().map(|p| p.1));
        let span_ms = x_range.end - x_range.start;

        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .caption(&plan.title, text_style(&theme.plot_title))
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x_range, y_range)
            .context("Failed to build chart")?;

        chart
            .plotting_area()
            .fill(&theme.panel_background)
            .context("Failed to fill panel")?;

        let time_label = |x: &f64| format_time(*x, span_ms);

        let mut mesh = chart.configure_mesh();
        apply_theme(&mut mesh, theme);
        mesh.x_labels(6)
            .x_label_formatter(&time_label)
            .x_desc(plan.x_label.as_deref().unwrap_or(""))
            .y_desc(plan.y_label.as_deref().unwrap_or(""))
            .draw()
            .context("Failed to draw mesh")?;

        let color = category_color(0);
        for run in &runs {
            chart
                .draw_series(LineSeries::new(run.iter().copied(), color.stroke_width(2)))
                .context("Failed to draw line series")?;
        }
        chart
            .draw_series(runs.iter().flatten().map(|&p| Circle::new(p, 4, color.filled())))
            .context("Failed to draw markers")?;

        root.present().context("Failed to present drawing")?;
        Ok(())
    }

    /// Annotated square heatmap on a fixed [-1, 1] diverging scale, with a color bar.
    pub fn draw_heatmap(&mut self, title: &str, labels: &[String], matrix: &[Vec<f64>]) -> Result<()> {
        let n = labels.len();
        if n == 0 || matrix.len() != n || matrix.iter().any(|row| row.len() != n) {
            anyhow::bail!("Heatmap matrix must be square and match its labels");
        }

        let theme = &self.theme;
        let root = BitMapBackend::with_buffer(&mut self.buffer, (self.width, self.height))
            .into_drawing_area();
        root.fill(&theme.plot_background).context("Failed to fill background")?;

        let (main, bar) = root.split_horizontally(self.width.saturating_sub(COLOR_BAR_WIDTH));

        let side = n as i32;
        let mut chart = ChartBuilder::on(&main)
            .margin(10)
            .caption(title, text_style(&theme.plot_title))
            .x_label_area_size(40)
            .y_label_area_size(90)
            .build_cartesian_2d((0..side).into_segmented(), (0..side).into_segmented())
            .context("Failed to build chart")?;

        // row 0 is drawn at the top
        let label_at = |v: &SegmentValue<i32>, flip: bool| match v {
            SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => {
                let idx = if flip { side - 1 - *i } else { *i };
                usize::try_from(idx)
                    .ok()
                    .and_then(|idx| labels.get(idx))
                    .cloned()
                    .unwrap_or_default()
            }
            SegmentValue::Last => String::new(),
        };

        let x_label = |v: &SegmentValue<i32>| label_at(v, false);
        let y_label = |v: &SegmentValue<i32>| label_at(v, true);
        chart
            .configure_mesh()
            .disable_mesh()
            .x_labels(n)
            .y_labels(n)
            .x_label_formatter(&x_label)
            .y_label_formatter(&y_label)
            .axis_style(theme.plot_background)
            .label_style(text_style(&theme.axis_text))
            .draw()
            .context("Failed to draw mesh")?;

        let cells = matrix.iter().enumerate().flat_map(|(i, row)| {
            row.iter().enumerate().map(move |(j, &v)| (i as i32, j as i32, v))
        });

        chart
            .draw_series(cells.clone().map(|(i, j, v)| {
                let y = side - 1 - i;
                Rectangle::new(
                    [
                        (SegmentValue::Exact(j), SegmentValue::Exact(y)),
                        (SegmentValue::Exact(j + 1), SegmentValue::Exact(y + 1)),
                    ],
                    diverging_color(v).filled(),
                )
            }))
            .context("Failed to draw cells")?;

        let annotation = text_style(&theme.axis_text).pos(Pos::new(HPos::Center, VPos::Center));
        chart
            .draw_series(cells.map(|(i, j, v)| {
                let y = side - 1 - i;
                let text = if v.is_nan() { "nan".to_string() } else { format!("{:.2}", v) };
                Text::new(
                    text,
                    (SegmentValue::CenterOf(j), SegmentValue::CenterOf(y)),
                    annotation.clone(),
                )
            }))
            .context("Failed to draw annotations")?;

        draw_color_bar(&bar, theme)?;

        root.present().context("Failed to present drawing")?;
        Ok(())
    }

    /// Crop to the content bounding box plus `padding` and encode as PNG.
    /// Returns the bytes and the final dimensions.
    pub fn render(self, padding: u32) -> Result<(Vec<u8>, u32, u32)> {
        let background = self.theme.plot_background;
        let (pixels, width, height) = tight_bbox(
            &self.buffer,
            self.width,
            self.height,
            [background.0, background.1, background.2],
            padding,
        );

        let mut png_bytes = Vec::new();
        {
            let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
            encoder
                .write_image(&pixels, width, height, image::ColorType::Rgb8)
                .context("Failed to encode PNG")?;
        }

        Ok((png_bytes, width, height))
    }
}

fn text_style(text: &ResolvedText) -> TextStyle<'_> {
    (text.family.as_str(), text.size).into_font().color(&text.color)
}

/// Grid, axis and label styling shared by the cartesian charts.
fn apply_theme<'a, 'b, X, Y, DB>(mesh: &mut MeshStyle<'a, 'b, X, Y, DB>, theme: &'b ResolvedTheme)
where
    X: Ranged,
    Y: Ranged,
    DB: DrawingBackend,
{
    mesh.axis_style(theme.axis_line.color.stroke_width(theme.axis_line.width))
        .label_style(text_style(&theme.axis_text))
        .axis_desc_style(text_style(&theme.axis_text));

    match &theme.panel_grid_major {
        Some(line) => {
            mesh.bold_line_style(line.color.stroke_width(line.width));
        }
        None => {
            mesh.disable_mesh();
        }
    }
    match &theme.panel_grid_minor {
        Some(line) => {
            mesh.light_line_style(line.color.stroke_width(line.width));
        }
        None => {
            mesh.light_line_style(TRANSPARENT);
        }
    }
}

fn draw_color_bar(area: &DrawingArea<BitMapBackend, plotters::coord::Shift>, theme: &ResolvedTheme) -> Result<()> {
    const STEPS: usize = 100;

    let mut chart = ChartBuilder::on(area)
        .margin_top(50)
        .margin_bottom(50)
        .margin_right(10)
        .y_label_area_size(45)
        .build_cartesian_2d(0.0..1.0, -1.0..1.0)
        .context("Failed to build color bar")?;

    chart
        .configure_mesh()
        .disable_mesh()
        .disable_x_axis()
        .y_labels(5)
        .y_label_formatter(&|y| format!("{:.1}", y))
        .axis_style(theme.plot_background)
        .label_style(text_style(&theme.axis_text))
        .draw()
        .context("Failed to draw color bar axis")?;

    let step = 2.0 / STEPS as f64;
    chart
        .draw_series((0..STEPS).map(|k| {
            let lo = -1.0 + k as f64 * step;
            Rectangle::new([(0.0, lo), (1.0, lo + step)], diverging_color(lo + step / 2.0).filled())
        }))
        .context("Failed to draw color bar")?;
    Ok(())
}

/// Finite (min, max) of `values`, or None when there is no finite value.
fn finite_bounds(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .filter(|v| v.is_finite())
        .fold(None, |bounds, v| match bounds {
            None => Some((v, v)),
            Some((lo, hi)) => Some((f64::min(lo, v), f64::max(hi, v))),
        })
}

/// Range covering the finite `values` with 5% headroom on each side.
fn padded_range(values: impl Iterator<Item = f64>) -> std::ops::Range<f64> {
    let Some((min, max)) = finite_bounds(values) else {
        return 0.0..1.0;
    };
    if min == max {
        (min - 1.0)..(max + 1.0)
    } else {
        let padding = (max - min) * 0.05;
        (min - padding)..(max + padding)
    }
}

/// Like `padded_range`, but never pads below a zero baseline.
fn value_range(values: impl Iterator<Item = f64>) -> std::ops::Range<f64> {
    let Some((min, max)) = finite_bounds(values) else {
        return 0.0..1.0;
    };
    if min == max {
        return (min - 1.0)..(max + 1.0);
    }
    let padding = (max - min) * 0.05;
    let lo = if min < 0.0 { min - padding } else { min };
    let hi = if max > 0.0 { max + padding } else { max };
    lo..hi
}

/// Axis label for a millisecond timestamp; coarser formats for long spans.
fn format_time(ms: f64, span_ms: f64) -> String {
    const DAY_MS: f64 = 86_400_000.0;
    let Some(dt) = DateTime::from_timestamp_millis(ms as i64) else {
        return String::new();
    };
    let format = if span_ms >= 2.0 * DAY_MS {
        "%Y-%m-%d"
    } else if span_ms >= 60_000.0 {
        "%m-%d %H:%M"
    } else {
        "%H:%M:%S"
    };
    dt.naive_utc().format(format).to_string()
}

/// Trim rows and columns that only contain `background`, keeping `padding` pixels
/// on every side. An all-background image is returned unchanged.
pub fn tight_bbox(
    pixels: &[u8],
    width: u32,
    height: u32,
    background: [u8; 3],
    padding: u32,
) -> (Vec<u8>, u32, u32) {
    let (w, h) = (width as usize, height as usize);
    let is_content = |x: usize, y: usize| {
        let i = (y * w + x) * 3;
        pixels[i..i + 3] != background
    };

    let mut bounds: Option<(usize, usize, usize, usize)> = None;
    for y in 0..h {
        for x in 0..w {
            if is_content(x, y) {
                bounds = Some(match bounds {
                    None => (x, y, x, y),
                    Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
                });
            }
        }
    }

    let Some((x0, y0, x1, y1)) = bounds else {
        return (pixels.to_vec(), width, height);
    };

    let pad = padding as usize;
    let out_w = x1 - x0 + 1 + 2 * pad;
    let out_h = y1 - y0 + 1 + 2 * pad;
    let mut out = Vec::with_capacity(out_w * out_h * 3);
    for _ in 0..out_w * out_h {
        out.extend_from_slice(&background);
    }
    for y in y0..=y1 {
        let src = (y * w + x0) * 3;
        let len = (x1 - x0 + 1) * 3;
        let dst = ((y - y0 + pad) * out_w + pad) * 3;
        out[dst..dst + len].copy_from_slice(&pixels[src..src + len]);
    }

    (out, out_w as u32, out_h as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{ChartData, ChartKind};
    use crate::theme::ThemePreset;

    fn is_png(bytes: &[u8]) -> bool {
        bytes.len() > 8 && bytes[0..8] == [137, 80, 78, 71, 13, 10, 26, 10]
    }

    fn bar_plan() -> ChartPlan {
        ChartPlan {
            kind: ChartKind::Bar,
            title: "sales sum by region".into(),
            x_label: Some("region".into()),
            y_label: Some("Sum of sales".into()),
            column: Some("sales".into()),
            data: ChartData::Bar {
                categories: vec!["B".into(), "A".into()],
                values: vec![70.0, 30.0],
            },
        }
    }

    #[test]
    fn test_tight_bbox_crops_to_content() {
        // 5x4 white image with one red pixel at (2, 1)
        let mut pixels = vec![255u8; 5 * 4 * 3];
        let i = (5 + 2) * 3;
        pixels[i..i + 3].copy_from_slice(&[255, 0, 0]);

        let (out, w, h) = tight_bbox(&pixels, 5, 4, [255, 255, 255], 1);
        assert_eq!((w, h), (3, 3));
        assert_eq!(&out[(3 + 1) * 3..(3 + 1) * 3 + 3], &[255, 0, 0]);
    }

    #[test]
    fn test_tight_bbox_blank_image_unchanged() {
        let pixels = vec![255u8; 4 * 4 * 3];
        let (out, w, h) = tight_bbox(&pixels, 4, 4, [255, 255, 255], 2);
        assert_eq!((w, h), (4, 4));
        assert_eq!(out, pixels);
    }

    #[test]
    fn test_bar_render_is_cropped_png() {
        let mut canvas = Canvas::new(800, 400, ThemePreset::Whitegrid.resolve());
        let ChartData::Bar { categories, values } = bar_plan().data else {
            unreachable!()
        };
        canvas.draw_bars(&bar_plan(), &categories, &values).unwrap();
        let (png, w, h) = canvas.render(10).unwrap();
        assert!(is_png(&png));
        assert!(w <= 800 + 20 && h <= 400 + 20);
    }

    #[test]
    fn test_bar_length_mismatch() {
        let mut canvas = Canvas::new(800, 400, ThemePreset::Ticks.resolve());
        let result = canvas.draw_bars(&bar_plan(), &["A".to_string()], &[1.0, 2.0]);
        assert!(result.is_err());
    }

    #[test]
    fn test_heatmap_requires_square_matrix() {
        let mut canvas = Canvas::new(800, 600, ThemePreset::Darkgrid.resolve());
        let labels = vec!["a".to_string(), "b".to_string()];
        let result = canvas.draw_heatmap("Correlation Heatmap", &labels, &[vec![1.0, 0.5]]);
        assert!(result.is_err());
    }

    #[test]
    fn test_value_range_includes_zero_baseline() {
        let r = value_range([0.0, 10.0].into_iter());
        assert_eq!(r.start, 0.0);
        assert!(r.end > 10.0);
        let r = value_range([-5.0, 0.0].into_iter());
        assert!(r.start < -5.0);
        assert_eq!(r.end, 0.0);
    }

    #[test]
    fn test_ranges_ignore_non_finite_values() {
        let r = padded_range([1.0, f64::INFINITY, 3.0, f64::NAN].into_iter());
        assert!(r.start.is_finite() && r.end.is_finite());
        assert!(r.start < 1.0 && r.end > 3.0);

        let r = value_range([f64::NEG_INFINITY, 0.0, 4.0].into_iter());
        assert_eq!(r.start, 0.0);
        assert!(r.end.is_finite());

        assert_eq!(padded_range([f64::INFINITY].into_iter()), 0.0..1.0);
    }

    #[test]
    fn test_format_time_by_span() {
        let ms = 1_704_067_200_000.0; // 2024-01-01T00:00:00Z
        assert_eq!(format_time(ms, 10.0 * 86_400_000.0), "2024-01-01");
        assert_eq!(format_time(ms, 3_600_000.0), "01-01 00:00");
    }
}
