//! Theme presets
//!
//! Each cosmetic preset resolves into concrete, fully-specified styles that the
//! canvas applies. Presets never change chart data.
//!
//! ```text
//! whitegrid  white panel, light grey grid
//! darkgrid   grey panel, white grid
//! ticks      white panel, no grid, axis ticks only
//! ```

use plotters::style::RGBColor;
use serde::Deserialize;

/// User-selectable cosmetic preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreset {
    #[default]
    Whitegrid,
    Darkgrid,
    Ticks,
}

/// Fully resolved text style ready for rendering
#[derive(Debug, Clone)]
pub struct ResolvedText {
    pub family: String,
    pub color: RGBColor,
    pub size: f64,
}

/// Fully resolved line style ready for rendering
#[derive(Debug, Clone)]
pub struct ResolvedLine {
    pub color: RGBColor,
    pub width: u32,
}

/// Complete resolved theme with all elements fully specified
#[derive(Debug, Clone)]
pub struct ResolvedTheme {
    pub plot_background: RGBColor,
    pub panel_background: RGBColor,
    pub plot_title: ResolvedText,
    pub axis_text: ResolvedText,
    pub panel_grid_major: Option<ResolvedLine>, // None if blank
    pub panel_grid_minor: Option<ResolvedLine>, // None if blank
    pub axis_line: ResolvedLine,
}

impl Default for ResolvedText {
    fn default() -> Self {
        ResolvedText {
            family: "sans-serif".to_string(),
            color: RGBColor(0, 0, 0),
            size: 14.0,
        }
    }
}

impl ThemePreset {
    pub fn resolve(self) -> ResolvedTheme {
        let white = RGBColor(255, 255, 255);
        let plot_title = ResolvedText {
            size: 20.0,
            ..ResolvedText::default()
        };
        let axis_text = ResolvedText {
            color: RGBColor(51, 51, 51),
            ..ResolvedText::default()
        };

        match self {
            ThemePreset::Whitegrid => ResolvedTheme {
                plot_background: white,
                panel_background: white,
                plot_title,
                axis_text,
                panel_grid_major: Some(ResolvedLine {
                    color: RGBColor(204, 204, 204),
                    width: 1,
                }),
                panel_grid_minor: None,
                axis_line: ResolvedLine {
                    color: RGBColor(204, 204, 204),
                    width: 1,
                },
            },
            ThemePreset::Darkgrid => ResolvedTheme {
                plot_background: white,
                panel_background: RGBColor(234, 234, 242),
                plot_title,
                axis_text,
                panel_grid_major: Some(ResolvedLine { color: white, width: 1 }),
                panel_grid_minor: Some(ResolvedLine {
                    color: RGBColor(244, 244, 248),
                    width: 1,
                }),
                axis_line: ResolvedLine { color: white, width: 1 },
            },
            ThemePreset::Ticks => ResolvedTheme {
                plot_background: white,
                panel_background: white,
                plot_title,
                axis_text,
                panel_grid_major: None,
                panel_grid_minor: None,
                axis_line: ResolvedLine {
                    color: RGBColor(38, 38, 38),
                    width: 1,
                },
            },
        }
    }
}

// === Categorical palette ===

const CATEGORY10: [RGBColor; 10] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];

/// The i-th color of the category10 palette, cycling.
pub fn category_color(index: usize) -> RGBColor {
    CATEGORY10[index % CATEGORY10.len()]
}

/// Diverging blue-white-red color for a correlation in [-1, 1]. NaN maps to grey.
pub fn diverging_color(value: f64) -> RGBColor {
    if !value.is_finite() {
        return RGBColor(200, 200, 200);
    }
    let t = ((value.clamp(-1.0, 1.0) + 1.0) / 2.0).clamp(0.0, 1.0);
    // RED_BLUE runs red -> blue; flip so that -1 is blue and +1 is red
    let color = colorous::RED_BLUE.eval_continuous(1.0 - t);
    RGBColor(color.r, color.g, color.b)
}
