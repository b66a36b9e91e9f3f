use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tabviz::export::{export_current, write_charts};
use tabviz::filter::RowFilter;
use tabviz::stats::format_describe;
use tabviz::theme::ThemePreset;
use tabviz::{ChartKind, Config, ConfigError, Selection, Session};

#[derive(Parser, Debug)]
#[command(name = "tabviz")]
#[command(about = "Explore a CSV, spreadsheet or JSON table and export charts as PNG", long_about = None)]
struct Args {
    /// Data file (.csv, .xlsx, .xls, .ods or .json)
    file: PathBuf,

    /// Chart to generate; without it only the preview and detected columns are shown
    #[arg(short, long, value_enum)]
    chart: Option<ChartKind>,

    /// Categorical column to group by (pie, bar)
    #[arg(short, long)]
    group: Option<String>,

    /// Numeric columns, comma separated
    #[arg(short = 'y', long, value_delimiter = ',')]
    columns: Vec<String>,

    /// Datetime column (line)
    #[arg(short, long)]
    time: Option<String>,

    /// Keep only rows where COLUMN equals VALUE
    #[arg(short, long, value_name = "COLUMN=VALUE")]
    filter: Option<String>,

    #[arg(long, value_enum)]
    theme: Option<ThemePreset>,

    /// Print summary statistics for these numeric columns (default: first numeric column)
    #[arg(long, value_delimiter = ',', num_args = 0..)]
    summary: Option<Vec<String>>,

    /// Rows of data preview
    #[arg(long, default_value_t = 5)]
    preview: usize,

    /// Directory for chart.png and the per-chart images
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// JSON file with render and load options
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(theme) = args.theme {
        config.render.theme = theme;
    }

    let mut session = Session::new(config);
    if let Err(e) = session.load_file(&args.file) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    println!("Loaded file: {}", session.source().unwrap_or_default());
    if let Some(table) = session.table() {
        println!("{}", table.format_preview(args.preview));
    }

    let classes = session.classification();
    println!("Detected Columns:");
    println!("  Categorical: {}", classes.categorical.join(", "));
    println!("  Numeric: {}", classes.numeric.join(", "));
    println!("  Datetime: {}", classes.datetime.join(", "));

    if let Some(expr) = &args.filter {
        match RowFilter::parse(expr).and_then(|f| session.apply_filter(f)) {
            Ok(()) => {
                if let Some(f) = session.filter() {
                    println!("Filtered by {} = {}", f.column, f.value);
                    if session.table().map_or(0, |t| t.row_count()) == 0 {
                        eprintln!(
                            "Warning: no rows have {} = {} (values: {})",
                            f.column,
                            f.value,
                            session.filter_values(&f.column).join(", ")
                        );
                    }
                }
            }
            Err(e) => warn(&e),
        }
    }

    if let Some(columns) = &args.summary {
        match session.summary(columns) {
            Ok(rows) => {
                println!("Summary Statistics:");
                print!("{}", format_describe(&rows));
            }
            Err(e) => warn(&e),
        }
    }

    let Some(kind) = args.chart else {
        return Ok(());
    };

    let mut selection = Selection::new(kind);
    selection.group_column = args.group.clone();
    selection.numeric_columns = args.columns.clone();
    selection.datetime_column = args.time.clone();

    let generated = match session.generate(&selection) {
        Ok(generated) => generated,
        Err(e) => match e.downcast_ref::<ConfigError>() {
            Some(config_error) => {
                warn(config_error);
                return Ok(());
            }
            None => return Err(e),
        },
    };

    println!("Insights:");
    for line in &generated.insights {
        println!("  {}", line);
    }

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("Failed to create '{}'", args.out_dir.display()))?;
    for path in write_charts(&generated.charts, &args.out_dir)? {
        println!("Wrote {}", path.display());
    }
    if let Some(path) = export_current(&session, &args.out_dir)? {
        println!("Exported {}", path.display());
    }

    Ok(())
}

fn warn(error: &ConfigError) {
    log::warn!("{}", error);
    eprintln!("Warning: {}", error);
}
