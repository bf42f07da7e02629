//! `salesgrid run | pivot | validate` — config-driven profitability reports.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::Args;
use salesgrid_report::engine::{load_input, prepare};
use salesgrid_report::write::{pivot_to_csv_string, summary_to_csv_string};
use salesgrid_report::{Report, ReportConfig, ReportError, ReportInput};

use crate::exit_codes::{
    report_exit_code, EXIT_CONFIG, EXIT_ERROR, EXIT_INPUT, EXIT_USAGE, EXIT_WRITE,
};
use crate::CliError;

/// Input selection shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// TOML config file; its relative paths resolve against its own directory
    #[arg(long, short, env = "SALESGRID_CONFIG")]
    pub config: Option<PathBuf>,

    /// Sales table (overrides [inputs].sales)
    #[arg(long)]
    pub sales: Option<PathBuf>,

    /// Product reference table (overrides [inputs].products)
    #[arg(long)]
    pub products: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub inputs: InputArgs,

    /// Summary CSV path, or `-` for stdout (overrides [output].csv)
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Print the JSON report to stdout
    #[arg(long)]
    pub json: bool,

    /// Write the JSON report to this file (overrides [output].json)
    #[arg(long)]
    pub json_output: Option<PathBuf>,

    /// Write the region x category pivot CSV to this file (overrides [output].pivot)
    #[arg(long)]
    pub pivot_output: Option<PathBuf>,

    /// Suppress the human summary on stderr
    #[arg(long, short)]
    pub quiet: bool,
}

#[derive(Args, Debug)]
pub struct PivotArgs {
    #[command(flatten)]
    pub inputs: InputArgs,

    /// Pivot CSV path; stdout when omitted or `-`
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Suppress the human summary on stderr
    #[arg(long, short)]
    pub quiet: bool,
}

fn report_err(code: u8, msg: impl Into<String>) -> CliError {
    CliError { code, message: msg.into(), hint: None }
}

impl From<ReportError> for CliError {
    fn from(err: ReportError) -> Self {
        let hint = match &err {
            ReportError::MissingColumns { table, .. } => Some(format!(
                "{table} table needs columns: {}",
                required_columns(*table).join(", ")
            )),
            ReportError::InvalidValue { .. } => {
                Some("set options.invalid_values = \"skip\" to drop unparseable rows".to_string())
            }
            ReportError::DuplicateProduct { .. } => Some(
                "set options.duplicate_products = \"first\" or \"last\" to keep one row".to_string(),
            ),
            _ => None,
        };
        CliError {
            code: report_exit_code(&err),
            message: err.to_string(),
            hint,
        }
    }
}

fn required_columns(table: salesgrid_report::model::Table) -> &'static [&'static str] {
    use salesgrid_report::load::{PRODUCT_COLUMNS, SALES_COLUMNS};
    use salesgrid_report::model::Table;
    match table {
        Table::Sales => &SALES_COLUMNS,
        Table::Products => &PRODUCT_COLUMNS,
    }
}

// ---------------------------------------------------------------------------
// Config + input resolution
// ---------------------------------------------------------------------------

/// Config plus the directory its relative paths resolve against.
struct Resolved {
    config: ReportConfig,
    base_dir: PathBuf,
    sales: PathBuf,
    products: PathBuf,
}

impl Resolved {
    fn from_args(args: &InputArgs) -> Result<Self, CliError> {
        let (config, base_dir) = match &args.config {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|e| {
                    report_err(EXIT_CONFIG, format!("cannot read config {}: {e}", path.display()))
                })?;
                let config = ReportConfig::from_toml(&text)?;
                let base_dir = path
                    .parent()
                    .filter(|p| !p.as_os_str().is_empty())
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from("."));
                log::info!("loaded config {}", path.display());
                (config, base_dir)
            }
            None => (ReportConfig::default(), PathBuf::new()),
        };

        let sales = args
            .sales
            .clone()
            .unwrap_or_else(|| base_dir.join(&config.inputs.sales));
        let products = args
            .products
            .clone()
            .unwrap_or_else(|| base_dir.join(&config.inputs.products));

        Ok(Self {
            config,
            base_dir,
            sales,
            products,
        })
    }

    /// Flag value as given, else the config value relative to the config dir.
    fn output_path(&self, flag: Option<PathBuf>, configured: Option<&str>) -> Option<PathBuf> {
        flag.or_else(|| configured.map(|p| self.base_dir.join(p)))
    }

    fn load(&self) -> Result<ReportInput, CliError> {
        let sales_csv = read_input(&self.sales, "sales")?;
        let products_csv = read_input(&self.products, "products")?;
        log::info!(
            "read {} ({} bytes) and {} ({} bytes)",
            self.sales.display(),
            sales_csv.len(),
            self.products.display(),
            products_csv.len()
        );
        Ok(load_input(
            &self.config,
            &self.sales.display().to_string(),
            &sales_csv,
            &self.products.display().to_string(),
            &products_csv,
        )?)
    }
}

fn read_input(path: &Path, table: &str) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => CliError {
            code: EXIT_INPUT,
            message: format!("{table} file not found: {}", path.display()),
            hint: Some(format!("pass --{table} or set [inputs].{table} in the config")),
        },
        _ => report_err(EXIT_INPUT, format!("cannot read {}: {e}", path.display())),
    })
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn is_stdout(path: &Path) -> bool {
    path.as_os_str() == "-"
}

/// Write `contents` to `path`, creating missing parent directories.
fn write_output(path: &Path, contents: &str) -> Result<(), CliError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            report_err(EXIT_WRITE, format!("cannot create {}: {e}", parent.display()))
        })?;
    }
    std::fs::write(path, contents)
        .map_err(|e| report_err(EXIT_WRITE, format!("cannot write {}: {e}", path.display())))
}

fn write_stdout(contents: &str) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    stdout
        .write_all(contents.as_bytes())
        .and_then(|()| stdout.flush())
        .map_err(|e| report_err(EXIT_WRITE, format!("cannot write to stdout: {e}")))
}

fn render_err(e: ReportError) -> CliError {
    report_err(EXIT_ERROR, format!("cannot render output: {e}"))
}

fn print_summary(report: &Report) {
    let s = &report.stats;
    let groups = report.summary.iter().filter(|r| !r.key.is_all()).count();
    eprintln!(
        "{}: {} groups from {} of {} sales rows ({} unmatched, {} filtered out, {} skipped)",
        report.meta.name,
        groups,
        s.contributing_rows,
        s.sales_rows + s.skipped_invalid_sales,
        s.unmatched_sales,
        s.dropped_non_positive_quantity + s.dropped_negative_unit_price,
        s.skipped_invalid_sales + s.dropped_invalid_product,
    );
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

pub fn cmd_run(args: RunArgs) -> Result<(), CliError> {
    let resolved = Resolved::from_args(&args.inputs)?;
    let csv_path = args
        .output
        .clone()
        .unwrap_or_else(|| resolved.base_dir.join(&resolved.config.output.csv));

    if args.json && is_stdout(&csv_path) {
        return Err(CliError {
            code: EXIT_USAGE,
            message: "--json and --output - both write to stdout".to_string(),
            hint: Some("use --json-output FILE for the JSON report".to_string()),
        });
    }

    let json_path = resolved.output_path(args.json_output, resolved.config.output.json.as_deref());
    let pivot_path = resolved.output_path(args.pivot_output, resolved.config.output.pivot.as_deref());

    let input = resolved.load()?;
    let report = salesgrid_report::run(&resolved.config, input)?;

    let csv = summary_to_csv_string(&report.summary).map_err(render_err)?;
    if is_stdout(&csv_path) {
        write_stdout(&csv)?;
    } else {
        write_output(&csv_path, &csv)?;
        if !args.quiet {
            eprintln!("wrote {}", csv_path.display());
        }
    }

    if let Some(ref path) = pivot_path {
        let pivot = pivot_to_csv_string(&report.pivot).map_err(render_err)?;
        write_output(path, &pivot)?;
        if !args.quiet {
            eprintln!("wrote {}", path.display());
        }
    }

    if args.json || json_path.is_some() {
        let json_str = serde_json::to_string_pretty(&report)
            .map_err(|e| report_err(EXIT_ERROR, format!("JSON serialization error: {e}")))?;
        if let Some(ref path) = json_path {
            write_output(path, &json_str)?;
            if !args.quiet {
                eprintln!("wrote {}", path.display());
            }
        }
        if args.json {
            write_stdout(&format!("{json_str}\n"))?;
        }
    }

    if !args.quiet {
        print_summary(&report);
    }
    Ok(())
}

pub fn cmd_pivot(args: PivotArgs) -> Result<(), CliError> {
    let resolved = Resolved::from_args(&args.inputs)?;
    let input = resolved.load()?;
    let report = salesgrid_report::run(&resolved.config, input)?;
    let pivot = pivot_to_csv_string(&report.pivot).map_err(render_err)?;

    match args.output {
        Some(ref path) if !is_stdout(path) => {
            write_output(path, &pivot)?;
            if !args.quiet {
                eprintln!("wrote {}", path.display());
            }
        }
        _ => write_stdout(&pivot)?,
    }

    if !args.quiet {
        eprintln!(
            "pivot: {} regions x {} categories",
            report.pivot.rows.len().saturating_sub(1),
            report.pivot.categories.len()
        );
    }
    Ok(())
}

/// Dry run: parse config and both tables, apply the duplicate policy and
/// the reserved-group check, write nothing.
pub fn cmd_validate(args: InputArgs) -> Result<(), CliError> {
    let resolved = Resolved::from_args(&args)?;
    let input = resolved.load()?;
    let (_, stats) = prepare(&resolved.config, input)?;

    eprintln!(
        "ok: {} ({} rows), {} ({} rows)",
        resolved.sales.display(),
        stats.sales_rows,
        resolved.products.display(),
        stats.product_rows
    );
    if stats.skipped_invalid_sales + stats.skipped_invalid_products > 0 {
        eprintln!(
            "skipped {} sales and {} product rows with unparseable values",
            stats.skipped_invalid_sales, stats.skipped_invalid_products
        );
    }
    if stats.dropped_invalid_product > 0 {
        eprintln!(
            "{} sales rows dropped: their product has no valid unit_cost",
            stats.dropped_invalid_product
        );
    }
    if stats.duplicate_products > 0 {
        eprintln!("{} duplicate product rows ignored", stats.duplicate_products);
    }
    Ok(())
}
