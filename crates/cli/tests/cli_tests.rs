// Integration tests for `salesgrid run | pivot | validate`.
// Run with: cargo test -p salesgrid-cli --test cli_tests -- --nocapture

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn salesgrid() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_salesgrid"));
    cmd.env_remove("RUST_LOG").env_remove("SALESGRID_CONFIG");
    cmd
}

const SALES: &str = "\
order_id,product_id,region,quantity,unit_price
1,101,EU,20,5
2,102,US,4,60
3,101,EU,35,5
4,999,US,1,100
5,101,EU,-3,50
6,103,APAC,2,-10
7,103,APAC,6,30
8,101,US,12,5
";

const PRODUCTS: &str = "\
product_id,product_name,category,unit_cost
101,Widget,Hardware,2
102,Support Plan,Services,24
103,Consulting,Services,12
";

const EXPECTED_SUMMARY: &str = "\
region,category,orders_count,total_revenue,total_cost,total_profit,profit_margin
ALL,ALL,6,855.00,302.00,553.00,0.65
APAC,Services,1,180.00,72.00,108.00,0.60
EU,Hardware,2,275.00,110.00,165.00,0.60
US,Hardware,1,60.00,24.00,36.00,0.60
US,Services,1,240.00,96.00,144.00,0.60
US,UNKNOWN,1,100.00,0.00,100.00,1.00
";

/// Lay out the default `data/input` tree in a fresh temp dir.
fn workspace() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("data/input");
    std::fs::create_dir_all(&input).unwrap();
    std::fs::write(input.join("sales.csv"), SALES).unwrap();
    std::fs::write(input.join("products.csv"), PRODUCTS).unwrap();
    dir
}

fn run_in(dir: &Path, args: &[&str]) -> Output {
    salesgrid()
        .current_dir(dir)
        .args(args)
        .output()
        .expect("failed to spawn salesgrid")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

#[test]
fn run_with_default_layout_writes_summary() {
    let dir = workspace();
    let output = run_in(dir.path(), &["run"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let written = dir.path().join("data/result/sales_summary.csv");
    assert_eq!(std::fs::read_to_string(&written).unwrap(), EXPECTED_SUMMARY);

    let err = stderr(&output);
    assert!(err.contains("wrote data/result/sales_summary.csv"), "stderr: {err}");
    assert!(err.contains("5 groups from 6 of 8 sales rows"), "stderr: {err}");
}

#[test]
fn run_to_stdout() {
    let dir = workspace();
    let output = run_in(dir.path(), &["run", "--output", "-", "--quiet"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), EXPECTED_SUMMARY);
    assert!(stderr(&output).is_empty());
    assert!(!dir.path().join("data/result").exists());
}

#[test]
fn run_output_parses_as_csv() {
    let dir = workspace();
    let output = run_in(dir.path(), &["run", "-o", "-", "-q"]);
    assert!(output.status.success());

    let stdout = stdout(&output);
    let mut reader = csv::Reader::from_reader(stdout.as_bytes());
    let headers = reader.headers().unwrap().clone();
    assert_eq!(headers.len(), 7);
    let first = reader.records().next().unwrap().unwrap();
    assert_eq!(&first[0], "ALL");
    assert_eq!(&first[3], "855.00");
}

#[test]
fn run_explicit_paths() {
    let dir = workspace();
    let output = run_in(
        dir.path(),
        &[
            "run",
            "--sales",
            "data/input/sales.csv",
            "--products",
            "data/input/products.csv",
            "--output",
            "reports/q3/summary.csv",
        ],
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let written = std::fs::read_to_string(dir.path().join("reports/q3/summary.csv")).unwrap();
    assert_eq!(written, EXPECTED_SUMMARY);
}

#[test]
fn run_from_config_resolves_relative_paths() {
    let dir = workspace();
    let config_dir = dir.path().join("conf");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(
        config_dir.join("report.toml"),
        r#"
name = "Q3 profitability"

[inputs]
sales = "../data/input/sales.csv"
products = "../data/input/products.csv"

[output]
csv = "out/summary.csv"
json = "out/report.json"
pivot = "out/pivot.csv"

[pivot]
categories = ["Hardware", "Services"]
"#,
    )
    .unwrap();

    // Run from an unrelated cwd: every path must come from the config dir.
    let elsewhere = tempfile::tempdir().unwrap();
    let config_path = config_dir.join("report.toml");
    let output = run_in(elsewhere.path(), &["run", "--config", config_path.to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let out = config_dir.join("out");
    assert_eq!(std::fs::read_to_string(out.join("summary.csv")).unwrap(), EXPECTED_SUMMARY);
    assert_eq!(
        std::fs::read_to_string(out.join("pivot.csv")).unwrap(),
        "\
region,Hardware,Services,TOTAL
APAC,0.00,180.00,180.00
EU,275.00,0.00,275.00
US,60.00,240.00,300.00
ALL,335.00,420.00,755.00
"
    );

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out.join("report.json")).unwrap()).unwrap();
    assert_eq!(json["meta"]["name"], "Q3 profitability");
    assert_eq!(json["summary"][0]["total_profit"], "553.00");
    assert_eq!(json["stats"]["sales_rows"], 8);

    assert!(stderr(&output).contains("Q3 profitability: 5 groups"));
}

#[test]
fn run_json_to_stdout() {
    let dir = workspace();
    let output = run_in(dir.path(), &["run", "--json", "-q"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["summary"].as_array().unwrap().len(), 6);
    assert_eq!(json["summary"][5]["category"], "UNKNOWN");
    assert_eq!(json["summary"][5]["profit_margin"], "1.00");
    assert!(dir.path().join("data/result/sales_summary.csv").exists());
}

#[test]
fn run_json_and_csv_both_on_stdout_is_usage_error() {
    let dir = workspace();
    let output = run_in(dir.path(), &["run", "--json", "--output", "-"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("hint:"));
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[test]
fn missing_input_file_exits_3() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_in(dir.path(), &["run"]);
    assert_eq!(output.status.code(), Some(3));
    let err = stderr(&output);
    assert!(err.contains("error: sales file not found"), "stderr: {err}");
    assert!(err.contains("hint:"), "stderr: {err}");
}

#[test]
fn empty_input_file_exits_3() {
    let dir = workspace();
    std::fs::write(dir.path().join("data/input/products.csv"), "").unwrap();
    let output = run_in(dir.path(), &["run"]);
    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("input is empty"));
}

#[test]
fn missing_columns_exit_4_and_list_all() {
    let dir = workspace();
    std::fs::write(
        dir.path().join("data/input/sales.csv"),
        "order_id,product_id,qty\n1,101,2\n",
    )
    .unwrap();
    let output = run_in(dir.path(), &["run"]);
    assert_eq!(output.status.code(), Some(4));
    let err = stderr(&output);
    assert!(err.contains("missing column(s): region, quantity, unit_price"), "stderr: {err}");
    assert!(!dir.path().join("data/result").exists());
}

#[test]
fn unparseable_value_exits_5_unless_skipped() {
    let dir = workspace();
    std::fs::write(
        dir.path().join("data/input/sales.csv"),
        "order_id,product_id,region,quantity,unit_price\n1,101,EU,two,5\n2,101,EU,1,5\n",
    )
    .unwrap();

    let output = run_in(dir.path(), &["run", "-o", "-"]);
    assert_eq!(output.status.code(), Some(5));
    assert!(stderr(&output).contains("cannot parse quantity 'two' as integer"));

    std::fs::write(dir.path().join("skip.toml"), "[options]\ninvalid_values = \"skip\"\n").unwrap();
    let output = run_in(dir.path(), &["run", "-c", "skip.toml", "-o", "-", "-q"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("ALL,ALL,1,5.00,2.00,3.00,0.60"));
}

#[test]
fn invalid_config_exits_6() {
    let dir = workspace();
    std::fs::write(dir.path().join("bad.toml"), "[options]\nduplicate_products = \"newest\"\n").unwrap();
    let output = run_in(dir.path(), &["run", "--config", "bad.toml"]);
    assert_eq!(output.status.code(), Some(6));
    assert!(stderr(&output).contains("config parse error"));

    let output = run_in(dir.path(), &["run", "--config", "absent.toml"]);
    assert_eq!(output.status.code(), Some(6));
}

#[test]
fn duplicate_product_under_error_policy_exits_8() {
    let dir = workspace();
    std::fs::write(
        dir.path().join("data/input/products.csv"),
        format!("{PRODUCTS}101,Widget v2,Hardware,3\n"),
    )
    .unwrap();
    std::fs::write(dir.path().join("strict.toml"), "[options]\nduplicate_products = \"error\"\n").unwrap();

    let output = run_in(dir.path(), &["run", "--config", "strict.toml"]);
    assert_eq!(output.status.code(), Some(8));
    assert!(stderr(&output).contains("duplicate product_id '101'"));

    // Default policy keeps the first row and succeeds with the same numbers.
    let output = run_in(dir.path(), &["run", "-o", "-", "-q"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), EXPECTED_SUMMARY);
}

#[test]
fn output_path_that_is_a_directory_exits_7() {
    let dir = workspace();
    std::fs::create_dir(dir.path().join("out")).unwrap();
    let output = run_in(dir.path(), &["run", "-o", "out"]);
    assert_eq!(output.status.code(), Some(7));
    assert!(stderr(&output).contains("cannot write out"), "stderr: {}", stderr(&output));
}

#[test]
fn overflowing_revenue_exits_8() {
    let dir = workspace();
    std::fs::write(
        dir.path().join("data/input/sales.csv"),
        "order_id,product_id,region,quantity,unit_price\n1,101,EU,9000000000000000000,100000000000\n",
    )
    .unwrap();
    let output = run_in(dir.path(), &["run", "-o", "-"]);
    assert_eq!(output.status.code(), Some(8));
    assert!(stderr(&output).contains("revenue overflowed at order '1'"));
}

#[test]
fn skipped_product_drops_its_sales() {
    let dir = workspace();
    std::fs::write(
        dir.path().join("data/input/products.csv"),
        PRODUCTS.replace("101,Widget,Hardware,2", "101,Widget,Hardware,n/a"),
    )
    .unwrap();
    std::fs::write(dir.path().join("skip.toml"), "[options]\ninvalid_values = \"skip\"\n").unwrap();

    let output = run_in(dir.path(), &["run", "-c", "skip.toml", "-o", "-"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(!out.contains("Hardware"), "stdout: {out}");
    assert!(out.contains("US,UNKNOWN,1,100.00,0.00,100.00,1.00"), "stdout: {out}");
    assert!(stderr(&output).contains("dropping order '1'"));
}

#[test]
fn unknown_subcommand_is_usage_error() {
    let output = salesgrid().arg("frobnicate").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

// ---------------------------------------------------------------------------
// pivot + validate
// ---------------------------------------------------------------------------

#[test]
fn pivot_prints_observed_categories() {
    let dir = workspace();
    let output = run_in(dir.path(), &["pivot", "-q"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(
        stdout(&output),
        "\
region,Hardware,Services,UNKNOWN,TOTAL
APAC,0.00,180.00,0.00,180.00
EU,275.00,0.00,0.00,275.00
US,60.00,240.00,100.00,400.00
ALL,335.00,420.00,100.00,855.00
"
    );
}

#[test]
fn pivot_to_file() {
    let dir = workspace();
    let output = run_in(dir.path(), &["pivot", "--output", "out/pivot.csv"]);
    assert!(output.status.success());
    let written: PathBuf = dir.path().join("out/pivot.csv");
    assert!(std::fs::read_to_string(written).unwrap().starts_with("region,Hardware"));
    assert!(stderr(&output).contains("pivot: 3 regions x 3 categories"));
}

#[test]
fn validate_reports_counts_and_writes_nothing() {
    let dir = workspace();
    let output = run_in(dir.path(), &["validate"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let err = stderr(&output);
    assert!(err.contains("ok: data/input/sales.csv (8 rows)"), "stderr: {err}");
    assert!(err.contains("data/input/products.csv (3 rows)"), "stderr: {err}");
    assert!(!dir.path().join("data/result").exists());
}

#[test]
fn validate_catches_schema_errors() {
    let dir = workspace();
    std::fs::write(dir.path().join("data/input/products.csv"), "product_id\n101\n").unwrap();
    let output = run_in(dir.path(), &["validate"]);
    assert_eq!(output.status.code(), Some(4));
    assert!(stderr(&output).contains("hint:  products table needs columns"));
}

#[test]
fn verbose_flag_emits_debug_logs() {
    let dir = workspace();
    let output = run_in(dir.path(), &["-vv", "run", "-o", "-", "-q"]);
    assert!(output.status.success());
    assert!(stderr(&output).contains("aggregated 6 records into 5 groups"));
}
