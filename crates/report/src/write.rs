//! Summary and pivot -> CSV.

use std::io;

use crate::config::PIVOT_TOTAL_COLUMN;
use crate::error::ReportError;
use crate::format::{round_half_up, MARGIN_DP, MONEY_DP};
use crate::model::{PivotTable, SummaryRow};

pub const SUMMARY_HEADER: [&str; 7] = [
    "region",
    "category",
    "orders_count",
    "total_revenue",
    "total_cost",
    "total_profit",
    "profit_margin",
];

/// Write the summary with its fixed header. Decimals always carry exactly
/// two places.
pub fn write_summary_csv<W: io::Write>(rows: &[SummaryRow], out: W) -> Result<(), ReportError> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(SUMMARY_HEADER)?;
    for row in rows {
        writer.write_record([
            row.region().to_string(),
            row.category().to_string(),
            row.orders_count.to_string(),
            round_half_up(row.total_revenue, MONEY_DP).to_string(),
            round_half_up(row.total_cost, MONEY_DP).to_string(),
            round_half_up(row.total_profit, MONEY_DP).to_string(),
            round_half_up(row.profit_margin, MARGIN_DP).to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn summary_to_csv_string(rows: &[SummaryRow]) -> Result<String, ReportError> {
    let mut buf = Vec::new();
    write_summary_csv(rows, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Header is `region,<categories...>,TOTAL`.
pub fn write_pivot_csv<W: io::Write>(table: &PivotTable, out: W) -> Result<(), ReportError> {
    let mut writer = csv::Writer::from_writer(out);

    let mut header = Vec::with_capacity(table.categories.len() + 2);
    header.push("region");
    header.extend(table.categories.iter().map(String::as_str));
    header.push(PIVOT_TOTAL_COLUMN);
    writer.write_record(&header)?;

    for row in &table.rows {
        let mut record = Vec::with_capacity(row.values.len() + 2);
        record.push(row.region.clone());
        record.extend(row.values.iter().map(|v| round_half_up(*v, MONEY_DP).to_string()));
        record.push(round_half_up(row.total, MONEY_DP).to_string());
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn pivot_to_csv_string(table: &PivotTable) -> Result<String, ReportError> {
    let mut buf = Vec::new();
    write_pivot_csv(table, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
