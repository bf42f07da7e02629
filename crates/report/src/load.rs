//! CSV text -> typed records, with required-column validation.

use std::str::FromStr;

use csv::StringRecord;
use rust_decimal::Decimal;

use crate::config::{InvalidValuePolicy, OptionsConfig};
use crate::error::ReportError;
use crate::model::{ProductRecord, SalesRecord, Table};

pub const SALES_COLUMNS: [&str; 5] = ["order_id", "product_id", "region", "quantity", "unit_price"];
pub const PRODUCT_COLUMNS: [&str; 4] = ["product_id", "product_name", "category", "unit_cost"];

#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    pub delimiter: u8,
    pub invalid_values: InvalidValuePolicy,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            invalid_values: InvalidValuePolicy::Error,
        }
    }
}

impl From<&OptionsConfig> for LoadOptions {
    fn from(options: &OptionsConfig) -> Self {
        Self {
            delimiter: options.delimiter_byte(),
            invalid_values: options.invalid_values,
        }
    }
}

/// Parsed table plus the rows dropped under `InvalidValuePolicy::Skip`.
#[derive(Debug, Clone)]
pub struct Loaded<T> {
    pub records: Vec<T>,
    pub skipped: usize,
    /// Key column (order_id / product_id) of each skipped row.
    pub skipped_keys: Vec<String>,
}

/// Load the sales table. `source_name` only feeds error messages.
pub fn load_sales(
    source_name: &str,
    csv_data: &str,
    options: LoadOptions,
) -> Result<Loaded<SalesRecord>, ReportError> {
    let mut reader = reader(csv_data, options.delimiter);
    let [order_id_idx, product_id_idx, region_idx, quantity_idx, unit_price_idx] =
        resolve_columns(Table::Sales, source_name, reader.headers()?, &SALES_COLUMNS)?;

    let mut records = Vec::new();
    let mut skipped_keys = Vec::new();

    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let row = RowContext {
            table: Table::Sales,
            source_name,
            row: i + 1,
        };

        let quantity_str = field(&record, quantity_idx);
        let unit_price_str = field(&record, unit_price_idx);
        let parsed = parse_quantity(quantity_str)
            .ok_or_else(|| row.invalid("quantity", quantity_str, "integer"))
            .and_then(|quantity| {
                parse_decimal(unit_price_str)
                    .map(|unit_price| (quantity, unit_price))
                    .ok_or_else(|| row.invalid("unit_price", unit_price_str, "decimal"))
            });

        let (quantity, unit_price) = match parsed {
            Ok(values) => values,
            Err(err) => {
                row.on_invalid(err, options.invalid_values)?;
                skipped_keys.push(field(&record, order_id_idx).to_string());
                continue;
            }
        };

        records.push(SalesRecord {
            row: row.row,
            order_id: field(&record, order_id_idx).to_string(),
            product_id: field(&record, product_id_idx).to_string(),
            region: field(&record, region_idx).to_string(),
            quantity,
            unit_price,
        });
    }

    log::debug!(
        "loaded {} sales rows from '{source_name}' ({} skipped)",
        records.len(),
        skipped_keys.len()
    );
    Ok(Loaded {
        records,
        skipped: skipped_keys.len(),
        skipped_keys,
    })
}

/// Load the product reference table. Duplicate ids are kept here; the
/// joiner applies the duplicate policy.
pub fn load_products(
    source_name: &str,
    csv_data: &str,
    options: LoadOptions,
) -> Result<Loaded<ProductRecord>, ReportError> {
    let mut reader = reader(csv_data, options.delimiter);
    let [product_id_idx, product_name_idx, category_idx, unit_cost_idx] =
        resolve_columns(Table::Products, source_name, reader.headers()?, &PRODUCT_COLUMNS)?;

    let mut records = Vec::new();
    let mut skipped_keys = Vec::new();

    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let row = RowContext {
            table: Table::Products,
            source_name,
            row: i + 1,
        };

        let unit_cost_str = field(&record, unit_cost_idx);
        let unit_cost = match parse_decimal(unit_cost_str) {
            Some(v) => v,
            None => {
                row.on_invalid(
                    row.invalid("unit_cost", unit_cost_str, "decimal"),
                    options.invalid_values,
                )?;
                skipped_keys.push(field(&record, product_id_idx).to_string());
                continue;
            }
        };

        records.push(ProductRecord {
            row: row.row,
            product_id: field(&record, product_id_idx).to_string(),
            product_name: field(&record, product_name_idx).to_string(),
            category: field(&record, category_idx).to_string(),
            unit_cost,
        });
    }

    log::debug!(
        "loaded {} product rows from '{source_name}' ({} skipped)",
        records.len(),
        skipped_keys.len()
    );
    Ok(Loaded {
        records,
        skipped: skipped_keys.len(),
        skipped_keys,
    })
}

fn reader(csv_data: &str, delimiter: u8) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .from_reader(csv_data.as_bytes())
}

/// Map required column names to header positions, reporting every missing
/// column at once.
fn resolve_columns<const N: usize>(
    table: Table,
    source_name: &str,
    headers: &StringRecord,
    required: &[&str; N],
) -> Result<[usize; N], ReportError> {
    if headers.is_empty() {
        return Err(ReportError::EmptyInput {
            table,
            source_name: source_name.into(),
        });
    }

    let mut indices = [0usize; N];
    let mut missing = Vec::new();
    for (slot, name) in indices.iter_mut().zip(required) {
        match headers.iter().position(|h| h.trim() == *name) {
            Some(i) => *slot = i,
            None => missing.push((*name).to_string()),
        }
    }

    if !missing.is_empty() {
        return Err(ReportError::MissingColumns {
            table,
            source_name: source_name.into(),
            columns: missing,
        });
    }
    Ok(indices)
}

fn field(record: &StringRecord, idx: usize) -> &str {
    record.get(idx).unwrap_or("")
}

fn parse_quantity(value: &str) -> Option<i64> {
    value.trim().parse().ok()
}

fn parse_decimal(value: &str) -> Option<Decimal> {
    Decimal::from_str(value.trim()).ok()
}

struct RowContext<'a> {
    table: Table,
    source_name: &'a str,
    row: usize,
}

impl RowContext<'_> {
    fn invalid(&self, column: &str, value: &str, expected: &'static str) -> ReportError {
        ReportError::InvalidValue {
            table: self.table,
            source_name: self.source_name.into(),
            row: self.row,
            column: column.into(),
            value: value.into(),
            expected,
        }
    }

    /// Propagate under `Error`, log under `Skip`.
    fn on_invalid(&self, err: ReportError, policy: InvalidValuePolicy) -> Result<(), ReportError> {
        match policy {
            InvalidValuePolicy::Error => Err(err),
            InvalidValuePolicy::Skip => {
                log::warn!("skipping row: {err}");
                Ok(())
            }
        }
    }
}
