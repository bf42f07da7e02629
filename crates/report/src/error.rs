use thiserror::Error;

use crate::model::Table;

#[derive(Debug, Error)]
pub enum ReportError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),

    /// Config validation error (bad delimiter, duplicate pivot category, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),

    /// Input has no header row at all.
    #[error("{table} table '{source_name}': input is empty")]
    EmptyInput { table: Table, source_name: String },

    /// One or more required columns are absent from the header.
    #[error(
        "{table} table '{source_name}': missing column(s): {}",
        .columns.join(", ")
    )]
    MissingColumns {
        table: Table,
        source_name: String,
        columns: Vec<String>,
    },

    /// A numeric field could not be parsed.
    #[error(
        "{table} table '{source_name}', row {row}: cannot parse {column} '{value}' as {expected}"
    )]
    InvalidValue {
        table: Table,
        source_name: String,
        row: usize,
        column: String,
        value: String,
        expected: &'static str,
    },

    /// Same product_id seen twice under the `error` duplicate policy.
    #[error("products table: duplicate product_id '{product_id}' (rows {first_row} and {row})")]
    DuplicateProduct {
        product_id: String,
        first_row: usize,
        row: usize,
    },

    /// A record would land in the group reserved for the grand total.
    #[error("order '{order_id}': region/category 'ALL'/'ALL' is reserved for the grand total row")]
    ReservedGroupKey { order_id: String },

    /// A revenue, cost, profit or total left the representable decimal range.
    /// `at` names the order or pivot row being computed.
    #[error("{metric} overflowed at {at}")]
    Overflow { metric: &'static str, at: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
