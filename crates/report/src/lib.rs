//! `salesgrid-report` — Sales profitability pipeline.
//!
//! Pure pipeline crate: parses CSV text into records, joins sales to the
//! product reference, filters, derives per-row metrics, aggregates by
//! (region, category) and formats the summary. File access lives in the CLI.

pub mod aggregate;
pub mod config;
pub mod derive;
pub mod engine;
pub mod error;
pub mod filter;
pub mod format;
pub mod join;
pub mod load;
pub mod model;
pub mod pivot;
pub mod write;

pub use config::ReportConfig;
pub use engine::run;
pub use error::ReportError;
pub use model::{GroupKey, ProductRecord, Report, ReportInput, SalesRecord, SummaryRow};
