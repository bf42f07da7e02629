use crate::aggregate::aggregate;
use crate::config::ReportConfig;
use crate::derive::derive_metrics;
use crate::error::ReportError;
use crate::filter::retain_valid;
use crate::format::format_summary;
use crate::join::{drop_invalid_products, join_products, ProductIndex};
use crate::load::{load_products, load_sales, LoadOptions};
use crate::model::{DerivedRecord, PipelineStats, Report, ReportInput, ReportMeta, ALL};
use crate::pivot::build_pivot;

/// Parse both tables per the config's load options.
pub fn load_input(
    config: &ReportConfig,
    sales_name: &str,
    sales_csv: &str,
    products_name: &str,
    products_csv: &str,
) -> Result<ReportInput, ReportError> {
    let options = LoadOptions::from(&config.options);
    let sales = load_sales(sales_name, sales_csv, options)?;
    let products = load_products(products_name, products_csv, options)?;
    Ok(ReportInput {
        sales: sales.records,
        products: products.records,
        skipped_sales: sales.skipped,
        skipped_products: products.skipped,
        invalid_product_ids: products.skipped_keys,
    })
}

/// Run the full pipeline. Returns the formatted summary, pivot and stats.
pub fn run(config: &ReportConfig, input: ReportInput) -> Result<Report, ReportError> {
    let (derived, stats) = prepare(config, input)?;

    let summary = format_summary(aggregate(&derived)?);
    let pivot = build_pivot(&derived, config.pivot.categories.as_deref())?;

    Ok(Report {
        meta: ReportMeta {
            name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
        },
        stats,
        summary,
        pivot,
    })
}

/// Join, filter and derive. The returned records are exactly the set that
/// contributes to every total.
pub fn prepare(
    config: &ReportConfig,
    input: ReportInput,
) -> Result<(Vec<DerivedRecord>, PipelineStats), ReportError> {
    let mut stats = PipelineStats {
        sales_rows: input.sales.len(),
        product_rows: input.products.len(),
        skipped_invalid_sales: input.skipped_sales,
        skipped_invalid_products: input.skipped_products,
        ..PipelineStats::default()
    };

    let index = ProductIndex::build(input.products, config.options.duplicate_products)?
        .with_invalid(input.invalid_product_ids);
    stats.duplicate_products = index.duplicates();

    let (sales, dropped_invalid) = drop_invalid_products(input.sales, &index);
    stats.dropped_invalid_product = dropped_invalid;

    let joined = join_products(sales, &index);
    stats.unmatched_sales = joined.iter().filter(|r| !r.matched).count();
    log::debug!(
        "joined {} sales rows against {} products ({} unmatched)",
        joined.len(),
        index.len(),
        stats.unmatched_sales
    );

    let (kept, dropped) = retain_valid(joined);
    stats.dropped_non_positive_quantity = dropped.non_positive_quantity;
    stats.dropped_negative_unit_price = dropped.negative_unit_price;
    log::debug!(
        "filtered to {} rows ({} non-positive quantity, {} negative unit_price)",
        kept.len(),
        dropped.non_positive_quantity,
        dropped.negative_unit_price
    );

    let derived = derive_metrics(kept)?;
    ensure_no_reserved_group(&derived)?;
    stats.contributing_rows = derived.len();

    Ok((derived, stats))
}

/// ("ALL", "ALL") belongs to the grand total.
fn ensure_no_reserved_group(records: &[DerivedRecord]) -> Result<(), ReportError> {
    match records
        .iter()
        .find(|r| r.region() == ALL && r.category() == ALL)
    {
        Some(r) => Err(ReportError::ReservedGroupKey {
            order_id: r.enriched.sale.order_id.clone(),
        }),
        None => Ok(()),
    }
}
