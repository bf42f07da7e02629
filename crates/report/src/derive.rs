use rust_decimal::Decimal;

use crate::error::ReportError;
use crate::model::{DerivedRecord, EnrichedRecord};

/// revenue = quantity * unit_price, cost = quantity * unit_cost,
/// profit = revenue - cost. Exact; rounding waits for the formatter.
///
/// Fails with `Overflow` instead of panicking when a product leaves the
/// decimal range.
pub fn derive_metrics(records: Vec<EnrichedRecord>) -> Result<Vec<DerivedRecord>, ReportError> {
    records.into_iter().map(derive_one).collect()
}

fn derive_one(enriched: EnrichedRecord) -> Result<DerivedRecord, ReportError> {
    let overflow = |metric| ReportError::Overflow {
        metric,
        at: format!("order '{}'", enriched.sale.order_id),
    };
    let quantity = Decimal::from(enriched.sale.quantity);
    let revenue = quantity
        .checked_mul(enriched.sale.unit_price)
        .ok_or_else(|| overflow("revenue"))?;
    let cost = quantity
        .checked_mul(enriched.unit_cost)
        .ok_or_else(|| overflow("cost"))?;
    let profit = revenue.checked_sub(cost).ok_or_else(|| overflow("profit"))?;
    Ok(DerivedRecord {
        revenue,
        cost,
        profit,
        enriched,
    })
}
