use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::error::ReportError;
use crate::model::{DerivedRecord, GroupKey, SummaryRow};

/// Running sums for one group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Accumulator {
    pub orders_count: usize,
    pub revenue: Decimal,
    pub cost: Decimal,
    pub profit: Decimal,
}

impl Accumulator {
    /// Fold one record in. On overflow the accumulator is left untouched.
    pub fn add(&mut self, record: &DerivedRecord) -> Result<(), ReportError> {
        let overflow = |metric| ReportError::Overflow {
            metric,
            at: format!("order '{}'", record.enriched.sale.order_id),
        };
        let revenue = self
            .revenue
            .checked_add(record.revenue)
            .ok_or_else(|| overflow("total_revenue"))?;
        let cost = self
            .cost
            .checked_add(record.cost)
            .ok_or_else(|| overflow("total_cost"))?;
        let profit = self
            .profit
            .checked_add(record.profit)
            .ok_or_else(|| overflow("total_profit"))?;

        self.orders_count += 1;
        self.revenue = revenue;
        self.cost = cost;
        self.profit = profit;
        Ok(())
    }

    /// Close the group. Totals stay unrounded.
    pub fn finish(self, key: GroupKey) -> SummaryRow {
        SummaryRow {
            key,
            orders_count: self.orders_count,
            total_revenue: self.revenue,
            total_cost: self.cost,
            total_profit: self.profit,
            profit_margin: profit_margin(self.profit, self.revenue),
        }
    }
}

/// `profit / revenue`, or zero when revenue is exactly zero.
pub fn profit_margin(profit: Decimal, revenue: Decimal) -> Decimal {
    if revenue.is_zero() {
        return Decimal::ZERO;
    }
    profit.checked_div(revenue).unwrap_or(Decimal::ZERO)
}

/// Group by (region, category) and reduce, in a single pass that also feeds
/// an independent grand-total accumulator.
///
/// Returns the data groups in key order followed by the `All` row. With no
/// records the result is the `All` row alone, with zero totals.
pub fn aggregate(records: &[DerivedRecord]) -> Result<Vec<SummaryRow>, ReportError> {
    let mut groups: BTreeMap<GroupKey, Accumulator> = BTreeMap::new();
    let mut grand_total = Accumulator::default();

    for record in records {
        groups.entry(record.group_key()).or_default().add(record)?;
        grand_total.add(record)?;
    }

    log::debug!(
        "aggregated {} records into {} groups",
        grand_total.orders_count,
        groups.len()
    );

    Ok(groups
        .into_iter()
        .map(|(key, acc)| acc.finish(key))
        .chain(std::iter::once(grand_total.finish(GroupKey::All)))
        .collect())
}
