use rust_decimal::Decimal;

use crate::model::EnrichedRecord;

/// Rows removed by `retain_valid`, each counted once under the first
/// predicate it fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub non_positive_quantity: usize,
    pub negative_unit_price: usize,
}

impl FilterStats {
    pub fn dropped(&self) -> usize {
        self.non_positive_quantity + self.negative_unit_price
    }
}

/// Keep records with `quantity > 0` and `unit_price >= 0`.
///
/// `unit_cost` is not checked; a negative cost from the reference table
/// flows through unchanged.
pub fn retain_valid(records: Vec<EnrichedRecord>) -> (Vec<EnrichedRecord>, FilterStats) {
    let mut stats = FilterStats::default();
    let kept = records
        .into_iter()
        .filter(|r| {
            if r.sale.quantity <= 0 {
                stats.non_positive_quantity += 1;
                log::trace!("drop order '{}': quantity {}", r.sale.order_id, r.sale.quantity);
                false
            } else if r.sale.unit_price < Decimal::ZERO {
                stats.negative_unit_price += 1;
                log::trace!("drop order '{}': unit_price {}", r.sale.order_id, r.sale.unit_price);
                false
            } else {
                true
            }
        })
        .collect();
    (kept, stats)
}
