//! Rounding and ordering of the final summary.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::model::SummaryRow;

/// Decimal places for monetary totals.
pub const MONEY_DP: u32 = 2;
/// Decimal places for profit margin.
pub const MARGIN_DP: u32 = 2;

/// Round half-up (midpoint away from zero) and pin the scale, so `423`
/// renders as `423.00`. Zero is never negative.
pub fn round_half_up(value: Decimal, dp: u32) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(dp);
    if rounded.is_zero() {
        rounded.set_sign_positive(true);
    }
    rounded
}

pub fn round_row(row: SummaryRow) -> SummaryRow {
    SummaryRow {
        total_revenue: round_half_up(row.total_revenue, MONEY_DP),
        total_cost: round_half_up(row.total_cost, MONEY_DP),
        total_profit: round_half_up(row.total_profit, MONEY_DP),
        profit_margin: round_half_up(row.profit_margin, MARGIN_DP),
        ..row
    }
}

/// Round every row, sort data groups by (region, category) and put the
/// grand total first.
pub fn format_summary(rows: Vec<SummaryRow>) -> Vec<SummaryRow> {
    let (all, mut groups): (Vec<_>, Vec<_>) =
        rows.into_iter().map(round_row).partition(|r| r.key.is_all());

    groups.sort_by(|a, b| {
        a.region()
            .cmp(b.region())
            .then_with(|| a.category().cmp(b.category()))
    });

    let mut out = Vec::with_capacity(all.len() + groups.len());
    out.extend(all);
    out.extend(groups);
    out
}
