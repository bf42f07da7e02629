use std::collections::{BTreeMap, BTreeSet, HashMap};

use rust_decimal::Decimal;

use crate::error::ReportError;
use crate::format::{round_half_up, MONEY_DP};
use crate::model::{DerivedRecord, PivotRow, PivotTable, ALL};

/// Region x category revenue matrix with a TOTAL column and a trailing
/// `ALL` row.
///
/// With `categories` the columns are exactly that list in that order:
/// unlisted categories are left out of every cell and total, listed ones
/// with no sales are zero columns. Without it, every observed category is a
/// column, sorted. Values are rounded only after summing.
pub fn build_pivot(
    records: &[DerivedRecord],
    categories: Option<&[String]>,
) -> Result<PivotTable, ReportError> {
    let columns: Vec<String> = match categories {
        Some(list) => list.to_vec(),
        None => records
            .iter()
            .map(|r| r.category())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect(),
    };
    let col_index: HashMap<&str, usize> =
        columns.iter().enumerate().map(|(i, c)| (c.as_str(), i)).collect();

    let mut regions: BTreeMap<&str, Vec<Decimal>> = BTreeMap::new();
    let mut all = vec![Decimal::ZERO; columns.len()];

    for record in records {
        let cells = regions
            .entry(record.region())
            .or_insert_with(|| vec![Decimal::ZERO; columns.len()]);
        if let Some(&i) = col_index.get(record.category()) {
            let at = || format!("order '{}'", record.enriched.sale.order_id);
            cells[i] = checked_sum(cells[i], record.revenue, at)?;
            all[i] = checked_sum(all[i], record.revenue, at)?;
        }
    }

    let rows = regions
        .into_iter()
        .map(|(region, values)| pivot_row(region, values))
        .chain(std::iter::once(pivot_row(ALL, all)))
        .collect::<Result<_, _>>()?;

    Ok(PivotTable {
        categories: columns,
        rows,
    })
}

fn checked_sum(
    acc: Decimal,
    value: Decimal,
    at: impl FnOnce() -> String,
) -> Result<Decimal, ReportError> {
    acc.checked_add(value).ok_or_else(|| ReportError::Overflow {
        metric: "revenue",
        at: at(),
    })
}

fn pivot_row(region: &str, values: Vec<Decimal>) -> Result<PivotRow, ReportError> {
    let total = values.iter().try_fold(Decimal::ZERO, |acc, v| {
        checked_sum(acc, *v, || format!("pivot row '{region}'"))
    })?;
    Ok(PivotRow {
        region: region.to_string(),
        values: values.into_iter().map(|v| round_half_up(v, MONEY_DP)).collect(),
        total: round_half_up(total, MONEY_DP),
    })
}
