use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;

use crate::config::DuplicatePolicy;
use crate::error::ReportError;
use crate::model::{EnrichedRecord, ProductRecord, SalesRecord, UNKNOWN};

/// Product lookup keyed by product_id, built once and probed per sales row.
#[derive(Debug, Default)]
pub struct ProductIndex {
    by_id: HashMap<String, ProductRecord>,
    duplicates: usize,
    /// Ids seen only on rows the loader skipped for an unparseable value.
    invalid: HashSet<String>,
}

impl ProductIndex {
    pub fn build(
        products: Vec<ProductRecord>,
        policy: DuplicatePolicy,
    ) -> Result<Self, ReportError> {
        let mut by_id: HashMap<String, ProductRecord> = HashMap::with_capacity(products.len());
        let mut duplicates = 0;

        for product in products {
            match by_id.entry(product.product_id.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(product);
                }
                Entry::Occupied(mut slot) => {
                    duplicates += 1;
                    match policy {
                        DuplicatePolicy::First => {
                            log::warn!(
                                "products row {}: duplicate product_id '{}' ignored (row {} wins)",
                                product.row,
                                product.product_id,
                                slot.get().row
                            );
                        }
                        DuplicatePolicy::Last => {
                            log::warn!(
                                "products row {}: duplicate product_id '{}' replaces row {}",
                                product.row,
                                product.product_id,
                                slot.get().row
                            );
                            slot.insert(product);
                        }
                        DuplicatePolicy::Error => {
                            return Err(ReportError::DuplicateProduct {
                                first_row: slot.get().row,
                                row: product.row,
                                product_id: product.product_id,
                            });
                        }
                    }
                }
            }
        }

        Ok(Self {
            by_id,
            duplicates,
            invalid: HashSet::new(),
        })
    }

    /// Record product ids whose rows were skipped at load time. An id that
    /// also has a valid row stays joinable.
    pub fn with_invalid(mut self, ids: impl IntoIterator<Item = String>) -> Self {
        self.invalid = ids
            .into_iter()
            .filter(|id| !self.by_id.contains_key(id))
            .collect();
        self
    }

    pub fn is_invalid(&self, product_id: &str) -> bool {
        self.invalid.contains(product_id)
    }

    pub fn get(&self, product_id: &str) -> Option<&ProductRecord> {
        self.by_id.get(product_id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Rows that lost to the duplicate policy.
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }
}

/// Drop sales whose product exists only as unparseable rows. Their cost is
/// unknown, so joining them as `UNKNOWN` with zero cost would overstate
/// profit. Returns the kept sales and the number dropped.
pub fn drop_invalid_products(
    sales: Vec<SalesRecord>,
    index: &ProductIndex,
) -> (Vec<SalesRecord>, usize) {
    let before = sales.len();
    let kept: Vec<SalesRecord> = sales
        .into_iter()
        .filter(|sale| {
            let invalid = index.is_invalid(&sale.product_id);
            if invalid {
                log::warn!(
                    "dropping order '{}': product_id '{}' has no valid unit_cost",
                    sale.order_id,
                    sale.product_id
                );
            }
            !invalid
        })
        .collect();
    let dropped = before - kept.len();
    (kept, dropped)
}

/// Left join: one enriched record per sale, in input order. Unmatched
/// product ids get `UNKNOWN` name/category and a zero unit cost.
pub fn join_products(sales: Vec<SalesRecord>, index: &ProductIndex) -> Vec<EnrichedRecord> {
    sales
        .into_iter()
        .map(|sale| match index.get(&sale.product_id) {
            Some(product) => EnrichedRecord {
                product_name: product.product_name.clone(),
                category: product.category.clone(),
                unit_cost: product.unit_cost,
                matched: true,
                sale,
            },
            None => EnrichedRecord {
                product_name: UNKNOWN.to_string(),
                category: UNKNOWN.to_string(),
                unit_cost: Decimal::ZERO,
                matched: false,
                sale,
            },
        })
        .collect()
}
