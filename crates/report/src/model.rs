use std::fmt;

use rust_decimal::Decimal;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// Fallback product name/category for sales rows with no product match.
pub const UNKNOWN: &str = "UNKNOWN";

/// Region/category label rendered for the grand total row.
pub const ALL: &str = "ALL";

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Sales,
    Products,
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sales => write!(f, "sales"),
            Self::Products => write!(f, "products"),
        }
    }
}

/// One row of the sales table, already type-coerced.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesRecord {
    /// 1-based data row in the source table (header excluded).
    pub row: usize,
    pub order_id: String,
    pub product_id: String,
    pub region: String,
    pub quantity: i64,
    pub unit_price: Decimal,
}

/// One row of the product reference table.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRecord {
    /// 1-based data row in the source table (header excluded).
    pub row: usize,
    pub product_id: String,
    pub product_name: String,
    pub category: String,
    pub unit_cost: Decimal,
}

/// Both tables as handed over by the loader.
#[derive(Debug, Clone, Default)]
pub struct ReportInput {
    pub sales: Vec<SalesRecord>,
    pub products: Vec<ProductRecord>,
    /// Rows dropped by the loader under the `skip` invalid-value policy.
    pub skipped_sales: usize,
    pub skipped_products: usize,
    /// product_id of every product row skipped for an unparseable value.
    pub invalid_product_ids: Vec<String>,
}

// ---------------------------------------------------------------------------
// Pipeline stages
// ---------------------------------------------------------------------------

/// A sales record with product attributes attached by the left join.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRecord {
    pub sale: SalesRecord,
    pub product_name: String,
    pub category: String,
    pub unit_cost: Decimal,
    /// False when the product id had no match and fallbacks were used.
    pub matched: bool,
}

/// A filtered record with its per-row metrics. Never rounded.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedRecord {
    pub enriched: EnrichedRecord,
    pub revenue: Decimal,
    pub cost: Decimal,
    pub profit: Decimal,
}

impl DerivedRecord {
    pub fn region(&self) -> &str {
        &self.enriched.sale.region
    }

    pub fn category(&self) -> &str {
        &self.enriched.category
    }

    pub fn group_key(&self) -> GroupKey {
        GroupKey::group(self.region(), self.category())
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Aggregation bucket. The grand total is its own variant so it can never
/// be confused with a data group, whatever strings the data holds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GroupKey {
    All,
    Group { region: String, category: String },
}

impl GroupKey {
    pub fn group(region: impl Into<String>, category: impl Into<String>) -> Self {
        Self::Group {
            region: region.into(),
            category: category.into(),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    pub fn region(&self) -> &str {
        match self {
            Self::All => ALL,
            Self::Group { region, .. } => region,
        }
    }

    pub fn category(&self) -> &str {
        match self {
            Self::All => ALL,
            Self::Group { category, .. } => category,
        }
    }
}

/// Reduced metrics for one group.
///
/// Produced unrounded by the aggregator; the formatter rounds every decimal
/// field to two places.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub key: GroupKey,
    pub orders_count: usize,
    pub total_revenue: Decimal,
    pub total_cost: Decimal,
    pub total_profit: Decimal,
    pub profit_margin: Decimal,
}

impl SummaryRow {
    pub fn region(&self) -> &str {
        self.key.region()
    }

    pub fn category(&self) -> &str {
        self.key.category()
    }
}

impl Serialize for SummaryRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("SummaryRow", 7)?;
        s.serialize_field("region", self.region())?;
        s.serialize_field("category", self.category())?;
        s.serialize_field("orders_count", &self.orders_count)?;
        s.serialize_field("total_revenue", &self.total_revenue)?;
        s.serialize_field("total_cost", &self.total_cost)?;
        s.serialize_field("total_profit", &self.total_profit)?;
        s.serialize_field("profit_margin", &self.profit_margin)?;
        s.end()
    }
}

// ---------------------------------------------------------------------------
// Pivot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotRow {
    pub region: String,
    /// One value per entry of `PivotTable::categories`, same order.
    pub values: Vec<Decimal>,
    pub total: Decimal,
}

/// Region x category revenue matrix. The last row is the `ALL` row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotTable {
    pub categories: Vec<String>,
    pub rows: Vec<PivotRow>,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    pub sales_rows: usize,
    pub product_rows: usize,
    pub skipped_invalid_sales: usize,
    pub skipped_invalid_products: usize,
    pub duplicate_products: usize,
    /// Sales dropped because their only product rows had an unparseable unit_cost.
    pub dropped_invalid_product: usize,
    pub unmatched_sales: usize,
    pub dropped_non_positive_quantity: usize,
    pub dropped_negative_unit_price: usize,
    pub contributing_rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportMeta {
    pub name: String,
    pub engine_version: String,
    pub generated_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub meta: ReportMeta,
    pub stats: PipelineStats,
    /// Formatted summary: ALL row first, then groups by (region, category).
    pub summary: Vec<SummaryRow>,
    pub pivot: PivotTable,
}
