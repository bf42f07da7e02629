use std::collections::HashSet;

use serde::Deserialize;

use crate::error::ReportError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub name: String,
    pub inputs: InputConfig,
    pub output: OutputConfig,
    pub options: OptionsConfig,
    pub pivot: PivotConfig,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            name: "Sales profitability".into(),
            inputs: InputConfig::default(),
            output: OutputConfig::default(),
            options: OptionsConfig::default(),
            pivot: PivotConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Inputs + Output
// ---------------------------------------------------------------------------

/// Input table paths, resolved relative to the config file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub sales: String,
    pub products: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            sales: "data/input/sales.csv".into(),
            products: "data/input/products.csv".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub csv: String,
    pub json: Option<String>,
    pub pivot: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            csv: "data/result/sales_summary.csv".into(),
            json: None,
            pivot: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// What to do when a product_id appears more than once in the reference table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// First-seen row is authoritative.
    #[default]
    First,
    Last,
    Error,
}

/// What to do when a numeric field cannot be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidValuePolicy {
    #[default]
    Error,
    /// Drop the offending row from its table and keep going.
    Skip,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OptionsConfig {
    pub duplicate_products: DuplicatePolicy,
    pub invalid_values: InvalidValuePolicy,
    pub delimiter: char,
}

impl Default for OptionsConfig {
    fn default() -> Self {
        Self {
            duplicate_products: DuplicatePolicy::First,
            invalid_values: InvalidValuePolicy::Error,
            delimiter: ',',
        }
    }
}

impl OptionsConfig {
    /// Delimiter as the byte `csv` expects. Only meaningful after `validate`.
    pub fn delimiter_byte(&self) -> u8 {
        if self.delimiter.is_ascii() {
            self.delimiter as u8
        } else {
            b','
        }
    }
}

// ---------------------------------------------------------------------------
// Pivot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PivotConfig {
    /// Fixed column set and order. `None` means every observed category, sorted.
    pub categories: Option<Vec<String>>,
}

/// Name of the pivot's row-total column.
pub const PIVOT_TOTAL_COLUMN: &str = "TOTAL";

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReportConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReportError> {
        let config: ReportConfig =
            toml::from_str(input).map_err(|e| ReportError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReportError> {
        let d = self.options.delimiter;
        if !d.is_ascii() || matches!(d, '"' | '\n' | '\r') {
            return Err(ReportError::ConfigValidation(format!(
                "delimiter must be a single ASCII character other than a quote or newline, got {d:?}"
            )));
        }

        if self.output.csv.trim().is_empty() {
            return Err(ReportError::ConfigValidation(
                "output.csv must not be empty".into(),
            ));
        }

        if let Some(ref categories) = self.pivot.categories {
            let mut seen = HashSet::new();
            for category in categories {
                if category.is_empty() {
                    return Err(ReportError::ConfigValidation(
                        "pivot.categories must not contain empty names".into(),
                    ));
                }
                if category == PIVOT_TOTAL_COLUMN {
                    return Err(ReportError::ConfigValidation(format!(
                        "pivot.categories must not contain '{PIVOT_TOTAL_COLUMN}'"
                    )));
                }
                if !seen.insert(category.as_str()) {
                    return Err(ReportError::ConfigValidation(format!(
                        "pivot.categories lists '{category}' twice"
                    )));
                }
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
