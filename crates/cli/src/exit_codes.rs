//! CLI Exit Code Registry
//!
//! Single source of truth for `salesgrid` exit codes. Scripts rely on them.
//!
//! | Code | Meaning                                                      |
//! |------|--------------------------------------------------------------|
//! | 0    | Success                                                      |
//! | 1    | General error (unspecified)                                  |
//! | 2    | Usage error (bad arguments, conflicting flags)               |
//! | 3    | Input file missing, unreadable or empty                      |
//! | 4    | Input schema error (required columns missing)                |
//! | 5    | Value parse error or malformed CSV                           |
//! | 6    | Invalid config (unreadable, bad TOML, failed validation)     |
//! | 7    | Output could not be written                                  |
//! | 8    | Data failure (duplicate product, reserved group, overflow)   |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into `report_exit_code` or the command's error handling

use salesgrid_report::ReportError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments. clap exits with this code on its own errors.
pub const EXIT_USAGE: u8 = 2;

/// Input table missing, unreadable, or without a header row.
pub const EXIT_INPUT: u8 = 3;

/// Required columns absent from an input header.
pub const EXIT_SCHEMA: u8 = 4;

/// A numeric field failed to parse, or the CSV itself is malformed.
pub const EXIT_PARSE: u8 = 5;

/// Config file unreadable, not valid TOML, or rejected by validation.
pub const EXIT_CONFIG: u8 = 6;

/// Output file or directory could not be written.
pub const EXIT_WRITE: u8 = 7;

/// Duplicate product under `duplicate_products = "error"`, a row in the
/// reserved ALL/ALL group, or a total too large for a decimal.
pub const EXIT_DATA: u8 = 8;

/// Map a pipeline error to its exit code.
pub fn report_exit_code(err: &ReportError) -> u8 {
    match err {
        ReportError::ConfigParse(_) | ReportError::ConfigValidation(_) => EXIT_CONFIG,
        ReportError::EmptyInput { .. } => EXIT_INPUT,
        ReportError::MissingColumns { .. } => EXIT_SCHEMA,
        ReportError::InvalidValue { .. } | ReportError::Csv(_) => EXIT_PARSE,
        ReportError::DuplicateProduct { .. }
        | ReportError::ReservedGroupKey { .. }
        | ReportError::Overflow { .. } => EXIT_DATA,
        ReportError::Io(_) => EXIT_ERROR,
    }
}
