use chrono::NaiveDate;
use thiserror::Error;

// Create a type alias for Result using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the aggregation engine.
///
/// Inconsistent *data* (orphaned splits, deleted categories, missing prices)
/// never surfaces here; those records are skipped per the degradation rules.
/// Errors are reserved for contract-level failures.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Calculation failed: {0}")]
    Calculator(#[from] CalculatorError),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

#[derive(Error, Debug)]
pub enum CalculatorError {
    #[error("Month arithmetic overflowed stepping {months} months from {from}")]
    MonthArithmetic { from: NaiveDate, months: i32 },

    #[error("Calculation error: {0}")]
    Calculation(String),
}
