/// Reserved capacity magnitude meaning "no limit".
///
/// A capacity whose absolute amount equals this value overrides aggregated
/// children totals instead of participating in them.
pub const UNLIMITED_CAPACITY: &str = "999999999";

/// Decimal precision for aggregation results
pub const DECIMAL_PRECISION: u32 = 6;

/// Decimal precision for display
pub const DISPLAY_DECIMAL_PRECISION: u32 = 2;
