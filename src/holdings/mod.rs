pub mod holdings_model;
pub mod valuation_engine;

pub use holdings_model::{AccountHoldingsTotals, HoldingValuation, PriceSource};
pub use valuation_engine::{value_holdings, HoldingsValuation};
