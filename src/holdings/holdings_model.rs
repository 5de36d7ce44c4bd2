use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::DISPLAY_DECIMAL_PRECISION;

/// Priority tier that resolved a holding-month's price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PriceSource {
    /// The holding's own institution-reported price.
    Institution,
    /// Close price from the security's snapshot for that month.
    Market,
    /// Inferred from `institution_value / quantity`.
    Derived,
}

/// Valuation of one holding for one month.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingValuation {
    pub value: Decimal,
    pub price: Decimal,
    pub quantity: Decimal,
    /// Total paid for the held quantity; `None` when neither reported nor
    /// inferable, which is distinct from a basis of zero.
    pub cost_basis: Option<Decimal>,
    /// True when the basis was inferred from investment transactions rather
    /// than reported upstream.
    pub cost_basis_estimated: bool,
    pub price_source: PriceSource,
}

impl HoldingValuation {
    pub fn unrealized_gain(&self) -> Option<Decimal> {
        self.cost_basis.map(|basis| self.value - basis)
    }

    /// Unrealized gain as a percentage of cost basis, rounded for display.
    /// `None` when the basis is absent or zero.
    pub fn return_percent(&self) -> Option<Decimal> {
        let basis = self.cost_basis.filter(|basis| !basis.is_zero())?;
        let gain = self.value - basis;
        Some((gain / basis * Decimal::ONE_HUNDRED).round_dp(DISPLAY_DECIMAL_PRECISION))
    }
}

/// Valuation totals across all of an account's holdings for one month.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountHoldingsTotals {
    pub value: Decimal,
    /// Summed over holdings with a resolvable basis only.
    pub cost_basis: Option<Decimal>,
    /// `None` only when no holding in the account has a cost basis.
    pub unrealized_gain: Option<Decimal>,
}
