use chrono::NaiveDate;
use log::debug;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};

use super::holdings_model::{AccountHoldingsTotals, HoldingValuation, PriceSource};
use crate::constants::DECIMAL_PRECISION;
use crate::ledger::MonthlyLedger;
use crate::models::{
    HoldingSnapshot, InvestmentTransaction, InvestmentTransactionType, SecuritySnapshot,
};
use crate::utils::time_utils::month_start;

/// Monthly market value and cost basis per (account, security) holding.
#[derive(Debug, Default)]
pub struct HoldingsValuation {
    ledger: MonthlyLedger<HoldingValuation>,
    holdings_by_account: HashMap<String, Vec<String>>,
}

impl HoldingsValuation {
    pub fn valuation(&self, holding_id: &str, date: NaiveDate) -> Option<&HoldingValuation> {
        self.ledger.get(holding_id, date)
    }

    pub fn to_array(&self, holding_id: &str, view_date: NaiveDate) -> Vec<Option<HoldingValuation>> {
        self.ledger.to_array(holding_id, view_date)
    }

    pub fn month_map(&self, holding_id: &str) -> BTreeMap<String, HoldingValuation> {
        self.ledger.month_map(holding_id)
    }

    pub fn unrealized_gain(&self, holding_id: &str, date: NaiveDate) -> Option<Decimal> {
        self.valuation(holding_id, date)?.unrealized_gain()
    }

    pub fn return_percent(&self, holding_id: &str, date: NaiveDate) -> Option<Decimal> {
        self.valuation(holding_id, date)?.return_percent()
    }

    /// Totals across all of the account's holdings for the month containing
    /// `date`. Holdings with no resolvable basis are skipped for the gain;
    /// the gain is `None` only when no holding has a basis.
    pub fn account_totals(&self, account_id: &str, date: NaiveDate) -> AccountHoldingsTotals {
        let mut totals = AccountHoldingsTotals::default();
        let holding_ids = match self.holdings_by_account.get(account_id) {
            Some(ids) => ids,
            None => return totals,
        };

        let mut basis = Decimal::ZERO;
        let mut gain = Decimal::ZERO;
        let mut any_basis = false;
        for holding_id in holding_ids {
            let valuation = match self.ledger.get(holding_id, date) {
                Some(valuation) => valuation,
                None => continue,
            };
            totals.value += valuation.value;
            if let Some(holding_basis) = valuation.cost_basis {
                basis += holding_basis;
                gain += valuation.value - holding_basis;
                any_basis = true;
            }
        }
        totals.value = totals.value.round_dp(DECIMAL_PRECISION);
        if any_basis {
            totals.cost_basis = Some(basis.round_dp(DECIMAL_PRECISION));
            totals.unrealized_gain = Some(gain.round_dp(DECIMAL_PRECISION));
        }
        totals
    }
}

/// Computes monthly valuations for every holding with a snapshot, using the
/// 3-tier price fallback and average-cost basis inference.
pub fn value_holdings(
    holding_snapshots: &[HoldingSnapshot],
    security_snapshots: &[SecuritySnapshot],
    investment_transactions: &[InvestmentTransaction],
) -> HoldingsValuation {
    debug!(
        "Valuing holdings from {} holding snapshots and {} security snapshots",
        holding_snapshots.len(),
        security_snapshots.len()
    );

    let prices = build_price_index(security_snapshots);
    let months = latest_snapshot_per_month(holding_snapshots);

    let mut result = HoldingsValuation::default();
    for ((holding_id, month), snapshot) in &months {
        let holding = &snapshot.holding;
        let (price, price_source) = match resolve_price(snapshot, &prices, *month) {
            Some(resolved) => resolved,
            None => {
                debug!(
                    "No resolvable price for holding {} in {}. Skipping month.",
                    holding_id,
                    month.format("%Y-%m")
                );
                continue;
            }
        };

        let (cost_basis, estimated) = resolve_cost_basis(snapshot, investment_transactions);

        result.ledger.set(
            holding_id,
            *month,
            HoldingValuation {
                value: price * holding.quantity,
                price,
                quantity: holding.quantity,
                cost_basis,
                cost_basis_estimated: estimated,
                price_source,
            },
        );
        let ids = result
            .holdings_by_account
            .entry(holding.account_id.clone())
            .or_default();
        if !ids.contains(holding_id) {
            ids.push(holding_id.clone());
        }
    }
    result
}

/// `security_id -> month -> close price`, keeping the later snapshot within a
/// month (ties broken by snapshot id) and skipping absent closes.
fn build_price_index(
    security_snapshots: &[SecuritySnapshot],
) -> HashMap<String, HashMap<NaiveDate, Decimal>> {
    let mut chosen: HashMap<(&str, NaiveDate), (&SecuritySnapshot, Decimal)> = HashMap::new();
    for snapshot in security_snapshots {
        let close = match snapshot.security.close_price {
            Some(close) => close,
            None => continue,
        };
        let key = (snapshot.security.id.as_str(), month_start(snapshot.date));
        match chosen.get(&key) {
            Some((current, _))
                if (snapshot.date, snapshot.id.as_str())
                    <= (current.date, current.id.as_str()) => {}
            _ => {
                chosen.insert(key, (snapshot, close));
            }
        }
    }

    let mut index: HashMap<String, HashMap<NaiveDate, Decimal>> = HashMap::new();
    for ((security_id, month), (_, close)) in chosen {
        index
            .entry(security_id.to_string())
            .or_default()
            .insert(month, close);
    }
    index
}

/// Groups holding snapshots by holding id and month, keeping only the most
/// recent snapshot within each month (ties broken by snapshot id).
fn latest_snapshot_per_month(
    holding_snapshots: &[HoldingSnapshot],
) -> HashMap<(String, NaiveDate), &HoldingSnapshot> {
    let mut chosen: HashMap<(String, NaiveDate), &HoldingSnapshot> = HashMap::new();
    for snapshot in holding_snapshots {
        let key = (snapshot.holding.holding_id(), month_start(snapshot.date));
        match chosen.get(&key) {
            Some(current)
                if (snapshot.date, snapshot.id.as_str())
                    <= (current.date, current.id.as_str()) => {}
            _ => {
                chosen.insert(key, snapshot);
            }
        }
    }
    chosen
}

/// Price resolution, first match wins: positive institution price, positive
/// security close for the month, positive value-per-unit.
fn resolve_price(
    snapshot: &HoldingSnapshot,
    prices: &HashMap<String, HashMap<NaiveDate, Decimal>>,
    month: NaiveDate,
) -> Option<(Decimal, PriceSource)> {
    let holding = &snapshot.holding;

    if let Some(price) = holding.institution_price {
        if price > Decimal::ZERO {
            return Some((price, PriceSource::Institution));
        }
    }
    if let Some(close) = prices
        .get(&holding.security_id)
        .and_then(|by_month| by_month.get(&month))
    {
        if *close > Decimal::ZERO {
            return Some((*close, PriceSource::Market));
        }
    }
    if !holding.quantity.is_zero() {
        let price = holding.institution_value / holding.quantity;
        if price > Decimal::ZERO {
            return Some((price, PriceSource::Derived));
        }
    }
    None
}

/// Uses the reported basis unless it is absent, or zero while quantity is
/// nonzero; in those cases infers it from the holding's transactions.
fn resolve_cost_basis(
    snapshot: &HoldingSnapshot,
    investment_transactions: &[InvestmentTransaction],
) -> (Option<Decimal>, bool) {
    let holding = &snapshot.holding;
    match holding.cost_basis {
        Some(basis) if !(basis.is_zero() && !holding.quantity.is_zero()) => (Some(basis), false),
        _ => {
            let inferred = infer_cost_basis(
                &holding.account_id,
                &holding.security_id,
                snapshot.date,
                investment_transactions,
            );
            let estimated = inferred.is_some();
            (inferred, estimated)
        }
    }
}

/// Average-cost walk over the holding's transactions dated on/before `as_of`:
/// buys add `price * quantity + fees`; sells remove quantity at the current
/// average cost; other transaction types are ignored. Floating drift is
/// clamped at zero rather than allowed to go negative.
fn infer_cost_basis(
    account_id: &str,
    security_id: &str,
    as_of: NaiveDate,
    investment_transactions: &[InvestmentTransaction],
) -> Option<Decimal> {
    let mut relevant: Vec<&InvestmentTransaction> = investment_transactions
        .iter()
        .filter(|tx| {
            tx.account_id == account_id && tx.security_id == security_id && tx.date <= as_of
        })
        .collect();
    relevant.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));

    let mut total_cost = Decimal::ZERO;
    let mut total_quantity = Decimal::ZERO;
    for tx in relevant {
        match tx.transaction_type {
            InvestmentTransactionType::Buy => {
                total_cost += tx.price * tx.quantity + tx.fees;
                total_quantity += tx.quantity;
            }
            InvestmentTransactionType::Sell => {
                if total_quantity > Decimal::ZERO {
                    let average_cost = total_cost / total_quantity;
                    total_cost -= average_cost * tx.quantity;
                    total_quantity -= tx.quantity;
                    if total_cost < Decimal::ZERO {
                        total_cost = Decimal::ZERO;
                    }
                    if total_quantity < Decimal::ZERO {
                        total_quantity = Decimal::ZERO;
                    }
                }
            }
            _ => {}
        }
    }

    if total_quantity <= Decimal::ZERO {
        None
    } else {
        Some(total_cost)
    }
}
