use chrono::NaiveDate;
use log::{debug, warn};
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::errors::Result;
use crate::ledger::MonthlyLedger;
use crate::models::{Account, AccountSnapshot, InvestmentTransaction, Transaction};
use crate::utils::time_utils::{add_months, get_months_between, month_start};

/// Computes, per account, a monthly balance history blending a
/// transaction-derived running balance with snapshot-derived point-in-time
/// balances, according to each account's source preference. Today is always
/// pinned to the account's live current balance.
pub fn aggregate_balances(
    accounts: &[Account],
    transactions: &[Transaction],
    investment_transactions: &[InvestmentTransaction],
    snapshots: &[AccountSnapshot],
    today: NaiveDate,
) -> Result<MonthlyLedger<Decimal>> {
    debug!(
        "Aggregating balances for {} accounts over {} transactions and {} snapshots",
        accounts.len(),
        transactions.len(),
        snapshots.len()
    );

    let from_transactions =
        transaction_balances(accounts, transactions, investment_transactions, today)?;
    let from_snapshots = snapshot_balances(snapshots, today);
    merge_balances(accounts, &from_transactions, &from_snapshots, today)
}

/// Running balance derived purely from transactions: each account is
/// anchored at its current balance in the present month, and every earlier
/// month equals the following month's balance minus the contributions that
/// landed between them. A transaction's contribution is recorded against the
/// month *before* its effective month.
pub(crate) fn transaction_balances(
    accounts: &[Account],
    transactions: &[Transaction],
    investment_transactions: &[InvestmentTransaction],
    today: NaiveDate,
) -> Result<MonthlyLedger<Decimal>> {
    let visible: HashMap<&str, &Account> = accounts
        .iter()
        .filter(|account| !account.hide)
        .map(|account| (account.id.as_str(), account))
        .collect();

    let mut deltas: MonthlyLedger<Decimal> = MonthlyLedger::new();
    for tx in transactions {
        let effective = tx.effective_date();
        if effective > today || !visible.contains_key(tx.account_id.as_str()) {
            continue;
        }
        let month_before = add_months(month_start(effective), -1)?;
        deltas.add(&tx.account_id, month_before, &tx.amount);
    }
    for tx in investment_transactions {
        let effective = tx.effective_date();
        if effective > today || !visible.contains_key(tx.account_id.as_str()) {
            continue;
        }
        // A buy reduces the cash-equivalent balance
        let contribution = -(tx.price * tx.quantity);
        let month_before = add_months(month_start(effective), -1)?;
        deltas.add(&tx.account_id, month_before, &contribution);
    }

    let today_month = month_start(today);
    let mut balances: MonthlyLedger<Decimal> = MonthlyLedger::new();
    for account in accounts {
        balances.set(&account.id, today_month, account.current_balance);

        let earliest = match deltas.range(&account.id) {
            Some((earliest, _)) if earliest < today_month => earliest,
            _ => continue,
        };
        let mut next_balance = account.current_balance;
        let last = add_months(today_month, -1)?;
        for month in get_months_between(earliest, last).into_iter().rev() {
            let delta = deltas.get(&account.id, month).copied().unwrap_or_default();
            let balance = next_balance - delta;
            balances.set(&account.id, month, balance);
            next_balance = balance;
        }
    }
    Ok(balances)
}

/// Point-in-time balances: the most recent snapshot per account per month
/// wins, with identical dates broken deterministically by snapshot id.
pub(crate) fn snapshot_balances(
    snapshots: &[AccountSnapshot],
    today: NaiveDate,
) -> MonthlyLedger<Decimal> {
    let mut chosen: HashMap<(&str, NaiveDate), &AccountSnapshot> = HashMap::new();
    for snapshot in snapshots {
        if snapshot.date > today {
            continue;
        }
        let key = (snapshot.account.id.as_str(), month_start(snapshot.date));
        match chosen.get(&key) {
            Some(current)
                if (snapshot.date, snapshot.id.as_str())
                    <= (current.date, current.id.as_str()) => {}
            _ => {
                chosen.insert(key, snapshot);
            }
        }
    }

    let mut balances: MonthlyLedger<Decimal> = MonthlyLedger::new();
    for ((account_id, month), snapshot) in chosen {
        balances.set(account_id, month, snapshot.account.current_balance);
    }
    balances
}

/// Source-preference merge, walking from today backward to the oldest month
/// present in either source: snapshot value if preferred and present, else
/// transaction value if preferred and present, else the nearer-to-today
/// resolved value carried backward.
fn merge_balances(
    accounts: &[Account],
    from_transactions: &MonthlyLedger<Decimal>,
    from_snapshots: &MonthlyLedger<Decimal>,
    today: NaiveDate,
) -> Result<MonthlyLedger<Decimal>> {
    let today_month = month_start(today);
    let mut merged: MonthlyLedger<Decimal> = MonthlyLedger::new();

    for account in accounts {
        merged.set(&account.id, today_month, account.current_balance);

        let oldest = [
            from_transactions.range(&account.id),
            from_snapshots.range(&account.id),
        ]
        .into_iter()
        .flatten()
        .map(|(earliest, _)| earliest)
        .min();
        let oldest = match oldest {
            Some(oldest) if oldest < today_month => oldest,
            _ => continue,
        };

        if !account.use_snapshots && !account.use_transactions {
            warn!(
                "Account {} prefers neither balance source; carrying current balance backward.",
                account.id
            );
        }

        let mut resolved = account.current_balance;
        let last = add_months(today_month, -1)?;
        for month in get_months_between(oldest, last).into_iter().rev() {
            if account.use_snapshots {
                if let Some(balance) = from_snapshots.get(&account.id, month) {
                    resolved = *balance;
                    merged.set(&account.id, month, resolved);
                    continue;
                }
            }
            if account.use_transactions {
                if let Some(balance) = from_transactions.get(&account.id, month) {
                    resolved = *balance;
                    merged.set(&account.id, month, resolved);
                    continue;
                }
            }
            merged.set(&account.id, month, resolved);
        }
    }
    Ok(merged)
}
