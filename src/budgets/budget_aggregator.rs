use chrono::NaiveDate;
use log::{debug, warn};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

use super::budget_model::{active_capacity_at, is_unlimited, BudgetNode, NodeKind};
use super::budget_taxonomy::BudgetTaxonomy;
use crate::errors::Result;
use crate::ledger::{Accumulate, MonthlyLedger};
use crate::models::{Account, SplitTransaction, Transaction, TransactionLabel};
use crate::splits::TransactionFamilies;
use crate::utils::time_utils::{add_months, get_months_between, month_start};

/// Per-month spend summary for one budget-family node.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetSpend {
    /// Spend assigned to a category.
    pub sorted_amount: Decimal,
    /// Spend only resolvable to a budget (no category label).
    pub unsorted_amount: Decimal,
    pub number_of_unsorted_items: i32,
    /// Overspend (positive) or unspent capacity (negative) carried forward.
    pub rolled_over_amount: Decimal,
}

impl Accumulate for BudgetSpend {
    fn accumulate(&mut self, delta: &Self) {
        self.sorted_amount += delta.sorted_amount;
        self.unsorted_amount += delta.unsorted_amount;
        self.number_of_unsorted_items += delta.number_of_unsorted_items;
        self.rolled_over_amount += delta.rolled_over_amount;
    }
}

impl BudgetSpend {
    fn sorted(amount: Decimal) -> Self {
        BudgetSpend {
            sorted_amount: amount,
            ..Default::default()
        }
    }

    fn unsorted(amount: Decimal) -> Self {
        BudgetSpend {
            unsorted_amount: amount,
            number_of_unsorted_items: 1,
            ..Default::default()
        }
    }

    fn rolled_over(amount: Decimal) -> Self {
        BudgetSpend {
            rolled_over_amount: amount,
            ..Default::default()
        }
    }
}

/// Monthly spend ledgers, one per node kind. The same sorted amount
/// propagates up all three levels independently.
#[derive(Debug, Default)]
pub struct BudgetTotals {
    budgets: MonthlyLedger<BudgetSpend>,
    sections: MonthlyLedger<BudgetSpend>,
    categories: MonthlyLedger<BudgetSpend>,
}

impl BudgetTotals {
    pub fn ledger(&self, kind: NodeKind) -> &MonthlyLedger<BudgetSpend> {
        match kind {
            NodeKind::Budget => &self.budgets,
            NodeKind::Section => &self.sections,
            NodeKind::Category => &self.categories,
        }
    }

    pub fn spend(&self, kind: NodeKind, id: &str, date: NaiveDate) -> Option<&BudgetSpend> {
        self.ledger(kind).get(id, date)
    }

    fn ledger_mut(&mut self, kind: NodeKind) -> &mut MonthlyLedger<BudgetSpend> {
        match kind {
            NodeKind::Budget => &mut self.budgets,
            NodeKind::Section => &mut self.sections,
            NodeKind::Category => &mut self.categories,
        }
    }
}

/// Normalized spend record: real transactions and split-derived carve-outs
/// flow through the same accumulation loop in this shape.
struct SpendContribution<'a> {
    id: &'a str,
    account_id: &'a str,
    date: NaiveDate,
    amount: Decimal,
    label: &'a TransactionLabel,
}

/// Maps transactions plus their (non-orphaned) split children into
/// contributions. A split shares the parent's account and effective date but
/// carries its own id, amount, and label.
fn normalize_contributions<'a>(
    transactions: &'a [Transaction],
    families: &TransactionFamilies<'a>,
) -> Vec<SpendContribution<'a>> {
    let mut contributions = Vec::with_capacity(transactions.len());
    for tx in transactions {
        contributions.push(SpendContribution {
            id: &tx.id,
            account_id: &tx.account_id,
            date: tx.effective_date(),
            amount: tx.amount,
            label: &tx.label,
        });
        for split in families.children(&tx.id) {
            contributions.push(SpendContribution {
                id: &split.id,
                account_id: &tx.account_id,
                date: tx.effective_date(),
                amount: split.amount,
                label: &split.label,
            });
        }
    }
    contributions
}

/// Computes per-month sorted/unsorted spend and rollover carry-forward for
/// every budget, section, and category.
pub fn aggregate_budgets(
    accounts: &[Account],
    transactions: &[Transaction],
    splits: &[SplitTransaction],
    taxonomy: &BudgetTaxonomy,
    today: NaiveDate,
) -> Result<BudgetTotals> {
    debug!(
        "Aggregating budget spend over {} transactions and {} splits",
        transactions.len(),
        splits.len()
    );

    let accounts_by_id: HashMap<&str, &Account> =
        accounts.iter().map(|a| (a.id.as_str(), a)).collect();
    let families = TransactionFamilies::build(transactions, splits);
    let contributions = normalize_contributions(transactions, &families);

    let mut totals = BudgetTotals::default();

    for contribution in &contributions {
        let account = match accounts_by_id.get(contribution.account_id) {
            Some(account) => account,
            None => {
                warn!(
                    "Transaction {} references missing account {}. Skipping.",
                    contribution.id, contribution.account_id
                );
                continue;
            }
        };
        if account.hide {
            continue;
        }

        // A parent's contribution excludes whatever its splits carved out;
        // split-derived contributions have no children of their own.
        let amount_after_split =
            contribution.amount - families.children_amount_total(contribution.id);

        match &contribution.label.category_id {
            None => {
                let budget_id = contribution
                    .label
                    .budget_id
                    .as_deref()
                    .or(account.label.budget_id.as_deref());
                let budget = budget_id.and_then(|id| taxonomy.budget(id));
                if let Some(budget) = budget {
                    totals.budgets.add(
                        &budget.id,
                        contribution.date,
                        &BudgetSpend::unsorted(amount_after_split),
                    );
                    record_rollover_spend(
                        &mut totals,
                        BudgetNode::Budget(budget),
                        contribution.date,
                        amount_after_split,
                    )?;
                }
            }
            Some(category_id) => {
                // A dangling category contributes nothing at any level.
                let category = match taxonomy.category(category_id) {
                    Some(category) => category,
                    None => continue,
                };
                totals.categories.add(
                    &category.id,
                    contribution.date,
                    &BudgetSpend::sorted(amount_after_split),
                );
                record_rollover_spend(
                    &mut totals,
                    BudgetNode::Category(category),
                    contribution.date,
                    amount_after_split,
                )?;

                let section = match taxonomy.section_of(category) {
                    Some(section) => section,
                    None => continue,
                };
                totals.sections.add(
                    &section.id,
                    contribution.date,
                    &BudgetSpend::sorted(amount_after_split),
                );
                record_rollover_spend(
                    &mut totals,
                    BudgetNode::Section(section),
                    contribution.date,
                    amount_after_split,
                )?;

                let budget = match taxonomy.budget_of(section) {
                    Some(budget) => budget,
                    None => continue,
                };
                totals.budgets.add(
                    &budget.id,
                    contribution.date,
                    &BudgetSpend::sorted(amount_after_split),
                );
                record_rollover_spend(
                    &mut totals,
                    BudgetNode::Budget(budget),
                    contribution.date,
                    amount_after_split,
                )?;
            }
        }
    }

    apply_rollover_decay(&mut totals, taxonomy, today)?;

    Ok(totals)
}

/// Step 5: spend on a rollover-enabled node also lands in the *next* month's
/// `rolled_over_amount` — unspent capacity decays forward.
fn record_rollover_spend(
    totals: &mut BudgetTotals,
    node: BudgetNode,
    date: NaiveDate,
    amount: Decimal,
) -> Result<()> {
    match node.roll_over_start_date() {
        Some(start) if node.roll_over() && start <= date => {}
        _ => return Ok(()),
    }

    let next_month = add_months(month_start(date), 1)?;
    totals
        .ledger_mut(node.kind())
        .add(node.id(), next_month, &BudgetSpend::rolled_over(amount));
    Ok(())
}

/// Step 6: walk each rollover-enabled node from the month after its start
/// date through the current month, folding the prior month's balance minus
/// that month's capacity into the spend contributions already recorded.
/// Each node touches only its own ledger entry.
fn apply_rollover_decay(
    totals: &mut BudgetTotals,
    taxonomy: &BudgetTaxonomy,
    today: NaiveDate,
) -> Result<()> {
    let current_month = month_start(today);

    for node in taxonomy.nodes() {
        let start = match node.roll_over_start_date() {
            Some(start) if node.roll_over() => month_start(start),
            _ => continue,
        };
        let first = add_months(start, 1)?;
        if first > current_month {
            continue;
        }

        let ledger = totals.ledger_mut(node.kind());
        let mut previous_month = start;
        for month in get_months_between(first, current_month) {
            let previous_rolled = ledger
                .get(node.id(), previous_month)
                .map(|spend| spend.rolled_over_amount)
                .unwrap_or_default();
            // Unlimited capacities never participate in ordinary sums
            let capacity = active_capacity_at(node.capacities(), month)
                .map(|c| c.month_amount)
                .filter(|amount| !is_unlimited(amount))
                .unwrap_or_default();

            let mut spend = ledger.get(node.id(), month).cloned().unwrap_or_default();
            spend.rolled_over_amount += previous_rolled - capacity;
            ledger.set(node.id(), month, spend);

            previous_month = month;
        }
    }
    Ok(())
}
