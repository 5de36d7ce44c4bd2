use chrono::NaiveDate;
use log::debug;
use rust_decimal::Decimal;

use crate::balances::aggregate_balances;
use crate::budgets::{
    aggregate_budgets, aggregate_capacities, Budget, BudgetTaxonomy, BudgetTotals,
    CapacityReport, Category, Section,
};
use crate::errors::Result;
use crate::holdings::{value_holdings, HoldingsValuation};
use crate::ledger::MonthlyLedger;
use crate::models::{
    Account, AccountSnapshot, HoldingSnapshot, InvestmentTransaction, SecuritySnapshot,
    SplitTransaction, Transaction,
};

/// One immutable snapshot of the domain collections, borrowed for the
/// duration of a single aggregation pass.
#[derive(Debug, Clone, Copy)]
pub struct EngineInput<'a> {
    pub accounts: &'a [Account],
    pub transactions: &'a [Transaction],
    pub investment_transactions: &'a [InvestmentTransaction],
    pub split_transactions: &'a [SplitTransaction],
    pub account_snapshots: &'a [AccountSnapshot],
    pub holding_snapshots: &'a [HoldingSnapshot],
    pub security_snapshots: &'a [SecuritySnapshot],
    pub budgets: &'a [Budget],
    pub sections: &'a [Section],
    pub categories: &'a [Category],
    pub today: NaiveDate,
}

/// All aggregates for one pass. Fully self-contained: holds no references
/// into the input, so a newer result can simply replace an older one.
#[derive(Debug)]
pub struct EngineOutput {
    pub balances: MonthlyLedger<Decimal>,
    pub budget_totals: BudgetTotals,
    pub capacity_report: CapacityReport,
    pub holdings: HoldingsValuation,
}

/// Runs every aggregator against one input snapshot.
pub fn run(input: &EngineInput) -> Result<EngineOutput> {
    debug!("Running aggregation pass for {}", input.today);

    let taxonomy = BudgetTaxonomy::new(input.budgets, input.sections, input.categories);

    let balances = aggregate_balances(
        input.accounts,
        input.transactions,
        input.investment_transactions,
        input.account_snapshots,
        input.today,
    )?;
    let budget_totals = aggregate_budgets(
        input.accounts,
        input.transactions,
        input.split_transactions,
        &taxonomy,
        input.today,
    )?;
    let capacity_report = aggregate_capacities(&taxonomy);
    let holdings = value_holdings(
        input.holding_snapshots,
        input.security_snapshots,
        input.investment_transactions,
    );

    Ok(EngineOutput {
        balances,
        budget_totals,
        capacity_report,
        holdings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budgets::NodeKind;
    use crate::models::{AccountLabel, TransactionLabel};
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn fixture() -> (Vec<Account>, Vec<Transaction>, Vec<Budget>) {
        let accounts = vec![Account {
            id: "acc_1".to_string(),
            name: "Checking".to_string(),
            current_balance: dec!(1000),
            available_balance: dec!(1000),
            use_transactions: true,
            use_snapshots: false,
            hide: false,
            label: AccountLabel {
                budget_id: Some("b1".to_string()),
            },
        }];
        let transactions = vec![Transaction {
            id: "tx_1".to_string(),
            account_id: "acc_1".to_string(),
            date: date(2024, 3, 5),
            authorized_date: None,
            amount: dec!(200),
            label: TransactionLabel::default(),
        }];
        let budgets = vec![Budget {
            id: "b1".to_string(),
            name: "Everything".to_string(),
            capacities: Vec::new(),
            roll_over: false,
            roll_over_start_date: None,
        }];
        (accounts, transactions, budgets)
    }

    #[test]
    fn one_pass_feeds_every_aggregate() {
        let (accounts, transactions, budgets) = fixture();
        let input = EngineInput {
            accounts: &accounts,
            transactions: &transactions,
            investment_transactions: &[],
            split_transactions: &[],
            account_snapshots: &[],
            holding_snapshots: &[],
            security_snapshots: &[],
            budgets: &budgets,
            sections: &[],
            categories: &[],
            today: date(2024, 3, 20),
        };

        let output = run(&input).unwrap();
        assert_eq!(
            output.balances.get("acc_1", date(2024, 2, 1)),
            Some(&dec!(800))
        );
        let spend = output
            .budget_totals
            .spend(NodeKind::Budget, "b1", date(2024, 3, 1))
            .unwrap();
        assert_eq!(spend.unsorted_amount, dec!(200));
    }

    #[test]
    fn reruns_on_the_same_snapshot_are_identical() {
        let (accounts, transactions, budgets) = fixture();
        let input = EngineInput {
            accounts: &accounts,
            transactions: &transactions,
            investment_transactions: &[],
            split_transactions: &[],
            account_snapshots: &[],
            holding_snapshots: &[],
            security_snapshots: &[],
            budgets: &budgets,
            sections: &[],
            categories: &[],
            today: date(2024, 3, 20),
        };

        let first = run(&input).unwrap();
        let second = run(&input).unwrap();
        assert_eq!(first.balances, second.balances);
        assert_eq!(
            first.balances.month_map("acc_1"),
            second.balances.month_map("acc_1")
        );
        for kind in [NodeKind::Budget, NodeKind::Section, NodeKind::Category] {
            assert_eq!(
                first.budget_totals.ledger(kind),
                second.budget_totals.ledger(kind)
            );
        }
    }
}
