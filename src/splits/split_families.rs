use log::warn;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};

use crate::models::{SplitTransaction, Transaction};

/// Split children grouped under their parent transaction id.
///
/// A parent's contribution to spend must subtract whatever has been carved
/// into splits; this index answers "what children exist for parent X and
/// what do they sum to" in one pass.
#[derive(Debug, Default)]
pub struct TransactionFamilies<'a> {
    children: HashMap<&'a str, Vec<&'a SplitTransaction>>,
}

impl<'a> TransactionFamilies<'a> {
    /// Indexes every split under its parent transaction. Splits whose parent
    /// is not present in `transactions` are orphans and are skipped.
    pub fn build(transactions: &[Transaction], splits: &'a [SplitTransaction]) -> Self {
        let known_parents: HashSet<&str> =
            transactions.iter().map(|tx| tx.id.as_str()).collect();

        let mut families = TransactionFamilies::default();
        for split in splits {
            if !known_parents.contains(split.transaction_id.as_str()) {
                warn!(
                    "Split transaction {} references missing parent {}. Skipping.",
                    split.id, split.transaction_id
                );
                continue;
            }
            families.add(&split.transaction_id, split);
        }
        families
    }

    /// Appends a split to the parent's child set, creating it if absent.
    pub fn add(&mut self, parent_id: &'a str, split: &'a SplitTransaction) {
        self.children.entry(parent_id).or_default().push(split);
    }

    pub fn children(&self, parent_id: &str) -> &[&'a SplitTransaction] {
        self.children
            .get(parent_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Sum of all children's amounts; zero for a parent with no children.
    pub fn children_amount_total(&self, parent_id: &str) -> Decimal {
        self.children(parent_id)
            .iter()
            .map(|split| split.amount)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransactionLabel;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn transaction(id: &str, amount: Decimal) -> Transaction {
        Transaction {
            id: id.to_string(),
            account_id: "acc_1".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
            authorized_date: None,
            amount,
            label: TransactionLabel::default(),
        }
    }

    fn split(id: &str, parent_id: &str, amount: Decimal) -> SplitTransaction {
        SplitTransaction {
            id: id.to_string(),
            transaction_id: parent_id.to_string(),
            account_id: "acc_1".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
            amount,
            label: TransactionLabel::default(),
        }
    }

    #[test]
    fn groups_children_and_totals_amounts() {
        let transactions = vec![transaction("tx_1", dec!(100))];
        let splits = vec![
            split("sp_1", "tx_1", dec!(30)),
            split("sp_2", "tx_1", dec!(20)),
        ];

        let families = TransactionFamilies::build(&transactions, &splits);
        assert_eq!(families.children("tx_1").len(), 2);
        assert_eq!(families.children_amount_total("tx_1"), dec!(50));
    }

    #[test]
    fn unknown_parent_totals_to_zero() {
        let families = TransactionFamilies::build(&[], &[]);
        assert_eq!(families.children_amount_total("nope"), dec!(0));
        assert!(families.children("nope").is_empty());
    }

    #[test]
    fn orphaned_splits_are_skipped() {
        let transactions = vec![transaction("tx_1", dec!(100))];
        let splits = vec![
            split("sp_1", "tx_1", dec!(30)),
            split("sp_2", "tx_gone", dec!(999)),
        ];

        let families = TransactionFamilies::build(&transactions, &splits);
        assert_eq!(families.children_amount_total("tx_1"), dec!(30));
        assert!(families.children("tx_gone").is_empty());
    }
}
