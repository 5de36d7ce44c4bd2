use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::UNLIMITED_CAPACITY;

/// A declared spending limit scoped to a time period.
///
/// `active_from: None` applies to all time before the next dated capacity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capacity {
    pub month_amount: Decimal,
    pub active_from: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub id: String,
    pub name: String,
    pub capacities: Vec<Capacity>,
    pub roll_over: bool,
    pub roll_over_start_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: String,
    pub budget_id: String,
    pub name: String,
    pub capacities: Vec<Capacity>,
    pub roll_over: bool,
    pub roll_over_start_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub section_id: String,
    pub name: String,
    pub capacities: Vec<Capacity>,
    pub roll_over: bool,
    pub roll_over_start_date: Option<NaiveDate>,
}

/// The three budget-family node kinds. Budgets are roots, sections sit under
/// budgets, categories are the leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    Budget,
    Section,
    Category,
}

/// Borrowed view over any budget-family node.
#[derive(Debug, Clone, Copy)]
pub enum BudgetNode<'a> {
    Budget(&'a Budget),
    Section(&'a Section),
    Category(&'a Category),
}

impl<'a> BudgetNode<'a> {
    pub fn kind(&self) -> NodeKind {
        match self {
            BudgetNode::Budget(_) => NodeKind::Budget,
            BudgetNode::Section(_) => NodeKind::Section,
            BudgetNode::Category(_) => NodeKind::Category,
        }
    }

    pub fn id(&self) -> &'a str {
        match self {
            BudgetNode::Budget(b) => &b.id,
            BudgetNode::Section(s) => &s.id,
            BudgetNode::Category(c) => &c.id,
        }
    }

    pub fn capacities(&self) -> &'a [Capacity] {
        match self {
            BudgetNode::Budget(b) => &b.capacities,
            BudgetNode::Section(s) => &s.capacities,
            BudgetNode::Category(c) => &c.capacities,
        }
    }

    pub fn roll_over(&self) -> bool {
        match self {
            BudgetNode::Budget(b) => b.roll_over,
            BudgetNode::Section(s) => s.roll_over,
            BudgetNode::Category(c) => c.roll_over,
        }
    }

    pub fn roll_over_start_date(&self) -> Option<NaiveDate> {
        match self {
            BudgetNode::Budget(b) => b.roll_over_start_date,
            BudgetNode::Section(s) => s.roll_over_start_date,
            BudgetNode::Category(c) => c.roll_over_start_date,
        }
    }
}

/// Whether a capacity amount carries the reserved "no limit" magnitude.
pub fn is_unlimited(amount: &Decimal) -> bool {
    let sentinel = Decimal::from_str_radix(UNLIMITED_CAPACITY, 10)
        .unwrap_or_else(|_| Decimal::MAX);
    amount.abs() == sentinel
}

/// The capacity in effect on `date`: the record with the latest
/// `active_from <= date`, where an undated record sorts before all dated ones.
pub fn active_capacity_at(capacities: &[Capacity], date: NaiveDate) -> Option<&Capacity> {
    capacities
        .iter()
        .filter(|capacity| capacity.active_from.map_or(true, |from| from <= date))
        .max_by_key(|capacity| capacity.active_from)
}

/// The capacity identified by a period anchor. A `None` anchor names the
/// undated record; a dated anchor resolves like `active_capacity_at`.
pub fn active_capacity_at_anchor(
    capacities: &[Capacity],
    anchor: Option<NaiveDate>,
) -> Option<&Capacity> {
    match anchor {
        Some(date) => active_capacity_at(capacities, date),
        None => capacities.iter().find(|c| c.active_from.is_none()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn capacities() -> Vec<Capacity> {
        vec![
            Capacity {
                month_amount: dec!(100),
                active_from: None,
            },
            Capacity {
                month_amount: dec!(200),
                active_from: Some(date(2024, 2, 1)),
            },
            Capacity {
                month_amount: dec!(300),
                active_from: Some(date(2024, 6, 1)),
            },
        ]
    }

    #[test]
    fn latest_dated_record_on_or_before_date_wins() {
        let caps = capacities();
        let active = active_capacity_at(&caps, date(2024, 4, 15)).unwrap();
        assert_eq!(active.month_amount, dec!(200));

        let active = active_capacity_at(&caps, date(2024, 6, 1)).unwrap();
        assert_eq!(active.month_amount, dec!(300));
    }

    #[test]
    fn undated_record_covers_all_earlier_time() {
        let caps = capacities();
        let active = active_capacity_at(&caps, date(2023, 1, 1)).unwrap();
        assert_eq!(active.active_from, None);
        assert_eq!(active.month_amount, dec!(100));
    }

    #[test]
    fn anchor_resolution() {
        let caps = capacities();
        assert_eq!(
            active_capacity_at_anchor(&caps, None).unwrap().month_amount,
            dec!(100)
        );
        assert_eq!(
            active_capacity_at_anchor(&caps, Some(date(2024, 3, 1)))
                .unwrap()
                .month_amount,
            dec!(200)
        );
    }

    #[test]
    fn unlimited_sentinel_matches_either_sign() {
        let sentinel = Decimal::from_str_radix(UNLIMITED_CAPACITY, 10).unwrap();
        assert!(is_unlimited(&sentinel));
        assert!(is_unlimited(&(-sentinel)));
        assert!(!is_unlimited(&dec!(250)));
    }
}
