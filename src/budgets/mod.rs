pub mod budget_aggregator;
pub mod budget_model;
pub mod budget_taxonomy;
pub mod capacity_aggregator;

pub use budget_aggregator::{aggregate_budgets, BudgetSpend, BudgetTotals};
pub use budget_model::{
    active_capacity_at, active_capacity_at_anchor, is_unlimited, Budget, BudgetNode, Capacity,
    Category, NodeKind, Section,
};
pub use budget_taxonomy::BudgetTaxonomy;
pub use capacity_aggregator::{
    aggregate_capacities, CapacityAnchor, CapacityReport, CapacityTotals,
};
