use chrono::NaiveDate;
use log::{debug, warn};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use super::budget_model::{
    active_capacity_at_anchor, is_unlimited, BudgetNode, NodeKind,
};
use super::budget_taxonomy::BudgetTaxonomy;

/// Period anchor of a capacity record (`None` = the undated record, which
/// sorts before all dated anchors).
pub type CapacityAnchor = Option<NaiveDate>;

/// Aggregated children capacities for one `(node, period)` key.
///
/// Sentinel (unlimited) child amounts override the sum instead of joining it;
/// an override always wins at its key.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityTotals {
    children_sum: Decimal,
    children_override: Option<Decimal>,
    grand_children_sum: Decimal,
    grand_children_override: Option<Decimal>,
}

impl CapacityTotals {
    pub fn children_total(&self) -> Decimal {
        self.children_override.unwrap_or(self.children_sum)
    }

    pub fn grand_children_total(&self) -> Decimal {
        self.grand_children_override.unwrap_or(self.grand_children_sum)
    }

    fn add_child(&mut self, amount: Decimal) {
        if is_unlimited(&amount) {
            self.children_override = Some(amount);
        } else {
            self.children_sum += amount;
        }
    }

    fn add_grand_child(&mut self, amount: Decimal) {
        if is_unlimited(&amount) {
            self.grand_children_override = Some(amount);
        } else {
            self.grand_children_sum += amount;
        }
    }
}

/// Children/grand-children capacity totals per budget-family node and
/// capacity period, used to detect "out of sync" declared limits.
#[derive(Debug, Default)]
pub struct CapacityReport {
    totals: HashMap<(NodeKind, String), BTreeMap<CapacityAnchor, CapacityTotals>>,
}

impl CapacityReport {
    pub fn totals(
        &self,
        kind: NodeKind,
        id: &str,
        anchor: CapacityAnchor,
    ) -> Option<&CapacityTotals> {
        self.totals
            .get(&(kind, id.to_string()))
            .and_then(|periods| periods.get(&anchor))
    }

    /// All period totals recorded for a node, ordered by anchor.
    pub fn periods(
        &self,
        kind: NodeKind,
        id: &str,
    ) -> Option<&BTreeMap<CapacityAnchor, CapacityTotals>> {
        self.totals.get(&(kind, id.to_string()))
    }

    /// A node is synced for a period iff its own declared amount equals the
    /// (possibly overridden) sum of its children's amounts at that anchor.
    pub fn is_synced(&self, node: BudgetNode, anchor: CapacityAnchor) -> bool {
        let own = active_capacity_at_anchor(node.capacities(), anchor)
            .map(|capacity| capacity.month_amount)
            .unwrap_or_default();
        let children = self
            .totals(node.kind(), node.id(), anchor)
            .map(CapacityTotals::children_total)
            .unwrap_or_default();
        own == children
    }

    fn entry_mut(&mut self, kind: NodeKind, id: &str, anchor: CapacityAnchor) -> &mut CapacityTotals {
        self.totals
            .entry((kind, id.to_string()))
            .or_default()
            .entry(anchor)
            .or_default()
    }
}

/// Sums each node's children's (and, for budgets, grandchildren's) declared
/// capacities at matching period anchors.
pub fn aggregate_capacities(taxonomy: &BudgetTaxonomy) -> CapacityReport {
    debug!("Aggregating budget-family capacity totals");
    let mut report = CapacityReport::default();

    for section in taxonomy.sections() {
        let budget = match taxonomy.budget(&section.budget_id) {
            Some(budget) => budget,
            None => {
                warn!(
                    "Section {} references missing budget {}. Skipping.",
                    section.id, section.budget_id
                );
                continue;
            }
        };
        for capacity in &section.capacities {
            if let Some(parent) =
                active_capacity_at_anchor(&budget.capacities, capacity.active_from)
            {
                report
                    .entry_mut(NodeKind::Budget, &budget.id, parent.active_from)
                    .add_child(capacity.month_amount);
            }
        }
    }

    for category in taxonomy.categories() {
        let section = match taxonomy.section_of(category) {
            Some(section) => section,
            None => {
                warn!(
                    "Category {} references missing section {}. Skipping.",
                    category.id, category.section_id
                );
                continue;
            }
        };
        let budget = taxonomy.budget_of(section);

        for capacity in &category.capacities {
            if let Some(parent) =
                active_capacity_at_anchor(&section.capacities, capacity.active_from)
            {
                report
                    .entry_mut(NodeKind::Section, &section.id, parent.active_from)
                    .add_child(capacity.month_amount);
            }
            if let Some(budget) = budget {
                if let Some(grand_parent) =
                    active_capacity_at_anchor(&budget.capacities, capacity.active_from)
                {
                    report
                        .entry_mut(NodeKind::Budget, &budget.id, grand_parent.active_from)
                        .add_grand_child(capacity.month_amount);
                }
            }
        }
    }

    report
}
