use std::collections::HashMap;

use super::budget_model::{Budget, BudgetNode, Category, Section};

/// Read-only id lookup over the budget family, built once per aggregation
/// pass and passed explicitly into every aggregator. Must not mutate during
/// a pass.
#[derive(Debug)]
pub struct BudgetTaxonomy<'a> {
    budgets: HashMap<&'a str, &'a Budget>,
    sections: HashMap<&'a str, &'a Section>,
    categories: HashMap<&'a str, &'a Category>,
}

impl<'a> BudgetTaxonomy<'a> {
    pub fn new(
        budgets: &'a [Budget],
        sections: &'a [Section],
        categories: &'a [Category],
    ) -> Self {
        BudgetTaxonomy {
            budgets: budgets.iter().map(|b| (b.id.as_str(), b)).collect(),
            sections: sections.iter().map(|s| (s.id.as_str(), s)).collect(),
            categories: categories.iter().map(|c| (c.id.as_str(), c)).collect(),
        }
    }

    pub fn budget(&self, id: &str) -> Option<&'a Budget> {
        self.budgets.get(id).copied()
    }

    pub fn section(&self, id: &str) -> Option<&'a Section> {
        self.sections.get(id).copied()
    }

    pub fn category(&self, id: &str) -> Option<&'a Category> {
        self.categories.get(id).copied()
    }

    /// Parent section of a category, if it still exists.
    pub fn section_of(&self, category: &Category) -> Option<&'a Section> {
        self.section(&category.section_id)
    }

    /// Parent budget of a section, if it still exists.
    pub fn budget_of(&self, section: &Section) -> Option<&'a Budget> {
        self.budget(&section.budget_id)
    }

    pub fn budgets(&self) -> impl Iterator<Item = &'a Budget> + '_ {
        self.budgets.values().copied()
    }

    pub fn sections(&self) -> impl Iterator<Item = &'a Section> + '_ {
        self.sections.values().copied()
    }

    pub fn categories(&self) -> impl Iterator<Item = &'a Category> + '_ {
        self.categories.values().copied()
    }

    /// Every node in the family, budgets first, then sections, then
    /// categories.
    pub fn nodes(&self) -> impl Iterator<Item = BudgetNode<'a>> + '_ {
        self.budgets()
            .map(BudgetNode::Budget)
            .chain(self.sections().map(BudgetNode::Section))
            .chain(self.categories().map(BudgetNode::Category))
    }
}
