use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A tracked financial account.
///
/// `use_transactions` / `use_snapshots` select which balance source the
/// engine prefers when both are available for a month; `hide` excludes the
/// account's transactions from budget totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub name: String,
    pub current_balance: Decimal,
    pub available_balance: Decimal,
    pub use_transactions: bool,
    pub use_snapshots: bool,
    pub hide: bool,
    pub label: AccountLabel,
}

/// Optional link from an account to a default budget for unlabeled spend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountLabel {
    pub budget_id: Option<String>,
}

/// Budget/category assignment carried by transactions and splits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionLabel {
    pub budget_id: Option<String>,
    pub category_id: Option<String>,
}

/// A ledger transaction. Amounts are signed with expenses positive and
/// income negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub account_id: String,
    pub date: NaiveDate,
    pub authorized_date: Option<NaiveDate>,
    pub amount: Decimal,
    pub label: TransactionLabel,
}

impl Transaction {
    /// The authorized date when present, otherwise the posted date.
    pub fn effective_date(&self) -> NaiveDate {
        self.authorized_date.unwrap_or(self.date)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvestmentTransactionType {
    Buy,
    Sell,
    Dividend,
    Fee,
    Transfer,
    Other,
}

/// A brokerage transaction against a security.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentTransaction {
    pub id: String,
    pub account_id: String,
    pub security_id: String,
    pub date: NaiveDate,
    pub authorized_date: Option<NaiveDate>,
    pub amount: Decimal,
    pub price: Decimal,
    pub quantity: Decimal,
    pub fees: Decimal,
    #[serde(rename = "type")]
    pub transaction_type: InvestmentTransactionType,
    pub label: TransactionLabel,
}

impl InvestmentTransaction {
    pub fn effective_date(&self) -> NaiveDate {
        self.authorized_date.unwrap_or(self.date)
    }
}

/// A carve-out of a parent transaction's amount into a separate
/// budget/category assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitTransaction {
    pub id: String,
    /// Parent transaction id.
    pub transaction_id: String,
    pub account_id: String,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub label: TransactionLabel,
}

/// Point-in-time copy of an account's state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSnapshot {
    pub id: String,
    pub date: NaiveDate,
    pub account: Account,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Security {
    pub id: String,
    pub name: Option<String>,
    pub close_price: Option<Decimal>,
}

/// Point-in-time copy of a security's market state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecuritySnapshot {
    pub id: String,
    pub date: NaiveDate,
    pub security: Security,
}

/// A position in a security held by an account, as reported upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub account_id: String,
    pub security_id: String,
    pub quantity: Decimal,
    pub institution_price: Option<Decimal>,
    pub institution_value: Decimal,
    pub cost_basis: Option<Decimal>,
}

impl Holding {
    /// Stable holding identifier, shared across snapshots of the same position.
    pub fn holding_id(&self) -> String {
        format!("{}_{}", self.account_id, self.security_id)
    }
}

/// Point-in-time copy of a holding's state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingSnapshot {
    pub id: String,
    pub date: NaiveDate,
    pub holding: Holding,
}
