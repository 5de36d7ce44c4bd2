pub mod ledger_model;

pub use ledger_model::{Accumulate, MonthlyLedger};
