pub mod balances;
pub mod budgets;
pub mod constants;
pub mod engine;
pub mod errors;
pub mod holdings;
pub mod ledger;
pub mod models;
pub mod splits;
pub mod utils;

pub use engine::{run, EngineInput, EngineOutput};
pub use errors::{Error, Result};
pub use ledger::{Accumulate, MonthlyLedger};
