pub mod balance_aggregator;

pub use balance_aggregator::aggregate_balances;
