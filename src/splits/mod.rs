pub mod split_families;

pub use split_families::TransactionFamilies;
