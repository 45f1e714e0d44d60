pub mod query;
pub mod strategy;
