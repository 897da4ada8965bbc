// Domain layer - Sales records, filters and dashboard models
pub mod dashboard;
pub mod dataset;
pub mod filter;
pub mod transaction;
pub mod widgets;
