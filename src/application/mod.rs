// Application layer - Filtering, aggregation and dashboard use cases
pub mod aggregation;
pub mod dashboard_service;
pub mod filter_engine;
pub mod filter_session;
pub mod memoizer;
pub mod streaming_service;
pub mod transaction_source;
