// Source trait for the sales dataset
use crate::domain::dataset::DataLoadError;
use crate::domain::transaction::Transaction;
use async_trait::async_trait;

#[async_trait]
pub trait TransactionSource: Send + Sync {
    /// Human-readable origin of the rows, for logging
    fn describe(&self) -> String;

    /// Load and validate every row. Called once at startup.
    async fn load(&self) -> Result<Vec<Transaction>, DataLoadError>;
}
