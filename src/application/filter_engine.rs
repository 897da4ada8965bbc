// Filter engine - narrows the dataset to the rows a filter selects
use crate::domain::filter::FilterSpec;
use crate::domain::transaction::Transaction;

/// Returns the rows selected by `spec`, preserving their relative order.
pub fn apply_filters(transactions: &[Transaction], spec: &FilterSpec) -> Vec<Transaction> {
    transactions
        .iter()
        .filter(|t| matches(t, spec))
        .cloned()
        .collect()
}

fn matches(t: &Transaction, spec: &FilterSpec) -> bool {
    spec.contains_date(t.order_date) && spec.allows_region(&t.region) && spec.allows_segment(&t.segment)
}
