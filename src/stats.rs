//! Class-imbalance statistics.

use ndarray::ArrayView1;

use crate::csv_reader::TransactionTable;
use crate::error::{PrepError, PrepResult};

/// Number of labels equal to 1.
pub fn fraud_count(labels: ArrayView1<'_, u8>) -> usize {
    labels.iter().filter(|&&label| label == 1).count()
}

/// Fraction of labels marking fraud. Fails on an empty label sequence.
pub fn fraud_ratio_of_labels(labels: ArrayView1<'_, u8>) -> PrepResult<f64> {
    if labels.is_empty() {
        return Err(PrepError::EmptyTable);
    }
    Ok(fraud_count(labels) as f64 / labels.len() as f64)
}

/// Fraction of rows in `table` whose label is 1, in [0, 1].
pub fn fraud_ratio(table: &TransactionTable) -> PrepResult<f64> {
    fraud_ratio_of_labels(table.labels())
}
