//! Data preparation and post-hoc scoring for the public credit card fraud
//! dataset: class-imbalance statistics, seeded train/test partitioning,
//! fold export, and confusion-matrix evaluation of remote predictions.

pub mod config;
pub mod csv_reader;
pub mod error;
pub mod evaluate;
pub mod export;
pub mod kmeans;
pub mod split;
pub mod stats;

#[cfg(test)]
mod tests;

pub use config::{Cli, RunConfig};
pub use csv_reader::{
    read_predictions, read_transactions, Prediction, Transaction, TransactionTable,
};
pub use error::{PrepError, PrepResult};
pub use evaluate::{
    evaluate, evaluate_predictions, labels_from_scores, ConfusionCounts, Evaluation, Metric,
};
pub use export::{export_partition, write_fold};
pub use kmeans::{profile_segments, SegmentProfile};
pub use split::{split_with_strategy, train_test_split, Partition, SplitStrategy};
pub use stats::{fraud_ratio, fraud_ratio_of_labels};
