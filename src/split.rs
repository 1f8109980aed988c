//! Seeded train/test partitioning.
//!
//! Every permutation is drawn from a `Pcg64Mcg` seeded with the caller's
//! seed, so a given (table, test_size, seed) always yields the same folds.

use log::{debug, warn};
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;
use serde::Deserialize;

use crate::csv_reader::TransactionTable;
use crate::error::{PrepError, PrepResult};
use crate::stats::fraud_count;

/// How rows are assigned to the two folds.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SplitStrategy {
    /// Shuffle all rows, then cut once.
    #[default]
    ShuffleSlice,
    /// Shuffle and cut each class separately so both folds keep the fraud ratio.
    Stratified,
}

impl SplitStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ShuffleSlice => "shuffle_slice",
            Self::Stratified => "stratified",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "shuffle_slice" => Some(Self::ShuffleSlice),
            "stratified" => Some(Self::Stratified),
            _ => None,
        }
    }
}

/// Disjoint train/test folds with labels separated from features.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub train_features: Array2<f64>,
    pub train_labels: Array1<u8>,
    pub test_features: Array2<f64>,
    pub test_labels: Array1<u8>,
    /// Source row of each training row, in fold order.
    pub train_indices: Vec<usize>,
    /// Source row of each test row, in fold order.
    pub test_indices: Vec<usize>,
}

impl Partition {
    pub fn train_len(&self) -> usize {
        self.train_labels.len()
    }

    pub fn test_len(&self) -> usize {
        self.test_labels.len()
    }
}

/// Shuffle-and-slice split: rows before `floor(n * (1 - test_size))` train,
/// the rest test.
pub fn train_test_split(
    table: &TransactionTable,
    test_size: f64,
    seed: u64,
) -> PrepResult<Partition> {
    split_with_strategy(table, test_size, seed, SplitStrategy::ShuffleSlice)
}

pub fn split_with_strategy(
    table: &TransactionTable,
    test_size: f64,
    seed: u64,
    strategy: SplitStrategy,
) -> PrepResult<Partition> {
    validate_test_size(test_size)?;
    let mut rng = Pcg64Mcg::seed_from_u64(seed);

    let (train_indices, test_indices) = match strategy {
        SplitStrategy::ShuffleSlice => {
            let mut order: Vec<usize> = (0..table.len()).collect();
            order.shuffle(&mut rng);
            let test = order.split_off(train_count(order.len(), test_size));
            (order, test)
        }
        SplitStrategy::Stratified => {
            let labels = table.labels();
            let mut train = Vec::with_capacity(table.len());
            let mut test = Vec::new();
            for class in [0u8, 1] {
                let mut members: Vec<usize> = labels
                    .iter()
                    .enumerate()
                    .filter(|(_, label)| **label == class)
                    .map(|(i, _)| i)
                    .collect();
                members.shuffle(&mut rng);
                let held_out = members.split_off(train_count(members.len(), test_size));
                train.extend(members);
                test.extend(held_out);
            }
            train.shuffle(&mut rng);
            test.shuffle(&mut rng);
            (train, test)
        }
    };

    let partition = Partition {
        train_features: table.features().select(Axis(0), &train_indices),
        train_labels: table.labels().select(Axis(0), &train_indices),
        test_features: table.features().select(Axis(0), &test_indices),
        test_labels: table.labels().select(Axis(0), &test_indices),
        train_indices,
        test_indices,
    };

    debug!(
        "Split {} rows ({}, seed {}): {} train, {} test",
        table.len(),
        strategy.name(),
        seed,
        partition.train_len(),
        partition.test_len()
    );
    if partition.test_len() > 0 && fraud_count(partition.test_labels.view()) == 0 {
        warn!(
            "Test fold of {} rows contains no fraud rows; recall will be undefined",
            partition.test_len()
        );
    }

    Ok(partition)
}

pub fn validate_test_size(test_size: f64) -> PrepResult<()> {
    if test_size.is_finite() && test_size > 0.0 && test_size < 1.0 {
        Ok(())
    } else {
        Err(PrepError::InvalidTestSize(test_size))
    }
}

/// Rows kept for training out of `total`. The small bias absorbs float noise
/// such as `100.0 * (1.0 - 0.3)` landing just under 70.
fn train_count(total: usize, test_size: f64) -> usize {
    let cut = (total as f64 * (1.0 - test_size) + 1e-9).floor() as usize;
    cut.min(total)
}
