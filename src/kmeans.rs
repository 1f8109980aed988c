use linfa::prelude::Predict;
use linfa::traits::Fit;
use linfa::DatasetBase;
use linfa_clustering::KMeans;
use log::debug;
use ndarray::{Array1, Array2, Axis};
use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;

use crate::csv_reader::TransactionTable;
use crate::error::{PrepError, PrepResult};
use crate::stats::{fraud_count, fraud_ratio_of_labels};

// Rescale every column to zero mean and unit variance; constant columns are
// only centred.
fn standardize_columns(features: &Array2<f64>) -> Array2<f64> {
    let mut scaled = features.clone();
    for mut column in scaled.columns_mut() {
        let n = column.len() as f64;
        let mean = column.sum() / n;
        let variance = column.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        let std_dev = variance.sqrt();

        column.mapv_inplace(|x| x - mean);
        if std_dev > 0.0 {
            column.mapv_inplace(|x| x / std_dev);
        }
    }
    scaled
}

/// Fraud concentration within one k-means segment.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentProfile {
    pub segment: usize,
    pub size: usize,
    pub fraud_count: usize,
    pub fraud_ratio: f64,
    /// Mean of the last feature column (Amount in the dataset layout).
    pub mean_amount: f64,
}

/// Cluster the standardized features and report each segment's fraud ratio,
/// highest first.
pub fn profile_segments(
    table: &TransactionTable,
    n_segments: usize,
    seed: u64,
) -> PrepResult<Vec<SegmentProfile>> {
    if n_segments == 0 {
        return Err(PrepError::InvalidSegmentCount);
    }
    if table.is_empty() {
        return Ok(Vec::new());
    }
    let n_segments = n_segments.min(table.len());

    let dataset = DatasetBase::from(standardize_columns(table.features()));
    let rng = Pcg64Mcg::seed_from_u64(seed);
    let model = KMeans::params_with_rng(n_segments, rng)
        .max_n_iterations(200)
        .tolerance(1e-5)
        .fit(&dataset)
        .map_err(|e| PrepError::Clustering(e.to_string()))?;

    let memberships: Array1<usize> = model.predict(dataset.records());

    let amount_column = table.n_features().saturating_sub(1);
    let mut profiles = Vec::new();
    for segment in 0..n_segments {
        let rows: Vec<usize> = memberships
            .iter()
            .enumerate()
            .filter(|(_, assigned)| **assigned == segment)
            .map(|(i, _)| i)
            .collect();
        if rows.is_empty() {
            continue;
        }

        let labels = table.labels().select(Axis(0), &rows);
        let amounts = table.features().column(amount_column).select(Axis(0), &rows);
        profiles.push(SegmentProfile {
            segment,
            size: rows.len(),
            fraud_count: fraud_count(labels.view()),
            fraud_ratio: fraud_ratio_of_labels(labels.view())?,
            mean_amount: amounts.mean().unwrap_or(0.0),
        });
    }
    debug!("Profiled {} non-empty segments", profiles.len());

    profiles.sort_by(|a, b| {
        b.fraud_ratio
            .partial_cmp(&a.fraud_ratio)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    Ok(profiles)
}
