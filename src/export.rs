//! Label-first CSV export of partition folds, the training input layout of
//! the managed linear learner.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use log::info;
use ndarray::{ArrayView1, ArrayView2};

use crate::error::{PrepError, PrepResult};
use crate::split::Partition;

/// Write one record per row: label, then every feature. No header.
pub fn write_fold<W: Write>(
    writer: W,
    features: ArrayView2<'_, f64>,
    labels: ArrayView1<'_, u8>,
) -> PrepResult<()> {
    if features.nrows() != labels.len() {
        return Err(PrepError::LengthMismatch {
            predicted: features.nrows(),
            actual: labels.len(),
        });
    }

    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    for (row, &label) in features.rows().into_iter().zip(labels.iter()) {
        let mut record = Vec::with_capacity(row.len() + 1);
        record.push(label.to_string());
        record.extend(row.iter().map(|value| value.to_string()));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_fold_to_path<P: AsRef<Path>>(
    path: P,
    features: ArrayView2<'_, f64>,
    labels: ArrayView1<'_, u8>,
) -> PrepResult<()> {
    let file = File::create(path.as_ref())?;
    write_fold(file, features, labels)?;
    info!("Wrote {} rows to {}", labels.len(), path.as_ref().display());
    Ok(())
}

/// Writes `train.csv` and `test.csv` under `dir`, creating it if needed.
pub fn export_partition<P: AsRef<Path>>(
    dir: P,
    partition: &Partition,
) -> PrepResult<(PathBuf, PathBuf)> {
    fs::create_dir_all(dir.as_ref())?;
    let train_path = dir.as_ref().join("train.csv");
    let test_path = dir.as_ref().join("test.csv");
    write_fold_to_path(
        &train_path,
        partition.train_features.view(),
        partition.train_labels.view(),
    )?;
    write_fold_to_path(
        &test_path,
        partition.test_features.view(),
        partition.test_labels.view(),
    )?;
    Ok((train_path, test_path))
}
