use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::info;
use ndarray::{Array1, Array2, ArrayView1};
use serde::Deserialize;

use crate::error::{PrepError, PrepResult};

/// Feature columns per row: Time, V1..V28, Amount.
pub const FEATURE_COUNT: usize = 30;

/// One row of the public credit card dataset.
#[derive(Debug, Deserialize, Clone)]
pub struct Transaction {
    #[serde(rename = "Time")]
    pub time: f64,
    #[serde(rename = "V1")]
    pub v1: f64,
    #[serde(rename = "V2")]
    pub v2: f64,
    #[serde(rename = "V3")]
    pub v3: f64,
    #[serde(rename = "V4")]
    pub v4: f64,
    #[serde(rename = "V5")]
    pub v5: f64,
    #[serde(rename = "V6")]
    pub v6: f64,
    #[serde(rename = "V7")]
    pub v7: f64,
    #[serde(rename = "V8")]
    pub v8: f64,
    #[serde(rename = "V9")]
    pub v9: f64,
    #[serde(rename = "V10")]
    pub v10: f64,
    #[serde(rename = "V11")]
    pub v11: f64,
    #[serde(rename = "V12")]
    pub v12: f64,
    #[serde(rename = "V13")]
    pub v13: f64,
    #[serde(rename = "V14")]
    pub v14: f64,
    #[serde(rename = "V15")]
    pub v15: f64,
    #[serde(rename = "V16")]
    pub v16: f64,
    #[serde(rename = "V17")]
    pub v17: f64,
    #[serde(rename = "V18")]
    pub v18: f64,
    #[serde(rename = "V19")]
    pub v19: f64,
    #[serde(rename = "V20")]
    pub v20: f64,
    #[serde(rename = "V21")]
    pub v21: f64,
    #[serde(rename = "V22")]
    pub v22: f64,
    #[serde(rename = "V23")]
    pub v23: f64,
    #[serde(rename = "V24")]
    pub v24: f64,
    #[serde(rename = "V25")]
    pub v25: f64,
    #[serde(rename = "V26")]
    pub v26: f64,
    #[serde(rename = "V27")]
    pub v27: f64,
    #[serde(rename = "V28")]
    pub v28: f64,
    #[serde(rename = "Amount")]
    pub amount: f64,
    #[serde(rename = "Class")]
    pub class: f64,
}

impl Transaction {
    /// Features in dataset column order, label excluded.
    pub fn to_feature_vector(&self) -> Vec<f64> {
        let mut features = Vec::with_capacity(FEATURE_COUNT);
        features.push(self.time);
        features.extend_from_slice(&[
            self.v1, self.v2, self.v3, self.v4, self.v5, self.v6, self.v7, self.v8, self.v9,
            self.v10, self.v11, self.v12, self.v13, self.v14, self.v15, self.v16, self.v17,
            self.v18, self.v19, self.v20, self.v21, self.v22, self.v23, self.v24, self.v25,
            self.v26, self.v27, self.v28,
        ]);
        features.push(self.amount);
        features
    }

    /// Full raw row with the label as the last column.
    pub fn to_raw_row(&self) -> Vec<f64> {
        let mut row = self.to_feature_vector();
        row.push(self.class);
        row
    }
}

/// Read-only labeled table: one feature row and one 0/1 label per transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionTable {
    features: Array2<f64>,
    labels: Array1<u8>,
}

impl TransactionTable {
    /// Build a table from raw rows whose last column is the label.
    ///
    /// Every row must share the first row's width (at least one feature plus
    /// the label) and every label must be exactly 0 or 1. With no rows there
    /// is no width to take, so the feature matrix is `(0, 0)`; use
    /// [`TransactionTable::from_transactions`] for an empty table that keeps
    /// the dataset's 30 feature columns.
    pub fn from_rows(rows: &[Vec<f64>]) -> PrepResult<Self> {
        let width = match rows.first() {
            Some(first) => first.len(),
            None => {
                return Ok(Self {
                    features: Array2::zeros((0, 0)),
                    labels: Array1::zeros(0),
                })
            }
        };
        if width < 2 {
            return Err(PrepError::ColumnMismatch {
                row: 0,
                expected: 2,
                found: width,
            });
        }

        let n_features = width - 1;
        let mut flat = Vec::with_capacity(rows.len() * n_features);
        let mut labels = Vec::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(PrepError::ColumnMismatch {
                    row: i,
                    expected: width,
                    found: row.len(),
                });
            }
            flat.extend_from_slice(&row[..n_features]);
            labels.push(parse_label(i, row[n_features])?);
        }

        let features = Array2::from_shape_vec((rows.len(), n_features), flat)?;
        Ok(Self {
            features,
            labels: Array1::from(labels),
        })
    }

    /// Table in the dataset layout; always `FEATURE_COUNT` columns wide, even
    /// when empty.
    pub fn from_transactions(transactions: &[Transaction]) -> PrepResult<Self> {
        if transactions.is_empty() {
            return Ok(Self {
                features: Array2::zeros((0, FEATURE_COUNT)),
                labels: Array1::zeros(0),
            });
        }
        let rows: Vec<Vec<f64>> = transactions.iter().map(Transaction::to_raw_row).collect();
        Self::from_rows(&rows)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    pub fn features(&self) -> &Array2<f64> {
        &self.features
    }

    pub fn labels(&self) -> ArrayView1<'_, u8> {
        self.labels.view()
    }
}

pub(crate) fn parse_label(row: usize, value: f64) -> PrepResult<u8> {
    if value == 0.0 {
        Ok(0)
    } else if value == 1.0 {
        Ok(1)
    } else {
        Err(PrepError::InvalidLabel { row, value })
    }
}

pub fn read_transactions_from_reader<R: Read>(reader: R) -> PrepResult<TransactionTable> {
    let mut rdr = csv::Reader::from_reader(reader);

    let transactions: Vec<Transaction> = rdr
        .deserialize()
        .collect::<Result<Vec<Transaction>, csv::Error>>()?;

    TransactionTable::from_transactions(&transactions)
}

pub fn read_transactions<P: AsRef<Path>>(file_path: P) -> PrepResult<TransactionTable> {
    let file = File::open(file_path.as_ref())?;
    let table = read_transactions_from_reader(file)?;
    info!(
        "Loaded {} transactions from {}",
        table.len(),
        file_path.as_ref().display()
    );
    Ok(table)
}

#[derive(Debug, Deserialize)]
struct PredictionRecord {
    predicted_label: f64,
    #[serde(default)]
    score: Option<f64>,
}

/// One endpoint response row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub predicted_label: u8,
    pub score: Option<f64>,
}

/// Predictions in file order. The endpoint may write labels as `1` or `1.0`.
pub fn read_predictions_from_reader<R: Read>(reader: R) -> PrepResult<Vec<Prediction>> {
    let mut rdr = csv::Reader::from_reader(reader);

    rdr.deserialize()
        .enumerate()
        .map(|(i, record)| -> PrepResult<Prediction> {
            let record: PredictionRecord = record?;
            Ok(Prediction {
                predicted_label: parse_label(i, record.predicted_label)?,
                score: record.score,
            })
        })
        .collect()
}

pub fn read_predictions<P: AsRef<Path>>(file_path: P) -> PrepResult<Vec<Prediction>> {
    let file = File::open(file_path.as_ref())?;
    read_predictions_from_reader(file)
}
