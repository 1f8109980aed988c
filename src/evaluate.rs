//! Post-hoc scoring of externally produced predictions.

use std::fmt;

use log::warn;

use crate::csv_reader::{parse_label, Prediction};
use crate::error::{PrepError, PrepResult};
use crate::split::Partition;

/// A ratio metric, or `Undefined` when its denominator is zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Metric {
    Defined(f64),
    Undefined,
}

impl Metric {
    fn ratio(numerator: usize, denominator: usize) -> Self {
        if denominator == 0 {
            Metric::Undefined
        } else {
            Metric::Defined(numerator as f64 / denominator as f64)
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Metric::Defined(v) => Some(*v),
            Metric::Undefined => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, Metric::Defined(_))
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Defined(v) => write!(f, "{:.4}", v),
            Metric::Undefined => write!(f, "undefined"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConfusionCounts {
    pub true_positive: usize,
    pub false_positive: usize,
    pub true_negative: usize,
    pub false_negative: usize,
}

impl ConfusionCounts {
    pub fn total(&self) -> usize {
        self.true_positive + self.false_positive + self.true_negative + self.false_negative
    }

    /// TP / (TP + FN)
    pub fn recall(&self) -> Metric {
        Metric::ratio(self.true_positive, self.true_positive + self.false_negative)
    }

    /// TP / (TP + FP)
    pub fn precision(&self) -> Metric {
        Metric::ratio(self.true_positive, self.true_positive + self.false_positive)
    }

    /// (TP + TN) / total
    pub fn accuracy(&self) -> Metric {
        Metric::ratio(self.true_positive + self.true_negative, self.total())
    }

    /// Harmonic mean of precision and recall.
    pub fn f1(&self) -> Metric {
        match (self.precision(), self.recall()) {
            (Metric::Defined(p), Metric::Defined(r)) if p + r > 0.0 => {
                Metric::Defined(2.0 * p * r / (p + r))
            }
            _ => Metric::Undefined,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub counts: ConfusionCounts,
    pub recall: Metric,
    pub precision: Metric,
    pub accuracy: Metric,
    pub f1: Metric,
}

impl Evaluation {
    pub fn from_counts(counts: ConfusionCounts) -> Self {
        Self {
            counts,
            recall: counts.recall(),
            precision: counts.precision(),
            accuracy: counts.accuracy(),
            f1: counts.f1(),
        }
    }
}

pub fn confusion_counts(predicted: &[u8], actual: &[u8]) -> PrepResult<ConfusionCounts> {
    if predicted.len() != actual.len() {
        return Err(PrepError::LengthMismatch {
            predicted: predicted.len(),
            actual: actual.len(),
        });
    }

    let mut counts = ConfusionCounts::default();
    for (row, (&p, &a)) in predicted.iter().zip(actual.iter()).enumerate() {
        match (check_binary(row, p)?, check_binary(row, a)?) {
            (1, 1) => counts.true_positive += 1,
            (1, 0) => counts.false_positive += 1,
            (0, 0) => counts.true_negative += 1,
            _ => counts.false_negative += 1,
        }
    }
    Ok(counts)
}

/// Confusion counts plus recall, precision, accuracy and F1 for two
/// equal-length 0/1 label sequences.
pub fn evaluate(predicted: &[u8], actual: &[u8]) -> PrepResult<Evaluation> {
    let evaluation = Evaluation::from_counts(confusion_counts(predicted, actual)?);
    if !evaluation.recall.is_defined() {
        warn!("Recall undefined: no fraud rows among {} actual labels", actual.len());
    }
    if !evaluation.precision.is_defined() {
        warn!("Precision undefined: no positive predictions");
    }
    Ok(evaluation)
}

/// Label 1 where `score >= threshold`, else 0.
pub fn labels_from_scores(scores: &[f64], threshold: f64) -> Vec<u8> {
    scores
        .iter()
        .map(|&score| u8::from(score >= threshold))
        .collect()
}

/// Score endpoint predictions for `partition`'s test fold, row for row.
///
/// With a `threshold`, labels are recomputed from each prediction's score and
/// every prediction must carry one.
pub fn evaluate_predictions(
    predictions: &[Prediction],
    partition: &Partition,
    threshold: Option<f64>,
) -> PrepResult<Evaluation> {
    if predictions.len() != partition.test_len() {
        return Err(PrepError::LengthMismatch {
            predicted: predictions.len(),
            actual: partition.test_len(),
        });
    }

    let predicted: Vec<u8> = match threshold {
        Some(threshold) => {
            let scores = predictions
                .iter()
                .enumerate()
                .map(|(row, p)| p.score.ok_or(PrepError::MissingScore { row }))
                .collect::<PrepResult<Vec<f64>>>()?;
            labels_from_scores(&scores, threshold)
        }
        None => predictions.iter().map(|p| p.predicted_label).collect(),
    };

    let actual = partition.test_labels.to_vec();
    evaluate(&predicted, &actual)
}

fn check_binary(row: usize, label: u8) -> PrepResult<u8> {
    parse_label(row, f64::from(label))
}
