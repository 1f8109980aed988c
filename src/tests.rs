use crate::csv_reader::{
    read_predictions_from_reader, read_transactions_from_reader, Prediction, TransactionTable,
    FEATURE_COUNT,
};
use crate::error::PrepError;
use crate::evaluate::{evaluate, evaluate_predictions};
use crate::export::{export_partition, write_fold};
use crate::kmeans::profile_segments;
use crate::split::{split_with_strategy, train_test_split, SplitStrategy};
use crate::stats::fraud_ratio;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::path::Path;

    // Three rows in the public dataset layout; the last one is fraud.
    fn dataset_csv() -> String {
        let pcs: Vec<String> = (1..=28).map(|i| format!("{:.1}", i as f64 * 0.1)).collect();
        let header: Vec<String> = (1..=28).map(|i| format!("V{}", i)).collect();
        let mut text = format!("Time,{},Amount,Class\n", header.join(","));
        for (time, amount, class) in [(0, "149.62", 0), (1, "2.69", 0), (2, "378.66", 1)] {
            text.push_str(&format!("{},{},{},{}\n", time, pcs.join(","), amount, class));
        }
        text
    }

    // `n` rows of `width` features each; rows listed in `fraud_rows` get label 1.
    fn create_test_rows(n: usize, width: usize, fraud_rows: &[usize]) -> Vec<Vec<f64>> {
        (0..n)
            .map(|i| {
                let mut row: Vec<f64> = (0..width).map(|j| (i * width + j) as f64).collect();
                row.push(if fraud_rows.contains(&i) { 1.0 } else { 0.0 });
                row
            })
            .collect()
    }

    fn create_test_table(n: usize, fraud_rows: &[usize]) -> TransactionTable {
        TransactionTable::from_rows(&create_test_rows(n, 3, fraud_rows)).unwrap()
    }

    #[test]
    fn test_fraud_ratio_one_in_ten() {
        let table = create_test_table(10, &[4]);
        assert_eq!(fraud_ratio(&table).unwrap(), 0.1, "1 fraud row in 10 should give 0.1");
    }

    #[test]
    fn test_fraud_ratio_empty_table() {
        let table = TransactionTable::from_rows(&[]).unwrap();
        assert!(table.is_empty());
        assert!(matches!(fraud_ratio(&table), Err(PrepError::EmptyTable)));
    }

    #[test]
    fn test_column_mismatch_is_rejected() {
        let mut rows = create_test_rows(4, 3, &[]);
        rows[2].pop();
        match TransactionTable::from_rows(&rows) {
            Err(PrepError::ColumnMismatch { row, expected, found }) => {
                assert_eq!(row, 2);
                assert_eq!(expected, 4);
                assert_eq!(found, 3);
            }
            other => panic!("expected column mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_non_binary_label_is_rejected() {
        let mut rows = create_test_rows(3, 2, &[]);
        rows[1][2] = 2.0;
        assert!(matches!(
            TransactionTable::from_rows(&rows),
            Err(PrepError::InvalidLabel { row: 1, .. })
        ));
    }

    #[test]
    fn test_label_column_is_separated() {
        let table = create_test_table(3, &[1]);
        assert_eq!(table.n_features(), 3);
        assert_eq!(table.labels().to_vec(), vec![0, 1, 0]);
        assert_eq!(table.features()[[1, 0]], 3.0);
    }

    #[test]
    fn test_read_dataset_layout() {
        let table = read_transactions_from_reader(dataset_csv().as_bytes()).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.n_features(), FEATURE_COUNT);
        assert_eq!(table.labels().to_vec(), vec![0, 0, 1]);
        assert_eq!(table.features()[[2, 0]], 2.0, "first feature is Time");
        assert_eq!(table.features()[[2, FEATURE_COUNT - 1]], 378.66, "last feature is Amount");
    }

    #[test]
    fn test_read_dataset_missing_column() {
        let truncated = "Time,V1,Amount,Class\n0,1.0,10.0,0\n";
        assert!(matches!(
            read_transactions_from_reader(truncated.as_bytes()),
            Err(PrepError::Csv(_))
        ));
    }

    #[test]
    fn test_read_predictions() {
        let csv = "predicted_label,score\n1.0,0.93\n0,0.02\n";
        let predictions = read_predictions_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(predictions.len(), 2);
        assert_eq!(predictions[0].predicted_label, 1);
        assert_eq!(predictions[0].score, Some(0.93));
        assert_eq!(predictions[1].predicted_label, 0);

        let labels_only = "predicted_label\n1\n";
        let predictions = read_predictions_from_reader(labels_only.as_bytes()).unwrap();
        assert_eq!(predictions[0].score, None);

        let bad = "predicted_label\n0.5\n";
        assert!(matches!(
            read_predictions_from_reader(bad.as_bytes()),
            Err(PrepError::InvalidLabel { row: 0, .. })
        ));
    }

    #[test]
    fn test_split_hundred_rows_seventy_thirty() {
        let table = create_test_table(100, &[3, 50, 97]);
        let partition = train_test_split(&table, 0.3, 42).unwrap();
        assert_eq!(partition.train_len(), 70);
        assert_eq!(partition.test_len(), 30);
        assert_eq!(partition.train_features.nrows(), 70);
        assert_eq!(partition.test_features.nrows(), 30);
        assert_eq!(partition.train_features.ncols(), 3);
    }

    #[test]
    fn test_split_is_disjoint_and_exhaustive() {
        let table = create_test_table(57, &[1, 2, 30]);
        let partition = train_test_split(&table, 0.25, 9).unwrap();

        let train: HashSet<usize> = partition.train_indices.iter().copied().collect();
        let test: HashSet<usize> = partition.test_indices.iter().copied().collect();
        assert!(train.is_disjoint(&test), "No row may land in both folds");
        assert_eq!(train.len() + test.len(), 57);

        // Each fold row is the source row it claims to be.
        for (pos, &src) in partition.test_indices.iter().enumerate() {
            assert_eq!(partition.test_features.row(pos), table.features().row(src));
            assert_eq!(partition.test_labels[pos], table.labels()[src]);
        }
    }

    #[test]
    fn test_split_shuffles_rows() {
        let table = create_test_table(50, &[]);
        let partition = train_test_split(&table, 0.2, 1).unwrap();
        let identity: Vec<usize> = (0..40).collect();
        assert_ne!(partition.train_indices, identity, "Rows should not keep source order");
    }

    #[test]
    fn test_split_rejects_degenerate_test_size() {
        let table = create_test_table(10, &[]);
        assert!(matches!(
            train_test_split(&table, 0.0, 1),
            Err(PrepError::InvalidTestSize(_))
        ));
        assert!(matches!(
            train_test_split(&table, 1.0, 1),
            Err(PrepError::InvalidTestSize(_))
        ));
    }

    #[test]
    fn test_split_empty_table() {
        let table = TransactionTable::from_rows(&[]).unwrap();
        let partition = train_test_split(&table, 0.3, 1).unwrap();
        assert_eq!(partition.train_len(), 0);
        assert_eq!(partition.test_len(), 0);
    }

    #[test]
    fn test_stratified_split_keeps_fraud_in_both_folds() {
        let fraud: Vec<usize> = (0..10).map(|i| i * 20).collect();
        let table = create_test_table(200, &fraud);
        let partition = split_with_strategy(&table, 0.3, 5, SplitStrategy::Stratified).unwrap();

        let train_fraud = partition.train_labels.iter().filter(|&&l| l == 1).count();
        let test_fraud = partition.test_labels.iter().filter(|&&l| l == 1).count();
        assert_eq!(train_fraud, 7, "floor(10 * 0.7) fraud rows train");
        assert_eq!(test_fraud, 3);
        assert_eq!(partition.train_len(), 140);
        assert_eq!(partition.test_len(), 60);
    }

    #[test]
    fn test_evaluate_concrete_scenario() {
        let evaluation = evaluate(&[1, 0, 1, 0], &[1, 1, 0, 0]).unwrap();
        let counts = evaluation.counts;
        assert_eq!(counts.true_positive, 1);
        assert_eq!(counts.false_positive, 1);
        assert_eq!(counts.false_negative, 1);
        assert_eq!(counts.true_negative, 1);
        assert_eq!(evaluation.accuracy.value(), Some(0.5));
        assert_eq!(evaluation.recall.value(), Some(0.5));
        assert_eq!(evaluation.precision.value(), Some(0.5));
        assert_eq!(evaluation.f1.value(), Some(0.5));
    }

    #[test]
    fn test_evaluate_length_mismatch() {
        assert!(matches!(
            evaluate(&[1, 0], &[1]),
            Err(PrepError::LengthMismatch { predicted: 2, actual: 1 })
        ));
    }

    #[test]
    fn test_write_fold_label_first() {
        let table = create_test_table(2, &[1]);
        let mut out = Vec::new();
        write_fold(&mut out, table.features().view(), table.labels()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "0,0,1,2\n1,3,4,5\n");
    }

    #[test]
    fn test_profile_segments_covers_all_rows() {
        let fraud: Vec<usize> = (20..30).collect();
        let mut rows = create_test_rows(30, 2, &fraud);
        // Fraud rows sit far from the rest so they cluster together.
        for row in rows.iter_mut().skip(20) {
            row[0] += 10_000.0;
            row[1] += 10_000.0;
        }
        let table = TransactionTable::from_rows(&rows).unwrap();
        let profiles = profile_segments(&table, 2, 7).unwrap();

        assert!(!profiles.is_empty() && profiles.len() <= 2);
        assert_eq!(profiles.iter().map(|p| p.size).sum::<usize>(), 30);
        for profile in &profiles {
            assert!(profile.fraud_count <= profile.size);
            assert!((0.0..=1.0).contains(&profile.fraud_ratio));
        }
        assert!(profiles[0].fraud_ratio >= profiles[profiles.len() - 1].fraud_ratio);
    }

    #[test]
    fn test_profile_segments_edge_cases() {
        let empty = TransactionTable::from_rows(&[]).unwrap();
        assert!(profile_segments(&empty, 3, 1).unwrap().is_empty());

        let table = create_test_table(5, &[0]);
        assert!(matches!(
            profile_segments(&table, 0, 1),
            Err(PrepError::InvalidSegmentCount)
        ));
    }

    #[test]
    fn test_empty_table_shapes() {
        let from_rows = TransactionTable::from_rows(&[]).unwrap();
        assert_eq!(from_rows.n_features(), 0, "No rows means no width to take");

        let from_transactions = TransactionTable::from_transactions(&[]).unwrap();
        assert!(from_transactions.is_empty());
        assert_eq!(from_transactions.n_features(), FEATURE_COUNT);

        let loaded = read_transactions_from_reader(
            dataset_csv().lines().next().unwrap().as_bytes(),
        )
        .unwrap();
        assert!(loaded.is_empty());
        assert_eq!(loaded.n_features(), FEATURE_COUNT, "Header-only file keeps the layout");
    }

    fn read_label_first(path: &Path) -> Vec<Vec<f64>> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_path(path)
            .unwrap();
        rdr.records()
            .map(|record| {
                record
                    .unwrap()
                    .iter()
                    .map(|field| field.parse::<f64>().unwrap())
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_export_partition_reads_back() {
        let rows: Vec<Vec<f64>> = (0..20)
            .map(|i| {
                let x = i as f64;
                vec![x * 0.1 + 1e-7, -x / 3.0, 1.0 / (x + 7.0), if i % 4 == 0 { 1.0 } else { 0.0 }]
            })
            .collect();
        let table = TransactionTable::from_rows(&rows).unwrap();
        let partition = train_test_split(&table, 0.25, 11).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("folds");
        let (train_path, test_path) = export_partition(&out_dir, &partition).unwrap();
        assert_eq!(train_path, out_dir.join("train.csv"));
        assert_eq!(test_path, out_dir.join("test.csv"));

        for (path, indices) in [
            (&train_path, &partition.train_indices),
            (&test_path, &partition.test_indices),
        ] {
            let written = read_label_first(path);
            assert_eq!(written.len(), indices.len());
            for (record, &src) in written.iter().zip(indices.iter()) {
                let source = &rows[src];
                assert_eq!(record[0], source[3], "Label comes first");
                assert_eq!(&record[1..], &source[..3], "Features follow the label exactly");
            }
        }
    }

    fn scored(label: u8, score: Option<f64>) -> Prediction {
        Prediction { predicted_label: label, score }
    }

    #[test]
    fn test_evaluate_predictions_uses_labels() {
        let table = create_test_table(10, &[0, 5, 9]);
        let partition = train_test_split(&table, 0.3, 3).unwrap();
        let predictions: Vec<Prediction> =
            partition.test_labels.iter().map(|&l| scored(l, None)).collect();

        let evaluation = evaluate_predictions(&predictions, &partition, None).unwrap();
        assert_eq!(evaluation.counts.total(), 3);
        assert_eq!(evaluation.accuracy.value(), Some(1.0));
    }

    #[test]
    fn test_evaluate_predictions_threshold_relabels() {
        let table = create_test_table(10, &[0, 5, 9]);
        let partition = train_test_split(&table, 0.3, 3).unwrap();
        // Every stored label says fraud; the scores say otherwise.
        let predictions: Vec<Prediction> = partition
            .test_labels
            .iter()
            .map(|&l| scored(1, Some(if l == 1 { 0.9 } else { 0.1 })))
            .collect();

        let evaluation = evaluate_predictions(&predictions, &partition, Some(0.5)).unwrap();
        assert_eq!(evaluation.counts.false_positive, 0, "Scores below threshold become 0");
        assert_eq!(evaluation.accuracy.value(), Some(1.0));

        let unscored = evaluate_predictions(&predictions, &partition, None).unwrap();
        let legit = partition.test_labels.iter().filter(|&&l| l == 0).count();
        assert_eq!(unscored.counts.false_positive, legit);
    }

    #[test]
    fn test_evaluate_predictions_missing_score() {
        let table = create_test_table(10, &[]);
        let partition = train_test_split(&table, 0.3, 3).unwrap();
        let predictions = vec![scored(0, Some(0.2)), scored(0, None), scored(0, Some(0.1))];
        assert!(matches!(
            evaluate_predictions(&predictions, &partition, Some(0.5)),
            Err(PrepError::MissingScore { row: 1 })
        ));
    }

    #[test]
    fn test_evaluate_predictions_count_mismatch() {
        let table = create_test_table(10, &[]);
        let partition = train_test_split(&table, 0.3, 3).unwrap();
        let predictions = vec![scored(0, None); 4];
        assert!(matches!(
            evaluate_predictions(&predictions, &partition, None),
            Err(PrepError::LengthMismatch { predicted: 4, actual: 3 })
        ));
    }
}
