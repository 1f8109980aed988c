// Report runner: loads the dataset, prints its fraud ratio, splits it, and
// optionally exports folds, scores endpoint predictions and profiles segments.
use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use fraud_prep::{
    evaluate_predictions, export_partition, fraud_ratio, fraud_ratio_of_labels, profile_segments,
    read_predictions, read_transactions, split_with_strategy, Cli, Evaluation, Partition,
    RunConfig, SegmentProfile,
};

const HIGH_FRAUD_RATE_THRESHOLD: f64 = 0.5;
const MEDIUM_FRAUD_RATE_THRESHOLD: f64 = 0.05;

fn print_split(partition: &Partition) {
    println!("\nTrain/Test Split:");
    println!("Train rows: {}", partition.train_len());
    println!("Test rows:  {}", partition.test_len());
    for (name, labels) in [
        ("Train", partition.train_labels.view()),
        ("Test", partition.test_labels.view()),
    ] {
        match fraud_ratio_of_labels(labels) {
            Ok(ratio) => println!("{} fraud ratio: {:.4}%", name, ratio * 100.0),
            Err(_) => println!("{} fraud ratio: undefined (empty fold)", name),
        }
    }
}

fn print_evaluation(evaluation: &Evaluation) {
    let counts = &evaluation.counts;
    println!("\nEvaluation on test fold:");
    println!(
        "TP: {}  FP: {}  TN: {}  FN: {}",
        counts.true_positive, counts.false_positive, counts.true_negative, counts.false_negative
    );
    println!("Recall:    {}", evaluation.recall);
    println!("Precision: {}", evaluation.precision);
    println!("Accuracy:  {}", evaluation.accuracy);
    println!("F1:        {}", evaluation.f1);
}

fn print_segment(profile: &SegmentProfile, rank: usize) {
    let risk_level = if profile.fraud_ratio >= HIGH_FRAUD_RATE_THRESHOLD {
        "High Risk"
    } else if profile.fraud_ratio >= MEDIUM_FRAUD_RATE_THRESHOLD {
        "Medium Risk"
    } else {
        "Low Risk"
    };
    println!(
        "#{} segment {}: {} rows, {} fraud ({:.2}%), avg amount {:.2} [{}]",
        rank,
        profile.segment,
        profile.size,
        profile.fraud_count,
        profile.fraud_ratio * 100.0,
        profile.mean_amount,
        risk_level
    );
}

fn score_predictions(config: &RunConfig, partition: &Partition) -> Result<Option<Evaluation>> {
    let Some(path) = &config.predictions_path else {
        return Ok(None);
    };
    let predictions = read_predictions(path)
        .with_context(|| format!("reading predictions from {}", path.display()))?;
    let evaluation = evaluate_predictions(&predictions, partition, config.threshold)
        .with_context(|| format!("scoring predictions from {}", path.display()))?;
    Ok(Some(evaluation))
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = RunConfig::from_cli(&cli).context("invalid configuration")?;
    info!("Run configuration: {:?}", config);

    let table = read_transactions(&config.data_path)
        .with_context(|| format!("loading {}", config.data_path.display()))?;
    if table.is_empty() {
        println!("No transactions in {}", config.data_path.display());
        return Ok(());
    }

    println!("Dataset: {}", config.data_path.display());
    println!("Rows: {}", table.len());
    println!("Fraud ratio: {:.4}%", fraud_ratio(&table)? * 100.0);

    let partition = split_with_strategy(&table, config.test_size, config.seed, config.strategy)?;
    print_split(&partition);

    if let Some(dir) = &config.export_dir {
        let (train_path, test_path) = export_partition(dir, &partition)
            .with_context(|| format!("exporting folds to {}", dir.display()))?;
        println!("\nExported {} and {}", train_path.display(), test_path.display());
    }

    if let Some(evaluation) = score_predictions(&config, &partition)? {
        print_evaluation(&evaluation);
    }

    if config.n_segments > 0 {
        let profiles = profile_segments(&table, config.n_segments, config.seed)?;
        println!("\nSegments (sorted by fraud ratio):");
        for (i, profile) in profiles.iter().enumerate() {
            print_segment(profile, i + 1);
        }
    }

    Ok(())
}
