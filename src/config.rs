use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Deserialize;

use crate::error::{PrepError, PrepResult};
use crate::split::{validate_test_size, SplitStrategy};

/// Command-line flags of the report runner. Every flag is optional and
/// overrides the matching `RunConfig` field.
#[derive(Parser, Debug, Default)]
#[command(name = "fraud-prep", about = "Fraud ratio, seeded split and scoring report")]
pub struct Cli {
    /// JSON file with `RunConfig` fields
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Dataset CSV
    #[arg(long)]
    pub data: Option<PathBuf>,
    #[arg(long)]
    pub test_size: Option<f64>,
    #[arg(long)]
    pub seed: Option<u64>,
    /// `shuffle_slice` or `stratified`
    #[arg(long)]
    pub strategy: Option<String>,
    #[arg(long)]
    pub export_dir: Option<PathBuf>,
    #[arg(long)]
    pub predictions: Option<PathBuf>,
    #[arg(long)]
    pub threshold: Option<f64>,
    #[arg(long)]
    pub segments: Option<usize>,
}

/// Settings for one report run. Every field has a default, so a config file
/// may name only what it changes.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct RunConfig {
    /// Dataset CSV with the `Time,V1..V28,Amount,Class` header.
    pub data_path: PathBuf,
    pub test_size: f64,
    pub seed: u64,
    pub strategy: SplitStrategy,
    /// When set, folds are written here as label-first CSV.
    pub export_dir: Option<PathBuf>,
    /// Endpoint predictions for the test fold, in test fold order.
    pub predictions_path: Option<PathBuf>,
    /// Relabel predictions from their scores at this threshold.
    pub threshold: Option<f64>,
    /// k-means segments to profile; 0 skips profiling.
    pub n_segments: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("creditcard.csv"),
            test_size: 0.3,
            seed: 42,
            strategy: SplitStrategy::ShuffleSlice,
            export_dir: None,
            predictions_path: None,
            threshold: None,
            n_segments: 0,
        }
    }
}

impl RunConfig {
    pub fn from_json_str(json: &str) -> PrepResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> PrepResult<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Build from command-line arguments (program name first). Unknown
    /// flags, flags without a value and unparseable values are errors.
    pub fn from_args(args: &[String]) -> PrepResult<Self> {
        Self::from_cli(&Cli::try_parse_from(args)?)
    }

    /// `--config <file>` is loaded first, then individual flags override it.
    pub fn from_cli(cli: &Cli) -> PrepResult<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        if let Some(path) = &cli.data {
            config.data_path = path.clone();
        }
        if let Some(test_size) = cli.test_size {
            config.test_size = test_size;
        }
        if let Some(seed) = cli.seed {
            config.seed = seed;
        }
        if let Some(name) = &cli.strategy {
            config.strategy =
                SplitStrategy::from_name(name).ok_or_else(|| PrepError::InvalidArgument {
                    flag: "--strategy".to_string(),
                    value: name.clone(),
                })?;
        }
        if let Some(dir) = &cli.export_dir {
            config.export_dir = Some(dir.clone());
        }
        if let Some(path) = &cli.predictions {
            config.predictions_path = Some(path.clone());
        }
        if let Some(threshold) = cli.threshold {
            config.threshold = Some(threshold);
        }
        if let Some(segments) = cli.segments {
            config.n_segments = segments;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> PrepResult<()> {
        validate_test_size(self.test_size)
    }
}
