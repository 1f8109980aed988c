use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrepError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("{0}")]
    Cli(#[from] clap::Error),

    #[error("Invalid value for {flag}: {value}")]
    InvalidArgument { flag: String, value: String },

    #[error("Shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("Prediction {row} has no score to threshold")]
    MissingScore { row: usize },

    #[error("Transaction table is empty")]
    EmptyTable,

    #[error("Row {row} has {found} columns, expected {expected}")]
    ColumnMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Row {row} has label {value}, expected 0 or 1")]
    InvalidLabel { row: usize, value: f64 },

    #[error("test_size must lie strictly between 0 and 1, got {0}")]
    InvalidTestSize(f64),

    #[error("Predicted length {predicted} does not match actual length {actual}")]
    LengthMismatch { predicted: usize, actual: usize },

    #[error("Segment count must be at least 1")]
    InvalidSegmentCount,

    #[error("Clustering failed: {0}")]
    Clustering(String),
}

pub type PrepResult<T> = Result<T, PrepError>;
