use thiserror::Error;

use crate::distance::Allele;

/// Error type for gtars-hapmatch operations.
#[derive(Error, Debug)]
pub enum HapMatchError {
    /// A vector's length disagrees with the length already established for the index.
    #[error("Vector has length {found}, but this index holds vectors of length {expected}")]
    DimensionMismatch { expected: usize, found: usize },

    /// More than one symbol is tied for the top count and the tie is not ref vs alt.
    #[error("Ambiguous consensus at position {position}: tied values {values:?}")]
    AmbiguousConsensus { position: usize, values: Vec<Allele> },

    #[error("Cannot build a consensus from zero matched vectors")]
    EmptyConsensus,

    #[error("Unknown sample: {0}")]
    UnknownSample(String),

    #[error("Error parsing genotypes at line {line}: {message}")]
    GenotypeParse { line: usize, message: String },

    #[error("Error parsing sample table at line {line}: {message}")]
    SampleTableParse { line: usize, message: String },

    #[error("Window size must be greater than zero")]
    InvalidWindowSize,

    #[error("Rate `{name}` must be within [0, 1], got {value}")]
    InvalidRate { name: &'static str, value: f64 },

    #[error("Failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for gtars-hapmatch operations.
pub type Result<T> = std::result::Result<T, HapMatchError>;
