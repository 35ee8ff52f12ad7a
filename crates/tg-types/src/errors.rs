use thiserror::Error;

use crate::params::ParamValue;

/// Main error type for a tunegrid search run
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Configuration error in assignment {assignment} ({params}): {source}")]
    Configuration {
        assignment: usize,
        params: String,
        #[source]
        source: ConfigurationError,
    },

    #[error("Cross-validation failed for assignment {assignment} ({params}): {source}")]
    CrossValidation {
        assignment: usize,
        params: String,
        #[source]
        source: CvError,
    },
}

impl SearchError {
    /// Index of the assignment that triggered the failure, if any.
    pub fn assignment(&self) -> Option<usize> {
        match self {
            Self::Schema(_) => None,
            Self::Configuration { assignment, .. } | Self::CrossValidation { assignment, .. } => {
                Some(*assignment)
            }
        }
    }

    /// Fold that triggered the failure, when it happened inside cross-validation.
    pub fn fold(&self) -> Option<usize> {
        match self {
            Self::CrossValidation { source, .. } => source.fold(),
            _ => None,
        }
    }
}

/// Parameter grid errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Parameter {parameter} has no candidate values")]
    EmptyCandidates { parameter: String },

    #[error("Parameter {parameter} appears more than once in the grid")]
    DuplicateParameter { parameter: String },

    #[error("Parameter names must not be empty")]
    EmptyName,

    #[error("Grid has too many combinations to enumerate")]
    TooManyCombinations,
}

/// Parameter injection errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("No parameter {parameter} on {estimator}")]
    UnknownParameter { estimator: String, parameter: String },

    #[error("Cannot set {expected} parameter {parameter} on {estimator} to {value}")]
    TypeMismatch {
        estimator: String,
        parameter: String,
        expected: String,
        value: ParamValue,
    },
}

/// Errors reported by estimator implementations from fit/transform
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EstimatorError {
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Numerical failure: {message}")]
    Numerical { message: String },

    #[error("Estimator used before fit")]
    NotFitted,

    #[error("Estimator failed: {message}")]
    Failed { message: String },
}

/// Table construction errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    #[error("Shape mismatch: {rows}x{cols} table needs {expected} values, got {actual}")]
    ShapeMismatch {
        rows: usize,
        cols: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Ragged rows: row {row} has {actual} columns, expected {expected}")]
    RaggedRows {
        row: usize,
        expected: usize,
        actual: usize,
    },
}

/// Which index list of a split an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitSide {
    Train,
    Test,
}

impl std::fmt::Display for SplitSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Train => write!(f, "train"),
            Self::Test => write!(f, "test"),
        }
    }
}

/// Malformed train/test splits
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SplitError {
    #[error("{side} index {index} out of bounds for {n_samples} samples")]
    OutOfBounds {
        side: SplitSide,
        index: usize,
        n_samples: usize,
    },

    #[error("Row {index} is in both train and test")]
    Overlap { index: usize },
}

/// Which estimator call failed inside a fold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoldStage {
    Fit,
    Transform,
}

impl std::fmt::Display for FoldStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fit => write!(f, "fit"),
            Self::Transform => write!(f, "transform"),
        }
    }
}

/// Cross-validation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CvError {
    #[error("Features have {features} rows but targets have {targets}")]
    RowCountMismatch { features: usize, targets: usize },

    #[error("Got {groups} group labels for {samples} samples")]
    GroupCountMismatch { samples: usize, groups: usize },

    #[error("Splitter produced no folds")]
    NoFolds,

    #[error("Invalid split for fold {fold}: {source}")]
    InvalidSplit {
        fold: usize,
        #[source]
        source: SplitError,
    },

    #[error("Splitter announced {expected} folds but produced {actual}")]
    SplitCountMismatch { expected: usize, actual: usize },

    #[error("Fold {fold} failed during {stage}: {source}")]
    Estimator {
        fold: usize,
        stage: FoldStage,
        #[source]
        source: EstimatorError,
    },
}

impl CvError {
    pub fn fold(&self) -> Option<usize> {
        match self {
            Self::InvalidSplit { fold, .. } | Self::Estimator { fold, .. } => Some(*fold),
            _ => None,
        }
    }
}

/// Result type alias for search operations
pub type SearchResult<T> = Result<T, SearchError>;
