//! Error types for artifact loading and per-request inference

use std::path::PathBuf;

use thiserror::Error;

/// Failure of a single classification or recommendation request.
///
/// Every variant is reported to the caller; none of them leave the loaded
/// artifacts in a different state, so later requests are unaffected.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InferenceError {
    #[error("feature vector has {actual} values but the {stage} expects {expected}")]
    InputShape {
        stage: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("no product name was given")]
    EmptyProductName,
    #[error("product name '{0}' not found in the system")]
    ProductNotFound(String),
    #[error("similarity data for product code '{0}' not found")]
    SimilarityDataMissing(String),
}

impl InferenceError {
    /// Whether the user can fix the request and retry.
    ///
    /// Shape errors come from inconsistent artifacts, not from user input.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::InputShape { .. })
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::InputShape { .. } => {
                "The segmentation model could not score this customer.".to_owned()
            }
            Self::EmptyProductName => "Please enter a product name.".to_owned(),
            Self::ProductNotFound(name) => format!(
                "Product name '{name}' not found in the system. \
                 Please check spelling or try another."
            ),
            Self::SimilarityDataMissing(code) => {
                format!("Similarity data for product code '{code}' not found.")
            }
        }
    }
}

/// Failure while reading one of the artifacts from disk.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("could not read artifact `{path}`: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse JSON artifact `{path}`: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("could not read table `{path}`: {source}")]
    Table {
        path: PathBuf,
        source: polars::error::PolarsError,
    },
    #[error("table `{path}` has no `{column}` column")]
    MissingColumn { path: PathBuf, column: String },
    #[error("invalid artifact `{path}`: {reason}")]
    Invalid { path: PathBuf, reason: String },
}

impl ArtifactError {
    pub(crate) fn invalid(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
