//! Shopper Spectrum: customer segmentation and product recommendations
//!
//! This library runs inference against artifacts produced by an external
//! training pipeline: a fitted RFM (Recency, Frequency, Monetary) scaler and
//! K-Means model with a table of labelled customers, plus an item-item
//! similarity matrix with its StockCode / Description mapping.

pub mod cli;
pub mod context;
pub mod data;
pub mod error;
pub mod model;
pub mod recommend;
pub mod segment;

// Re-export public items for easier access
pub use cli::Args;
pub use context::ShopperContext;
pub use data::{load_artifacts, ArtifactPaths};
pub use error::{ArtifactError, InferenceError};
pub use model::{FeatureVector, KMeansModel, StandardScaler};
pub use recommend::{ProductCatalog, Recommendation, SelfExclusion, SimilarityMatrix};
pub use segment::{SegmentAssignment, SegmentCatalog, UNKNOWN_SEGMENT};

/// Common result type used by the command-line shell
pub type Result<T> = anyhow::Result<T>;
