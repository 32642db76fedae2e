//! Artifact loading: fitted models from JSON, lookup tables from CSV using Polars

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use ndarray::Array2;
use polars::prelude::*;
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::context::ShopperContext;
use crate::error::ArtifactError;
use crate::model::{KMeansModel, KMeansParams, ScalerParams, StandardScaler, RFM_FEATURES};
use crate::recommend::{ProductCatalog, SimilarityMatrix};
use crate::segment::SegmentCatalog;

pub const SCALER_FILE: &str = "rfm_scaler.json";
pub const CLUSTER_MODEL_FILE: &str = "rfm_kmeans.json";
pub const SEGMENTS_FILE: &str = "rfm_segmented.csv";
pub const SIMILARITY_FILE: &str = "product_similarity.csv";
pub const PRODUCT_MAPPING_FILE: &str = "product_mapping.csv";

const CLUSTER_COLUMN: &str = "Cluster";
const SEGMENT_COLUMN: &str = "Segment";
const STOCK_CODE_COLUMN: &str = "StockCode";
const DESCRIPTION_COLUMN: &str = "Description";

/// Locations of the five artifacts produced by the training pipeline
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub scaler: PathBuf,
    pub cluster_model: PathBuf,
    pub segments: PathBuf,
    pub similarity: PathBuf,
    pub product_mapping: PathBuf,
}

impl ArtifactPaths {
    /// Default artifact file names inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            scaler: dir.join(SCALER_FILE),
            cluster_model: dir.join(CLUSTER_MODEL_FILE),
            segments: dir.join(SEGMENTS_FILE),
            similarity: dir.join(SIMILARITY_FILE),
            product_mapping: dir.join(PRODUCT_MAPPING_FILE),
        }
    }

    /// Each artifact's name paired with its resolved location.
    pub fn entries(&self) -> [(&'static str, &Path); 5] {
        [
            ("scaler", self.scaler.as_path()),
            ("cluster model", self.cluster_model.as_path()),
            ("segments", self.segments.as_path()),
            ("similarity", self.similarity.as_path()),
            ("product mapping", self.product_mapping.as_path()),
        ]
    }
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self::in_dir(".")
    }
}

/// Load every artifact and publish them as one immutable context.
pub fn load_artifacts(paths: &ArtifactPaths) -> Result<ShopperContext, ArtifactError> {
    let scaler = load_scaler(&paths.scaler)?;
    let model = load_cluster_model(&paths.cluster_model)?;
    let segments = load_segment_catalog(&paths.segments)?;
    let products = load_product_catalog(&paths.product_mapping)?;
    let similarity = load_similarity_matrix(&paths.similarity)?;

    Ok(ShopperContext::new(scaler, model, segments, products, similarity))
}

/// Load the fitted scaler: `{"mean": [...], "scale": [...]}`
pub fn load_scaler(path: &Path) -> Result<StandardScaler, ArtifactError> {
    let params: ScalerParams = read_json(path)?;
    let scaler =
        StandardScaler::try_from(params).map_err(|reason| ArtifactError::invalid(path, reason))?;

    if scaler.n_features() != RFM_FEATURES {
        warn!(
            path = %path.display(),
            n_features = scaler.n_features(),
            "scaler was not fit on recency, frequency and monetary features"
        );
    }
    info!(path = %path.display(), n_features = scaler.n_features(), "loaded scaler");
    Ok(scaler)
}

/// Load the fitted cluster model: `{"centroids": [[...], ...], "labels": [...]}`
pub fn load_cluster_model(path: &Path) -> Result<KMeansModel, ArtifactError> {
    let params: KMeansParams = read_json(path)?;
    let model =
        KMeansModel::try_from(params).map_err(|reason| ArtifactError::invalid(path, reason))?;

    info!(
        path = %path.display(),
        n_clusters = model.n_clusters(),
        n_features = model.n_features(),
        "loaded cluster model"
    );
    Ok(model)
}

/// Load the segmented customer table, keeping its `Cluster` and `Segment` columns.
///
/// Cluster ids written as integer-valued floats ("2.0") are accepted. Rows with
/// a missing or fractional cluster, or a missing segment, are skipped.
pub fn load_segment_catalog(path: &Path) -> Result<SegmentCatalog, ArtifactError> {
    let df = read_table(path)?;
    require_column(&df, CLUSTER_COLUMN, path)?;
    require_column(&df, SEGMENT_COLUMN, path)?;

    let total_rows = df.height();
    let df = df
        .lazy()
        .select([col(CLUSTER_COLUMN).cast(DataType::Float64), col(SEGMENT_COLUMN)])
        .filter(
            col(CLUSTER_COLUMN)
                .is_not_null()
                .and(col(SEGMENT_COLUMN).is_not_null()),
        )
        .collect()
        .map_err(table_error(path))?;

    let clusters = df
        .column(CLUSTER_COLUMN)
        .and_then(|series| series.f64())
        .map_err(table_error(path))?;
    let segments = df
        .column(SEGMENT_COLUMN)
        .and_then(|series| series.str())
        .map_err(table_error(path))?;

    let rows: Vec<(i64, String)> = clusters
        .into_iter()
        .zip(segments.into_iter())
        .filter_map(|(cluster, segment)| {
            Some((integral_cluster(cluster?)?, segment?.to_owned()))
        })
        .collect();

    if rows.len() < total_rows {
        warn!(
            path = %path.display(),
            skipped = total_rows - rows.len(),
            "skipped segment rows without a cluster id or label"
        );
    }
    info!(path = %path.display(), rows = rows.len(), "loaded segment catalog");
    Ok(SegmentCatalog::new(rows))
}

/// Load the StockCode / Description mapping table.
pub fn load_product_catalog(path: &Path) -> Result<ProductCatalog, ArtifactError> {
    let df = read_table(path)?;
    let codes = string_values(require_column(&df, STOCK_CODE_COLUMN, path)?, path)?;
    let descriptions = string_values(require_column(&df, DESCRIPTION_COLUMN, path)?, path)?;

    let catalog = ProductCatalog::new(
        codes
            .into_iter()
            .zip(descriptions)
            .filter_map(|(code, description)| Some((code?, description?))),
    );

    info!(path = %path.display(), products = catalog.len(), "loaded product catalog");
    Ok(catalog)
}

/// Load the product similarity matrix.
///
/// The first column holds the row StockCodes; every other column is headed by
/// a StockCode, in the same order as the rows. Unparsable cells become NaN.
pub fn load_similarity_matrix(path: &Path) -> Result<SimilarityMatrix, ArtifactError> {
    let df = read_table(path)?;
    let (index, score_columns) = df
        .get_columns()
        .split_first()
        .ok_or_else(|| ArtifactError::invalid(path, "similarity table has no columns"))?;

    let row_codes = string_values(index, path)?
        .into_iter()
        .enumerate()
        .map(|(row, code)| {
            code.ok_or_else(|| {
                ArtifactError::invalid(path, format!("row {row} has no product code"))
            })
        })
        .collect::<Result<Vec<String>, _>>()?;
    let codes: Vec<String> = score_columns
        .iter()
        .map(|series| series.name().to_string())
        .collect();

    if row_codes != codes {
        return Err(ArtifactError::invalid(
            path,
            "row product codes do not match the column product codes",
        ));
    }

    let mut scores = Array2::<f64>::from_elem((row_codes.len(), codes.len()), f64::NAN);
    for (column_idx, series) in score_columns.iter().enumerate() {
        let values = series.cast(&DataType::Float64).map_err(table_error(path))?;
        let values = values.f64().map_err(table_error(path))?;
        for (row_idx, value) in values.into_iter().enumerate() {
            if let Some(value) = value {
                scores[[row_idx, column_idx]] = value;
            }
        }
    }

    let matrix = SimilarityMatrix::new(codes, scores)
        .map_err(|reason| ArtifactError::invalid(path, reason))?;
    info!(path = %path.display(), products = matrix.len(), "loaded similarity matrix");
    Ok(matrix)
}

fn integral_cluster(value: f64) -> Option<i64> {
    (value.is_finite() && value.fract() == 0.0).then_some(value as i64)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let file = File::open(path).map_err(|source| ArtifactError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| ArtifactError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Read a CSV table with every column as a string; callers cast what they need.
fn read_table(path: &Path) -> Result<DataFrame, ArtifactError> {
    std::fs::metadata(path).map_err(|source| ArtifactError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
        .map_err(table_error(path))
}

fn require_column<'a>(
    df: &'a DataFrame,
    column: &str,
    path: &Path,
) -> Result<&'a Series, ArtifactError> {
    df.column(column).map_err(|_| ArtifactError::MissingColumn {
        path: path.to_path_buf(),
        column: column.to_string(),
    })
}

fn string_values(series: &Series, path: &Path) -> Result<Vec<Option<String>>, ArtifactError> {
    let values = series
        .cast(&DataType::String)
        .map_err(table_error(path))?;
    let values = values.str().map_err(table_error(path))?;
    Ok(values
        .into_iter()
        .map(|value| value.map(str::to_owned))
        .collect())
}

fn table_error(path: &Path) -> impl Fn(PolarsError) -> ArtifactError + '_ {
    move |source| ArtifactError::Table {
        path: path.to_path_buf(),
        source,
    }
}
