//! Fitted scaler and K-Means cluster model used for inference

use ndarray::{Array1, Array2, ArrayView1};
use serde::Deserialize;

use crate::error::InferenceError;

/// Number of RFM features the segmentation models are fit on.
pub const RFM_FEATURES: usize = 3;

/// Recency, frequency and monetary summary of one customer
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FeatureVector {
    /// Days since last purchase
    pub recency: u32,
    /// Number of purchases
    pub frequency: u32,
    /// Total spend
    pub monetary: f64,
}

impl FeatureVector {
    pub fn new(recency: u32, frequency: u32, monetary: f64) -> Self {
        Self {
            recency,
            frequency,
            monetary,
        }
    }

    pub fn to_array(&self) -> Array1<f64> {
        Array1::from(vec![
            f64::from(self.recency),
            f64::from(self.frequency),
            self.monetary,
        ])
    }
}

/// Standardization with externally fitted per-feature mean and scale.
///
/// Applies `(x - mean) / scale`; a zero scale leaves the centered value as is.
#[derive(Clone, Debug, PartialEq)]
pub struct StandardScaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

/// On-disk form of [`StandardScaler`]
#[derive(Debug, Deserialize)]
pub(crate) struct ScalerParams {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// Build a scaler from fitted parameters, rejecting mismatched lengths.
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self, String> {
        if mean.len() != scale.len() {
            return Err(format!(
                "mean has {} entries but scale has {}",
                mean.len(),
                scale.len()
            ));
        }
        if mean.is_empty() {
            return Err("scaler has no features".to_string());
        }
        Ok(Self {
            mean: Array1::from(mean),
            scale: Array1::from(scale),
        })
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    pub fn transform(&self, features: ArrayView1<f64>) -> Result<Array1<f64>, InferenceError> {
        if features.len() != self.n_features() {
            return Err(InferenceError::InputShape {
                stage: "scaler",
                expected: self.n_features(),
                actual: features.len(),
            });
        }

        Ok(features
            .iter()
            .zip(self.mean.iter().zip(self.scale.iter()))
            .map(|(&x, (&mean, &scale))| {
                let centered = x - mean;
                if scale == 0.0 {
                    centered
                } else {
                    centered / scale
                }
            })
            .collect())
    }
}

impl TryFrom<ScalerParams> for StandardScaler {
    type Error = String;

    fn try_from(params: ScalerParams) -> Result<Self, Self::Error> {
        Self::new(params.mean, params.scale)
    }
}

/// Nearest-centroid model produced by an external K-Means fit
#[derive(Clone, Debug, PartialEq)]
pub struct KMeansModel {
    /// Cluster centroids in normalized space, one row per cluster
    pub centroids: Array2<f64>,
    /// Cluster id reported for each centroid row
    pub labels: Vec<i64>,
}

/// On-disk form of [`KMeansModel`]
#[derive(Debug, Deserialize)]
pub(crate) struct KMeansParams {
    pub centroids: Vec<Vec<f64>>,
    #[serde(default)]
    pub labels: Option<Vec<i64>>,
}

impl KMeansModel {
    /// Build a model from centroid rows. Without explicit labels, row `i`
    /// reports cluster id `i`.
    pub fn new(centroids: Vec<Vec<f64>>, labels: Option<Vec<i64>>) -> Result<Self, String> {
        let n_clusters = centroids.len();
        let n_features = centroids.first().map(Vec::len).unwrap_or(0);
        if n_clusters == 0 || n_features == 0 {
            return Err("cluster model has no centroids".to_string());
        }
        if let Some(row) = centroids.iter().position(|row| row.len() != n_features) {
            return Err(format!(
                "centroid {row} has {} values, expected {n_features}",
                centroids[row].len()
            ));
        }

        let labels = match labels {
            Some(labels) if labels.len() != n_clusters => {
                return Err(format!(
                    "{} labels given for {n_clusters} centroids",
                    labels.len()
                ));
            }
            Some(labels) => labels,
            None => (0..n_clusters as i64).collect(),
        };

        let flat: Vec<f64> = centroids.into_iter().flatten().collect();
        let centroids = Array2::from_shape_vec((n_clusters, n_features), flat)
            .map_err(|err| err.to_string())?;

        Ok(Self { centroids, labels })
    }

    pub fn n_clusters(&self) -> usize {
        self.centroids.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.centroids.ncols()
    }

    /// Predict the cluster id of a normalized feature vector.
    ///
    /// Equidistant centroids resolve to the earlier row.
    pub fn predict(&self, features: ArrayView1<f64>) -> Result<i64, InferenceError> {
        if features.len() != self.n_features() {
            return Err(InferenceError::InputShape {
                stage: "cluster model",
                expected: self.n_features(),
                actual: features.len(),
            });
        }

        // Find nearest centroid
        let mut min_distance = f64::INFINITY;
        let mut closest_cluster = 0;

        for (cluster_idx, centroid) in self.centroids.outer_iter().enumerate() {
            let distance = squared_distance(&features, &centroid);
            if distance < min_distance {
                min_distance = distance;
                closest_cluster = cluster_idx;
            }
        }

        Ok(self.labels[closest_cluster])
    }
}

impl TryFrom<KMeansParams> for KMeansModel {
    type Error = String;

    fn try_from(params: KMeansParams) -> Result<Self, Self::Error> {
        Self::new(params.centroids, params.labels)
    }
}

fn squared_distance(point1: &ArrayView1<f64>, point2: &ArrayView1<f64>) -> f64 {
    point1
        .iter()
        .zip(point2.iter())
        .map(|(a, b)| (a - b).powi(2))
        .sum::<f64>()
}
