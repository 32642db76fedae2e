//! Customer segment classification: scale, predict a cluster, resolve its label

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::InferenceError;
use crate::model::{FeatureVector, KMeansModel, StandardScaler};

/// Label reported when no historical customer shares the predicted cluster.
pub const UNKNOWN_SEGMENT: &str = "Unknown";

/// Result of classifying one customer
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SegmentAssignment {
    /// Raw cluster id from the model; not stable across retraining
    pub cluster_id: i64,
    /// Human-readable segment resolved from the catalog
    pub segment: String,
}

/// Historical (cluster id, segment label) rows, one per customer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SegmentCatalog {
    rows: Vec<(i64, String)>,
}

impl SegmentCatalog {
    pub fn new(rows: Vec<(i64, String)>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Label counts among rows sharing `cluster_id`, ordered by label.
    pub fn segments_for(&self, cluster_id: i64) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for (_, segment) in self.rows.iter().filter(|(id, _)| *id == cluster_id) {
            *counts.entry(segment.as_str()).or_insert(0) += 1;
        }
        counts
    }

    /// Most frequent label for `cluster_id`.
    ///
    /// Equally frequent labels resolve to the lexicographically smallest one.
    /// Returns `None` when no row carries the id.
    pub fn resolve(&self, cluster_id: i64) -> Option<&str> {
        let mut best: Option<(&str, usize)> = None;
        for (segment, count) in self.segments_for(cluster_id) {
            if best.map_or(true, |(_, best_count)| count > best_count) {
                best = Some((segment, count));
            }
        }
        best.map(|(segment, _)| segment)
    }
}

/// Assign a customer to a cluster and a segment label.
pub fn classify_customer(
    scaler: &StandardScaler,
    model: &KMeansModel,
    catalog: &SegmentCatalog,
    features: FeatureVector,
) -> Result<SegmentAssignment, InferenceError> {
    let scaled = scaler.transform(features.to_array().view())?;
    let cluster_id = model.predict(scaled.view())?;

    let segment = match catalog.resolve(cluster_id) {
        Some(segment) => segment.to_owned(),
        None => {
            debug!(cluster_id, "no catalog rows for predicted cluster");
            UNKNOWN_SEGMENT.to_owned()
        }
    };

    debug!(
        recency = features.recency,
        frequency = features.frequency,
        monetary = features.monetary,
        cluster_id,
        segment = %segment,
        "classified customer"
    );

    Ok(SegmentAssignment {
        cluster_id,
        segment,
    })
}
