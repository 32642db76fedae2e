//! Immutable snapshot of the loaded artifacts shared by both inference operations

use crate::error::InferenceError;
use crate::model::{FeatureVector, KMeansModel, StandardScaler};
use crate::recommend::{self, ProductCatalog, Recommendation, SelfExclusion, SimilarityMatrix};
use crate::segment::{self, SegmentAssignment, SegmentCatalog};

/// Every artifact needed to classify customers and recommend products.
///
/// Built once, never mutated afterwards. It is `Send + Sync`, so concurrent
/// callers can share it behind an `Arc` without locking.
#[derive(Clone, Debug)]
pub struct ShopperContext {
    scaler: StandardScaler,
    model: KMeansModel,
    segments: SegmentCatalog,
    products: ProductCatalog,
    similarity: SimilarityMatrix,
}

impl ShopperContext {
    pub fn new(
        scaler: StandardScaler,
        model: KMeansModel,
        segments: SegmentCatalog,
        products: ProductCatalog,
        similarity: SimilarityMatrix,
    ) -> Self {
        Self {
            scaler,
            model,
            segments,
            products,
            similarity,
        }
    }

    pub fn segments(&self) -> &SegmentCatalog {
        &self.segments
    }

    pub fn products(&self) -> &ProductCatalog {
        &self.products
    }

    pub fn classify_customer(
        &self,
        features: FeatureVector,
    ) -> Result<SegmentAssignment, InferenceError> {
        segment::classify_customer(&self.scaler, &self.model, &self.segments, features)
    }

    pub fn recommend_similar(
        &self,
        product_name: &str,
        n: usize,
    ) -> Result<Vec<String>, InferenceError> {
        recommend::recommend_similar(&self.products, &self.similarity, product_name, n)
    }

    pub fn rank_similar(
        &self,
        product_name: &str,
        n: usize,
        exclusion: SelfExclusion,
    ) -> Result<Vec<Recommendation>, InferenceError> {
        recommend::rank_similar(
            &self.products,
            &self.similarity,
            product_name,
            n,
            exclusion,
        )
    }
}
