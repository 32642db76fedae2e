//! Product recommendations from a pre-computed item similarity matrix

use std::cmp::Ordering;
use std::collections::HashMap;

use ndarray::Array2;
use tracing::debug;

use crate::error::InferenceError;

/// Lower-case and trim a product description for lookup.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Bidirectional StockCode / Description mapping.
///
/// Both directions are built from the mapping table in row order and a later
/// row overwrites an earlier one, so duplicate descriptions resolve to the
/// last StockCode listed for them.
#[derive(Clone, Debug, Default)]
pub struct ProductCatalog {
    code_by_name: HashMap<String, String>,
    description_by_code: HashMap<String, String>,
}

impl ProductCatalog {
    pub fn new<I, C, D>(rows: I) -> Self
    where
        I: IntoIterator<Item = (C, D)>,
        C: Into<String>,
        D: Into<String>,
    {
        let mut catalog = Self::default();
        for (code, description) in rows {
            let code = code.into();
            let description = description.into();
            catalog
                .code_by_name
                .insert(normalize_name(&description), code.clone());
            catalog.description_by_code.insert(code, description);
        }
        catalog
    }

    pub fn len(&self) -> usize {
        self.description_by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.description_by_code.is_empty()
    }

    /// StockCode for a product name, ignoring case and surrounding whitespace.
    pub fn code_for(&self, name: &str) -> Option<&str> {
        self.code_by_name
            .get(&normalize_name(name))
            .map(String::as_str)
    }

    pub fn description_for(&self, code: &str) -> Option<&str> {
        self.description_by_code.get(code).map(String::as_str)
    }

    /// Description for display, falling back to the code itself.
    pub fn display_name<'a>(&'a self, code: &'a str) -> &'a str {
        self.description_for(code).unwrap_or(code)
    }
}

/// Square product-product similarity scores keyed by StockCode on both axes
#[derive(Clone, Debug, PartialEq)]
pub struct SimilarityMatrix {
    codes: Vec<String>,
    index: HashMap<String, usize>,
    scores: Array2<f64>,
}

impl SimilarityMatrix {
    /// Build a matrix whose rows and columns are both ordered as `codes`.
    pub fn new(codes: Vec<String>, scores: Array2<f64>) -> Result<Self, String> {
        if scores.nrows() != scores.ncols() {
            return Err(format!(
                "similarity matrix is {}x{}, expected a square matrix",
                scores.nrows(),
                scores.ncols()
            ));
        }
        if codes.len() != scores.ncols() {
            return Err(format!(
                "{} product codes given for {} matrix columns",
                codes.len(),
                scores.ncols()
            ));
        }

        let mut index = HashMap::with_capacity(codes.len());
        for (position, code) in codes.iter().enumerate() {
            if index.insert(code.clone(), position).is_some() {
                return Err(format!("product code '{code}' appears more than once"));
            }
        }

        Ok(Self {
            codes,
            index,
            scores,
        })
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.index.contains_key(code)
    }

    /// All `(code, score)` entries of the column for `code`, highest score first.
    ///
    /// Equal scores are ordered by StockCode and NaN scores sort last.
    pub fn ranked(&self, code: &str) -> Option<Vec<(&str, f64)>> {
        let column = self.scores.column(*self.index.get(code)?);
        let mut ranked: Vec<(&str, f64)> = self
            .codes
            .iter()
            .map(String::as_str)
            .zip(column.iter().copied())
            .collect();
        ranked.sort_by(|(code_a, score_a), (code_b, score_b)| {
            descending_score(*score_a, *score_b).then_with(|| code_a.cmp(code_b))
        });
        Some(ranked)
    }
}

fn descending_score(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.total_cmp(&a),
    }
}

/// How the queried product is kept out of its own recommendations
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SelfExclusion {
    /// Drop exactly the top-ranked entry, assuming it is the product itself.
    #[default]
    Positional,
    /// Drop entries whose StockCode equals the queried one.
    ByStockCode,
}

/// One recommended product with its similarity to the query
#[derive(Clone, Debug, PartialEq)]
pub struct Recommendation {
    pub stock_code: String,
    pub description: String,
    pub score: f64,
}

/// Rank up to `n` products most similar to `product_name`.
pub fn rank_similar(
    products: &ProductCatalog,
    similarity: &SimilarityMatrix,
    product_name: &str,
    n: usize,
    exclusion: SelfExclusion,
) -> Result<Vec<Recommendation>, InferenceError> {
    let name = normalize_name(product_name);
    if name.is_empty() {
        return Err(InferenceError::EmptyProductName);
    }

    let stock_code = products
        .code_for(&name)
        .ok_or_else(|| InferenceError::ProductNotFound(name.clone()))?;
    let ranked = similarity
        .ranked(stock_code)
        .ok_or_else(|| InferenceError::SimilarityDataMissing(stock_code.to_owned()))?;

    let recommendations: Vec<Recommendation> = ranked
        .into_iter()
        .enumerate()
        .filter(|(rank, (code, _))| match exclusion {
            SelfExclusion::Positional => *rank != 0,
            SelfExclusion::ByStockCode => *code != stock_code,
        })
        .take(n)
        .map(|(_, (code, score))| Recommendation {
            stock_code: code.to_owned(),
            description: products.display_name(code).to_owned(),
            score,
        })
        .collect();

    debug!(
        product = %name,
        stock_code,
        requested = n,
        returned = recommendations.len(),
        "ranked similar products"
    );

    Ok(recommendations)
}

/// Descriptions of the `n` products most similar to `product_name`, most similar first.
pub fn recommend_similar(
    products: &ProductCatalog,
    similarity: &SimilarityMatrix,
    product_name: &str,
    n: usize,
) -> Result<Vec<String>, InferenceError> {
    Ok(
        rank_similar(products, similarity, product_name, n, SelfExclusion::Positional)?
            .into_iter()
            .map(|recommendation| recommendation.description)
            .collect(),
    )
}
