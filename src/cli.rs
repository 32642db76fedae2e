//! Command-line interface definitions and argument parsing

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

use crate::data::ArtifactPaths;
use crate::error::InferenceError;
use crate::model::FeatureVector;
use crate::recommend::SelfExclusion;

const MAX_RECENCY: u32 = 365;
const MAX_FREQUENCY: u32 = 1000;
const MAX_MONETARY: f64 = 1_000_000.0;

/// Exit status for a request the user can correct
pub const EXIT_WARNING: u8 = 1;
/// Exit status for unreadable or inconsistent artifacts
pub const EXIT_ARTIFACTS: u8 = 2;

/// Customer segmentation and product recommendations from trained RFM artifacts
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Directory holding the trained artifacts
    #[arg(short, long, env = "SHOPPER_ARTIFACTS_DIR", default_value = ".")]
    pub artifacts_dir: PathBuf,

    /// Scaler JSON, overriding the one in the artifacts directory
    #[arg(long)]
    pub scaler: Option<PathBuf>,

    /// K-Means model JSON, overriding the one in the artifacts directory
    #[arg(long)]
    pub cluster_model: Option<PathBuf>,

    /// Segmented customer CSV, overriding the one in the artifacts directory
    #[arg(long)]
    pub segments: Option<PathBuf>,

    /// Product similarity CSV, overriding the one in the artifacts directory
    #[arg(long)]
    pub similarity: Option<PathBuf>,

    /// StockCode/Description CSV, overriding the one in the artifacts directory
    #[arg(long)]
    pub product_mapping: Option<PathBuf>,

    /// Log filter directive, e.g. "info" or "shopper_spectrum=debug"
    #[arg(long, env = "RUST_LOG", default_value = "warn")]
    pub log_level: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Predict the segment of a customer from RFM values
    Segment(SegmentArgs),
    /// List products similar to a given product
    Recommend(RecommendArgs),
}

#[derive(ClapArgs, Debug, Clone, PartialEq)]
pub struct SegmentArgs {
    /// Days since last purchase
    #[arg(
        short,
        long,
        default_value_t = 30,
        value_parser = clap::value_parser!(u32).range(0..=365)
    )]
    pub recency: u32,

    /// Number of purchases
    #[arg(
        short,
        long,
        default_value_t = 5,
        value_parser = clap::value_parser!(u32).range(0..=1000)
    )]
    pub frequency: u32,

    /// Total spend
    #[arg(short, long, default_value_t = 100.0, value_parser = parse_monetary)]
    pub monetary: f64,

    /// All three values as a comma-separated string
    /// Example: --rfm "30,10,500.0" for Recency=30, Frequency=10, Monetary=500.0
    #[arg(long, conflicts_with_all = ["recency", "frequency", "monetary"])]
    pub rfm: Option<String>,
}

#[derive(ClapArgs, Debug, Clone, PartialEq)]
pub struct RecommendArgs {
    /// Product name, matched ignoring case and surrounding whitespace
    #[arg(required = true, num_args = 1..)]
    pub product: Vec<String>,

    /// Number of recommendations
    #[arg(
        short = 'n',
        long,
        default_value_t = 5,
        value_parser = clap::value_parser!(u8).range(1..=10)
    )]
    pub count: u8,

    /// Drop the queried product by StockCode instead of skipping the top-ranked entry
    #[arg(long)]
    pub exclude_by_code: bool,
}

impl Args {
    /// Artifact locations after applying per-file overrides.
    pub fn artifact_paths(&self) -> ArtifactPaths {
        let mut paths = ArtifactPaths::in_dir(&self.artifacts_dir);
        let overrides = [
            (&mut paths.scaler, &self.scaler),
            (&mut paths.cluster_model, &self.cluster_model),
            (&mut paths.segments, &self.segments),
            (&mut paths.similarity, &self.similarity),
            (&mut paths.product_mapping, &self.product_mapping),
        ];
        for (path, override_path) in overrides {
            if let Some(override_path) = override_path {
                *path = override_path.clone();
            }
        }
        paths
    }
}

impl SegmentArgs {
    /// Feature vector from `--rfm` when given, otherwise from the individual flags.
    pub fn feature_vector(&self) -> crate::Result<FeatureVector> {
        match self.rfm {
            Some(ref rfm) => parse_rfm_values(rfm),
            None => Ok(FeatureVector::new(self.recency, self.frequency, self.monetary)),
        }
    }
}

impl RecommendArgs {
    pub fn product_name(&self) -> String {
        self.product.join(" ")
    }

    pub fn exclusion(&self) -> SelfExclusion {
        if self.exclude_by_code {
            SelfExclusion::ByStockCode
        } else {
            SelfExclusion::Positional
        }
    }
}

/// Parse RFM values from a string
/// Expected format: "recency,frequency,monetary"
pub fn parse_rfm_values(rfm: &str) -> crate::Result<FeatureVector> {
    let parts: Vec<&str> = rfm.split(',').collect();
    if parts.len() != 3 {
        anyhow::bail!("RFM values must be in format 'recency,frequency,monetary'");
    }

    let recency: u32 = parts[0]
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid recency value: {}", parts[0]))?;
    let frequency: u32 = parts[1]
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid frequency value: {}", parts[1]))?;
    let monetary = parse_monetary(parts[2]).map_err(|err| anyhow::anyhow!(err))?;

    if recency > MAX_RECENCY {
        anyhow::bail!("Recency must be between 0 and {MAX_RECENCY} days");
    }
    if frequency > MAX_FREQUENCY {
        anyhow::bail!("Frequency must be between 0 and {MAX_FREQUENCY}");
    }

    Ok(FeatureVector::new(recency, frequency, monetary))
}

fn parse_monetary(raw: &str) -> Result<f64, String> {
    let monetary: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("Invalid monetary value: {raw}"))?;
    if !(0.0..=MAX_MONETARY).contains(&monetary) {
        return Err(format!("Monetary must be between 0 and {MAX_MONETARY}"));
    }
    Ok(monetary)
}

/// Exit status and stderr line for a request that failed.
///
/// Recoverable failures are warnings; shape errors point at the artifacts.
pub fn failure_report(err: &InferenceError) -> (u8, String) {
    if err.is_recoverable() {
        (EXIT_WARNING, format!("warning: {}", err.user_message()))
    } else {
        (EXIT_ARTIFACTS, format!("error: {} ({err})", err.user_message()))
    }
}

/// Heading printed above a recommendation list.
pub fn recommendation_header(count: u8, product_name: &str) -> String {
    format!("Top {count} products similar to {}:", title_case(product_name.trim()))
}

/// Capitalize the first letter of every word and lower-case the rest.
pub fn title_case(text: &str) -> String {
    let mut titled = String::with_capacity(text.len());
    let mut previous_is_letter = false;
    for ch in text.chars() {
        if previous_is_letter {
            titled.extend(ch.to_lowercase());
        } else {
            titled.extend(ch.to_uppercase());
        }
        previous_is_letter = ch.is_alphabetic();
    }
    titled
}
