//! Shopper Spectrum: command-line shell over the segmentation and
//! recommendation inference.
//!
//! Loads the trained artifacts once, answers one request, and reports
//! recoverable failures as warnings.

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use shopper_spectrum::cli::{
    failure_report, recommendation_header, Command, RecommendArgs, SegmentArgs, EXIT_ARTIFACTS,
};
use shopper_spectrum::{load_artifacts, Args, InferenceError, ShopperContext};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging(directive: &str) {
    let filter = EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn main() -> Result<ExitCode> {
    // Parse command-line arguments
    let args = Args::parse();
    init_logging(&args.log_level);

    let paths = args.artifact_paths();
    if args.verbose {
        println!("Shopper Spectrum - E-Commerce Analytics");
        println!("=======================================\n");
        println!("Loading artifacts:");
        for (artifact, path) in paths.entries() {
            println!("  {artifact}: {}", path.display());
        }
    }

    let context = match load_artifacts(&paths) {
        Ok(context) => context,
        Err(err) => {
            error!(error = %err, "failed to load artifacts");
            eprintln!("error: {err}");
            return Ok(ExitCode::from(EXIT_ARTIFACTS));
        }
    };
    info!("artifacts loaded");

    let outcome = match &args.command {
        Command::Segment(segment) => run_segment(&context, segment, args.verbose),
        Command::Recommend(recommend) => run_recommend(&context, recommend, args.verbose),
    };

    let err = match outcome {
        Ok(()) => return Ok(ExitCode::SUCCESS),
        Err(err) => err,
    };
    let Some(inference) = err.downcast_ref::<InferenceError>() else {
        return Err(err);
    };
    if inference.is_recoverable() {
        warn!(error = %inference, "request could not be served");
    } else {
        error!(error = %inference, "inference failed");
    }
    let (status, line) = failure_report(inference);
    eprintln!("{line}");
    Ok(ExitCode::from(status))
}

/// Classify one customer and print its cluster and segment
fn run_segment(context: &ShopperContext, args: &SegmentArgs, verbose: bool) -> Result<()> {
    let features = args.feature_vector()?;
    if verbose {
        println!(
            "Input RFM values: R={}, F={}, M={:.2}",
            features.recency, features.frequency, features.monetary
        );
    }

    let assignment = context.classify_customer(features)?;

    println!("Predicted Cluster: {}", assignment.cluster_id);
    println!("Predicted Customer Segment: {}", assignment.segment);

    if verbose {
        let counts = context.segments().segments_for(assignment.cluster_id);
        let total: usize = counts.values().sum();
        println!("\nCluster {} labels:", assignment.cluster_id);
        for (segment, count) in counts {
            let percentage = (count as f64 / total as f64) * 100.0;
            println!("  {segment}: {count} customers ({percentage:.1}%)");
        }
    }

    Ok(())
}

/// Print the products most similar to the requested one
fn run_recommend(context: &ShopperContext, args: &RecommendArgs, verbose: bool) -> Result<()> {
    let product_name = args.product_name();
    let recommendations =
        context.rank_similar(&product_name, usize::from(args.count), args.exclusion())?;

    println!("{}", recommendation_header(args.count, &product_name));
    for (rank, recommendation) in recommendations.iter().enumerate() {
        if verbose {
            println!(
                "{}. {} [{}] (similarity {:.3})",
                rank + 1,
                recommendation.description,
                recommendation.stock_code,
                recommendation.score
            );
        } else {
            println!("{}. {}", rank + 1, recommendation.description);
        }
    }

    Ok(())
}
