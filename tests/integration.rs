//! Integration tests for Shopper Spectrum

use std::fs;
use std::sync::Arc;
use std::thread;

use shopper_spectrum::{
    load_artifacts, ArtifactError, ArtifactPaths, FeatureVector, InferenceError, SelfExclusion,
    ShopperContext, UNKNOWN_SEGMENT,
};
use support::create_artifacts;
use tempfile::TempDir;

mod support;

fn load(dir: &TempDir) -> ShopperContext {
    load_artifacts(&ArtifactPaths::in_dir(dir.path())).unwrap()
}

#[test]
fn test_classify_end_to_end() {
    let dir = create_artifacts();
    let context = load(&dir);

    let assignment = context
        .classify_customer(FeatureVector::new(10, 20, 500.0))
        .unwrap();

    assert_eq!(assignment.cluster_id, 2);
    assert_eq!(assignment.segment, "Champions");
}

#[test]
fn test_classify_uses_mode_of_cluster_labels() {
    let dir = create_artifacts();
    let context = load(&dir);

    // Scales to (2.0, -1.2, -1.0), nearest to the cluster 0 centroid
    let assignment = context
        .classify_customer(FeatureVector::new(100, 4, 100.0))
        .unwrap();

    assert_eq!(assignment.cluster_id, 0);
    assert_eq!(assignment.segment, "At Risk");
}

#[test]
fn test_classify_cluster_without_catalog_rows() {
    let dir = create_artifacts();
    let context = load(&dir);

    let assignment = context
        .classify_customer(FeatureVector::new(0, 60, 4300.0))
        .unwrap();

    assert_eq!(assignment.cluster_id, 5);
    assert_eq!(assignment.segment, UNKNOWN_SEGMENT);
}

#[test]
fn test_classify_shape_mismatch_is_reported() {
    let dir = create_artifacts();
    fs::write(
        dir.path().join("rfm_scaler.json"),
        r#"{"mean": [0.0, 0.0, 0.0, 0.0], "scale": [1.0, 1.0, 1.0, 1.0]}"#,
    )
    .unwrap();
    let context = load(&dir);

    let err = context
        .classify_customer(FeatureVector::new(10, 20, 500.0))
        .unwrap_err();
    assert!(matches!(err, InferenceError::InputShape { expected: 4, actual: 3, .. }));

    // Later requests on the same snapshot are unaffected
    let names = context.recommend_similar("white metal lantern", 2).unwrap();
    assert_eq!(names.len(), 2);
}

#[test]
fn test_recommend_end_to_end() {
    let dir = create_artifacts();
    let context = load(&dir);

    let names = context
        .recommend_similar("White Hanging Heart T-Light Holder", 3)
        .unwrap();

    assert_eq!(
        names,
        vec![
            "WHITE METAL LANTERN",
            "CREAM CUPID HEARTS COAT HANGER",
            "HAND WARMER UNION JACK",
        ]
    );
}

#[test]
fn test_recommend_shows_code_without_description() {
    let dir = create_artifacts();
    let context = load(&dir);

    let names = context.recommend_similar("hand warmer union jack", 2).unwrap();
    assert_eq!(names, vec!["84029G", "WHITE HANGING HEART T-LIGHT HOLDER"]);
}

#[test]
fn test_recommend_returns_fewer_when_exhausted() {
    let dir = create_artifacts();
    let context = load(&dir);

    let ranked = context
        .rank_similar("  white metal lantern ", 10, SelfExclusion::Positional)
        .unwrap();

    assert_eq!(ranked.len(), 4);
    assert!(ranked.iter().all(|r| r.stock_code != "71053"));
    assert!(ranked.windows(2).all(|pair| pair[0].score >= pair[1].score));
}

#[test]
fn test_recommend_failures() {
    let dir = create_artifacts();
    let context = load(&dir);

    assert_eq!(
        context.recommend_similar("pink flamingo", 5).unwrap_err(),
        InferenceError::ProductNotFound("pink flamingo".to_string())
    );
    assert_eq!(
        context.recommend_similar("Discontinued Sample", 5).unwrap_err(),
        InferenceError::SimilarityDataMissing("99999".to_string())
    );
    assert_eq!(
        context.recommend_similar("", 5).unwrap_err(),
        InferenceError::EmptyProductName
    );
}

#[test]
fn test_repeated_requests_are_identical() {
    let dir = create_artifacts();
    let context = load(&dir);

    let first_segment = context.classify_customer(FeatureVector::new(10, 20, 500.0));
    let first_names = context.recommend_similar("white metal lantern", 3);
    for _ in 0..5 {
        assert_eq!(
            context.classify_customer(FeatureVector::new(10, 20, 500.0)),
            first_segment
        );
        assert_eq!(context.recommend_similar("white metal lantern", 3), first_names);
    }
}

#[test]
fn test_concurrent_readers_share_snapshot() {
    let dir = create_artifacts();
    let context = Arc::new(load(&dir));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let context = Arc::clone(&context);
            thread::spawn(move || {
                let segment = context
                    .classify_customer(FeatureVector::new(10, 20, 500.0))
                    .unwrap();
                let names = context.recommend_similar("WHITE METAL LANTERN", 1).unwrap();
                (segment.segment, names)
            })
        })
        .collect();

    for handle in handles {
        let (segment, names) = handle.join().unwrap();
        assert_eq!(segment, "Champions");
        assert_eq!(names, vec!["WHITE HANGING HEART T-LIGHT HOLDER"]);
    }
}

#[test]
fn test_missing_artifact_fails_load() {
    let dir = create_artifacts();
    fs::remove_file(dir.path().join("product_similarity.csv")).unwrap();

    let err = load_artifacts(&ArtifactPaths::in_dir(dir.path())).unwrap_err();
    assert!(matches!(err, ArtifactError::Read { .. }));
}
