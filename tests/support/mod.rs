//! Artifact fixtures shared by the integration test binaries

use std::fs;

use tempfile::TempDir;

/// Write a complete artifact set into a temporary directory
pub fn create_artifacts() -> TempDir {
    let dir = TempDir::new().unwrap();

    // Recency mean 50 / scale 25, frequency 10 / 5, monetary 300 / 200
    fs::write(
        dir.path().join("rfm_scaler.json"),
        r#"{"mean": [50.0, 10.0, 300.0], "scale": [25.0, 5.0, 200.0]}"#,
    )
    .unwrap();

    // Centroid rows are reported as clusters 0, 1, 2 and 5
    fs::write(
        dir.path().join("rfm_kmeans.json"),
        r#"{
            "centroids": [
                [1.5, -1.0, -1.0],
                [0.0, 0.0, 0.0],
                [-1.5, 2.0, 1.0],
                [-1.0, 10.0, 20.0]
            ],
            "labels": [0, 1, 2, 5]
        }"#,
    )
    .unwrap();

    let mut segments = String::from("CustomerID,Recency,Frequency,Monetary,Cluster,Segment\n");
    let mut customer = 12346;
    for (cluster, segment, count) in [
        (2, "Loyal", 2),
        (2, "Champions", 8),
        (0, "At Risk", 5),
        (0, "Occasional", 1),
        (1, "Regular", 4),
    ] {
        for _ in 0..count {
            segments.push_str(&format!("{customer},10,5,250.0,{cluster},{segment}\n"));
            customer += 1;
        }
    }
    fs::write(dir.path().join("rfm_segmented.csv"), segments).unwrap();

    fs::write(
        dir.path().join("product_mapping.csv"),
        "StockCode,Description\n\
         85123A,WHITE HANGING HEART T-LIGHT HOLDER\n\
         71053,WHITE METAL LANTERN\n\
         22633,HAND WARMER UNION JACK\n\
         84406B,CREAM CUPID HEARTS COAT HANGER\n\
         99999,DISCONTINUED SAMPLE\n",
    )
    .unwrap();

    // 84029G has no description; 99999 has no similarity data
    fs::write(
        dir.path().join("product_similarity.csv"),
        "StockCode,85123A,71053,22633,84406B,84029G\n\
         85123A,1.0,0.9,0.5,0.7,0.2\n\
         71053,0.9,1.0,0.4,0.6,0.3\n\
         22633,0.5,0.4,1.0,0.1,0.8\n\
         84406B,0.7,0.6,0.1,1.0,0.0\n\
         84029G,0.2,0.3,0.8,0.0,1.0\n",
    )
    .unwrap();

    dir
}
