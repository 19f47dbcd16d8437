//! End-to-end comparison runs against an in-process backend.

use std::path::Path;

use compare_cli::{run, CompareOptions};
use ntl_common::ProductType;
use serde_json::Value;
use test_utils::{create_ramp_grid, CannedResponse, FixtureBackend, GeoTiffBuilder, RunningBackend};
use tokio::task::LocalSet;
use viewer::{ExploreQuery, SlotStatus, ViewerConfig};

const LJ_PATH: &str = "/compare/2023-01-05/CHE/lj";
const GAP_FILLED_PATH: &str = "/compare/2023-01-05/CHE/bm";

fn ramp_tiff() -> Vec<u8> {
    GeoTiffBuilder::new(10, 10)
        .origin(5.96, 47.81)
        .pixel_size(0.453, 0.199)
        .samples(create_ramp_grid(10, 10, 5.0, 95.0))
        .build()
}

fn options(backend: &RunningBackend, query: &str, out_dir: &Path) -> CompareOptions {
    let mut config = ViewerConfig::default();
    config.api.base_url = backend.base_url.clone();
    config.overlay.resolution = 16;
    config.overlay.tile_size = 64;
    CompareOptions {
        config,
        query: ExploreQuery::parse(query),
        out_dir: out_dir.to_path_buf(),
        zoom: Some(6),
        max_tiles: 64,
        retries: 1,
    }
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[tokio::test]
async fn test_failed_slot_does_not_block_sibling() {
    let backend = FixtureBackend::with_defaults()
        .route(LJ_PATH, CannedResponse::tiff_with_stats(ramp_tiff(), "NaN", "NaN"))
        .spawn()
        .await
        .unwrap();
    let out = tempfile::tempdir().unwrap();
    let opts = options(&backend, "date=2023-01-05&admin=CHE&compare=true", out.path());

    let summary = LocalSet::new().run_until(run(opts)).await.unwrap();

    assert_eq!(summary.region.as_deref(), Some("CHE"));
    assert_eq!(summary.slots.len(), 2);
    assert_eq!(summary.failed_slots(), 1);

    let gap_filled = &summary.slots[0];
    assert_eq!(gap_filled.product, ProductType::Vnp46a2GapFilled);
    assert!(matches!(
        gap_filled.status,
        SlotStatus::Errored { category: "NetworkError", .. }
    ));
    // One initial attempt plus one fresh retry.
    assert_eq!(backend.hits(GAP_FILLED_PATH), 2);

    let luojia = &summary.slots[1];
    assert_eq!(luojia.status, SlotStatus::Ready);
    assert!(luojia.tiles > 0);

    let slot_dir = out.path().join("slot-1-lj");
    assert!(slot_dir.join("legend.png").exists());
    let status = read_json(&slot_dir.join("status.json"));
    assert_eq!(status["status"], "ready");
    assert_eq!(status["imaging_datetime"], "2023-01-05 22:30");
    assert_eq!(status["legend"]["descriptor"]["min"], 5.0);
    assert_eq!(status["legend"]["descriptor"]["max"], 95.0);

    let failed = read_json(&out.path().join("slot-0-vnp46a2_gap_filled").join("status.json"));
    assert_eq!(failed["status"], "errored");
    assert_eq!(failed["error"]["category"], "NetworkError");
    assert!(!out.path().join("slot-0-vnp46a2_gap_filled").join("legend.png").exists());
}

#[tokio::test]
async fn test_date_without_data_fetches_nothing() {
    let backend = FixtureBackend::with_defaults().spawn().await.unwrap();
    let out = tempfile::tempdir().unwrap();
    let opts = options(&backend, "date=2023-01-10&admin=CHE&compare=true", out.path());

    let summary = LocalSet::new().run_until(run(opts)).await.unwrap();

    assert!(summary.slots.iter().all(|s| s.status == SlotStatus::NoData));
    assert!(backend
        .requests()
        .iter()
        .all(|uri| !uri.starts_with("/compare")));
}

#[tokio::test]
async fn test_without_compare_writes_availability() {
    let backend = FixtureBackend::with_defaults().spawn().await.unwrap();
    let out = tempfile::tempdir().unwrap();
    let opts = options(&backend, "admin=LIE", out.path());

    let summary = LocalSet::new().run_until(run(opts)).await.unwrap();

    assert!(summary.slots.is_empty());
    let availability = read_json(&out.path().join("availability.json"));
    assert_eq!(availability["region"], "LIE");
    assert_eq!(availability["min_date"], "2023-01-01");
    assert_eq!(availability["max_date"], "2023-02-10");
    assert_eq!(availability["months"], serde_json::json!(["2023-01", "2023-02"]));
}

#[tokio::test]
async fn test_deep_zoom_writes_at_most_max_tiles() {
    let backend = FixtureBackend::with_defaults()
        .route(LJ_PATH, CannedResponse::tiff_with_stats(ramp_tiff(), "5", "95"))
        .spawn()
        .await
        .unwrap();
    let out = tempfile::tempdir().unwrap();
    let mut opts = options(&backend, "date=2023-01-05&admin=CHE&compare=true", out.path());
    opts.zoom = Some(17);
    opts.max_tiles = 3;

    let summary = LocalSet::new().run_until(run(opts)).await.unwrap();

    let luojia = &summary.slots[1];
    assert_eq!(luojia.status, SlotStatus::Ready);
    assert_eq!(luojia.tiles, 3);
    let tiles_dir = out.path().join("slot-1-lj").join("tiles").join("17");
    assert!(tiles_dir.exists());
}
