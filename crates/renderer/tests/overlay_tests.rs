//! Overlay lifecycle on a headless surface.

use std::rc::Rc;

use ntl_common::{
    BandStatistics, Corner, HeadlessSurface, MapControl, MapSurface, TileCoord, TileSource,
    ViewerError, ViewportState,
};
use raster::{decode_geotiff, FetchedRaster};
use renderer::{ApplyOutcome, OverlayOptions, OverlayState, TileOverlayRenderer};
use test_utils::{create_city_lights_grid, create_ramp_grid, GeoTiffBuilder};

const URL_A: &str = "http://backend/compare/2023-01-05/CHE/lj";
const URL_B: &str = "http://backend/compare/2023-02-10/CHE/lj";

/// A 40x20 raster over Switzerland.
fn swiss_raster(stats: BandStatistics) -> FetchedRaster {
    let bytes = GeoTiffBuilder::new(40, 20)
        .origin(5.96, 47.81)
        .pixel_size(0.11325, 0.0995)
        .samples(create_city_lights_grid(40, 20, 0.5, 120.0))
        .build();
    FetchedRaster::new(decode_geotiff(&bytes).unwrap(), stats)
}

fn setup(options: OverlayOptions) -> (Rc<HeadlessSurface>, TileOverlayRenderer) {
    let surface = HeadlessSurface::new("slot-0").into_handle();
    let renderer =
        TileOverlayRenderer::new(surface.clone(), options, "Light intensity", "").unwrap();
    (surface, renderer)
}

#[test]
fn test_load_mounts_overlay_legend_and_fits_once() {
    let (surface, mut r) = setup(OverlayOptions::default());
    let req = r.mount(URL_A).unwrap();
    assert_eq!(r.state(), &OverlayState::Loading);

    let outcome = r.apply(&req, Ok(swiss_raster(BandStatistics::new(1.0, 90.0))));
    assert_eq!(outcome, ApplyOutcome::Applied);
    assert_eq!(r.state(), &OverlayState::Ready);
    assert_eq!(surface.overlay_count(), 1);
    assert_eq!(surface.control_count(), 1);
    assert_eq!(surface.fit_count(), 1);
    assert_eq!(surface.controls()[0].corner(), Corner::BottomLeft);

    let legend = r.legend().unwrap();
    assert_eq!((legend.min, legend.max), (1.0, 90.0));
    assert_eq!(legend.ticks[1].label, "46");

    // Restyling redraws without moving the map.
    let view_before = surface.get_view();
    r.set_style(OverlayOptions {
        palette: "viridis".to_string(),
        opacity: 0.5,
        ..Default::default()
    })
    .unwrap();
    assert_eq!(surface.overlay_count(), 1);
    assert_eq!(surface.control_count(), 1);
    assert_eq!(surface.fit_count(), 1);
    assert_eq!(surface.get_view(), view_before);
}

#[test]
fn test_fit_centres_on_raster() {
    let (surface, mut r) = setup(OverlayOptions::default());
    let req = r.mount(URL_A).unwrap();
    r.apply(&req, Ok(swiss_raster(BandStatistics::unavailable())));

    let view = surface.get_view();
    assert!((view.center.lng - 8.225).abs() < 0.01, "{:?}", view);
    assert!((view.center.lat - 46.815).abs() < 0.01, "{:?}", view);
    assert_ne!(view, ViewportState::default());
}

#[test]
fn test_superseded_result_is_ignored() {
    let (surface, mut r) = setup(OverlayOptions::default());
    let first = r.mount(URL_A).unwrap();
    let second = r.set_url(Some(URL_B.to_string())).unwrap();

    let late = r.apply(&first, Ok(swiss_raster(BandStatistics::unavailable())));
    assert_eq!(late, ApplyOutcome::Superseded);
    assert_eq!(r.state(), &OverlayState::Loading);
    assert_eq!(surface.overlay_count(), 0);

    let current = r.apply(&second, Ok(swiss_raster(BandStatistics::unavailable())));
    assert_eq!(current, ApplyOutcome::Applied);
    assert_eq!(r.url(), Some(URL_B));
}

#[test]
fn test_new_url_tears_down_previous_overlay() {
    let (surface, mut r) = setup(OverlayOptions::default());
    let a = r.mount(URL_A).unwrap();
    r.apply(&a, Ok(swiss_raster(BandStatistics::unavailable())));
    assert_eq!(surface.overlay_count(), 1);

    let b = r.set_url(Some(URL_B.to_string())).unwrap();
    assert_eq!(surface.overlay_count(), 0);
    assert_eq!(surface.control_count(), 0);
    assert!(r.dataset().is_none());

    r.apply(&b, Ok(swiss_raster(BandStatistics::unavailable())));
    assert_eq!(surface.overlay_count(), 1);
    assert_eq!(surface.control_count(), 1);
    // Each new URL is fitted once.
    assert_eq!(surface.fit_count(), 2);
}

#[test]
fn test_error_then_retry_same_url() {
    let (surface, mut r) = setup(OverlayOptions::default());
    let req = r.mount(URL_A).unwrap();
    let err = ViewerError::decode("TIFF error: unexpected EOF");
    assert_eq!(r.apply(&req, Err(err.clone())), ApplyOutcome::Errored);
    assert_eq!(r.state().error(), Some(&err));
    assert_eq!(surface.overlay_count(), 0);

    let retry = r.retry().unwrap();
    assert_eq!(retry.url, URL_A);
    assert!(retry.fresh);
    assert_eq!(r.state(), &OverlayState::Loading);

    // The failed attempt can no longer land.
    assert_eq!(
        r.apply(&req, Err(ViewerError::decode("stale"))),
        ApplyOutcome::Superseded
    );
    assert_eq!(
        r.apply(&retry, Ok(swiss_raster(BandStatistics::unavailable()))),
        ApplyOutcome::Applied
    );
    assert_eq!(surface.fit_count(), 1);
}

#[test]
fn test_all_nan_raster_is_decode_error() {
    let (_, mut r) = setup(OverlayOptions::default());
    let bytes = GeoTiffBuilder::new(2, 2).samples(vec![f32::NAN; 4]).build();
    let fetched = FetchedRaster::new(decode_geotiff(&bytes).unwrap(), BandStatistics::unavailable());

    let req = r.mount(URL_A).unwrap();
    assert_eq!(r.apply(&req, Ok(fetched)), ApplyOutcome::Errored);
    assert_eq!(r.state().error().map(|e| e.category()), Some("DecodeError"));
}

#[test]
fn test_unmount_is_idempotent() {
    let (surface, mut r) = setup(OverlayOptions::default());
    let req = r.mount(URL_A).unwrap();
    r.apply(&req, Ok(swiss_raster(BandStatistics::unavailable())));

    r.unmount();
    r.unmount();
    assert_eq!(r.state(), &OverlayState::Idle);
    assert_eq!(surface.overlay_count(), 0);
    assert_eq!(surface.control_count(), 0);
    assert_eq!(
        r.apply(&req, Ok(swiss_raster(BandStatistics::unavailable()))),
        ApplyOutcome::Superseded
    );
}

#[test]
fn test_drop_removes_attachments() {
    let (surface, mut r) = setup(OverlayOptions::default());
    let req = r.mount(URL_A).unwrap();
    r.apply(&req, Ok(swiss_raster(BandStatistics::unavailable())));
    drop(r);
    assert_eq!(surface.overlay_count(), 0);
    assert_eq!(surface.control_count(), 0);
}

#[test]
fn test_overlay_tiles() {
    let options = OverlayOptions {
        resolution: 16,
        tile_size: 64,
        ..Default::default()
    };
    let (surface, mut r) = setup(options);
    let bytes = GeoTiffBuilder::new(10, 10)
        .samples(create_ramp_grid(10, 10, 0.0, 1.0))
        .build();
    let req = r.mount(URL_A).unwrap();
    r.apply(
        &req,
        Ok(FetchedRaster::new(decode_geotiff(&bytes).unwrap(), BandStatistics::unavailable())),
    );

    let overlay = surface.overlays()[0].clone();
    assert_eq!(overlay.tile_size(), 64);

    // The raster spans lon/lat 0..10; z=3 tile (4, 3) covers lon 0..45, lat 0..41.
    let tile = overlay.render_tile(TileCoord::new(3, 4, 3)).unwrap();
    assert_eq!(tile.len(), 64 * 64 * 4);
    assert!(tile.chunks_exact(4).any(|px| px[3] == 255));
    assert!(tile.chunks_exact(4).any(|px| px[3] == 0));

    // Western hemisphere: no data.
    assert!(overlay.render_tile(TileCoord::new(3, 0, 3)).is_none());
}

#[test]
fn test_remount_after_unmount_fits_again() {
    let (surface, mut r) = setup(OverlayOptions::default());
    let req = r.mount(URL_A).unwrap();
    r.apply(&req, Ok(swiss_raster(BandStatistics::new(1.0, 90.0))));
    assert_eq!(surface.fit_count(), 1);

    r.unmount();
    let req = r.mount(URL_A).unwrap();
    assert_eq!(
        r.apply(&req, Ok(swiss_raster(BandStatistics::new(1.0, 90.0)))),
        ApplyOutcome::Applied
    );
    assert_eq!(surface.fit_count(), 2);

    // Clearing the URL counts as leaving the slot too.
    assert!(r.set_url(None).is_none());
    let req = r.mount(URL_A).unwrap();
    r.apply(&req, Ok(swiss_raster(BandStatistics::new(1.0, 90.0))));
    assert_eq!(surface.fit_count(), 3);
}
