//! Viewport synchronisation across several headless surfaces.

use std::rc::Rc;

use ntl_common::{
    BoundingBox, HeadlessSurface, LatLng, MapSurface, SurfaceHandle, ViewOptions, ViewportState,
};
use viewer::ViewportSyncCoordinator;

fn view(lat: f64, lng: f64, zoom: i32) -> ViewportState {
    ViewportState::new(LatLng::new(lat, lng), zoom)
}

fn surfaces(n: usize) -> (ViewportSyncCoordinator, Vec<Rc<HeadlessSurface>>) {
    let sync = ViewportSyncCoordinator::new();
    let all: Vec<_> = (0..n)
        .map(|i| HeadlessSurface::new(format!("slot-{}", i)).into_handle())
        .collect();
    for (i, s) in all.iter().enumerate() {
        sync.register(i, s.clone());
    }
    (sync, all)
}

#[test]
fn test_broadcast_is_idempotent() {
    let (sync, all) = surfaces(3);
    let target = view(46.8, 8.2, 8);

    sync.on_viewport_changed(0, target);
    let once: Vec<_> = all.iter().map(|s| s.get_view()).collect();
    let calls_once: usize = all.iter().map(|s| s.set_view_calls().len()).sum();

    sync.on_viewport_changed(0, target);
    let twice: Vec<_> = all.iter().map(|s| s.get_view()).collect();
    let calls_twice: usize = all.iter().map(|s| s.set_view_calls().len()).sum();

    assert_eq!(once, twice);
    assert_eq!(calls_once, calls_twice);
    assert!(all[1..].iter().all(|s| s.get_view() == target));
}

#[test]
fn test_last_user_change_wins() {
    let (sync, all) = surfaces(3);
    all[0].pan_to(view(10.0, 10.0, 5));
    all[2].pan_to(view(20.0, 20.0, 6));

    assert_eq!(sync.shared_view(), Some(view(20.0, 20.0, 6)));
    for s in &all {
        assert_eq!(s.get_view(), view(20.0, 20.0, 6));
    }
}

#[test]
fn test_replays_are_immediate_and_do_not_echo() {
    let (_sync, all) = surfaces(4);
    all[1].pan_to(view(47.0, 9.0, 10));

    for (i, s) in all.iter().enumerate() {
        let calls = s.set_view_calls();
        if i == 1 {
            assert!(calls.is_empty());
        } else {
            assert_eq!(calls, vec![(view(47.0, 9.0, 10), ViewOptions::immediate())]);
        }
    }
}

#[test]
fn test_fit_bounds_is_not_broadcast() {
    let (sync, all) = surfaces(2);
    let before = all[1].get_view();
    all[0].fit_bounds(&BoundingBox::new(5.96, 45.82, 10.49, 47.81));
    assert_eq!(all[1].get_view(), before);
    assert_eq!(sync.shared_view(), None);
}

/// A surface that unregisters a sibling when it gets moved.
struct Unregistering {
    inner: Rc<HeadlessSurface>,
    sync: ViewportSyncCoordinator,
    victim: usize,
}

impl MapSurface for Unregistering {
    fn get_view(&self) -> ViewportState {
        self.inner.get_view()
    }

    fn set_view(&self, view: ViewportState, options: ViewOptions) {
        self.sync.unregister(self.victim);
        self.inner.set_view(view, options);
    }

    fn fit_bounds(&self, bounds: &BoundingBox) {
        self.inner.fit_bounds(bounds)
    }

    fn add_overlay(&self, source: Rc<dyn ntl_common::TileSource>) -> u64 {
        self.inner.add_overlay(source)
    }

    fn remove_overlay(&self, id: u64) -> bool {
        self.inner.remove_overlay(id)
    }

    fn add_control(&self, control: Rc<dyn ntl_common::MapControl>) -> u64 {
        self.inner.add_control(control)
    }

    fn remove_control(&self, id: u64) -> bool {
        self.inner.remove_control(id)
    }

    fn subscribe(&self, listener: ntl_common::surface::SurfaceListener) -> u64 {
        self.inner.subscribe(listener)
    }

    fn unsubscribe(&self, id: u64) {
        self.inner.unsubscribe(id)
    }
}

#[test]
fn test_unregister_during_broadcast() {
    let sync = ViewportSyncCoordinator::new();
    let a = HeadlessSurface::new("a").into_handle();
    let b_inner = HeadlessSurface::new("b").into_handle();
    let c = HeadlessSurface::new("c").into_handle();

    let b: SurfaceHandle = Rc::new(Unregistering {
        inner: b_inner.clone(),
        sync: sync.clone(),
        victim: 2,
    });
    sync.register(0, a.clone());
    sync.register(1, b);
    sync.register(2, c.clone());

    let before = c.get_view();
    a.pan_to(view(1.0, 2.0, 3));

    assert_eq!(b_inner.get_view(), view(1.0, 2.0, 3));
    assert_eq!(c.get_view(), before);
    assert!(!sync.is_registered(2));
    assert_eq!(sync.len(), 2);
}
