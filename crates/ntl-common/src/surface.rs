//! Map surface capability.
//!
//! The sync coordinator and the overlay renderer only ever talk to a map through
//! [`MapSurface`]. A surface is owned by whatever hosts it and is shared as a
//! [`SurfaceHandle`]; every method takes `&self` and implementations use
//! interior mutability, since everything runs on one thread.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::{BoundingBox, TileCoord, ViewportState};

/// Shared handle to a live map surface.
pub type SurfaceHandle = Rc<dyn MapSurface>;

/// Identifier of an overlay, control or listener attached to a surface.
pub type AttachmentId = u64;

/// Listener invoked for every surface event.
pub type SurfaceListener = Box<dyn Fn(&SurfaceEvent)>;

/// Who caused a viewport change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewOrigin {
    /// Direct pointer/keyboard interaction on this surface.
    User,
    /// `set_view` or `fit_bounds` called by code.
    Programmatic,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfaceEvent {
    /// The viewport settled on a new state.
    Moved {
        view: ViewportState,
        origin: ViewOrigin,
    },
}

/// Options for [`MapSurface::set_view`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewOptions {
    pub animate: bool,
}

impl ViewOptions {
    pub fn immediate() -> Self {
        Self { animate: false }
    }
}

/// Corner of a surface a control is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Corner {
    TopLeft,
    TopRight,
    #[default]
    BottomLeft,
    BottomRight,
}

/// A tiled layer a surface can display.
pub trait TileSource {
    /// Extent covered by the layer, lon/lat degrees.
    fn bounds(&self) -> BoundingBox;

    /// Edge length of a rendered tile in pixels.
    fn tile_size(&self) -> u32;

    /// Render one tile as RGBA bytes (`tile_size² × 4`), or `None` when the tile
    /// lies outside the layer.
    fn render_tile(&self, coord: TileCoord) -> Option<Vec<u8>>;
}

/// A control (legend, button, ...) anchored to a corner of a surface.
pub trait MapControl {
    fn corner(&self) -> Corner;

    /// Short description, used for logging and inspection.
    fn label(&self) -> String;
}

/// Capability interface to an externally owned map instance.
pub trait MapSurface {
    fn get_view(&self) -> ViewportState;

    /// Move the viewport. Emits a [`ViewOrigin::Programmatic`] move event.
    fn set_view(&self, view: ViewportState, options: ViewOptions);

    /// Move the viewport so `bounds` fills it.
    fn fit_bounds(&self, bounds: &BoundingBox);

    fn add_overlay(&self, source: Rc<dyn TileSource>) -> AttachmentId;

    /// Returns `false` if the overlay was not attached.
    fn remove_overlay(&self, id: AttachmentId) -> bool;

    fn add_control(&self, control: Rc<dyn MapControl>) -> AttachmentId;

    /// Returns `false` if the control was not attached.
    fn remove_control(&self, id: AttachmentId) -> bool;

    fn subscribe(&self, listener: SurfaceListener) -> AttachmentId;

    fn unsubscribe(&self, id: AttachmentId);
}

/// In-memory [`MapSurface`] without a display.
///
/// Used by the headless front-end and by tests. [`HeadlessSurface::pan_to`]
/// simulates a user gesture.
pub struct HeadlessSurface {
    name: String,
    view: Cell<ViewportState>,
    next_id: Cell<AttachmentId>,
    overlays: RefCell<Vec<(AttachmentId, Rc<dyn TileSource>)>>,
    controls: RefCell<Vec<(AttachmentId, Rc<dyn MapControl>)>>,
    listeners: RefCell<Vec<(AttachmentId, Rc<dyn Fn(&SurfaceEvent)>)>>,
    set_view_calls: RefCell<Vec<(ViewportState, ViewOptions)>>,
    fit_count: Cell<usize>,
}

impl HeadlessSurface {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_view(name, ViewportState::default())
    }

    pub fn with_view(name: impl Into<String>, view: ViewportState) -> Self {
        Self {
            name: name.into(),
            view: Cell::new(view),
            next_id: Cell::new(1),
            overlays: RefCell::new(Vec::new()),
            controls: RefCell::new(Vec::new()),
            listeners: RefCell::new(Vec::new()),
            set_view_calls: RefCell::new(Vec::new()),
            fit_count: Cell::new(0),
        }
    }

    /// Wrap in a shareable handle.
    pub fn into_handle(self) -> Rc<Self> {
        Rc::new(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Simulate the user panning or zooming this surface.
    pub fn pan_to(&self, view: ViewportState) {
        self.view.set(view);
        self.emit(SurfaceEvent::Moved {
            view,
            origin: ViewOrigin::User,
        });
    }

    pub fn overlays(&self) -> Vec<Rc<dyn TileSource>> {
        self.overlays.borrow().iter().map(|(_, o)| o.clone()).collect()
    }

    pub fn overlay_count(&self) -> usize {
        self.overlays.borrow().len()
    }

    pub fn controls(&self) -> Vec<Rc<dyn MapControl>> {
        self.controls.borrow().iter().map(|(_, c)| c.clone()).collect()
    }

    pub fn control_count(&self) -> usize {
        self.controls.borrow().len()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Every `set_view` call received, oldest first.
    pub fn set_view_calls(&self) -> Vec<(ViewportState, ViewOptions)> {
        self.set_view_calls.borrow().clone()
    }

    /// How many times `fit_bounds` was called.
    pub fn fit_count(&self) -> usize {
        self.fit_count.get()
    }

    fn allocate_id(&self) -> AttachmentId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }

    fn emit(&self, event: SurfaceEvent) {
        // Listeners may subscribe/unsubscribe while being notified.
        let snapshot: Vec<_> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        for listener in snapshot {
            listener(&event);
        }
    }
}

impl MapSurface for HeadlessSurface {
    fn get_view(&self) -> ViewportState {
        self.view.get()
    }

    fn set_view(&self, view: ViewportState, options: ViewOptions) {
        self.set_view_calls.borrow_mut().push((view, options));
        self.view.set(view);
        self.emit(SurfaceEvent::Moved {
            view,
            origin: ViewOrigin::Programmatic,
        });
    }

    fn fit_bounds(&self, bounds: &BoundingBox) {
        self.fit_count.set(self.fit_count.get() + 1);
        let view = ViewportState::fitting(bounds);
        self.view.set(view);
        self.emit(SurfaceEvent::Moved {
            view,
            origin: ViewOrigin::Programmatic,
        });
    }

    fn add_overlay(&self, source: Rc<dyn TileSource>) -> AttachmentId {
        let id = self.allocate_id();
        self.overlays.borrow_mut().push((id, source));
        id
    }

    fn remove_overlay(&self, id: AttachmentId) -> bool {
        let mut overlays = self.overlays.borrow_mut();
        let before = overlays.len();
        overlays.retain(|(existing, _)| *existing != id);
        overlays.len() != before
    }

    fn add_control(&self, control: Rc<dyn MapControl>) -> AttachmentId {
        let id = self.allocate_id();
        self.controls.borrow_mut().push((id, control));
        id
    }

    fn remove_control(&self, id: AttachmentId) -> bool {
        let mut controls = self.controls.borrow_mut();
        let before = controls.len();
        controls.retain(|(existing, _)| *existing != id);
        controls.len() != before
    }

    fn subscribe(&self, listener: SurfaceListener) -> AttachmentId {
        let id = self.allocate_id();
        self.listeners.borrow_mut().push((id, Rc::from(listener)));
        id
    }

    fn unsubscribe(&self, id: AttachmentId) {
        self.listeners.borrow_mut().retain(|(existing, _)| *existing != id);
    }
}

impl fmt::Debug for HeadlessSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeadlessSurface")
            .field("name", &self.name)
            .field("view", &self.view.get())
            .field("overlays", &self.overlay_count())
            .field("controls", &self.control_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LatLng;

    struct Dummy;

    impl MapControl for Dummy {
        fn corner(&self) -> Corner {
            Corner::TopRight
        }

        fn label(&self) -> String {
            "dummy".to_string()
        }
    }

    #[test]
    fn test_pan_emits_user_event() {
        let surface = HeadlessSurface::new("a");
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        surface.subscribe(Box::new(move |event| sink.borrow_mut().push(*event)));

        let view = ViewportState::new(LatLng::new(1.0, 2.0), 5);
        surface.pan_to(view);
        surface.set_view(view, ViewOptions::immediate());

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(
            seen[0],
            SurfaceEvent::Moved {
                view,
                origin: ViewOrigin::User
            }
        );
        assert_eq!(
            seen[1],
            SurfaceEvent::Moved {
                view,
                origin: ViewOrigin::Programmatic
            }
        );
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let surface = HeadlessSurface::new("a");
        let count = Rc::new(Cell::new(0));
        let sink = count.clone();
        let id = surface.subscribe(Box::new(move |_| sink.set(sink.get() + 1)));
        surface.pan_to(ViewportState::default());
        surface.unsubscribe(id);
        surface.pan_to(ViewportState::default());
        assert_eq!(count.get(), 1);
        assert_eq!(surface.listener_count(), 0);
    }

    #[test]
    fn test_controls_attach_and_detach() {
        let surface = HeadlessSurface::new("a");
        let id = surface.add_control(Rc::new(Dummy));
        assert_eq!(surface.control_count(), 1);
        assert!(surface.remove_control(id));
        assert!(!surface.remove_control(id));
        assert_eq!(surface.control_count(), 0);
    }

    #[test]
    fn test_fit_bounds_counts_and_moves() {
        let surface = HeadlessSurface::new("a");
        surface.fit_bounds(&BoundingBox::new(0.0, 0.0, 2.0, 2.0));
        assert_eq!(surface.fit_count(), 1);
        assert_eq!(surface.get_view().center, LatLng::new(1.0, 1.0));
    }
}
