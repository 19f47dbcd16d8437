//! Viewport synchronisation across comparison surfaces.
//!
//! Every registered surface reports user pans and zooms to the coordinator,
//! which replays the new view onto all other surfaces without animation.
//! Replayed moves are programmatic and are never forwarded again, and a
//! `replaying` flag drops anything a surface reports while a broadcast is
//! running, so a broadcast cannot trigger another one.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use ntl_common::{
    AttachmentId, SurfaceEvent, SurfaceHandle, ViewOptions, ViewOrigin, ViewportState,
};
use tracing::{debug, trace};

/// Identifier of a comparison slot's surface.
pub type SlotId = usize;

struct Registration {
    surface: SurfaceHandle,
    listener: AttachmentId,
}

#[derive(Default)]
struct Registry {
    surfaces: RefCell<BTreeMap<SlotId, Registration>>,
    shared: Cell<Option<ViewportState>>,
    replaying: Cell<bool>,
}

impl Registry {
    fn broadcast(&self, origin: SlotId, view: ViewportState) {
        if self.replaying.get() {
            trace!(slot = origin, "Suppressed viewport change during broadcast");
            return;
        }
        self.shared.set(Some(view));

        // Surfaces may (un)register while being updated.
        let targets: Vec<(SlotId, SurfaceHandle)> = self
            .surfaces
            .borrow()
            .iter()
            .filter(|(slot, _)| **slot != origin)
            .map(|(slot, reg)| (*slot, reg.surface.clone()))
            .collect();

        self.replaying.set(true);
        for (slot, surface) in targets {
            if !self.surfaces.borrow().contains_key(&slot) {
                continue;
            }
            if surface.get_view() != view {
                surface.set_view(view, ViewOptions::immediate());
            }
        }
        self.replaying.set(false);
        debug!(
            slot = origin,
            lat = view.center.lat,
            lng = view.center.lng,
            zoom = view.zoom,
            "Viewport broadcast"
        );
    }
}

/// Keeps the viewports of all registered surfaces aligned.
///
/// Clones share the same registry.
#[derive(Clone, Default)]
pub struct ViewportSyncCoordinator {
    registry: Rc<Registry>,
}

impl ViewportSyncCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the surface of `slot`, replacing any earlier registration.
    ///
    /// A surface joining after the first broadcast is moved to the shared view.
    pub fn register(&self, slot: SlotId, surface: SurfaceHandle) {
        self.unregister(slot);

        let weak: Weak<Registry> = Rc::downgrade(&self.registry);
        let listener = surface.subscribe(Box::new(move |event: &SurfaceEvent| {
            let SurfaceEvent::Moved { view, origin } = *event;
            if origin != ViewOrigin::User {
                return;
            }
            if let Some(registry) = weak.upgrade() {
                registry.broadcast(slot, view);
            }
        }));

        if let Some(view) = self.registry.shared.get() {
            if surface.get_view() != view {
                self.registry.replaying.set(true);
                surface.set_view(view, ViewOptions::immediate());
                self.registry.replaying.set(false);
            }
        }

        self.registry
            .surfaces
            .borrow_mut()
            .insert(slot, Registration { surface, listener });
        debug!(slot = slot, "Surface registered");
    }

    /// Returns `false` when `slot` was not registered.
    pub fn unregister(&self, slot: SlotId) -> bool {
        let removed = self.registry.surfaces.borrow_mut().remove(&slot);
        match removed {
            Some(reg) => {
                reg.surface.unsubscribe(reg.listener);
                debug!(slot = slot, "Surface unregistered");
                true
            }
            None => false,
        }
    }

    /// Report a user-originated view change of `slot`.
    ///
    /// Surfaces registered through [`ViewportSyncCoordinator::register`] call
    /// this themselves; hosts with their own event plumbing may call it
    /// directly.
    pub fn on_viewport_changed(&self, slot: SlotId, view: ViewportState) {
        self.registry.broadcast(slot, view);
    }

    /// The most recent broadcast view.
    pub fn shared_view(&self) -> Option<ViewportState> {
        self.registry.shared.get()
    }

    pub fn is_registered(&self, slot: SlotId) -> bool {
        self.registry.surfaces.borrow().contains_key(&slot)
    }

    pub fn len(&self) -> usize {
        self.registry.surfaces.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Unregister every surface.
    pub fn clear(&self) {
        let slots: Vec<SlotId> = self.registry.surfaces.borrow().keys().copied().collect();
        for slot in slots {
            self.unregister(slot);
        }
    }
}
