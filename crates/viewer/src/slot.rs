//! Per-slot load driver.
//!
//! Connects a slot's [`TileOverlayRenderer`] to a [`RasterSource`]. Loads run
//! as local tasks, so a driver must be used inside a
//! [`tokio::task::LocalSet`]. At most one load is in flight per slot: a new
//! URL, a retry or an unmount aborts the previous task, and the renderer's
//! generation check drops anything that still slips through.

use std::cell::{Ref, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use client::{FetchMode, RasterSource};
use ntl_common::{ProductType, SurfaceHandle};
use renderer::{ApplyOutcome, LoadRequest, OverlayState, RenderResult, TileOverlayRenderer};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::ViewerConfig;
use crate::session::SlotRequest;

/// What a slot currently shows.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotStatus {
    /// Waiting for a region and date.
    Empty,
    NoData,
    /// Base map only, the product has no raster.
    BaseMapOnly,
    Loading,
    Ready,
    Errored { category: &'static str, message: String },
}

pub struct SlotDriver {
    index: usize,
    product: ProductType,
    surface: SurfaceHandle,
    renderer: Rc<RefCell<TileOverlayRenderer>>,
    source: Arc<dyn RasterSource>,
    request: SlotRequest,
    pending: Option<JoinHandle<ApplyOutcome>>,
}

impl SlotDriver {
    /// Driver for slot `index` showing `product` on `surface`.
    pub fn new(
        index: usize,
        product: ProductType,
        surface: SurfaceHandle,
        config: &ViewerConfig,
        source: Arc<dyn RasterSource>,
    ) -> RenderResult<Self> {
        let renderer = TileOverlayRenderer::new(
            surface.clone(),
            config.overlay_for(product),
            product.legend_title(),
            "",
        )?;
        Ok(Self {
            index,
            product,
            surface,
            renderer: Rc::new(RefCell::new(renderer)),
            source,
            request: SlotRequest::NoSelection,
            pending: None,
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn product(&self) -> ProductType {
        self.product
    }

    pub fn surface(&self) -> &SurfaceHandle {
        &self.surface
    }

    pub fn renderer(&self) -> Ref<'_, TileOverlayRenderer> {
        self.renderer.borrow()
    }

    pub fn request(&self) -> &SlotRequest {
        &self.request
    }

    /// Show the outcome of [`ComparisonSessionController::slot_request`].
    ///
    /// [`ComparisonSessionController::slot_request`]: crate::session::ComparisonSessionController::slot_request
    pub fn show(&mut self, request: SlotRequest) {
        let url = match &request {
            SlotRequest::Fetch { url, .. } => Some(url.clone()),
            _ => None,
        };
        debug!(slot = self.index, request = ?request, "Slot request");
        self.request = request;
        self.set_url(url);
    }

    /// Point the renderer at `url`, aborting any load for an earlier URL.
    pub fn set_url(&mut self, url: Option<String>) {
        let next = self.renderer.borrow_mut().set_url(url);
        if let Some(load) = next {
            self.start(load);
        } else if self.renderer.borrow().url().is_none() {
            self.abort_pending();
        }
    }

    /// Re-fetch after an error, bypassing caches. Returns `false` when the
    /// slot is not in the error state.
    pub fn retry(&mut self) -> bool {
        let next = self.renderer.borrow_mut().retry();
        match next {
            Some(load) => {
                info!(slot = self.index, url = %load.url, "Retrying slot");
                self.start(load);
                true
            }
            None => false,
        }
    }

    /// Wait for the in-flight load, if any.
    pub async fn settle(&mut self) -> Option<ApplyOutcome> {
        let handle = self.pending.take()?;
        handle.await.ok()
    }

    pub fn is_loading(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn status(&self) -> SlotStatus {
        match &self.request {
            SlotRequest::NoSelection => SlotStatus::Empty,
            SlotRequest::NoData => SlotStatus::NoData,
            SlotRequest::Unsupported(_) => SlotStatus::BaseMapOnly,
            SlotRequest::Fetch { .. } => match self.renderer.borrow().state() {
                OverlayState::Idle | OverlayState::Loading => SlotStatus::Loading,
                OverlayState::Ready => SlotStatus::Ready,
                OverlayState::Errored(err) => SlotStatus::Errored {
                    category: err.category(),
                    message: err.to_string(),
                },
            },
        }
    }

    /// Abort any load and remove the overlay and legend. Idempotent.
    pub fn unmount(&mut self) {
        self.abort_pending();
        self.renderer.borrow_mut().unmount();
        self.request = SlotRequest::NoSelection;
    }

    fn start(&mut self, load: LoadRequest) {
        self.abort_pending();
        let renderer = self.renderer.clone();
        let source = self.source.clone();
        let slot = self.index;
        self.pending = Some(tokio::task::spawn_local(async move {
            let mode = if load.fresh {
                FetchMode::Fresh
            } else {
                FetchMode::Cached
            };
            let result = source.fetch(&load.url, mode).await;
            let outcome = renderer.borrow_mut().apply(&load, result);
            debug!(slot = slot, url = %load.url, outcome = ?outcome, "Slot load finished");
            outcome
        }));
    }

    fn abort_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            if !handle.is_finished() {
                debug!(slot = self.index, "Aborting in-flight load");
            }
            handle.abort();
        }
    }
}

impl Drop for SlotDriver {
    fn drop(&mut self) {
        self.unmount();
    }
}
