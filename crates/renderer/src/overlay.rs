//! Tiled raster overlay with a legend on one map surface.
//!
//! [`TileOverlayRenderer`] is a synchronous state machine:
//!
//! ```text
//! Idle ──set_url──▶ Loading ──apply(Ok)──▶ Ready
//!                      │
//!                      └──apply(Err)──▶ Errored ──retry──▶ Loading
//! ```
//!
//! It never fetches anything itself. [`TileOverlayRenderer::set_url`] and
//! [`TileOverlayRenderer::retry`] hand back a [`LoadRequest`]; the caller
//! fetches and passes the outcome to [`TileOverlayRenderer::apply`] together
//! with the request. Results for a request that is no longer current are
//! dropped, so at most one load is ever applied per URL change.

use std::rc::Rc;
use std::sync::Arc;

use ntl_common::{
    AttachmentId, BoundingBox, Corner, InterpolationMode, MapControl, Rgba, SurfaceHandle,
    TileCoord, TileSource, ViewerError, ViewerResult,
};
use raster::{FetchedRaster, RasterDataset, ResampleMethod};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::RenderResult;
use crate::gradient;
use crate::legend::LegendDescriptor;
use crate::palettes::resolve_palette;
use crate::scale::{resolve_domain, ColorScale};

#[derive(Debug, Clone, PartialEq)]
pub enum OverlayState {
    Idle,
    Loading,
    Ready,
    Errored(ViewerError),
}

impl OverlayState {
    pub fn is_ready(&self) -> bool {
        matches!(self, OverlayState::Ready)
    }

    pub fn error(&self) -> Option<&ViewerError> {
        match self {
            OverlayState::Errored(err) => Some(err),
            _ => None,
        }
    }
}

/// A fetch the renderer is waiting for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub url: String,
    pub generation: u64,
    /// Bypass any cached response.
    pub fresh: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// The request was replaced by a newer URL or load, or the renderer was
    /// unmounted.
    Superseded,
    Errored,
}

/// Per-slot rendering options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayOptions {
    /// Samples per tile edge.
    pub resolution: usize,
    pub tile_size: u32,
    pub opacity: f32,
    pub resample: ResampleMethod,
    /// Palette name or comma-separated hex list.
    pub palette: String,
    pub mode: InterpolationMode,
    pub legend_corner: Corner,
    pub band: usize,
}

impl Default for OverlayOptions {
    fn default() -> Self {
        Self {
            resolution: 128,
            tile_size: 256,
            opacity: 1.0,
            resample: ResampleMethod::Bilinear,
            palette: "cet_l8".to_string(),
            mode: InterpolationMode::Lch,
            legend_corner: Corner::BottomLeft,
            band: 0,
        }
    }
}

/// The recolored raster as a tile source.
pub struct RasterOverlay {
    dataset: Arc<RasterDataset>,
    scale: ColorScale,
    options: OverlayOptions,
    bounds: BoundingBox,
}

impl RasterOverlay {
    pub fn new(dataset: Arc<RasterDataset>, scale: ColorScale, options: OverlayOptions) -> Self {
        let bounds = dataset.lon_lat_bounds();
        Self {
            dataset,
            scale,
            options,
            bounds,
        }
    }

    pub fn dataset(&self) -> &RasterDataset {
        &self.dataset
    }

    pub fn scale(&self) -> &ColorScale {
        &self.scale
    }
}

impl TileSource for RasterOverlay {
    fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    fn tile_size(&self) -> u32 {
        self.options.tile_size
    }

    fn render_tile(&self, coord: TileCoord) -> Option<Vec<u8>> {
        gradient::render_tile(
            &self.dataset,
            self.options.band,
            coord,
            &self.scale,
            self.options.resolution,
            self.options.tile_size as usize,
            self.options.resample,
            self.options.opacity,
        )
    }
}

/// Legend anchored to a surface corner.
pub struct LegendControl {
    descriptor: LegendDescriptor,
    corner: Corner,
}

impl LegendControl {
    pub fn new(descriptor: LegendDescriptor, corner: Corner) -> Self {
        Self { descriptor, corner }
    }

    pub fn descriptor(&self) -> &LegendDescriptor {
        &self.descriptor
    }
}

impl MapControl for LegendControl {
    fn corner(&self) -> Corner {
        self.corner
    }

    fn label(&self) -> String {
        let labels: Vec<&str> = self.descriptor.ticks.iter().map(|t| t.label.as_str()).collect();
        format!("{} [{}]", self.descriptor.title, labels.join(" | "))
    }
}

/// What is currently attached to the surface.
struct Mounted {
    overlay_id: AttachmentId,
    legend_id: AttachmentId,
    overlay: Rc<RasterOverlay>,
    legend: LegendDescriptor,
}

pub struct TileOverlayRenderer {
    surface: SurfaceHandle,
    options: OverlayOptions,
    palette: Vec<Rgba>,
    title: String,
    unit: String,
    url: Option<String>,
    generation: u64,
    state: OverlayState,
    raster: Option<FetchedRaster>,
    mounted: Option<Mounted>,
    fitted_url: Option<String>,
}

impl TileOverlayRenderer {
    pub fn new(
        surface: SurfaceHandle,
        options: OverlayOptions,
        title: impl Into<String>,
        unit: impl Into<String>,
    ) -> RenderResult<Self> {
        let palette = resolve_palette(&options.palette)?;
        Ok(Self {
            surface,
            options,
            palette,
            title: title.into(),
            unit: unit.into(),
            url: None,
            generation: 0,
            state: OverlayState::Idle,
            raster: None,
            mounted: None,
            fitted_url: None,
        })
    }

    pub fn state(&self) -> &OverlayState {
        &self.state
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn options(&self) -> &OverlayOptions {
        &self.options
    }

    pub fn legend(&self) -> Option<&LegendDescriptor> {
        self.mounted.as_ref().map(|m| &m.legend)
    }

    pub fn scale(&self) -> Option<&ColorScale> {
        self.mounted.as_ref().map(|m| m.overlay.scale())
    }

    pub fn overlay(&self) -> Option<Rc<RasterOverlay>> {
        self.mounted.as_ref().map(|m| m.overlay.clone())
    }

    pub fn dataset(&self) -> Option<&Arc<RasterDataset>> {
        self.raster.as_ref().map(|r| &r.dataset)
    }

    /// Start showing `url`.
    pub fn mount(&mut self, url: impl Into<String>) -> Option<LoadRequest> {
        self.set_url(Some(url.into()))
    }

    /// Switch to a new URL, or to none.
    ///
    /// Tears down whatever is shown. Returns the load to perform, or `None`
    /// when the URL did not change or was cleared.
    pub fn set_url(&mut self, url: Option<String>) -> Option<LoadRequest> {
        if url == self.url {
            return None;
        }
        self.teardown();
        self.raster = None;
        self.url = url;

        if self.url.is_some() {
            self.begin_load(false)
        } else {
            self.generation += 1;
            self.fitted_url = None;
            self.state = OverlayState::Idle;
            None
        }
    }

    /// Enter `Loading` for the current URL and invalidate earlier requests.
    pub fn begin_load(&mut self, fresh: bool) -> Option<LoadRequest> {
        let url = self.url.clone()?;
        self.generation += 1;
        self.state = OverlayState::Loading;
        debug!(url = %url, generation = self.generation, fresh = fresh, "Loading raster");
        Some(LoadRequest {
            url,
            generation: self.generation,
            fresh,
        })
    }

    /// Reload the same URL after a failure, bypassing caches.
    pub fn retry(&mut self) -> Option<LoadRequest> {
        if !matches!(self.state, OverlayState::Errored(_)) {
            return None;
        }
        info!(url = ?self.url, "Retrying raster load");
        self.begin_load(true)
    }

    /// Apply the outcome of `request`.
    pub fn apply(
        &mut self,
        request: &LoadRequest,
        result: ViewerResult<FetchedRaster>,
    ) -> ApplyOutcome {
        if request.generation != self.generation || self.url.as_deref() != Some(request.url.as_str()) {
            debug!(
                url = %request.url,
                generation = request.generation,
                current = self.generation,
                "Ignoring superseded raster result"
            );
            return ApplyOutcome::Superseded;
        }

        let fetched = match result {
            Ok(fetched) => fetched,
            Err(err) => return self.fail(err),
        };
        let scale = match self.build_scale(&fetched) {
            Ok(scale) => scale,
            Err(err) => return self.fail(err.into()),
        };

        self.teardown();
        self.attach(fetched.dataset.clone(), scale);
        self.raster = Some(fetched);

        if self.fitted_url.as_deref() != Some(request.url.as_str()) {
            if let Some(m) = &self.mounted {
                self.surface.fit_bounds(&m.overlay.bounds());
            }
            self.fitted_url = Some(request.url.clone());
        }
        self.state = OverlayState::Ready;
        ApplyOutcome::Applied
    }

    /// Change palette, opacity, resolution, ... and redraw without refitting.
    pub fn set_style(&mut self, options: OverlayOptions) -> RenderResult<()> {
        self.palette = resolve_palette(&options.palette)?;
        self.options = options;

        if let Some(fetched) = self.raster.clone() {
            let scale = self.build_scale(&fetched)?;
            self.teardown();
            self.attach(fetched.dataset, scale);
        }
        Ok(())
    }

    /// Remove everything from the surface and forget the URL. Idempotent.
    pub fn unmount(&mut self) {
        self.teardown();
        self.raster = None;
        self.url = None;
        self.fitted_url = None;
        self.generation += 1;
        self.state = OverlayState::Idle;
    }

    fn fail(&mut self, err: ViewerError) -> ApplyOutcome {
        warn!(url = ?self.url, category = err.category(), error = %err, "Raster load failed");
        self.teardown();
        self.raster = None;
        self.state = OverlayState::Errored(err);
        ApplyOutcome::Errored
    }

    fn build_scale(&self, fetched: &FetchedRaster) -> RenderResult<ColorScale> {
        let domain = resolve_domain(&fetched.stats, &fetched.dataset, self.options.band)?;
        ColorScale::build(&self.palette, self.options.mode, domain)
    }

    fn attach(&mut self, dataset: Arc<RasterDataset>, scale: ColorScale) {
        let legend = LegendDescriptor::build(&scale, self.title.clone(), self.unit.clone());
        let overlay = Rc::new(RasterOverlay::new(dataset, scale, self.options.clone()));
        let control = Rc::new(LegendControl::new(legend.clone(), self.options.legend_corner));

        let overlay_id = self.surface.add_overlay(overlay.clone());
        let legend_id = self.surface.add_control(control);
        info!(
            url = ?self.url,
            min = legend.min,
            max = legend.max,
            "Overlay mounted"
        );
        self.mounted = Some(Mounted {
            overlay_id,
            legend_id,
            overlay,
            legend,
        });
    }

    fn teardown(&mut self) {
        if let Some(m) = self.mounted.take() {
            self.surface.remove_overlay(m.overlay_id);
            self.surface.remove_control(m.legend_id);
            debug!(url = ?self.url, "Overlay torn down");
        }
    }
}

impl Drop for TileOverlayRenderer {
    fn drop(&mut self) {
        self.teardown();
    }
}
