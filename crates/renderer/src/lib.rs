//! Color scales, legends and tiled raster overlays.
//!
//! - [`scale`]: lightness-corrected value → color mapping
//! - [`legend`]: legend descriptors and legend images
//! - [`gradient`]: tile sampling and recoloring
//! - [`overlay`]: the per-surface overlay state machine
//! - [`png`]: PNG encoding

pub mod colorspace;
pub mod error;
pub mod gradient;
pub mod legend;
pub mod overlay;
pub mod palettes;
pub mod png;
pub mod scale;

pub use error::{RenderError, RenderResult};
pub use legend::{format_value, LegendDescriptor, LegendRenderer, LegendTick};
pub use overlay::{
    ApplyOutcome, LegendControl, LoadRequest, OverlayOptions, OverlayState, RasterOverlay,
    TileOverlayRenderer,
};
pub use palettes::resolve_palette;
pub use png::{encode_image, encode_png};
pub use scale::{resolve_domain, ColorScale};
