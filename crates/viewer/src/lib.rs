//! Comparison session core: slots, viewport sync, region selection and
//! navigation state.
//!
//! Everything here runs on one thread. Map surfaces are shared as
//! `Rc<dyn MapSurface>` handles and raster loads run as local tasks.

pub mod availability;
pub mod config;
pub mod error;
pub mod persistence;
pub mod query;
pub mod region;
pub mod selection;
pub mod session;
pub mod slot;
pub mod sync;

pub use availability::DateAvailability;
pub use config::{BoundaryConfig, LegendConfig, ProductOverride, SessionConfig, ViewerConfig};
pub use error::ConfigError;
pub use persistence::{
    deserialize_slots, serialize_slots, try_deserialize_slots, FileStore, KeyValueStore,
    MemoryStore,
};
pub use query::ExploreQuery;
pub use region::{RegionAttributes, RegionFeature};
pub use selection::{Emphasis, FeatureStyle, RegionSelectionModel, SelectionChanged};
pub use session::{ComparisonSessionController, Direction, SlotRequest};
pub use slot::{SlotDriver, SlotStatus};
pub use sync::{SlotId, ViewportSyncCoordinator};
